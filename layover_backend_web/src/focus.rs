// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window focus tracking.

use alloc::boxed::Box;
use alloc::rc::Rc;

use wasm_bindgen::JsCast as _;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, Window};

use layover_core::toast::{FocusReader, WindowFocus};

type FocusClosure = Closure<dyn FnMut(Event)>;

/// Feeds a window's `focus`/`blur` events into a [`WindowFocus`].
///
/// One per document. Every toaster in the document reads the same signal
/// through [`reader`](Self::reader), so blurring the window pauses all of
/// their countdowns at once.
pub struct FocusTracker {
    window: Window,
    focus: Rc<WindowFocus>,
    on_focus: FocusClosure,
    on_blur: FocusClosure,
}

impl core::fmt::Debug for FocusTracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FocusTracker")
            .field("focused", &self.focus.is_focused())
            .finish_non_exhaustive()
    }
}

impl FocusTracker {
    /// Starts tracking, seeded from `document.hasFocus()`.
    ///
    /// # Errors
    ///
    /// Fails if the browser rejects either listener.
    pub fn new(window: Window) -> Result<Self, JsValue> {
        let focus = Rc::new(WindowFocus::new());
        if let Some(document) = window.document() {
            focus.set(document.has_focus().unwrap_or(true));
        }

        let on_focus = signal(&focus, true);
        let on_blur = signal(&focus, false);
        window.add_event_listener_with_callback("focus", on_focus.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback("blur", on_blur.as_ref().unchecked_ref())?;
        Ok(Self {
            window,
            focus,
            on_focus,
            on_blur,
        })
    }

    /// A handle for toasters.
    #[must_use]
    pub fn reader(&self) -> FocusReader {
        self.focus.reader()
    }

    /// Current value.
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focus.is_focused()
    }
}

fn signal(focus: &Rc<WindowFocus>, value: bool) -> FocusClosure {
    let focus = Rc::clone(focus);
    Closure::wrap(Box::new(move |_: Event| focus.set(value)) as Box<dyn FnMut(Event)>)
}

impl Drop for FocusTracker {
    fn drop(&mut self) {
        _ = self
            .window
            .remove_event_listener_with_callback("focus", self.on_focus.as_ref().unchecked_ref());
        _ = self
            .window
            .remove_event_listener_with_callback("blur", self.on_blur.as_ref().unchecked_ref());
    }
}
