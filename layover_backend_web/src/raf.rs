// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` tick source.
//!
//! [`RafLoop`] turns browser animation frames into [`FrameTick`]s. Each
//! callback receives a [`DOMHighResTimeStamp`][mdn] (milliseconds on the
//! `performance.now()` clock), converted to microsecond [`HostTime`] ticks.
//! Toast countdowns and the toast shrink delay advance only on these ticks,
//! so a background tab (where the browser throttles frames) pauses them.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp
//! [`FrameTick`]: layover_core::timing::FrameTick
//! [`HostTime`]: layover_core::time::HostTime

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use layover_core::time::HostTime;
use layover_core::timing::FrameTick;

// Direct global bindings instead of `web_sys::Window` methods, so no
// Window/Performance object is fetched on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

/// A `requestAnimationFrame` loop that emits [`FrameTick`] events.
///
/// Create with [`RafLoop::new`], then call [`start`](Self::start). The loop
/// re-registers itself each frame until [`stop`](Self::stop) is called or
/// the `RafLoop` is dropped.
///
/// [`FrameTick`]: layover_core::timing::FrameTick
pub struct RafLoop {
    inner: Rc<RafInner>,
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct RafInner {
    /// The JS closure registered with `requestAnimationFrame`.
    ///
    /// Kept in its own `RefCell` so it can be set once in `start()` and
    /// referenced from inside itself without conflicting with `callback`.
    closure: RefCell<Option<RafClosure>>,

    callback: RefCell<Box<dyn FnMut(FrameTick)>>,

    /// Becomes `FrameTick::frame_index`.
    frame_counter: Cell<u64>,

    running: Cell<bool>,

    /// Most recent `requestAnimationFrame` handle, for cancellation.
    raf_id: Cell<i32>,
}

impl RafLoop {
    /// Creates a loop that is **not yet running**.
    pub fn new(callback: impl FnMut(FrameTick) + 'static) -> Self {
        Self {
            inner: Rc::new(RafInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                frame_counter: Cell::new(0),
                running: Cell::new(false),
                raf_id: Cell::new(0),
            }),
        }
    }

    /// Starts the loop. A running loop is left alone.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        if let Some(closure) = &*self.inner.closure.borrow() {
            let id = request_animation_frame(closure.as_ref().unchecked_ref());
            self.inner.raf_id.set(id);
            return;
        }

        let inner = Rc::clone(&self.inner);
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            if !inner.running.get() {
                return;
            }

            let frame_index = inner.frame_counter.get();
            inner.frame_counter.set(frame_index + 1);
            let tick = FrameTick::new(HostTime::from_millis_f64(timestamp_ms), frame_index);

            // Scoped so it does not overlap the `closure` borrow below.
            inner.callback.borrow_mut()(tick);

            if inner.running.get()
                && let Some(ref closure) = *inner.closure.borrow()
            {
                let id = request_animation_frame(closure.as_ref().unchecked_ref());
                inner.raf_id.set(id);
            }
        }) as Box<dyn FnMut(f64)>);

        let id = request_animation_frame(closure.as_ref().unchecked_ref());
        self.inner.raf_id.set(id);
        *self.inner.closure.borrow_mut() = Some(closure);
    }

    /// Stops the loop and cancels the pending callback. Can be restarted.
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        cancel_animation_frame(self.inner.raf_id.get());
    }

    /// Returns `true` if the loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Number of frames delivered so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.inner.frame_counter.get()
    }
}

impl Drop for RafLoop {
    fn drop(&mut self) {
        self.stop();
        // The closure holds an `Rc` to `inner`; dropping it breaks the cycle.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for RafLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafLoop")
            .field("running", &self.inner.running.get())
            .field("frame_counter", &self.inner.frame_counter.get())
            .finish_non_exhaustive()
    }
}
