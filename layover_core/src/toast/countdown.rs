// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pausable frame-driven countdown and the shared window-focus signal.

use alloc::rc::Rc;
use core::cell::Cell;

use crate::time::Duration;
use crate::timing::{FrameDelta, FrameTick};

/// Writer side of the document's window-focus signal.
///
/// One exists per document and is driven by window focus/blur events. It
/// starts focused. Countdowns only read it, through [`FocusReader`].
#[derive(Debug)]
pub struct WindowFocus {
    focused: Rc<Cell<bool>>,
}

impl Default for WindowFocus {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowFocus {
    /// Creates a focused signal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            focused: Rc::new(Cell::new(true)),
        }
    }

    /// Records a focus or blur event.
    pub fn set(&self, focused: bool) {
        self.focused.set(focused);
    }

    /// Current value.
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focused.get()
    }

    /// Returns a read-only handle.
    #[must_use]
    pub fn reader(&self) -> FocusReader {
        FocusReader {
            focused: Rc::clone(&self.focused),
        }
    }
}

/// Read-only handle to a [`WindowFocus`].
#[derive(Clone, Debug)]
pub struct FocusReader {
    focused: Rc<Cell<bool>>,
}

impl FocusReader {
    /// Current value.
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focused.get()
    }
}

/// Time remaining before a toast closes itself.
///
/// Each frame tick subtracts the time since the previous tick, but only
/// while the countdown is not paused; paused ticks still advance the
/// baseline, so pausing loses exactly the paused frames. The countdown
/// stops at zero and reports expiry once.
///
/// A duration that is not a positive finite number of milliseconds never
/// expires.
#[derive(Clone, Copy, Debug)]
pub struct Countdown {
    remaining: Option<Duration>,
    hovered: bool,
    delta: FrameDelta,
    expired: bool,
}

impl Countdown {
    /// Creates a countdown; `None` never expires.
    #[must_use]
    pub const fn new(duration: Option<Duration>) -> Self {
        Self {
            remaining: duration,
            hovered: false,
            delta: FrameDelta::new(),
            expired: false,
        }
    }

    /// Creates a countdown from a millisecond value.
    #[must_use]
    pub fn from_millis(ms: f64) -> Self {
        Self::new(Duration::from_finite_millis(ms))
    }

    /// Records pointer enter/leave on the toast.
    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// Whether the pointer is over the toast.
    #[must_use]
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Remaining time; `None` for countdowns that never expire.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    /// Whether the countdown has reached zero.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Feeds a frame tick.
    ///
    /// Returns `true` on the one tick at which the countdown reaches zero.
    pub fn tick(&mut self, tick: &FrameTick, window_focused: bool) -> bool {
        let Some(remaining) = self.remaining else {
            return false;
        };
        if self.expired {
            return false;
        }
        let Some(delta) = self.delta.advance(tick) else {
            return false;
        };
        if !window_focused || self.hovered {
            return false;
        }
        let next = remaining.saturating_sub(delta);
        self.remaining = Some(next);
        if next.is_zero() {
            self.expired = true;
        }
        self.expired
    }
}
