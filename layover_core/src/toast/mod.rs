// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Toast notifications.
//!
//! [`Countdown`] is the per-toast auto-close timer, paused while the toast
//! is hovered or the window is blurred. [`WindowFocus`] is that window
//! signal, shared by every countdown in one document. [`Toaster`] owns the
//! records, renders them in per-placement lists, and runs the two-phase
//! exit.

mod countdown;
mod toaster;

pub use countdown::{Countdown, FocusReader, WindowFocus};
pub use toaster::{
    SHRINK_DELAY, ToastGroup, ToastRecord, ToastRequest, Toaster, ToasterConfig,
};
