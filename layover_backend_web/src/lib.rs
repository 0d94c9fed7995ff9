// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for layover.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebHost`]: DOM probe and presenter over a live document
//! - [`RafLoop`]: `requestAnimationFrame` tick source for toast countdowns
//! - [`FocusTracker`]: window focus/blur feeding the shared focus signal
//!
//! A typical page owns one of each plus the document's
//! [`OverlayManager`](layover_core::manager::OverlayManager). On every frame
//! it drains [`WebHost::drain_events`], routes each [`HostEvent`] to its
//! owner, then ticks its toasters.

#![no_std]

extern crate alloc;

mod dom;
mod focus;
mod raf;
mod table;

pub use dom::{HostEvent, WebHost};
pub use focus::FocusTracker;
pub use layover_core::backend::{DomProbe, Presenter};
pub use raf::RafLoop;

use layover_core::time::HostTime;

/// Returns the current host time from `performance.now()`, in microsecond
/// ticks.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(raf::performance_now())
}
