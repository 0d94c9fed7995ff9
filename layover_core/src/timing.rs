// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame ticks.
//!
//! Everything time-based in the overlay core (toast countdowns, the delay
//! before a dismissed toast collapses) advances on animation-frame ticks
//! rather than on free-running timers. Backends turn a platform callback
//! (`requestAnimationFrame`, a test clock) into a stream of [`FrameTick`]s and
//! hand each one to the consumers that need it.
//!
//! [`FrameDelta`] reproduces the pairwise reading of that stream: the first
//! tick only establishes a baseline, every later tick yields the time elapsed
//! since the previous one.

use crate::time::{Duration, HostTime};

/// A frame opportunity delivered by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameTick {
    /// Host time of the frame callback.
    pub now: HostTime,
    /// Monotonically increasing frame counter.
    pub frame_index: u64,
}

impl FrameTick {
    /// Creates a tick at the given time.
    #[must_use]
    pub const fn new(now: HostTime, frame_index: u64) -> Self {
        Self { now, frame_index }
    }
}

/// Converts successive frame ticks into elapsed deltas.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameDelta {
    last: Option<HostTime>,
}

impl FrameDelta {
    /// Creates a tracker with no baseline.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Feeds a tick and returns the time since the previous one.
    ///
    /// Returns `None` for the very first tick. A tick that goes backwards
    /// yields a zero delta.
    pub fn advance(&mut self, tick: &FrameTick) -> Option<Duration> {
        let delta = self
            .last
            .map(|prev| tick.now.saturating_duration_since(prev));
        self.last = Some(tick.now);
        delta
    }

    /// Forgets the baseline.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_baseline_only() {
        let mut delta = FrameDelta::new();
        assert_eq!(delta.advance(&FrameTick::new(HostTime(1_000), 0)), None);
        assert_eq!(
            delta.advance(&FrameTick::new(HostTime(17_000), 1)),
            Some(Duration(16_000))
        );
    }

    #[test]
    fn backwards_tick_is_zero() {
        let mut delta = FrameDelta::new();
        delta.advance(&FrameTick::new(HostTime(10_000), 0));
        assert_eq!(
            delta.advance(&FrameTick::new(HostTime(5_000), 1)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn reset_drops_baseline() {
        let mut delta = FrameDelta::new();
        delta.advance(&FrameTick::new(HostTime(10_000), 0));
        delta.reset();
        assert_eq!(delta.advance(&FrameTick::new(HostTime(20_000), 1)), None);
    }
}
