// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for overlay state changes.
//!
//! This module provides a [`TraceSink`] trait with one method per event kind
//! that the lifecycle controller, manager, position engine, and toaster call
//! as they act. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Free-text warnings also go through the `log` facade; the
//! [`WarningEvent`] stream is the structured counterpart.

use alloc::string::String;

use crate::id::{BindingId, ElementId, OverlayId};
use crate::lifecycle::OverlayPhase;
use crate::manager::DismissReason;
use crate::position::InsetInstruction;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when an overlay changes lifecycle phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseChangeEvent {
    /// The overlay, if it is registered with a manager.
    pub overlay: Option<OverlayId>,
    /// Phase before the transition.
    pub from: OverlayPhase,
    /// Phase after the transition.
    pub to: OverlayPhase,
}

/// Emitted when the manager routes a dismissal to an overlay.
#[derive(Clone, Copy, Debug)]
pub struct DismissEvent {
    /// The overlay asked to close.
    pub overlay: OverlayId,
    /// What triggered it.
    pub reason: DismissReason,
}

/// Emitted when the position engine writes an inset.
#[derive(Clone, Copy, Debug)]
pub struct InsetWriteEvent {
    /// Binding that produced the write.
    pub binding: BindingId,
    /// Element written to.
    pub target: ElementId,
    /// The written instruction.
    pub instruction: InsetInstruction,
}

/// Emitted when the scroll-lock reference count changes.
#[derive(Clone, Copy, Debug)]
pub struct ScrollLockEvent {
    /// Count after the change.
    pub count: u32,
    /// Whether the page is locked after the change.
    pub locked: bool,
    /// Whether the change was a forced reapply.
    pub forced: bool,
}

/// Emitted for toast countdown and removal milestones.
#[derive(Clone, Copy, Debug)]
pub struct ToastEvent<'a> {
    /// Toast key.
    pub key: &'a str,
    /// Frame time at which it happened, if frame-driven.
    pub at: Option<HostTime>,
}

/// A recoverable misconfiguration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WarningEvent {
    /// A placement name was rejected.
    InvalidPlacement {
        /// The rejected name.
        name: String,
    },
    /// A render callback attached nothing to the supplied ref.
    MissingRender {
        /// The overlay, if registered.
        overlay: Option<OverlayId>,
    },
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the overlay core.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when an overlay changes phase.
    fn on_phase_change(&mut self, e: &PhaseChangeEvent) {
        _ = e;
    }

    /// Called when a dismissal is routed.
    fn on_dismiss(&mut self, e: &DismissEvent) {
        _ = e;
    }

    /// Called when an inset is written.
    fn on_inset_write(&mut self, e: &InsetWriteEvent) {
        _ = e;
    }

    /// Called when the scroll-lock count changes.
    fn on_scroll_lock(&mut self, e: &ScrollLockEvent) {
        _ = e;
    }

    /// Called when a toast countdown reaches zero.
    fn on_toast_expired(&mut self, e: &ToastEvent<'_>) {
        _ = e;
    }

    /// Called when a toast record is removed.
    fn on_toast_removed(&mut self, e: &ToastEvent<'_>) {
        _ = e;
    }

    /// Called on a recoverable misconfiguration.
    fn on_warning(&mut self, e: &WarningEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($(#[$meta:meta])* $name:ident => $method:ident($ty:ty)) => {
        $(#[$meta])*
        #[inline]
        pub fn $name(&mut self, e: &$ty) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$method(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Reborrows the tracer for a shorter scope.
    #[inline]
    pub fn reborrow(&mut self) -> Tracer<'_> {
        #[cfg(feature = "trace")]
        {
            Tracer {
                sink: match &mut self.sink {
                    Some(s) => Some(&mut **s),
                    None => None,
                },
            }
        }
        #[cfg(not(feature = "trace"))]
        {
            Tracer {
                _marker: core::marker::PhantomData,
            }
        }
    }

    dispatch! {
        /// Emits a [`PhaseChangeEvent`].
        phase_change => on_phase_change(PhaseChangeEvent)
    }

    dispatch! {
        /// Emits a [`DismissEvent`].
        dismiss => on_dismiss(DismissEvent)
    }

    dispatch! {
        /// Emits an [`InsetWriteEvent`].
        inset_write => on_inset_write(InsetWriteEvent)
    }

    dispatch! {
        /// Emits a [`ScrollLockEvent`].
        scroll_lock => on_scroll_lock(ScrollLockEvent)
    }

    dispatch! {
        /// Emits a toast expiry.
        toast_expired => on_toast_expired(ToastEvent<'_>)
    }

    dispatch! {
        /// Emits a toast removal.
        toast_removed => on_toast_removed(ToastEvent<'_>)
    }

    dispatch! {
        /// Emits a [`WarningEvent`].
        warning => on_warning(WarningEvent)
    }
}

impl Default for Tracer<'_> {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_scroll_lock(&ScrollLockEvent {
            count: 1,
            locked: true,
            forced: false,
        });
        sink.on_toast_expired(&ToastEvent {
            key: "toast-0",
            at: None,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.scroll_lock(&ScrollLockEvent {
            count: 0,
            locked: false,
            forced: false,
        });
        tracer.warning(&WarningEvent::MissingRender { overlay: None });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct CountingSink {
            counts: Vec<u32>,
        }
        impl TraceSink for CountingSink {
            fn on_scroll_lock(&mut self, e: &ScrollLockEvent) {
                self.counts.push(e.count);
            }
        }

        let mut sink = CountingSink { counts: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        for count in [1, 2, 1] {
            tracer.reborrow().scroll_lock(&ScrollLockEvent {
                count,
                locked: true,
                forced: false,
            });
        }
        drop(tracer);
        assert_eq!(sink.counts, &[1, 2, 1]);
    }
}
