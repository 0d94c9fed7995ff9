// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each prefixed with a tag byte and the
//! host time set by [`RecorderSink::set_now`]. [`decode`] reads them back as
//! an iterator of [`Stamped`] events.
//!
//! Core handles are recorded by value ([`RawId`]), so a recording can be
//! inspected after the manager and engines that issued them are gone.

use core::fmt;

use layover_core::id::{BindingId, ElementId, OverlayId};
use layover_core::lifecycle::OverlayPhase;
use layover_core::manager::DismissReason;
use layover_core::position::{InsetInstruction, PositionMode};
use layover_core::time::HostTime;
use layover_core::trace::{
    DismissEvent, InsetWriteEvent, PhaseChangeEvent, ScrollLockEvent, ToastEvent, TraceSink,
    WarningEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PHASE_CHANGE: u8 = 1;
const TAG_DISMISS: u8 = 2;
const TAG_INSET_WRITE: u8 = 3;
const TAG_SCROLL_LOCK: u8 = 4;
const TAG_TOAST_EXPIRED: u8 = 5;
const TAG_TOAST_REMOVED: u8 = 6;
const TAG_INVALID_PLACEMENT: u8 = 7;
const TAG_MISSING_RENDER: u8 = 8;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A generational handle captured by value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawId {
    /// Slot index.
    pub index: u32,
    /// Slot generation.
    pub generation: u32,
}

impl fmt::Debug for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@gen{}", self.index, self.generation)
    }
}

impl From<OverlayId> for RawId {
    fn from(id: OverlayId) -> Self {
        Self {
            index: id.index(),
            generation: id.generation(),
        }
    }
}

impl From<BindingId> for RawId {
    fn from(id: BindingId) -> Self {
        Self {
            index: id.index(),
            generation: id.generation(),
        }
    }
}

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
    now: HostTime,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time stamped on subsequent records.
    ///
    /// Toast expiries carry their own frame time and ignore this.
    pub fn set_now(&mut self, now: HostTime) {
        self.now = now;
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn begin(&mut self, tag: u8, at: HostTime) {
        self.write_u8(tag);
        self.write_u64(at.micros());
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_f64(&mut self, v: Option<f64>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u64(val.to_bits());
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }

    fn write_id(&mut self, id: RawId) {
        self.write_u32(id.index);
        self.write_u32(id.generation);
    }

    fn write_option_id(&mut self, id: Option<RawId>) {
        self.write_u8(u8::from(id.is_some()));
        self.write_id(id.unwrap_or(RawId {
            index: 0,
            generation: 0,
        }));
    }

    fn write_str(&mut self, s: &str) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "keys and placement names are short; length capped at u32::MAX"
        )]
        self.write_u32(s.len().min(u32::MAX as usize) as u32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn write_phase(&mut self, p: OverlayPhase) {
        self.write_u8(match p {
            OverlayPhase::Closed => 0,
            OverlayPhase::Opening => 1,
            OverlayPhase::Open => 2,
            OverlayPhase::Closing => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_change(&mut self, e: &PhaseChangeEvent) {
        self.begin(TAG_PHASE_CHANGE, self.now);
        self.write_option_id(e.overlay.map(RawId::from));
        self.write_phase(e.from);
        self.write_phase(e.to);
    }

    fn on_dismiss(&mut self, e: &DismissEvent) {
        self.begin(TAG_DISMISS, self.now);
        self.write_id(e.overlay.into());
        self.write_u8(match e.reason {
            DismissReason::Escape => 0,
            DismissReason::OutsideClick => 1,
            DismissReason::Backdrop => 2,
            DismissReason::Programmatic => 3,
        });
    }

    fn on_inset_write(&mut self, e: &InsetWriteEvent) {
        self.begin(TAG_INSET_WRITE, self.now);
        self.write_id(e.binding.into());
        self.write_u32(e.target.0);
        let i = &e.instruction;
        self.write_u8(match i.mode {
            PositionMode::Fixed => 0,
            PositionMode::Absolute => 1,
        });
        for (_, value) in i.axes() {
            self.write_option_f64(value);
        }
    }

    fn on_scroll_lock(&mut self, e: &ScrollLockEvent) {
        self.begin(TAG_SCROLL_LOCK, self.now);
        self.write_u32(e.count);
        self.write_u8(u8::from(e.locked));
        self.write_u8(u8::from(e.forced));
    }

    fn on_toast_expired(&mut self, e: &ToastEvent<'_>) {
        self.begin(TAG_TOAST_EXPIRED, e.at.unwrap_or(self.now));
        self.write_str(e.key);
    }

    fn on_toast_removed(&mut self, e: &ToastEvent<'_>) {
        self.begin(TAG_TOAST_REMOVED, e.at.unwrap_or(self.now));
        self.write_str(e.key);
    }

    fn on_warning(&mut self, e: &WarningEvent) {
        match e {
            WarningEvent::InvalidPlacement { name } => {
                self.begin(TAG_INVALID_PLACEMENT, self.now);
                self.write_str(name);
            }
            WarningEvent::MissingRender { overlay } => {
                self.begin(TAG_MISSING_RENDER, self.now);
                self.write_option_id(overlay.map(RawId::from));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`PhaseChangeEvent`].
    PhaseChange {
        /// Registered overlay, if any.
        overlay: Option<RawId>,
        /// Phase before.
        from: OverlayPhase,
        /// Phase after.
        to: OverlayPhase,
    },
    /// A [`DismissEvent`].
    Dismiss {
        /// Overlay asked to close.
        overlay: RawId,
        /// Trigger.
        reason: DismissReason,
    },
    /// An [`InsetWriteEvent`].
    InsetWrite {
        /// Binding that wrote.
        binding: RawId,
        /// Element written to.
        target: ElementId,
        /// The written instruction.
        instruction: InsetInstruction,
    },
    /// A [`ScrollLockEvent`].
    ScrollLock {
        /// Count after the change.
        count: u32,
        /// Lock state after the change.
        locked: bool,
        /// Whether it was a forced reapply.
        forced: bool,
    },
    /// A toast countdown expired.
    ToastExpired {
        /// Toast key.
        key: String,
    },
    /// A toast record was removed.
    ToastRemoved {
        /// Toast key.
        key: String,
    },
    /// [`WarningEvent::InvalidPlacement`].
    InvalidPlacement {
        /// The rejected name.
        name: String,
    },
    /// [`WarningEvent::MissingRender`].
    MissingRender {
        /// Registered overlay, if any.
        overlay: Option<RawId>,
    },
}

/// A decoded event with its recording time.
#[derive(Clone, Debug, PartialEq)]
pub struct Stamped {
    /// Host time of the record.
    pub at: HostTime,
    /// The event.
    pub event: RecordedEvent,
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`Stamped`] events.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        Some(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_option_f64(&mut self) -> Option<Option<f64>> {
        let present = self.read_bool()?;
        let bits = self.read_u64()?;
        Some(present.then(|| f64::from_bits(bits)))
    }

    fn read_id(&mut self) -> Option<RawId> {
        Some(RawId {
            index: self.read_u32()?,
            generation: self.read_u32()?,
        })
    }

    fn read_option_id(&mut self) -> Option<Option<RawId>> {
        let present = self.read_bool()?;
        let id = self.read_id()?;
        Some(present.then_some(id))
    }

    fn read_str(&mut self) -> Option<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    fn read_phase(&mut self) -> Option<OverlayPhase> {
        Some(match self.read_u8()? {
            0 => OverlayPhase::Closed,
            1 => OverlayPhase::Opening,
            2 => OverlayPhase::Open,
            _ => OverlayPhase::Closing,
        })
    }

    fn read_reason(&mut self) -> Option<DismissReason> {
        Some(match self.read_u8()? {
            0 => DismissReason::Escape,
            1 => DismissReason::OutsideClick,
            2 => DismissReason::Backdrop,
            _ => DismissReason::Programmatic,
        })
    }

    fn decode_inset_write(&mut self) -> Option<RecordedEvent> {
        let binding = self.read_id()?;
        let target = ElementId(self.read_u32()?);
        let mode = match self.read_u8()? {
            0 => PositionMode::Fixed,
            _ => PositionMode::Absolute,
        };
        Some(RecordedEvent::InsetWrite {
            binding,
            target,
            instruction: InsetInstruction {
                mode,
                top: self.read_option_f64()?,
                right: self.read_option_f64()?,
                bottom: self.read_option_f64()?,
                left: self.read_option_f64()?,
            },
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Stamped;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let at = HostTime(self.read_u64()?);
        let event = match tag {
            TAG_PHASE_CHANGE => RecordedEvent::PhaseChange {
                overlay: self.read_option_id()?,
                from: self.read_phase()?,
                to: self.read_phase()?,
            },
            TAG_DISMISS => RecordedEvent::Dismiss {
                overlay: self.read_id()?,
                reason: self.read_reason()?,
            },
            TAG_INSET_WRITE => self.decode_inset_write()?,
            TAG_SCROLL_LOCK => RecordedEvent::ScrollLock {
                count: self.read_u32()?,
                locked: self.read_bool()?,
                forced: self.read_bool()?,
            },
            TAG_TOAST_EXPIRED => RecordedEvent::ToastExpired {
                key: self.read_str()?,
            },
            TAG_TOAST_REMOVED => RecordedEvent::ToastRemoved {
                key: self.read_str()?,
            },
            TAG_INVALID_PLACEMENT => RecordedEvent::InvalidPlacement {
                name: self.read_str()?,
            },
            TAG_MISSING_RENDER => RecordedEvent::MissingRender {
                overlay: self.read_option_id()?,
            },
            _ => return None, // unknown tag → stop iteration
        };
        Some(Stamped { at, event })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use kurbo::Rect;
    use layover_core::backend::ContainerRef;
    use layover_core::config::{DrawerSide, OverlayOptions};
    use layover_core::headless::HeadlessHost;
    use layover_core::lifecycle::{OverlayController, OverlayCx};
    use layover_core::manager::OverlayManager;
    use layover_core::placement::Placement;
    use layover_core::position::{PositionConfig, PositionEngine};
    use layover_core::render::RenderScope;
    use layover_core::trace::Tracer;

    use super::*;

    #[test]
    fn records_a_drawer_session() {
        let mut host = HeadlessHost::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let mut manager = OverlayManager::new();
        let mut rec = RecorderSink::new();
        let mut drawer = OverlayController::new("drawer", OverlayOptions::drawer(DrawerSide::Left));
        drawer.set_renderer(|mut scope: RenderScope<'_>| {
            scope.render_content().unwrap();
        });

        rec.set_now(HostTime(1_000));
        let mut cx = OverlayCx::new(&mut manager, &mut host).with_tracer(Tracer::new(&mut rec));
        drawer.request_visible(true, &mut cx);
        let request = cx.manager.handle_escape(&mut cx.tracer).unwrap();
        assert!(drawer.dismiss(request, &mut cx));
        drop(cx);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        let id = RawId::from(request.overlay);
        assert_eq!(
            events.iter().map(|s| &s.event).collect::<Vec<_>>(),
            [
                &RecordedEvent::ScrollLock {
                    count: 1,
                    locked: true,
                    forced: false,
                },
                &RecordedEvent::PhaseChange {
                    overlay: Some(id),
                    from: OverlayPhase::Closed,
                    to: OverlayPhase::Opening,
                },
                &RecordedEvent::Dismiss {
                    overlay: id,
                    reason: DismissReason::Escape,
                },
                &RecordedEvent::PhaseChange {
                    overlay: Some(id),
                    from: OverlayPhase::Opening,
                    to: OverlayPhase::Closing,
                },
            ]
        );
        assert!(events.iter().all(|s| s.at == HostTime(1_000)));
    }

    #[test]
    fn toast_events_keep_their_frame_time() {
        let mut rec = RecorderSink::new();
        rec.set_now(HostTime(5));
        rec.on_toast_expired(&ToastEvent {
            key: "toast-3",
            at: Some(HostTime(48_000)),
        });
        rec.on_toast_removed(&ToastEvent {
            key: "toast-3",
            at: None,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].at, HostTime(48_000));
        assert_eq!(
            events[0].event,
            RecordedEvent::ToastExpired {
                key: "toast-3".into()
            }
        );
        assert_eq!(events[1].at, HostTime(5));
    }

    #[test]
    fn inset_axes_survive_recording() {
        let mut engine = PositionEngine::new();
        let mut host = HeadlessHost::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let target = host.add_element(host.body(), Rect::new(0.0, 0.0, 100.0, 40.0));
        let mut rec = RecorderSink::new();
        let binding = engine.subscribe(
            ContainerRef::DocumentBody,
            target,
            PositionConfig::new(Placement::Center),
            &mut host,
            &mut Tracer::new(&mut rec),
        );

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match &events[..] {
            [Stamped {
                event:
                    RecordedEvent::InsetWrite {
                        binding: b,
                        target: t,
                        instruction,
                    },
                ..
            }] => {
                assert_eq!(*b, RawId::from(binding));
                assert_eq!(*t, target);
                assert_eq!(
                    *instruction,
                    InsetInstruction::top_left(PositionMode::Fixed, 350.0, 280.0)
                );
            }
            other => panic!("expected one InsetWrite, got {other:?}"),
        }
    }

    #[test]
    fn truncated_buffer_stops_cleanly() {
        let mut rec = RecorderSink::new();
        rec.on_warning(&WarningEvent::InvalidPlacement {
            name: "middle".into(),
        });
        let bytes = rec.as_bytes();
        assert_eq!(decode(&bytes[..bytes.len() - 2]).count(), 0);
        assert!(decode(&[]).next().is_none());
    }
}
