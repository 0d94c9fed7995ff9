// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each registered overlay gets its own track (`tid`), with a duration slice
//! spanning from `opening` to `closed`. Unregistered overlays and toasts share
//! track 0. Scroll-lock changes become a counter.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use layover_core::lifecycle::OverlayPhase;

use crate::recorder::{RawId, RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Host time is already in microseconds and is written unchanged.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for stamped in decode(bytes) {
        let ts = stamped.at.micros();
        match stamped.event {
            RecordedEvent::PhaseChange { overlay, from, to } => {
                let tid = track(overlay);
                let name = overlay_name(overlay);
                if overlay.is_some() && to == OverlayPhase::Opening && from == OverlayPhase::Closed
                {
                    events.push(json!({
                        "ph": "B",
                        "name": name,
                        "cat": "Overlay",
                        "ts": ts,
                        "pid": 0,
                        "tid": tid,
                    }));
                }
                events.push(json!({
                    "ph": "i",
                    "name": format!("{from}→{to}"),
                    "cat": "Phase",
                    "ts": ts,
                    "pid": 0,
                    "tid": tid,
                    "s": "t",
                    "args": { "overlay": name },
                }));
                if overlay.is_some() && to == OverlayPhase::Closed {
                    events.push(json!({
                        "ph": "E",
                        "name": name,
                        "cat": "Overlay",
                        "ts": ts,
                        "pid": 0,
                        "tid": tid,
                    }));
                }
            }
            RecordedEvent::Dismiss { overlay, reason } => {
                events.push(json!({
                    "ph": "i",
                    "name": "Dismiss",
                    "cat": "Manager",
                    "ts": ts,
                    "pid": 0,
                    "tid": track(Some(overlay)),
                    "s": "t",
                    "args": { "reason": format!("{reason:?}") },
                }));
            }
            RecordedEvent::InsetWrite {
                binding,
                target,
                instruction,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "InsetWrite",
                    "cat": "Position",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "binding": format!("{binding:?}"),
                        "target": target.0,
                        "mode": instruction.mode.as_css(),
                        "top": instruction.top,
                        "right": instruction.right,
                        "bottom": instruction.bottom,
                        "left": instruction.left,
                    }
                }));
            }
            RecordedEvent::ScrollLock { count, .. } => {
                events.push(json!({
                    "ph": "C",
                    "name": "ScrollLock",
                    "cat": "Manager",
                    "ts": ts,
                    "pid": 0,
                    "args": { "count": count },
                }));
            }
            RecordedEvent::ToastExpired { key } => {
                events.push(toast_event("ToastExpired", ts, &key));
            }
            RecordedEvent::ToastRemoved { key } => {
                events.push(toast_event("ToastRemoved", ts, &key));
            }
            RecordedEvent::InvalidPlacement { name } => {
                events.push(json!({
                    "ph": "i",
                    "name": "InvalidPlacement",
                    "cat": "Warning",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": { "name": name },
                }));
            }
            RecordedEvent::MissingRender { overlay } => {
                events.push(json!({
                    "ph": "i",
                    "name": "MissingRender",
                    "cat": "Warning",
                    "ts": ts,
                    "pid": 0,
                    "tid": track(overlay),
                    "s": "g",
                    "args": { "overlay": overlay_name(overlay) },
                }));
            }
        }
    }

    serde_json::to_writer_pretty(&mut *writer, &events)?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn toast_event(name: &str, ts: u64, key: &str) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": "Toast",
        "ts": ts,
        "pid": 0,
        "tid": 0,
        "s": "t",
        "args": { "key": key },
    })
}

fn track(overlay: Option<RawId>) -> u32 {
    overlay.map_or(0, |id| id.index + 1)
}

fn overlay_name(overlay: Option<RawId>) -> String {
    overlay.map_or_else(|| "unregistered".to_owned(), |id| format!("overlay {id:?}"))
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;
    use layover_core::backend::ContainerRef;
    use layover_core::headless::HeadlessHost;
    use layover_core::placement::Placement;
    use layover_core::position::{PositionConfig, PositionEngine};
    use layover_core::time::HostTime;
    use layover_core::trace::{ScrollLockEvent, ToastEvent, TraceSink, Tracer};

    use super::*;
    use crate::recorder::RecorderSink;

    fn parse(rec: &RecorderSink) -> Vec<Value> {
        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();
        value.as_array().unwrap().clone()
    }

    #[test]
    fn empty_recording_is_empty_array() {
        let rec = RecorderSink::new();
        assert!(parse(&rec).is_empty());
    }

    #[test]
    fn toasts_and_scroll_lock() {
        let mut rec = RecorderSink::new();
        rec.set_now(HostTime(2_000));
        rec.on_scroll_lock(&ScrollLockEvent {
            count: 1,
            locked: true,
            forced: false,
        });
        rec.on_toast_expired(&ToastEvent {
            key: "saved",
            at: Some(HostTime(7_000)),
        });
        rec.on_toast_removed(&ToastEvent {
            key: "saved",
            at: None,
        });

        let events = parse(&rec);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["ph"], "C");
        assert_eq!(events[0]["args"]["count"], 1);
        assert_eq!(events[1]["name"], "ToastExpired");
        assert_eq!(events[1]["ts"], 7_000);
        assert_eq!(events[1]["args"]["key"], "saved");
        assert_eq!(events[2]["name"], "ToastRemoved");
        assert_eq!(events[2]["ts"], 2_000);
    }

    #[test]
    fn cleared_axes_export_as_null() {
        let mut engine = PositionEngine::new();
        let mut host = HeadlessHost::new(Rect::new(0.0, 0.0, 400.0, 300.0));
        let target = host.add_element(host.body(), Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut rec = RecorderSink::new();
        engine.subscribe(
            ContainerRef::DocumentBody,
            target,
            PositionConfig::new(Placement::TopLeft),
            &mut host,
            &mut Tracer::new(&mut rec),
        );

        let events = parse(&rec);
        assert_eq!(events.len(), 1);
        let args = &events[0]["args"];
        assert_eq!(args["target"], target.0);
        assert_eq!(args["mode"], "fixed");
        assert_eq!(args["top"], 0.0);
        assert_eq!(args["left"], 0.0);
        assert!(args["right"].is_null());
        assert!(args["bottom"].is_null());
    }
}
