// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Lines are
//! stamped with the time last passed to [`PrettyPrintSink::set_now`].

use std::io::Write;

use layover_core::time::HostTime;
use layover_core::trace::{
    DismissEvent, InsetWriteEvent, PhaseChangeEvent, ScrollLockEvent, ToastEvent, TraceSink,
    WarningEvent,
};

use crate::recorder::RawId;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    now: HostTime,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            now: HostTime::default(),
        }
    }

    /// Sets the time printed on subsequent lines.
    pub fn set_now(&mut self, now: HostTime) {
        self.now = now;
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ms(&self) -> f64 {
        self.now.micros() as f64 / 1000.0
    }
}

fn overlay_label(overlay: Option<RawId>) -> String {
    overlay.map_or_else(|| "-".to_owned(), |id| format!("{id:?}"))
}

fn axis(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| format!("{v:.1}"))
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_change(&mut self, e: &PhaseChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[phase] t={:.1}ms overlay={} {}→{}",
            self.ms(),
            overlay_label(e.overlay.map(RawId::from)),
            e.from.as_str(),
            e.to.as_str(),
        );
    }

    fn on_dismiss(&mut self, e: &DismissEvent) {
        let _ = writeln!(
            self.writer,
            "[dismiss] t={:.1}ms overlay={:?} reason={:?}",
            self.ms(),
            RawId::from(e.overlay),
            e.reason,
        );
    }

    fn on_inset_write(&mut self, e: &InsetWriteEvent) {
        let i = &e.instruction;
        let _ = writeln!(
            self.writer,
            "[inset] t={:.1}ms binding={:?} target={} {} top={} right={} bottom={} left={}",
            self.ms(),
            RawId::from(e.binding),
            e.target.0,
            i.mode.as_css(),
            axis(i.top),
            axis(i.right),
            axis(i.bottom),
            axis(i.left),
        );
    }

    fn on_scroll_lock(&mut self, e: &ScrollLockEvent) {
        let _ = writeln!(
            self.writer,
            "[scroll-lock] t={:.1}ms count={} locked={}{}",
            self.ms(),
            e.count,
            e.locked,
            if e.forced { " forced" } else { "" },
        );
    }

    fn on_toast_expired(&mut self, e: &ToastEvent<'_>) {
        let at = e.at.unwrap_or(self.now);
        let _ = writeln!(
            self.writer,
            "[toast] t={:.1}ms key={} expired",
            at.micros() as f64 / 1000.0,
            e.key,
        );
    }

    fn on_toast_removed(&mut self, e: &ToastEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[toast] t={:.1}ms key={} removed",
            self.ms(),
            e.key,
        );
    }

    fn on_warning(&mut self, e: &WarningEvent) {
        let _ = match e {
            WarningEvent::InvalidPlacement { name } => writeln!(
                self.writer,
                "[warn] t={:.1}ms invalid placement {name:?}",
                self.ms(),
            ),
            WarningEvent::MissingRender { overlay } => writeln!(
                self.writer,
                "[warn] t={:.1}ms overlay={} rendered nothing",
                self.ms(),
                overlay_label(overlay.map(RawId::from)),
            ),
        };
    }
}

#[cfg(test)]
mod tests {
    use layover_core::lifecycle::OverlayPhase;

    use super::*;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn phase_change_line() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        sink.set_now(HostTime(1_500));
        sink.on_phase_change(&PhaseChangeEvent {
            overlay: None,
            from: OverlayPhase::Closed,
            to: OverlayPhase::Opening,
        });
        assert_eq!(
            output(sink),
            "[phase] t=1.5ms overlay=- closed→opening\n",
            "unregistered overlays print a dash"
        );
    }

    #[test]
    fn toast_and_warning_lines() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        sink.on_toast_expired(&ToastEvent {
            key: "toast-1",
            at: Some(HostTime(5_000_000)),
        });
        sink.on_warning(&WarningEvent::InvalidPlacement {
            name: "middle".into(),
        });
        sink.on_scroll_lock(&ScrollLockEvent {
            count: 2,
            locked: true,
            forced: true,
        });
        let text = output(sink);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "[toast] t=5000.0ms key=toast-1 expired");
        assert_eq!(lines[1], "[warn] t=0.0ms invalid placement \"middle\"");
        assert_eq!(lines[2], "[scroll-lock] t=0.0ms count=2 locked=true forced");
    }
}
