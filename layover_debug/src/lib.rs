// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for layover
//! diagnostics.
//!
//! This crate provides [`TraceSink`](layover_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//!
//! Sinks are attached through [`Tracer::new`](layover_core::trace::Tracer::new)
//! and stamped by the page with the current frame time.

pub mod chrome;
pub mod pretty;
pub mod recorder;
