// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle, positioning, and auto-dismiss core for layered overlays.
//!
//! `layover_core` drives floating UI surfaces (dialogs, drawers, popups,
//! tooltips, toasts) that render above the page: when they mount and
//! unmount around enter/exit animations, which of several stacked overlays
//! receives a dismissal, how the page scroll lock is shared between them,
//! and where each floating element sits inside its container. It is
//! `no_std` compatible (with `alloc`) and talks to the document only through
//! the [`backend`] traits, so the same logic runs in a browser, in a
//! headless rendering pass, and in tests.
//!
//! # Architecture
//!
//! Every transition runs inside an explicit [`OverlayCx`](lifecycle::OverlayCx)
//! holding the document's manager, its host, and a tracer:
//!
//! ```text
//!   widget intent ──► OverlayController ──► mount / animate / unmount
//!                          │      ▲                    │
//!               register / │      │ DismissRequest     ▼
//!               unregister ▼      │                 Presenter
//!                      OverlayManager ◄── escape, pointer down
//!
//!   PositionEngine ◄── resize listeners ── DomProbe
//!        └──► inset writes ──► Presenter
//!
//!   FrameTick ──► Toaster ──► Countdown per toast ──► close intent
//! ```
//!
//! **[`lifecycle`]**: the per-overlay state machine
//! (`Closed → Opening → Open → Closing → Closed`) with animation ids that
//! make stale completions harmless.
//!
//! **[`manager`]**: the per-document stack of mounted overlays, escape and
//! outside-click routing, and the reference-counted scroll lock.
//!
//! **[`position`]**: bindings that keep an element anchored at one of nine
//! placements inside a container, rewriting its inset on resize.
//!
//! **[`toast`]**: pausable countdowns, the shared window-focus signal, and
//! the [`Toaster`](toast::Toaster) that groups toasts by placement.
//!
//! **[`affix`]**: script-driven sticky positioning against scroll parents.
//!
//! **[`render`]**: the contract between a widget's render callback and the
//! controller that owns its element.
//!
//! **[`config`]**: per-kind presets and document-wide behavior defaults.
//!
//! **[`headless`]**: an in-memory host with leak counters.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) and event types, behind a
//! zero-overhead [`Tracer`](trace::Tracer).
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod affix;
pub mod backend;
pub mod config;
pub mod headless;
pub mod id;
pub mod lifecycle;
pub mod manager;
pub mod placement;
pub mod position;
pub mod render;
pub mod time;
pub mod timing;
pub mod toast;
pub mod trace;
