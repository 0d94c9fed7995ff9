// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reactive position engine.
//!
//! A *binding* keeps one target element placed at a named anchor inside a
//! container:
//!
//! ```text
//!  ┌──────────┐
//!  │          │ <┄┄┄ container
//!  │   ╔══╗ <┄┄┄┄┄┄┄ target (placement = center)
//!  │   ╚══╝   │
//!  │          │
//!  └──────────┘
//! ```
//!
//! Each binding listens for resize events on its container and its target.
//! On the initial subscription, on any of those events, and on any
//! configuration change, the engine measures both rectangles, resolves the
//! placement to an [`InsetInstruction`], and writes it to the target through
//! [`Presenter::apply_inset`]. Nothing else is written; no re-render is
//! involved.
//!
//! # Change detection
//!
//! - Configuration updates equal to the current [`PositionConfig`] are
//!   dropped before any measurement.
//! - Computed instructions equal to the last one written are not written
//!   again.
//! - [`rebind`](PositionEngine::rebind) with the same resolved
//!   container/target pair is a no-op. A different pair unregisters every
//!   listener of the old pair before registering the new ones.
//!
//! # Failure
//!
//! An invalid placement name passed to
//! [`set_placement_name`](PositionEngine::set_placement_name) is fatal to that
//! binding only: its listeners are released and later calls report
//! [`PositionError::Failed`]. Other bindings are unaffected.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use kurbo::{Size, Vec2};

use crate::backend::{ContainerRef, DomProbe, EventKind, Frame, Host};
use crate::id::{BindingId, ElementId, ListenerId, Slots};
use crate::placement::{Placement, PlacementError};
use crate::trace::{InsetWriteEvent, Tracer, WarningEvent};

/// CSS `position` mode of a placed element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PositionMode {
    /// Tracks the viewport (`position: fixed`).
    Fixed,
    /// Scrolls with a custom container (`position: absolute`).
    Absolute,
}

impl PositionMode {
    /// Returns the CSS keyword.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Absolute => "absolute",
        }
    }

    /// The mode used for targets placed inside `frame`.
    #[must_use]
    pub const fn for_frame(frame: Frame) -> Self {
        match frame {
            Frame::Viewport => Self::Fixed,
            Frame::Element(_) => Self::Absolute,
        }
    }
}

/// Resolved inline-style instruction for a placed element.
///
/// Axes that are `None` must be cleared when applied, so a previous
/// placement can never leave a stale value behind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InsetInstruction {
    /// Position mode.
    pub mode: PositionMode,
    /// `top`, in px.
    pub top: Option<f64>,
    /// `right`, in px.
    pub right: Option<f64>,
    /// `bottom`, in px.
    pub bottom: Option<f64>,
    /// `left`, in px.
    pub left: Option<f64>,
}

impl InsetInstruction {
    /// An instruction setting only `left` and `top`.
    #[must_use]
    pub const fn top_left(mode: PositionMode, left: f64, top: f64) -> Self {
        Self {
            mode,
            top: Some(top),
            right: None,
            bottom: None,
            left: Some(left),
        }
    }

    /// Returns `(property, value)` pairs for all four axes.
    #[must_use]
    pub fn axes(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("top", self.top),
            ("right", self.right),
            ("bottom", self.bottom),
            ("left", self.left),
        ]
    }
}

/// Placement plus pixel offset, compared by value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PositionConfig {
    /// Anchor point.
    pub placement: Placement,
    /// Offset added after anchoring, `(dx, dy)`.
    pub offset: Vec2,
}

impl PositionConfig {
    /// Creates a config with zero offset.
    #[must_use]
    pub const fn new(placement: Placement) -> Self {
        Self {
            placement,
            offset: Vec2::ZERO,
        }
    }

    /// Returns the config with the given offset.
    #[must_use]
    pub const fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }
}

/// Resolves a placement to an inset instruction.
///
/// With `hx = (container.width - target.width) / 2` and
/// `hy = (container.height - target.height) / 2`, the placement's step pair
/// `(sx, sy)` yields `left = sx * hx + dx` and `top = sy * hy + dy`.
#[must_use]
pub fn resolve_inset(
    placement: Placement,
    offset: Vec2,
    container: Size,
    target: Size,
    mode: PositionMode,
) -> InsetInstruction {
    let half_dx = (container.width - target.width) / 2.0;
    let half_dy = (container.height - target.height) / 2.0;
    let (sx, sy) = placement.steps();
    InsetInstruction::top_left(
        mode,
        f64::from(sx) * half_dx + offset.x,
        f64::from(sy) * half_dy + offset.y,
    )
}

/// Errors from [`PositionEngine`] operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PositionError {
    /// The placement name was not recognized; the binding is now failed.
    InvalidPlacement(PlacementError),
    /// The binding failed earlier and no longer updates.
    Failed(BindingId),
    /// The handle does not refer to a live binding.
    Stale(BindingId),
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPlacement(err) => write!(f, "position binding rejected: {err}"),
            Self::Failed(id) => write!(f, "position binding {id:?} has failed"),
            Self::Stale(id) => write!(f, "position binding {id:?} is stale"),
        }
    }
}

impl core::error::Error for PositionError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::InvalidPlacement(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PlacementError> for PositionError {
    fn from(err: PlacementError) -> Self {
        Self::InvalidPlacement(err)
    }
}

#[derive(Debug)]
struct Binding {
    container: ContainerRef,
    frame: Frame,
    target: ElementId,
    config: PositionConfig,
    last: Option<InsetInstruction>,
    listeners: Vec<ListenerId>,
    failed: bool,
}

/// Owns every live position binding and routes layout events to them.
#[derive(Debug, Default)]
pub struct PositionEngine {
    bindings: Slots<Binding>,
    routes: HashMap<ListenerId, BindingId>,
    writes: u64,
}

impl PositionEngine {
    /// Creates an engine with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `target` to `container` and writes the initial inset.
    pub fn subscribe(
        &mut self,
        container: ContainerRef,
        target: ElementId,
        config: PositionConfig,
        host: &mut dyn Host,
        tracer: &mut Tracer<'_>,
    ) -> BindingId {
        let frame = container.resolve(&*host);
        let id = BindingId::new(self.bindings.insert(Binding {
            container,
            frame,
            target,
            config,
            last: None,
            listeners: Vec::new(),
            failed: false,
        }));
        self.attach_listeners(id, host);
        self.recompute(id, host, tracer);
        id
    }

    /// Updates the placement and offset of a binding.
    ///
    /// A config equal to the current one is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::Stale`] or [`PositionError::Failed`] if the
    /// binding can no longer be updated.
    pub fn set_config(
        &mut self,
        id: BindingId,
        config: PositionConfig,
        host: &mut dyn Host,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), PositionError> {
        let binding = self.live_mut(id)?;
        if binding.config == config {
            return Ok(());
        }
        binding.config = config;
        self.recompute(id, host, tracer);
        Ok(())
    }

    /// Updates the placement from its textual name.
    ///
    /// # Errors
    ///
    /// An unrecognized name tears the binding's listeners down, marks it
    /// failed, and returns [`PositionError::InvalidPlacement`].
    pub fn set_placement_name(
        &mut self,
        id: BindingId,
        name: &str,
        host: &mut dyn Host,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), PositionError> {
        let offset = self.live_mut(id)?.config.offset;
        match name.parse::<Placement>() {
            Ok(placement) => self.set_config(
                id,
                PositionConfig { placement, offset },
                host,
                tracer,
            ),
            Err(err) => {
                log::warn!("position binding {id:?} failed: {err}");
                tracer.warning(&WarningEvent::InvalidPlacement {
                    name: String::from(name),
                });
                self.detach_listeners(id, host);
                if let Some(binding) = self.bindings.get_mut(id.idx, id.generation) {
                    binding.failed = true;
                }
                Err(err.into())
            }
        }
    }

    /// Points a binding at a new container and/or target.
    ///
    /// If the resolved pair is unchanged nothing happens. Otherwise the old
    /// pair's listeners are removed first, then the new pair's are added and
    /// the inset is recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::Stale`] or [`PositionError::Failed`] if the
    /// binding can no longer be updated.
    pub fn rebind(
        &mut self,
        id: BindingId,
        container: ContainerRef,
        target: ElementId,
        host: &mut dyn Host,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), PositionError> {
        let frame = container.resolve(&*host);
        let binding = self.live_mut(id)?;
        if binding.frame == frame && binding.target == target {
            binding.container = container;
            return Ok(());
        }
        self.detach_listeners(id, host);
        let binding = self.live_mut(id)?;
        binding.container = container;
        binding.frame = frame;
        binding.target = target;
        binding.last = None;
        self.attach_listeners(id, host);
        self.recompute(id, host, tracer);
        Ok(())
    }

    /// Handles a fired listener. Unknown listeners are ignored.
    ///
    /// Returns `true` if the event belonged to a live binding.
    pub fn handle_event(
        &mut self,
        listener: ListenerId,
        host: &mut dyn Host,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let Some(&id) = self.routes.get(&listener) else {
            return false;
        };
        self.recompute(id, host, tracer);
        true
    }

    /// Removes a binding and all of its listeners.
    ///
    /// Returns `false` if the handle was already stale.
    pub fn unsubscribe(&mut self, id: BindingId, host: &mut dyn Host) -> bool {
        self.detach_listeners(id, host);
        self.bindings.remove(id.idx, id.generation).is_some()
    }

    /// Returns the last instruction written for a binding.
    #[must_use]
    pub fn last_instruction(&self, id: BindingId) -> Option<InsetInstruction> {
        self.bindings.get(id.idx, id.generation)?.last
    }

    /// Returns the container a binding was configured with.
    #[must_use]
    pub fn container(&self, id: BindingId) -> Option<ContainerRef> {
        self.bindings.get(id.idx, id.generation).map(|b| b.container)
    }

    /// Whether the binding exists and has not failed.
    #[must_use]
    pub fn is_active(&self, id: BindingId) -> bool {
        self.bindings
            .get(id.idx, id.generation)
            .is_some_and(|b| !b.failed)
    }

    /// Number of live bindings, failed ones included.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Number of listeners currently routed to bindings.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.routes.len()
    }

    /// Total number of inset writes issued.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    fn live_mut(&mut self, id: BindingId) -> Result<&mut Binding, PositionError> {
        match self.bindings.get_mut(id.idx, id.generation) {
            None => Err(PositionError::Stale(id)),
            Some(b) if b.failed => Err(PositionError::Failed(id)),
            Some(b) => Ok(b),
        }
    }

    fn attach_listeners(&mut self, id: BindingId, probe: &mut dyn Host) {
        let Some(binding) = self.bindings.get_mut(id.idx, id.generation) else {
            return;
        };
        let container = probe.listen(binding.frame, EventKind::Resize);
        let target = probe.listen(Frame::Element(binding.target), EventKind::Resize);
        binding.listeners.extend([container, target]);
        self.routes.insert(container, id);
        self.routes.insert(target, id);
    }

    fn detach_listeners(&mut self, id: BindingId, probe: &mut dyn Host) {
        let Some(binding) = self.bindings.get_mut(id.idx, id.generation) else {
            return;
        };
        for listener in binding.listeners.drain(..) {
            probe.unlisten(listener);
            self.routes.remove(&listener);
        }
    }

    fn recompute(&mut self, id: BindingId, host: &mut dyn Host, tracer: &mut Tracer<'_>) {
        let Some(binding) = self.bindings.get_mut(id.idx, id.generation) else {
            return;
        };
        if binding.failed {
            return;
        }
        let Some(instruction) = measure(&*host, binding) else {
            return;
        };
        if binding.last == Some(instruction) {
            return;
        }
        binding.last = Some(instruction);
        host.apply_inset(binding.target, &instruction);
        self.writes += 1;
        tracer.inset_write(&InsetWriteEvent {
            binding: id,
            target: binding.target,
            instruction,
        });
    }
}

fn measure(probe: &dyn DomProbe, binding: &Binding) -> Option<InsetInstruction> {
    let container = probe.frame_rect(binding.frame)?;
    let target = probe.layout_rect(binding.frame, binding.target)?;
    Some(resolve_inset(
        binding.config.placement,
        binding.config.offset,
        container.size(),
        target.size(),
        PositionMode::for_frame(binding.frame),
    ))
}
