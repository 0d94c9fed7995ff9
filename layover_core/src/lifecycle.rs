// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay lifecycle controller.
//!
//! ```text
//!            request_visible(true)
//!   Closed ───────────────────────► Opening ── enter done ──► Open
//!     ▲                              │  ▲                       │
//!     │                   (false)    │  │ (true)                │ request_visible(false)
//!     │                              ▼  │                       ▼
//!     └────────── exit done ──────── Closing ◄──────────────────┘
//! ```
//!
//! Entering `Opening` mounts the portal, backdrop, and rendered content and
//! registers with the [`OverlayManager`]. Leaving `Closing` unregisters,
//! removes the portal subtree, and detaches the content ref. While
//! `Closing` the overlay stays registered but no longer receives escape or
//! outside-click dismissals. Without an animation both intermediate phases
//! are passed through synchronously.
//!
//! A reversal while `Opening` or `Closing` cancels the running animation
//! before the opposite one starts. Completions are matched against the one
//! animation id the controller is waiting for, so a completion from a
//! cancelled or superseded animation is ignored.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::backend::{DomProbe, ElementRole, Host};
use crate::config::{AnimationSpec, OverlayOptions};
use crate::id::{AnimationId, ElementId, OverlayId};
use crate::manager::{DismissRequest, OverlayManager, OverlayRoots, RegisterOptions};
use crate::render::{NodeRef, RenderScope, Renderer, render_into};
use crate::trace::{PhaseChangeEvent, Tracer, WarningEvent};

/// Lifecycle phase of one overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OverlayPhase {
    /// Not mounted.
    #[default]
    Closed,
    /// Mounted, entry animation running.
    Opening,
    /// Mounted and idle.
    Open,
    /// Mounted, exit animation running.
    Closing,
}

impl OverlayPhase {
    /// Whether content exists in the document.
    #[must_use]
    pub const fn is_mounted(self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
        }
    }
}

impl fmt::Display for OverlayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a close should proceed, as decided by a before-close hook.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExitPlan {
    /// Play the exit animation, if any.
    #[default]
    Animate,
    /// Skip straight to teardown.
    Immediate,
}

/// What a before-close hook can inspect.
#[derive(Clone, Copy)]
pub struct BeforeClose<'a> {
    /// Rendered content element.
    pub content: ElementId,
    /// Layout queries, for measuring the content before it leaves.
    pub probe: &'a dyn DomProbe,
}

impl fmt::Debug for BeforeClose<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeforeClose")
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

/// Hook run when an open overlay starts closing.
pub type BeforeCloseHook = Box<dyn FnMut(BeforeClose<'_>) -> ExitPlan>;

/// Listener notified of every phase change.
pub type LifecycleListener = Box<dyn FnMut(OverlayPhase)>;

/// The explicit per-document context every transition runs in.
pub struct OverlayCx<'a> {
    /// The document's manager.
    pub manager: &'a mut OverlayManager,
    /// The document host.
    pub host: &'a mut dyn Host,
    /// Trace output.
    pub tracer: Tracer<'a>,
}

impl fmt::Debug for OverlayCx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayCx")
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}

impl<'a> OverlayCx<'a> {
    /// Creates a context with tracing disabled.
    pub fn new(manager: &'a mut OverlayManager, host: &'a mut dyn Host) -> Self {
        Self {
            manager,
            host,
            tracer: Tracer::none(),
        }
    }

    /// Returns the context with a tracer attached.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer<'a>) -> Self {
        self.tracer = tracer;
        self
    }
}

#[derive(Clone, Copy, Debug)]
struct Mounted {
    root: ElementId,
    content: ElementId,
    overlay: Option<OverlayId>,
}

/// Drives one overlay through its lifecycle.
pub struct OverlayController {
    key: String,
    options: OverlayOptions,
    intent: bool,
    phase: OverlayPhase,
    mounted: Option<Mounted>,
    animation: Option<AnimationId>,
    node_ref: NodeRef,
    renderer: Option<Renderer>,
    before_close: Option<BeforeCloseHook>,
    listener: Option<LifecycleListener>,
}

impl fmt::Debug for OverlayController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayController")
            .field("key", &self.key)
            .field("phase", &self.phase)
            .field("intent", &self.intent)
            .field("mounted", &self.mounted)
            .field("animation", &self.animation)
            .finish_non_exhaustive()
    }
}

impl OverlayController {
    /// Creates a closed controller.
    pub fn new(key: impl Into<String>, options: OverlayOptions) -> Self {
        Self {
            key: key.into(),
            options,
            intent: false,
            phase: OverlayPhase::Closed,
            mounted: None,
            animation: None,
            node_ref: NodeRef::new(),
            renderer: None,
            before_close: None,
            listener: None,
        }
    }

    /// Sets the render callback used on every mount.
    pub fn set_renderer(&mut self, renderer: impl FnMut(RenderScope<'_>) + 'static) {
        self.renderer = Some(Box::new(renderer));
    }

    /// Sets the hook run when closing starts.
    pub fn set_before_close(
        &mut self,
        hook: impl FnMut(BeforeClose<'_>) -> ExitPlan + 'static,
    ) {
        self.before_close = Some(Box::new(hook));
    }

    /// Sets the phase-change listener.
    pub fn set_lifecycle_listener(&mut self, listener: impl FnMut(OverlayPhase) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Returns the key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &OverlayOptions {
        &self.options
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    /// Last requested visibility.
    #[must_use]
    pub fn intent(&self) -> bool {
        self.intent
    }

    /// Manager id while registered.
    #[must_use]
    pub fn overlay_id(&self) -> Option<OverlayId> {
        self.mounted.and_then(|m| m.overlay)
    }

    /// Rendered content element while mounted.
    #[must_use]
    pub fn content(&self) -> Option<ElementId> {
        self.mounted.map(|m| m.content)
    }

    /// Portal root while mounted.
    #[must_use]
    pub fn root(&self) -> Option<ElementId> {
        self.mounted.map(|m| m.root)
    }

    /// The animation whose completion is awaited.
    #[must_use]
    pub fn pending_animation(&self) -> Option<AnimationId> {
        self.animation
    }

    /// Sets the desired visibility. Repeating the current intent does
    /// nothing.
    pub fn request_visible(&mut self, visible: bool, cx: &mut OverlayCx<'_>) {
        if visible == self.intent {
            return;
        }
        self.intent = visible;
        match (visible, self.phase) {
            (true, OverlayPhase::Closed) => self.open_fresh(cx),
            (true, OverlayPhase::Closing) => {
                self.cancel_animation(cx);
                self.enter(cx);
            }
            (false, OverlayPhase::Opening | OverlayPhase::Open) => {
                self.cancel_animation(cx);
                self.start_close(cx);
            }
            _ => {}
        }
    }

    /// Delivers an animation completion.
    ///
    /// Returns `false` for completions this controller is not waiting for.
    pub fn on_animation_end(&mut self, animation: AnimationId, cx: &mut OverlayCx<'_>) -> bool {
        if self.animation != Some(animation) {
            return false;
        }
        self.animation = None;
        match self.phase {
            OverlayPhase::Opening => self.set_phase(OverlayPhase::Open, cx),
            OverlayPhase::Closing => self.finish_close(cx),
            OverlayPhase::Closed | OverlayPhase::Open => {}
        }
        true
    }

    /// Applies a routed dismissal addressed to this overlay.
    ///
    /// Returns `false` if the request targets another overlay. Dismissals
    /// of an overlay that is already closing or closed converge on the same
    /// terminal state.
    pub fn dismiss(&mut self, request: DismissRequest, cx: &mut OverlayCx<'_>) -> bool {
        if self.overlay_id() != Some(request.overlay) {
            return false;
        }
        self.request_visible(false, cx);
        true
    }

    /// Tears everything down immediately, skipping any exit animation.
    pub fn unmount(&mut self, cx: &mut OverlayCx<'_>) {
        self.intent = false;
        if self.phase.is_mounted() {
            self.cancel_animation(cx);
            self.finish_close(cx);
        }
    }

    fn open_fresh(&mut self, cx: &mut OverlayCx<'_>) {
        let portal = cx.manager.behavior().portal_for(&self.options);
        let root = cx.host.mount_portal(portal);
        let backdrop = self
            .options
            .backdrop
            .then(|| cx.host.create_element(root, ElementRole::Backdrop));

        self.node_ref = NodeRef::new();
        let (content, degraded) =
            render_into(self.renderer.as_mut(), &mut self.node_ref, root, &mut *cx.host);

        let overlay = if self.options.attach_to_manager {
            let id = cx.manager.allocate_id();
            cx.manager.register(
                id,
                RegisterOptions::from(&self.options),
                OverlayRoots { content, backdrop },
                &mut *cx.host,
                &mut cx.tracer,
            );
            Some(id)
        } else {
            None
        };
        if degraded {
            cx.tracer.warning(&WarningEvent::MissingRender { overlay });
        }
        self.mounted = Some(Mounted {
            root,
            content,
            overlay,
        });
        self.enter(cx);
    }

    fn enter(&mut self, cx: &mut OverlayCx<'_>) {
        if let Some(id) = self.overlay_id() {
            cx.manager.set_dismissable(id, true);
        }
        self.set_phase(OverlayPhase::Opening, cx);
        match self.play(cx, |spec| spec.enter) {
            Some(id) => self.animation = Some(id),
            None => self.set_phase(OverlayPhase::Open, cx),
        }
    }

    fn start_close(&mut self, cx: &mut OverlayCx<'_>) {
        let plan = match (&mut self.before_close, self.mounted) {
            (Some(hook), Some(mounted)) => hook(BeforeClose {
                content: mounted.content,
                probe: &*cx.host,
            }),
            _ => ExitPlan::Animate,
        };
        if let Some(id) = self.overlay_id() {
            cx.manager.set_dismissable(id, false);
        }
        self.set_phase(OverlayPhase::Closing, cx);
        let animation = match plan {
            ExitPlan::Animate => self.play(cx, |spec| spec.exit),
            ExitPlan::Immediate => None,
        };
        match animation {
            Some(id) => self.animation = Some(id),
            None => self.finish_close(cx),
        }
    }

    fn finish_close(&mut self, cx: &mut OverlayCx<'_>) {
        let mut overlay = None;
        if let Some(mounted) = self.mounted.take() {
            if let Some(id) = mounted.overlay {
                cx.manager.release_id(id, &mut *cx.host, &mut cx.tracer);
                overlay = Some(id);
            }
            cx.host.remove_element(mounted.root);
        }
        self.node_ref.detach();
        self.transition(OverlayPhase::Closed, overlay, cx);
    }

    fn play(
        &self,
        cx: &mut OverlayCx<'_>,
        name: impl FnOnce(&AnimationSpec) -> &'static str,
    ) -> Option<AnimationId> {
        let spec = self.options.animation?;
        let content = self.mounted?.content;
        Some(cx.host.play_animation(content, name(&spec), spec.duration))
    }

    fn cancel_animation(&mut self, cx: &mut OverlayCx<'_>) {
        if let Some(id) = self.animation.take() {
            cx.host.cancel_animation(id);
        }
    }

    fn set_phase(&mut self, phase: OverlayPhase, cx: &mut OverlayCx<'_>) {
        self.transition(phase, self.overlay_id(), cx);
    }

    fn transition(
        &mut self,
        phase: OverlayPhase,
        overlay: Option<OverlayId>,
        cx: &mut OverlayCx<'_>,
    ) {
        if self.phase == phase {
            return;
        }
        let from = core::mem::replace(&mut self.phase, phase);
        cx.tracer.phase_change(&PhaseChangeEvent {
            overlay,
            from,
            to: phase,
        });
        if let Some(listener) = &mut self.listener {
            listener(phase);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use kurbo::Rect;

    use super::*;
    use crate::config::DrawerSide;
    use crate::headless::HeadlessHost;
    use crate::manager::DismissReason;

    struct Fixture {
        host: HeadlessHost,
        manager: OverlayManager,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                host: HeadlessHost::new(Rect::new(0.0, 0.0, 800.0, 600.0)),
                manager: OverlayManager::new(),
            }
        }

        fn cx(&mut self) -> OverlayCx<'_> {
            OverlayCx::new(&mut self.manager, &mut self.host)
        }

        fn show(&mut self, ctrl: &mut OverlayController, visible: bool) {
            ctrl.request_visible(visible, &mut self.cx());
        }

        /// Lets the pending animation of `ctrl` run to completion.
        fn finish(&mut self, ctrl: &mut OverlayController) -> bool {
            let id = ctrl.pending_animation().unwrap();
            let id = self.host.finish_animation(id).unwrap();
            ctrl.on_animation_end(id, &mut self.cx())
        }

        fn assert_clean(&self) {
            assert_eq!(self.host.element_count(), 0, "residual elements");
            assert_eq!(self.host.pending_animation_count(), 0, "residual animations");
            assert_eq!(self.host.listener_count(), 0, "residual listeners");
            assert!(!self.host.scroll_locked());
            assert!(self.manager.stack().is_empty());
            assert_eq!(self.manager.allocated_count(), 0);
        }
    }

    fn recorded(ctrl: &mut OverlayController) -> Rc<RefCell<Vec<OverlayPhase>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        ctrl.set_lifecycle_listener(move |phase| sink.borrow_mut().push(phase));
        log
    }

    fn dialog() -> OverlayController {
        let mut ctrl = OverlayController::new("dialog", OverlayOptions::dialog());
        ctrl.set_renderer(|mut scope: RenderScope<'_>| {
            scope.render_content().unwrap();
        });
        ctrl
    }

    #[test]
    fn full_animated_cycle() {
        let mut fx = Fixture::new();
        let mut ctrl = dialog();
        let log = recorded(&mut ctrl);

        fx.show(&mut ctrl, true);
        assert_eq!(ctrl.phase(), OverlayPhase::Opening);
        assert_eq!(fx.manager.stack().len(), 1);
        assert_eq!(fx.manager.scroll_lock_count(), 1);
        assert!(fx.host.scroll_locked());
        assert!(fx.finish(&mut ctrl));
        assert_eq!(ctrl.phase(), OverlayPhase::Open);

        fx.show(&mut ctrl, false);
        assert_eq!(ctrl.phase(), OverlayPhase::Closing);
        assert_eq!(fx.manager.stack().len(), 1, "registered until the exit ends");
        assert!(fx.finish(&mut ctrl));
        assert_eq!(ctrl.phase(), OverlayPhase::Closed);

        assert_eq!(
            *log.borrow(),
            [
                OverlayPhase::Opening,
                OverlayPhase::Open,
                OverlayPhase::Closing,
                OverlayPhase::Closed
            ]
        );
        fx.assert_clean();
    }

    #[test]
    fn backdrop_precedes_content() {
        let mut fx = Fixture::new();
        let mut ctrl = dialog();
        fx.show(&mut ctrl, true);

        let children = fx.host.children(ctrl.root().unwrap());
        assert_eq!(children.len(), 2);
        assert_eq!(fx.host.role(children[0]), Some(ElementRole::Backdrop));
        assert_eq!(children[1], ctrl.content().unwrap());
    }

    #[test]
    fn unanimated_transitions_are_synchronous() {
        let mut fx = Fixture::new();
        let mut ctrl = OverlayController::new("popup", OverlayOptions::popup());
        let log = recorded(&mut ctrl);

        fx.show(&mut ctrl, true);
        assert_eq!(ctrl.phase(), OverlayPhase::Open);
        fx.show(&mut ctrl, false);
        assert_eq!(ctrl.phase(), OverlayPhase::Closed);
        assert_eq!(log.borrow().len(), 4);
        fx.assert_clean();
    }

    #[test]
    fn repeated_intent_is_idempotent() {
        let mut fx = Fixture::new();
        let mut ctrl = dialog();
        fx.show(&mut ctrl, true);
        let first = ctrl.pending_animation();
        fx.show(&mut ctrl, true);
        assert_eq!(ctrl.pending_animation(), first);
        assert_eq!(fx.manager.stack().len(), 1);
        assert_eq!(fx.host.pending_animation_count(), 1);
        assert_eq!(fx.host.element_count(), 3, "root, backdrop, content");
    }

    #[test]
    fn reopen_while_closing_cancels_exit() {
        let mut fx = Fixture::new();
        let mut ctrl = dialog();
        let log = recorded(&mut ctrl);

        fx.show(&mut ctrl, true);
        let enter = ctrl.pending_animation().unwrap();
        fx.show(&mut ctrl, false);
        let exit = ctrl.pending_animation().unwrap();
        fx.show(&mut ctrl, true);
        let reenter = ctrl.pending_animation().unwrap();
        assert_ne!(exit, reenter);
        assert_eq!(fx.host.finish_animation(exit), None, "exit was cancelled");

        // Late deliveries of superseded animations are ignored.
        assert!(!ctrl.on_animation_end(enter, &mut fx.cx()));
        assert!(!ctrl.on_animation_end(exit, &mut fx.cx()));
        assert_eq!(ctrl.phase(), OverlayPhase::Opening);
        assert!(fx.finish(&mut ctrl));
        assert_eq!(ctrl.phase(), OverlayPhase::Open);
        assert_eq!(fx.manager.stack().len(), 1, "never unregistered");
        assert_eq!(fx.host.pending_animation_count(), 0);
        assert_eq!(
            *log.borrow(),
            [
                OverlayPhase::Opening,
                OverlayPhase::Closing,
                OverlayPhase::Opening,
                OverlayPhase::Open
            ]
        );
    }

    #[test]
    fn escape_closes_innermost_only() {
        let mut fx = Fixture::new();
        let mut outer = OverlayController::new("outer", OverlayOptions::drawer(DrawerSide::Right));
        let mut inner = OverlayController::new("inner", OverlayOptions::drawer(DrawerSide::Left));
        fx.show(&mut outer, true);
        fx.show(&mut inner, true);

        let mut cx = fx.cx();
        let req = cx.manager.handle_escape(&mut cx.tracer).unwrap();
        assert!(!outer.dismiss(req, &mut cx));
        assert!(inner.dismiss(req, &mut cx));
        assert_eq!(inner.phase(), OverlayPhase::Closing);
        assert_eq!(outer.phase(), OverlayPhase::Opening);
    }

    #[test]
    fn escape_skips_overlays_already_closing() {
        let mut fx = Fixture::new();
        let mut outer = OverlayController::new("outer", OverlayOptions::drawer(DrawerSide::Right));
        let mut inner = OverlayController::new("inner", OverlayOptions::drawer(DrawerSide::Left));
        fx.show(&mut outer, true);
        fx.show(&mut inner, true);

        for _ in 0..2 {
            let mut cx = fx.cx();
            let req = cx.manager.handle_escape(&mut cx.tracer).unwrap();
            outer.dismiss(req, &mut cx);
            inner.dismiss(req, &mut cx);
        }
        assert_eq!(inner.phase(), OverlayPhase::Closing);
        assert_eq!(outer.phase(), OverlayPhase::Closing);
        assert_eq!(fx.manager.stack().len(), 2, "both still exiting");

        let mut cx = fx.cx();
        assert!(cx.manager.handle_escape(&mut cx.tracer).is_none());

        // Reopening makes the overlay eligible again.
        fx.show(&mut inner, true);
        let mut cx = fx.cx();
        let req = cx.manager.handle_escape(&mut cx.tracer).unwrap();
        assert_eq!(Some(req.overlay), inner.overlay_id());
    }

    #[test]
    fn dismissal_races_converge() {
        let mut fx = Fixture::new();
        let mut ctrl = OverlayController::new("drawer", OverlayOptions::drawer(DrawerSide::Right));
        fx.show(&mut ctrl, true);
        let id = ctrl.overlay_id().unwrap();

        let escape = DismissRequest {
            overlay: id,
            reason: DismissReason::Escape,
        };
        let click = DismissRequest {
            overlay: id,
            reason: DismissReason::OutsideClick,
        };
        assert!(ctrl.dismiss(escape, &mut fx.cx()));
        assert!(ctrl.dismiss(click, &mut fx.cx()));
        fx.show(&mut ctrl, false);
        assert_eq!(fx.host.pending_animation_count(), 1, "one exit animation");
        assert!(fx.finish(&mut ctrl));
        assert_eq!(ctrl.phase(), OverlayPhase::Closed);

        // Requests arriving after teardown are stale.
        assert!(!ctrl.dismiss(escape, &mut fx.cx()));
        assert_eq!(ctrl.phase(), OverlayPhase::Closed);
        fx.assert_clean();
    }

    #[test]
    fn rapid_mount_unmount_leaves_nothing_behind() {
        let mut fx = Fixture::new();
        let mut ctrl = dialog();
        for _ in 0..5 {
            fx.show(&mut ctrl, true);
            fx.show(&mut ctrl, false);
        }
        assert_eq!(fx.host.pending_animation_count(), 1);
        ctrl.unmount(&mut fx.cx());
        assert_eq!(ctrl.phase(), OverlayPhase::Closed);
        fx.assert_clean();
    }

    #[test]
    fn before_close_can_skip_exit_animation() {
        let mut fx = Fixture::new();
        let mut ctrl = dialog();
        let measured = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&measured);
        ctrl.set_before_close(move |scope: BeforeClose<'_>| {
            *slot.borrow_mut() = scope.probe.bounding_rect(scope.content);
            ExitPlan::Immediate
        });
        fx.show(&mut ctrl, true);
        assert!(fx.finish(&mut ctrl));
        fx.show(&mut ctrl, false);
        assert_eq!(ctrl.phase(), OverlayPhase::Closed);
        assert!(measured.borrow().is_some());
        fx.assert_clean();
    }

    #[test]
    fn missing_render_degrades_to_placeholder() {
        let mut fx = Fixture::new();
        let mut ctrl = OverlayController::new("bare", OverlayOptions::popup());
        ctrl.set_renderer(|_scope: RenderScope<'_>| {});
        fx.show(&mut ctrl, true);
        let content = ctrl.content().unwrap();
        assert_eq!(fx.host.role(content), Some(ElementRole::Placeholder));
    }
}
