// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Toast records, grouped lists, and the two-phase exit.
//!
//! ```text
//!   show() ──► record (visible) ──► countdown ticks on every frame
//!                                        │ expired / close() / click()
//!                                        ▼
//!              record hidden ──► exit animation on the toast content
//!                                + shrink delay (frame-driven)
//!                                        │ delay elapsed
//!                                        ▼
//!              content replaced by a fixed-height spacer ──► zeroHeight
//!                                        │ animation end
//!                                        ▼
//!                                     clear()
//! ```
//!
//! Toasts are grouped by placement. Each group renders into one list
//! element that a position binding keeps anchored inside the portal
//! container; the list exists exactly while its group is non-empty.

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::Vec2;

use super::countdown::{Countdown, FocusReader};
use crate::backend::{ContainerRef, ElementRole};
use crate::config::{AnimationSpec, OverlayOptions, ZERO_HEIGHT_ANIMATION};
use crate::id::{AnimationId, BindingId, ElementId, ListenerId};
use crate::lifecycle::{BeforeClose, ExitPlan, OverlayController, OverlayCx};
use crate::placement::Placement;
use crate::position::{PositionConfig, PositionEngine};
use crate::render::RenderScope;
use crate::time::Duration;
use crate::timing::FrameTick;
use crate::trace::ToastEvent;

/// Delay between a toast starting to leave and its space collapsing.
pub const SHRINK_DELAY: Duration = Duration::from_millis(200);

/// Defaults applied to every toast a [`Toaster`] shows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToasterConfig {
    /// Placement of toasts that do not set one.
    pub placement: Placement,
    /// Auto-close delay in milliseconds; non-positive or non-finite values
    /// never close.
    pub duration_ms: f64,
    /// Whether clicking a toast closes it.
    pub can_close_by_click: bool,
    /// Portal for the toast lists; `None` uses the document default.
    pub portal: Option<ContainerRef>,
    /// See [`SHRINK_DELAY`].
    pub shrink_delay: Duration,
}

impl Default for ToasterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ToasterConfig {
    /// Top placement, 5 seconds, not click-closable.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            placement: Placement::Top,
            duration_ms: 5000.0,
            can_close_by_click: false,
            portal: None,
            shrink_delay: SHRINK_DELAY,
        }
    }
}

/// A request to show one toast. Unset fields inherit from the
/// [`ToasterConfig`].
#[derive(Clone, Debug, PartialEq)]
pub struct ToastRequest<C> {
    /// Explicit key; generated as `toast-N` when absent.
    pub key: Option<String>,
    /// Placement override.
    pub placement: Option<Placement>,
    /// Duration override, in milliseconds.
    pub duration_ms: Option<f64>,
    /// Click-to-close override.
    pub can_close_by_click: Option<bool>,
    /// Application content.
    pub content: C,
}

impl<C> ToastRequest<C> {
    /// A request inheriting every default.
    pub fn new(content: C) -> Self {
        Self {
            key: None,
            placement: None,
            duration_ms: None,
            can_close_by_click: None,
            content,
        }
    }

    /// Sets the key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the placement.
    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets click-to-close.
    #[must_use]
    pub fn with_close_by_click(mut self, enabled: bool) -> Self {
        self.can_close_by_click = Some(enabled);
        self
    }
}

/// A shown toast, as owned by the [`Toaster`].
#[derive(Clone, Debug, PartialEq)]
pub struct ToastRecord<C> {
    key: String,
    visible: bool,
    placement: Placement,
    duration_ms: f64,
    can_close_by_click: bool,
    content: C,
}

impl<C> ToastRecord<C> {
    /// Unique key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// `false` once closing has started.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Resolved placement.
    #[must_use]
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Resolved duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// Resolved click-to-close.
    #[must_use]
    pub fn can_close_by_click(&self) -> bool {
        self.can_close_by_click
    }

    /// Application content.
    #[must_use]
    pub fn content(&self) -> &C {
        &self.content
    }
}

/// The toasts sharing one placement.
#[derive(Clone, Debug, PartialEq)]
pub struct ToastGroup<'a> {
    /// Shared placement.
    pub placement: Placement,
    /// Inset of the list from the anchored edges.
    pub offset: Vec2,
    /// Animation each toast in the group plays.
    pub animation: AnimationSpec,
    /// Keys in show order.
    pub keys: Vec<&'a str>,
}

type ContentRenderer<C> = Rc<RefCell<Box<dyn FnMut(&C, &mut RenderScope<'_>)>>>;

#[derive(Debug)]
enum Exit {
    Staying,
    Delayed(Countdown),
    Shrinking(AnimationId),
}

struct Toast<C> {
    record: ToastRecord<C>,
    slot: ElementId,
    overlay: OverlayController,
    countdown: Countdown,
    exit: Exit,
    height: Rc<Cell<Option<f64>>>,
}

#[derive(Debug)]
struct ToastList {
    placement: Placement,
    overlay: OverlayController,
    binding: BindingId,
}

/// Owner of every toast in one document.
pub struct Toaster<C> {
    config: ToasterConfig,
    focus: FocusReader,
    toasts: Vec<Toast<C>>,
    lists: Vec<ToastList>,
    positions: PositionEngine,
    next_key: u64,
    content_renderer: Option<ContentRenderer<C>>,
}

impl<C> fmt::Debug for Toaster<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toaster")
            .field("config", &self.config)
            .field("toasts", &self.toasts.len())
            .field("lists", &self.lists)
            .finish_non_exhaustive()
    }
}

impl<C: Clone + 'static> Toaster<C> {
    /// Creates an empty toaster reading the document's focus signal.
    pub fn new(config: ToasterConfig, focus: FocusReader) -> Self {
        Self {
            config,
            focus,
            toasts: Vec::new(),
            lists: Vec::new(),
            positions: PositionEngine::new(),
            next_key: 1,
            content_renderer: None,
        }
    }

    /// Returns the defaults.
    #[must_use]
    pub fn config(&self) -> &ToasterConfig {
        &self.config
    }

    /// Replaces the defaults for toasts shown from now on.
    pub fn set_config(&mut self, config: ToasterConfig) {
        self.config = config;
    }

    /// Sets the callback that builds each toast's markup.
    ///
    /// Without one, every toast renders a single content element.
    pub fn set_content_renderer(
        &mut self,
        renderer: impl FnMut(&C, &mut RenderScope<'_>) + 'static,
    ) {
        self.content_renderer = Some(Rc::new(RefCell::new(Box::new(renderer))));
    }

    /// Shows a toast and returns its key.
    ///
    /// Showing an existing key removes the old toast first.
    pub fn show(&mut self, request: ToastRequest<C>, cx: &mut OverlayCx<'_>) -> String {
        let key = match request.key {
            Some(key) => {
                self.clear(&key, cx);
                key
            }
            None => self.generate_key(),
        };
        let record = ToastRecord {
            key,
            visible: true,
            placement: request.placement.unwrap_or(self.config.placement),
            duration_ms: request.duration_ms.unwrap_or(self.config.duration_ms),
            can_close_by_click: request
                .can_close_by_click
                .unwrap_or(self.config.can_close_by_click),
            content: request.content,
        };

        let Some(list) = self.ensure_list(record.placement, cx) else {
            log::error!(
                "toast list for {} did not mount; dropping {}",
                record.placement,
                record.key
            );
            return record.key;
        };
        let slot = cx.host.create_element(list, ElementRole::Content);
        let height = Rc::new(Cell::new(None));
        let mut overlay = OverlayController::new(
            record.key.clone(),
            OverlayOptions::toast(record.placement).with_portal(ContainerRef::Element(slot)),
        );
        self.install_renderer(&mut overlay, &record.content);
        let measured = Rc::clone(&height);
        overlay.set_before_close(move |scope: BeforeClose<'_>| {
            measured.set(scope.probe.bounding_rect(scope.content).map(|r| r.height()));
            ExitPlan::Animate
        });
        overlay.request_visible(true, cx);

        let key = record.key.clone();
        self.toasts.push(Toast {
            countdown: Countdown::from_millis(record.duration_ms),
            record,
            slot,
            overlay,
            exit: Exit::Staying,
            height,
        });
        key
    }

    /// Starts closing a toast. Missing or already hidden keys are ignored.
    pub fn close(&mut self, key: &str, cx: &mut OverlayCx<'_>) {
        let delay = self.config.shrink_delay;
        let Some(toast) = self.toast_mut(key) else {
            return;
        };
        if !toast.record.visible {
            return;
        }
        toast.record.visible = false;
        toast.exit = Exit::Delayed(Countdown::new(Some(delay)));
        toast.overlay.request_visible(false, cx);
    }

    /// Starts closing every visible toast.
    pub fn close_all(&mut self, cx: &mut OverlayCx<'_>) {
        let keys: Vec<String> = self
            .toasts
            .iter()
            .filter(|t| t.record.visible)
            .map(|t| t.record.key.clone())
            .collect();
        for key in keys {
            self.close(&key, cx);
        }
    }

    /// Removes a toast immediately, whatever its state.
    pub fn clear(&mut self, key: &str, cx: &mut OverlayCx<'_>) {
        let Some(index) = self.toasts.iter().position(|t| t.record.key == key) else {
            return;
        };
        let mut toast = self.toasts.remove(index);
        toast.overlay.unmount(cx);
        if let Exit::Shrinking(animation) = toast.exit {
            cx.host.cancel_animation(animation);
        }
        cx.host.remove_element(toast.slot);
        cx.tracer.toast_removed(&ToastEvent {
            key: &toast.record.key,
            at: None,
        });

        let placement = toast.record.placement;
        if !self.toasts.iter().any(|t| t.record.placement == placement) {
            self.remove_list(placement, cx);
        }
    }

    /// Removes every toast immediately.
    pub fn clear_all(&mut self, cx: &mut OverlayCx<'_>) {
        let keys: Vec<String> = self.toasts.iter().map(|t| t.record.key.clone()).collect();
        for key in keys {
            self.clear(&key, cx);
        }
    }

    /// Records pointer enter/leave on a toast.
    pub fn set_hovered(&mut self, key: &str, hovered: bool) {
        if let Some(toast) = self.toast_mut(key) {
            toast.countdown.set_hovered(hovered);
        }
    }

    /// Handles a click on a toast. Returns `true` if it started closing.
    pub fn click(&mut self, key: &str, cx: &mut OverlayCx<'_>) -> bool {
        let closable = self
            .record(key)
            .is_some_and(|r| r.visible && r.can_close_by_click);
        if closable {
            self.close(key, cx);
        }
        closable
    }

    /// Advances countdowns and shrink delays by one frame.
    pub fn on_frame(&mut self, tick: &FrameTick, cx: &mut OverlayCx<'_>) {
        let focused = self.focus.is_focused();
        let mut expired = Vec::new();
        let mut shrink = Vec::new();
        for toast in &mut self.toasts {
            if toast.record.visible {
                if toast.countdown.tick(tick, focused) {
                    expired.push(toast.record.key.clone());
                }
            } else if let Exit::Delayed(delay) = &mut toast.exit {
                if delay.tick(tick, true) {
                    shrink.push(toast.record.key.clone());
                }
            }
        }
        for key in expired {
            cx.tracer.toast_expired(&ToastEvent {
                key: &key,
                at: Some(tick.now),
            });
            self.close(&key, cx);
        }
        for key in shrink {
            self.begin_shrink(&key, cx);
        }
    }

    /// Delivers an animation completion. Returns `false` if no toast was
    /// waiting for it.
    pub fn on_animation_end(&mut self, animation: AnimationId, cx: &mut OverlayCx<'_>) -> bool {
        for toast in &mut self.toasts {
            if toast.overlay.on_animation_end(animation, cx) {
                return true;
            }
        }
        let shrunk = self.toasts.iter().find_map(|t| match t.exit {
            Exit::Shrinking(a) if a == animation => Some(t.record.key.clone()),
            _ => None,
        });
        match shrunk {
            Some(key) => {
                self.clear(&key, cx);
                true
            }
            None => false,
        }
    }

    /// Delivers a fired layout listener to the list position bindings.
    pub fn handle_layout_event(&mut self, listener: ListenerId, cx: &mut OverlayCx<'_>) -> bool {
        self.positions
            .handle_event(listener, &mut *cx.host, &mut cx.tracer)
    }

    /// Toasts grouped by placement, groups in order of first appearance.
    #[must_use]
    pub fn groups(&self) -> Vec<ToastGroup<'_>> {
        let mut groups: Vec<ToastGroup<'_>> = Vec::new();
        for toast in &self.toasts {
            let placement = toast.record.placement;
            match groups.iter_mut().find(|g| g.placement == placement) {
                Some(group) => group.keys.push(&toast.record.key),
                None => groups.push(ToastGroup {
                    placement,
                    offset: placement.default_toast_offset(),
                    animation: AnimationSpec::toast(placement),
                    keys: alloc::vec![toast.record.key.as_str()],
                }),
            }
        }
        groups
    }

    /// Returns a record.
    #[must_use]
    pub fn record(&self, key: &str) -> Option<&ToastRecord<C>> {
        self.toasts
            .iter()
            .find(|t| t.record.key == key)
            .map(|t| &t.record)
    }

    /// All records in show order.
    pub fn records(&self) -> impl Iterator<Item = &ToastRecord<C>> {
        self.toasts.iter().map(|t| &t.record)
    }

    /// Number of toasts, leaving ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    /// Whether there are no toasts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Remaining auto-close time of a toast.
    #[must_use]
    pub fn remaining(&self, key: &str) -> Option<Duration> {
        self.toasts
            .iter()
            .find(|t| t.record.key == key)?
            .countdown
            .remaining()
    }

    /// The rendered content element of a toast, while mounted.
    #[must_use]
    pub fn content_element(&self, key: &str) -> Option<ElementId> {
        self.toasts
            .iter()
            .find(|t| t.record.key == key)?
            .overlay
            .content()
    }

    /// The list element for a placement, while its group is non-empty.
    #[must_use]
    pub fn list_element(&self, placement: Placement) -> Option<ElementId> {
        self.lists
            .iter()
            .find(|l| l.placement == placement)?
            .overlay
            .content()
    }

    /// The engine positioning the lists.
    #[must_use]
    pub fn positions(&self) -> &PositionEngine {
        &self.positions
    }

    fn generate_key(&mut self) -> String {
        loop {
            let key = format!("toast-{}", self.next_key);
            self.next_key += 1;
            if self.record(&key).is_none() {
                return key;
            }
        }
    }

    fn toast_mut(&mut self, key: &str) -> Option<&mut Toast<C>> {
        self.toasts.iter_mut().find(|t| t.record.key == key)
    }

    fn install_renderer(&self, overlay: &mut OverlayController, content: &C) {
        match &self.content_renderer {
            Some(renderer) => {
                let renderer = Rc::clone(renderer);
                let content = content.clone();
                overlay.set_renderer(move |mut scope: RenderScope<'_>| {
                    let mut render = renderer.borrow_mut();
                    (*render)(&content, &mut scope);
                });
            }
            None => overlay.set_renderer(|mut scope: RenderScope<'_>| {
                if let Err(err) = scope.render_content() {
                    log::warn!("toast render failed: {err}");
                }
            }),
        }
    }

    fn ensure_list(&mut self, placement: Placement, cx: &mut OverlayCx<'_>) -> Option<ElementId> {
        if let Some(element) = self.list_element(placement) {
            return Some(element);
        }
        let mut options = OverlayOptions::toast_list();
        options.portal = self.config.portal;
        let container = cx.manager.behavior().portal_for(&options);
        let mut overlay = OverlayController::new(format!("toast-list-{placement}"), options);
        overlay.set_renderer(|mut scope: RenderScope<'_>| {
            if let Err(err) = scope.render_content() {
                log::warn!("toast list render failed: {err}");
            }
        });
        overlay.request_visible(true, cx);
        let element = overlay.content()?;
        let binding = self.positions.subscribe(
            container,
            element,
            PositionConfig::new(placement).with_offset(placement.default_toast_offset()),
            &mut *cx.host,
            &mut cx.tracer,
        );
        self.lists.push(ToastList {
            placement,
            overlay,
            binding,
        });
        Some(element)
    }

    fn remove_list(&mut self, placement: Placement, cx: &mut OverlayCx<'_>) {
        let Some(index) = self.lists.iter().position(|l| l.placement == placement) else {
            return;
        };
        let mut list = self.lists.remove(index);
        self.positions.unsubscribe(list.binding, &mut *cx.host);
        list.overlay.request_visible(false, cx);
    }

    fn begin_shrink(&mut self, key: &str, cx: &mut OverlayCx<'_>) {
        let Some(toast) = self.toast_mut(key) else {
            return;
        };
        toast.overlay.unmount(cx);
        let element = cx.host.create_element(toast.slot, ElementRole::Shrink);
        cx.host
            .set_fixed_height(element, toast.height.get().unwrap_or(0.0));
        let duration = AnimationSpec::toast(toast.record.placement).duration;
        let animation = cx
            .host
            .play_animation(element, ZERO_HEIGHT_ANIMATION, duration);
        toast.exit = Exit::Shrinking(animation);
    }
}
