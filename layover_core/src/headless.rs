// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host.
//!
//! [`HeadlessHost`] implements both [`DomProbe`] and [`Presenter`] over a
//! plain element tree with caller-assigned rectangles. As in a browser, a
//! vertical translate moves the measured rectangle. It serves two roles:
//! rendering passes with no document at all (nothing is measured, nothing
//! panics), and tests, where its counters make leaks observable: live
//! listeners, pending animations, style writes, and the scroll lock.
//!
//! Events are injected with [`fire`](HeadlessHost::fire), which returns the
//! listener ids the caller must forward to their owners, and
//! [`finish_animation`](HeadlessHost::finish_animation).

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Rect, Vec2};

use crate::backend::{ContainerRef, DomProbe, ElementRole, EventKind, Frame, Presenter};
use crate::id::{AnimationId, ElementId, ListenerId};
use crate::position::InsetInstruction;
use crate::time::Duration;

#[derive(Debug)]
struct Node {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    role: Option<ElementRole>,
    rect: Rect,
    attached: bool,
    scrollable: bool,
    inset: Option<InsetInstruction>,
    inset_writes: u32,
    translate_y: Option<f64>,
    fixed_height: Option<f64>,
}

impl Node {
    fn new(parent: Option<ElementId>, role: Option<ElementRole>, rect: Rect) -> Self {
        Self {
            parent,
            children: Vec::new(),
            role,
            rect,
            attached: true,
            scrollable: false,
            inset: None,
            inset_writes: 0,
            translate_y: None,
            fixed_height: None,
        }
    }
}

/// A running animation as seen by the headless host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAnimation {
    /// Animated element.
    pub element: ElementId,
    /// Animation name.
    pub name: String,
    /// Requested duration.
    pub duration: Duration,
}

/// Headless implementation of the backend contract.
#[derive(Debug)]
pub struct HeadlessHost {
    viewport: Rect,
    nodes: Vec<Node>,
    listeners: HashMap<ListenerId, (Frame, EventKind)>,
    next_listener: u64,
    total_listens: u64,
    animations: HashMap<AnimationId, PendingAnimation>,
    next_animation: u64,
    scroll_locked: bool,
    scroll_lock_writes: u32,
}

impl HeadlessHost {
    /// Creates a host whose body fills `viewport`.
    #[must_use]
    pub fn new(viewport: Rect) -> Self {
        Self {
            viewport,
            nodes: alloc::vec![Node::new(None, None, viewport)],
            listeners: HashMap::new(),
            next_listener: 0,
            total_listens: 0,
            animations: HashMap::new(),
            next_animation: 0,
            scroll_locked: false,
            scroll_lock_writes: 0,
        }
    }

    /// Returns the body element.
    #[must_use]
    pub const fn body(&self) -> ElementId {
        ElementId(0)
    }

    /// Adds a plain element under `parent` with the given viewport rectangle.
    pub fn add_element(&mut self, parent: ElementId, rect: Rect) -> ElementId {
        self.push_node(parent, None, rect)
    }

    /// Moves or resizes an element.
    pub fn set_rect(&mut self, element: ElementId, rect: Rect) {
        if let Some(node) = self.node_mut(element) {
            node.rect = rect;
        }
    }

    /// Resizes the viewport (and the body with it).
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
        self.nodes[0].rect = viewport;
    }

    /// Marks an element as a scroll container.
    pub fn set_scrollable(&mut self, element: ElementId, scrollable: bool) {
        if let Some(node) = self.node_mut(element) {
            node.scrollable = scrollable;
        }
    }

    /// Returns the listeners registered for `kind` on `source`, in
    /// registration order, as if the event had just fired.
    #[must_use]
    pub fn fire(&self, source: Frame, kind: EventKind) -> Vec<ListenerId> {
        let mut ids: Vec<ListenerId> = self
            .listeners
            .iter()
            .filter(|&(_, &(s, k))| s == source && k == kind)
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of live listeners on `source`, any kind.
    #[must_use]
    pub fn listeners_on(&self, source: Frame) -> usize {
        self.listeners.values().filter(|(s, _)| *s == source).count()
    }

    /// Number of listeners ever registered.
    #[must_use]
    pub fn total_listens(&self) -> u64 {
        self.total_listens
    }

    /// Number of animations started and neither finished nor cancelled.
    #[must_use]
    pub fn pending_animation_count(&self) -> usize {
        self.animations.len()
    }

    /// Returns a pending animation.
    #[must_use]
    pub fn animation(&self, id: AnimationId) -> Option<&PendingAnimation> {
        self.animations.get(&id)
    }

    /// Returns pending animations on `element`, oldest first.
    #[must_use]
    pub fn animations_on(&self, element: ElementId) -> Vec<AnimationId> {
        let mut ids: Vec<AnimationId> = self
            .animations
            .iter()
            .filter(|(_, a)| a.element == element)
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Completes a pending animation, returning its id for delivery.
    ///
    /// Returns `None` if the animation was cancelled or already finished.
    pub fn finish_animation(&mut self, id: AnimationId) -> Option<AnimationId> {
        self.animations.remove(&id).map(|_| id)
    }

    /// Completes every pending animation, oldest first.
    pub fn finish_all_animations(&mut self) -> Vec<AnimationId> {
        let mut ids: Vec<AnimationId> = self.animations.drain().map(|(id, _)| id).collect();
        ids.sort_unstable();
        ids
    }

    /// Whether `element` is still attached.
    #[must_use]
    pub fn is_attached(&self, element: ElementId) -> bool {
        self.node(element).is_some()
    }

    /// Returns the role an element was created with.
    #[must_use]
    pub fn role(&self, element: ElementId) -> Option<ElementRole> {
        self.node(element)?.role
    }

    /// Returns the attached children of `element`, in insertion order.
    #[must_use]
    pub fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.node(element)
            .map(|n| {
                n.children
                    .iter()
                    .copied()
                    .filter(|&c| self.is_attached(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of attached elements, excluding the body.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.nodes.iter().skip(1).filter(|n| n.attached).count()
    }

    /// Returns the last inset written to `element`.
    #[must_use]
    pub fn inset(&self, element: ElementId) -> Option<InsetInstruction> {
        self.node(element)?.inset
    }

    /// Number of inset writes to `element`.
    #[must_use]
    pub fn inset_writes(&self, element: ElementId) -> u32 {
        self.node(element).map_or(0, |n| n.inset_writes)
    }

    /// Returns the translate applied to `element`.
    #[must_use]
    pub fn translate_y(&self, element: ElementId) -> Option<f64> {
        self.node(element)?.translate_y
    }

    /// Returns the pinned height of `element`.
    #[must_use]
    pub fn fixed_height(&self, element: ElementId) -> Option<f64> {
        self.node(element)?.fixed_height
    }

    /// Whether page scrolling is disabled.
    #[must_use]
    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// Number of scroll-lock writes.
    #[must_use]
    pub fn scroll_lock_writes(&self) -> u32 {
        self.scroll_lock_writes
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "element count never approaches u32::MAX"
    )]
    fn push_node(&mut self, parent: ElementId, role: Option<ElementRole>, rect: Rect) -> ElementId {
        let id = ElementId(self.nodes.len() as u32);
        self.nodes.push(Node::new(Some(parent), role, rect));
        if let Some(p) = self.nodes.get_mut(parent.0 as usize) {
            p.children.push(id);
        }
        id
    }

    fn node(&self, element: ElementId) -> Option<&Node> {
        self.nodes.get(element.0 as usize).filter(|n| n.attached)
    }

    fn node_mut(&mut self, element: ElementId) -> Option<&mut Node> {
        self.nodes
            .get_mut(element.0 as usize)
            .filter(|n| n.attached)
    }

    fn detach(&mut self, element: ElementId) {
        let Some(node) = self.nodes.get_mut(element.0 as usize) else {
            return;
        };
        node.attached = false;
        let children = node.children.clone();
        self.animations.retain(|_, a| a.element != element);
        for child in children {
            self.detach(child);
        }
    }
}

impl DomProbe for HeadlessHost {
    fn viewport_rect(&self) -> Rect {
        self.viewport.with_origin((0.0, 0.0))
    }

    fn bounding_rect(&self, element: ElementId) -> Option<Rect> {
        let node = self.node(element)?;
        Some(node.rect + Vec2::new(0.0, node.translate_y.unwrap_or(0.0)))
    }

    fn is_body(&self, element: ElementId) -> bool {
        element == self.body()
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        if self.node(ancestor).is_none() {
            return false;
        }
        let mut cursor = Some(node);
        while let Some(el) = cursor {
            if el == ancestor {
                return true;
            }
            cursor = self.node(el).and_then(|n| n.parent);
        }
        false
    }

    fn scroll_parents(&self, element: ElementId) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut cursor = self.node(element).and_then(|n| n.parent);
        while let Some(el) = cursor {
            let Some(node) = self.node(el) else { break };
            if node.scrollable && !self.is_body(el) {
                frames.push(Frame::Element(el));
            }
            cursor = node.parent;
        }
        frames.push(Frame::Viewport);
        frames
    }

    fn listen(&mut self, source: Frame, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.total_listens += 1;
        self.listeners.insert(id, (source, kind));
        id
    }

    fn unlisten(&mut self, listener: ListenerId) {
        self.listeners.remove(&listener);
    }
}

impl Presenter for HeadlessHost {
    fn mount_portal(&mut self, host: ContainerRef) -> ElementId {
        let parent = match host {
            ContainerRef::DocumentBody => self.body(),
            ContainerRef::Element(el) => el,
        };
        let rect = self.bounding_rect(parent).unwrap_or(self.viewport);
        self.push_node(parent, None, rect)
    }

    fn create_element(&mut self, parent: ElementId, role: ElementRole) -> ElementId {
        let rect = self.bounding_rect(parent).unwrap_or(Rect::ZERO);
        self.push_node(parent, Some(role), rect.with_size((0.0, 0.0)))
    }

    fn remove_element(&mut self, element: ElementId) {
        if self.is_body(element) {
            return;
        }
        self.detach(element);
    }

    fn play_animation(
        &mut self,
        element: ElementId,
        name: &str,
        duration: Duration,
    ) -> AnimationId {
        let id = AnimationId(self.next_animation);
        self.next_animation += 1;
        self.animations.insert(
            id,
            PendingAnimation {
                element,
                name: String::from(name),
                duration,
            },
        );
        id
    }

    fn cancel_animation(&mut self, animation: AnimationId) {
        self.animations.remove(&animation);
    }

    fn apply_inset(&mut self, element: ElementId, inset: &InsetInstruction) {
        if let Some(node) = self.node_mut(element) {
            node.inset = Some(*inset);
            node.inset_writes += 1;
        }
    }

    fn set_translate_y(&mut self, element: ElementId, dy: Option<f64>) {
        if let Some(node) = self.node_mut(element) {
            node.translate_y = dy;
        }
    }

    fn set_fixed_height(&mut self, element: ElementId, height: f64) {
        if let Some(node) = self.node_mut(element) {
            node.fixed_height = Some(height);
        }
    }

    fn set_scroll_lock(&mut self, locked: bool) {
        self.scroll_locked = locked;
        self.scroll_lock_writes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HeadlessHost {
        HeadlessHost::new(Rect::new(0.0, 0.0, 800.0, 600.0))
    }

    #[test]
    fn removal_detaches_subtree_and_drops_animations() {
        let mut host = host();
        let root = host.mount_portal(ContainerRef::DocumentBody);
        let content = host.create_element(root, ElementRole::Content);
        let anim = host.play_animation(content, "zoomIn", Duration::from_millis(300));
        assert_eq!(host.pending_animation_count(), 1);

        host.remove_element(root);
        assert!(!host.is_attached(content));
        assert_eq!(host.element_count(), 0);
        assert_eq!(host.finish_animation(anim), None);
    }

    #[test]
    fn contains_walks_ancestors() {
        let mut host = host();
        let root = host.mount_portal(ContainerRef::DocumentBody);
        let content = host.create_element(root, ElementRole::Content);
        let inner = host.add_element(content, Rect::new(0.0, 0.0, 10.0, 10.0));
        let outside = host.add_element(host.body(), Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(host.contains(root, inner));
        assert!(host.contains(content, content));
        assert!(!host.contains(root, outside));
    }

    #[test]
    fn scroll_parents_skip_plain_ancestors() {
        let mut host = host();
        let outer = host.add_element(host.body(), Rect::new(0.0, 0.0, 400.0, 400.0));
        let middle = host.add_element(outer, Rect::new(0.0, 0.0, 300.0, 300.0));
        let leaf = host.add_element(middle, Rect::new(0.0, 0.0, 10.0, 10.0));
        host.set_scrollable(outer, true);
        assert_eq!(
            host.scroll_parents(leaf),
            alloc::vec![Frame::Element(outer), Frame::Viewport]
        );
    }

    #[test]
    fn fire_reports_matching_listeners_only() {
        let mut host = host();
        let el = host.add_element(host.body(), Rect::new(0.0, 0.0, 10.0, 10.0));
        let resize = host.listen(Frame::Element(el), EventKind::Resize);
        let _scroll = host.listen(Frame::Element(el), EventKind::Scroll);
        assert_eq!(host.fire(Frame::Element(el), EventKind::Resize), alloc::vec![resize]);
        host.unlisten(resize);
        assert!(host.fire(Frame::Element(el), EventKind::Resize).is_empty());
        assert_eq!(host.listener_count(), 1);
    }
}
