// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Global overlay manager.
//!
//! One [`OverlayManager`] exists per document. It is constructed explicitly
//! at startup and handed to every transition through
//! [`OverlayCx`](crate::lifecycle::OverlayCx); tests build a fresh one each.
//!
//! It owns the only process-wide mutable overlay state:
//!
//! - the **stack** of mounted overlays in registration order, which decides
//!   who receives escape (topmost eligible entry only) and lets every entry
//!   run its own outside-click hit test. Entries that are already closing
//!   stay on the stack but take no part in routing;
//! - the **scroll-lock count**. The page is locked while the count is
//!   non-zero; [`ScrollLockMode::Force`] registrations reapply the lock on
//!   mount regardless of the count.
//!
//! The manager never closes anything itself. Routing produces
//! [`DismissRequest`]s; the caller forwards each one to the owning
//! controller's [`dismiss`](crate::lifecycle::OverlayController::dismiss).

use alloc::vec::Vec;

use crate::backend::{DomProbe, Presenter};
use crate::config::{OverlayBehavior, OverlayOptions, ScrollLockMode};
use crate::id::{ElementId, OverlayId, Slots};
use crate::trace::{DismissEvent, ScrollLockEvent, Tracer};

/// Why an overlay is being asked to close.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DismissReason {
    /// The escape key.
    Escape,
    /// A pointer-down outside the overlay's content and backdrop.
    OutsideClick,
    /// A pointer-down on the overlay's own backdrop.
    Backdrop,
    /// Application code.
    Programmatic,
}

/// A routed close request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DismissRequest {
    /// Target overlay.
    pub overlay: OverlayId,
    /// Trigger.
    pub reason: DismissReason,
}

/// Dismissal and scroll-lock participation of one registration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RegisterOptions {
    /// Receives escape when topmost among escape-closable entries.
    pub closes_on_escape: bool,
    /// Receives pointer-downs outside its subtree.
    pub closes_on_outside_click: bool,
    /// Holds the scroll lock while registered.
    pub scroll_lock: Option<ScrollLockMode>,
}

impl From<&OverlayOptions> for RegisterOptions {
    fn from(options: &OverlayOptions) -> Self {
        Self {
            closes_on_escape: options.closes_on_escape,
            closes_on_outside_click: options.closes_on_outside_click,
            scroll_lock: options.scroll_lock,
        }
    }
}

/// The elements that make up an overlay for hit testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OverlayRoots {
    /// Rendered content; pointer-downs inside it are not dismissals.
    pub content: ElementId,
    /// Backdrop, if any.
    pub backdrop: Option<ElementId>,
}

#[derive(Debug)]
struct Entry {
    registration: Option<(RegisterOptions, OverlayRoots)>,
    dismissable: bool,
}

/// Stack of mounted overlays plus the shared scroll lock.
#[derive(Debug, Default)]
pub struct OverlayManager {
    behavior: OverlayBehavior,
    entries: Slots<Entry>,
    stack: Vec<OverlayId>,
    lock_count: u32,
}

impl OverlayManager {
    /// Creates a manager with default behavior.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager with the given document-wide defaults.
    #[must_use]
    pub fn with_behavior(behavior: OverlayBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    /// Returns the document-wide defaults.
    #[must_use]
    pub fn behavior(&self) -> &OverlayBehavior {
        &self.behavior
    }

    /// Reserves an id. It joins the stack only once registered.
    pub fn allocate_id(&mut self) -> OverlayId {
        OverlayId::new(self.entries.insert(Entry {
            registration: None,
            dismissable: false,
        }))
    }

    /// Frees an id, unregistering it first if needed.
    pub fn release_id(
        &mut self,
        id: OverlayId,
        presenter: &mut dyn Presenter,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        self.unregister(id, presenter, tracer);
        self.entries.remove(id.idx, id.generation).is_some()
    }

    /// Pushes `id` onto the stack and takes the scroll lock if requested.
    ///
    /// Returns `false` if the id is stale or already registered; an entry
    /// appears on the stack at most once.
    pub fn register(
        &mut self,
        id: OverlayId,
        options: RegisterOptions,
        roots: OverlayRoots,
        presenter: &mut dyn Presenter,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(id.idx, id.generation) else {
            return false;
        };
        if entry.registration.is_some() {
            return false;
        }
        entry.registration = Some((options, roots));
        entry.dismissable = true;
        self.stack.push(id);

        if let Some(mode) = options.scroll_lock {
            self.lock_count += 1;
            let forced = mode == ScrollLockMode::Force;
            if forced || self.lock_count == 1 {
                presenter.set_scroll_lock(true);
            }
            tracer.scroll_lock(&ScrollLockEvent {
                count: self.lock_count,
                locked: true,
                forced,
            });
        }
        true
    }

    /// Removes `id` from the stack and drops its scroll-lock hold.
    ///
    /// Returns `false` if it was not registered.
    pub fn unregister(
        &mut self,
        id: OverlayId,
        presenter: &mut dyn Presenter,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(id.idx, id.generation) else {
            return false;
        };
        let Some((options, _)) = entry.registration.take() else {
            return false;
        };
        entry.dismissable = false;
        self.stack.retain(|&other| other != id);

        if options.scroll_lock.is_some() {
            self.lock_count = self.lock_count.saturating_sub(1);
            let locked = self.lock_count > 0;
            if !locked {
                presenter.set_scroll_lock(false);
            }
            tracer.scroll_lock(&ScrollLockEvent {
                count: self.lock_count,
                locked,
                forced: false,
            });
        }
        true
    }

    /// Marks whether a registered entry takes part in escape and
    /// outside-click routing.
    ///
    /// Controllers clear it when their exit starts and set it again on a
    /// reopen. Returns `false` if `id` is not registered.
    pub fn set_dismissable(&mut self, id: OverlayId, dismissable: bool) -> bool {
        match self.entries.get_mut(id.idx, id.generation) {
            Some(entry) if entry.registration.is_some() => {
                entry.dismissable = dismissable;
                true
            }
            _ => false,
        }
    }

    /// Whether `id` is registered and currently eligible for routing.
    #[must_use]
    pub fn is_dismissable(&self, id: OverlayId) -> bool {
        self.routable(id).is_some()
    }

    /// Routes an escape key press to the topmost escape-closable entry.
    pub fn handle_escape(&self, tracer: &mut Tracer<'_>) -> Option<DismissRequest> {
        let overlay = self.stack.iter().rev().copied().find(|&id| {
            self.routable(id)
                .is_some_and(|(options, _)| options.closes_on_escape)
        })?;
        let request = DismissRequest {
            overlay,
            reason: DismissReason::Escape,
        };
        tracer.dismiss(&DismissEvent {
            overlay,
            reason: request.reason,
        });
        Some(request)
    }

    /// Hit-tests a pointer-down against every outside-click-closable entry.
    ///
    /// Each entry decides independently, topmost first: a target inside its
    /// content is ignored, a target on its own backdrop is a
    /// [`DismissReason::Backdrop`] request, anything else is
    /// [`DismissReason::OutsideClick`].
    pub fn handle_pointer_down(
        &self,
        target: ElementId,
        probe: &dyn DomProbe,
        tracer: &mut Tracer<'_>,
    ) -> Vec<DismissRequest> {
        let mut requests = Vec::new();
        for &overlay in self.stack.iter().rev() {
            let Some((options, roots)) = self.routable(overlay) else {
                continue;
            };
            if !options.closes_on_outside_click || probe.contains(roots.content, target) {
                continue;
            }
            let reason = match roots.backdrop {
                Some(backdrop) if probe.contains(backdrop, target) => DismissReason::Backdrop,
                _ => DismissReason::OutsideClick,
            };
            tracer.dismiss(&DismissEvent { overlay, reason });
            requests.push(DismissRequest { overlay, reason });
        }
        requests
    }

    /// Current scroll-lock reference count.
    #[must_use]
    pub fn scroll_lock_count(&self) -> u32 {
        self.lock_count
    }

    /// Registered overlays, oldest first.
    #[must_use]
    pub fn stack(&self) -> &[OverlayId] {
        &self.stack
    }

    /// Whether `id` is currently on the stack.
    #[must_use]
    pub fn is_registered(&self, id: OverlayId) -> bool {
        self.registration(id).is_some()
    }

    /// Number of allocated ids, registered or not.
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.entries.len()
    }

    fn registration(&self, id: OverlayId) -> Option<&(RegisterOptions, OverlayRoots)> {
        self.entries
            .get(id.idx, id.generation)?
            .registration
            .as_ref()
    }

    fn routable(&self, id: OverlayId) -> Option<&(RegisterOptions, OverlayRoots)> {
        let entry = self.entries.get(id.idx, id.generation)?;
        if !entry.dismissable {
            return None;
        }
        entry.registration.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::backend::{ContainerRef, ElementRole};
    use crate::headless::HeadlessHost;

    const LOCKING: RegisterOptions = RegisterOptions {
        closes_on_escape: true,
        closes_on_outside_click: false,
        scroll_lock: Some(ScrollLockMode::Nested),
    };

    fn host() -> HeadlessHost {
        HeadlessHost::new(Rect::new(0.0, 0.0, 800.0, 600.0))
    }

    fn mount(host: &mut HeadlessHost, backdrop: bool) -> OverlayRoots {
        let root = host.mount_portal(ContainerRef::DocumentBody);
        let backdrop = backdrop.then(|| host.create_element(root, ElementRole::Backdrop));
        let content = host.create_element(root, ElementRole::Content);
        OverlayRoots { content, backdrop }
    }

    #[test]
    fn escape_goes_to_most_recent_eligible() {
        let mut host = host();
        let mut manager = OverlayManager::new();
        let mut tracer = Tracer::none();
        let outer = manager.allocate_id();
        let inner = manager.allocate_id();
        let passive = manager.allocate_id();
        for (id, opts) in [
            (outer, LOCKING),
            (inner, LOCKING),
            (passive, RegisterOptions::default()),
        ] {
            let roots = mount(&mut host, false);
            assert!(manager.register(id, opts, roots, &mut host, &mut tracer));
        }

        let req = manager.handle_escape(&mut tracer).unwrap();
        assert_eq!(req.overlay, inner);
        assert_eq!(req.reason, DismissReason::Escape);

        manager.unregister(inner, &mut host, &mut tracer);
        assert_eq!(manager.handle_escape(&mut tracer).unwrap().overlay, outer);
    }

    #[test]
    fn non_dismissable_entries_are_skipped() {
        let mut host = host();
        let mut manager = OverlayManager::new();
        let mut tracer = Tracer::none();
        let both = RegisterOptions {
            closes_on_outside_click: true,
            ..LOCKING
        };
        let outer = manager.allocate_id();
        let inner = manager.allocate_id();
        for id in [outer, inner] {
            let roots = mount(&mut host, false);
            manager.register(id, both, roots, &mut host, &mut tracer);
        }

        assert!(manager.set_dismissable(inner, false));
        assert!(!manager.is_dismissable(inner));
        assert!(manager.is_registered(inner));
        assert_eq!(manager.handle_escape(&mut tracer).unwrap().overlay, outer);
        let body = host.body();
        let reqs = manager.handle_pointer_down(body, &host, &mut tracer);
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].overlay, outer);

        assert!(manager.set_dismissable(inner, true));
        assert_eq!(manager.handle_escape(&mut tracer).unwrap().overlay, inner);

        manager.unregister(inner, &mut host, &mut tracer);
        assert!(!manager.set_dismissable(inner, true));
    }

    #[test]
    fn double_register_is_rejected() {
        let mut host = host();
        let mut manager = OverlayManager::new();
        let mut tracer = Tracer::none();
        let id = manager.allocate_id();
        let roots = mount(&mut host, false);
        assert!(manager.register(id, LOCKING, roots, &mut host, &mut tracer));
        assert!(!manager.register(id, LOCKING, roots, &mut host, &mut tracer));
        assert_eq!(manager.stack(), &[id]);
        assert_eq!(manager.scroll_lock_count(), 1);
    }

    #[test]
    fn scroll_lock_counts_in_any_order() {
        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let mut host = host();
            let mut manager = OverlayManager::new();
            let mut tracer = Tracer::none();
            let ids: Vec<OverlayId> = (0..3).map(|_| manager.allocate_id()).collect();
            for &id in &ids {
                let roots = mount(&mut host, false);
                manager.register(id, LOCKING, roots, &mut host, &mut tracer);
            }
            assert!(host.scroll_locked());
            assert_eq!(host.scroll_lock_writes(), 1, "nested mounts only lock once");

            for (n, &i) in order.iter().enumerate() {
                assert!(manager.unregister(ids[i], &mut host, &mut tracer));
                assert!(!manager.unregister(ids[i], &mut host, &mut tracer));
                let remaining = 2 - n;
                assert_eq!(manager.scroll_lock_count() as usize, remaining);
                assert_eq!(host.scroll_locked(), remaining > 0, "order {order:?}");
            }
        }
    }

    #[test]
    fn force_mode_reapplies_lock() {
        let mut host = host();
        let mut manager = OverlayManager::new();
        let mut tracer = Tracer::none();
        let forced = RegisterOptions {
            scroll_lock: Some(ScrollLockMode::Force),
            ..LOCKING
        };
        for opts in [LOCKING, forced] {
            let id = manager.allocate_id();
            let roots = mount(&mut host, false);
            manager.register(id, opts, roots, &mut host, &mut tracer);
        }
        assert_eq!(host.scroll_lock_writes(), 2);
        assert_eq!(manager.scroll_lock_count(), 2);
    }

    #[test]
    fn outside_click_hit_tests_each_entry() {
        let mut host = host();
        let mut manager = OverlayManager::new();
        let mut tracer = Tracer::none();
        let clicky = RegisterOptions {
            closes_on_outside_click: true,
            ..RegisterOptions::default()
        };
        let a = manager.allocate_id();
        let b = manager.allocate_id();
        let a_roots = mount(&mut host, false);
        let b_roots = mount(&mut host, true);
        manager.register(a, clicky, a_roots, &mut host, &mut tracer);
        manager.register(b, clicky, b_roots, &mut host, &mut tracer);

        let inside_b = host.add_element(b_roots.content, Rect::ZERO);
        let reqs = manager.handle_pointer_down(inside_b, &host, &mut tracer);
        assert_eq!(
            reqs,
            alloc::vec![DismissRequest {
                overlay: a,
                reason: DismissReason::OutsideClick
            }]
        );

        let reqs = manager.handle_pointer_down(b_roots.backdrop.unwrap(), &host, &mut tracer);
        assert_eq!(reqs.len(), 2, "both overlays fail their hit test");
        assert_eq!(reqs[0].overlay, b);
        assert_eq!(reqs[0].reason, DismissReason::Backdrop);
        assert_eq!(reqs[1].reason, DismissReason::OutsideClick);

        assert!(
            manager
                .handle_pointer_down(a_roots.content, &host, &mut tracer)
                .iter()
                .all(|r| r.overlay == b)
        );
    }

    #[test]
    fn released_ids_are_stale() {
        let mut host = host();
        let mut manager = OverlayManager::new();
        let mut tracer = Tracer::none();
        let id = manager.allocate_id();
        let roots = mount(&mut host, false);
        manager.register(id, LOCKING, roots, &mut host, &mut tracer);
        assert!(manager.release_id(id, &mut host, &mut tracer));
        assert!(!host.scroll_locked());
        assert!(manager.stack().is_empty());
        assert!(!manager.register(id, LOCKING, roots, &mut host, &mut tracer));
        assert_eq!(manager.allocated_count(), 0);
    }
}
