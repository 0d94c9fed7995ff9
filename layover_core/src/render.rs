// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-callback contract.
//!
//! The lifecycle controller owns measurement and animation, the widget owns
//! markup. On mount the controller calls the widget's renderer with a
//! [`RenderScope`]: a fresh [`NodeRef`], the portal root to build under, and
//! the presenter. The renderer creates whatever structure it likes and
//! attaches one element to the ref; that element is what the controller
//! animates and what outside-click hit testing treats as "inside".
//!
//! A renderer that attaches nothing is a recoverable mistake: the controller
//! logs a warning and substitutes an empty placeholder element.

use alloc::boxed::Box;
use core::fmt;

use crate::backend::{ElementRole, Presenter};
use crate::id::ElementId;

/// Errors from [`NodeRef`] assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefError {
    /// The ref's owner has unmounted.
    Detached {
        /// The element that was being assigned.
        element: ElementId,
    },
}

impl fmt::Display for RefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached { element } => {
                write!(f, "cannot assign {element:?} to a ref whose owner has unmounted")
            }
        }
    }
}

impl core::error::Error for RefError {}

/// Slot through which a renderer hands its root element to the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeRef {
    element: Option<ElementId>,
    detached: bool,
}

impl NodeRef {
    /// Creates an empty, live ref.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            element: None,
            detached: false,
        }
    }

    /// Attaches `element`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`RefError::Detached`] if the owner has already unmounted.
    pub fn attach(&mut self, element: ElementId) -> Result<(), RefError> {
        if self.detached {
            return Err(RefError::Detached { element });
        }
        self.element = Some(element);
        Ok(())
    }

    /// Returns the attached element.
    #[must_use]
    pub const fn get(&self) -> Option<ElementId> {
        self.element
    }

    /// Whether the owner has unmounted.
    #[must_use]
    pub const fn is_detached(&self) -> bool {
        self.detached
    }

    /// Clears the ref and refuses later assignments.
    pub fn detach(&mut self) -> Option<ElementId> {
        self.detached = true;
        self.element.take()
    }
}

/// Everything a renderer receives on mount.
pub struct RenderScope<'a> {
    /// Ref to attach the rendered root to.
    pub node_ref: &'a mut NodeRef,
    /// Portal root to build under.
    pub root: ElementId,
    /// Presenter used to create elements.
    pub presenter: &'a mut dyn Presenter,
}

impl fmt::Debug for RenderScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderScope")
            .field("node_ref", &self.node_ref)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl RenderScope<'_> {
    /// Creates a content element under the root and attaches it to the ref.
    ///
    /// Covers the common case of a single wrapper element.
    ///
    /// # Errors
    ///
    /// Propagates [`RefError`] from [`NodeRef::attach`].
    pub fn render_content(&mut self) -> Result<ElementId, RefError> {
        let element = self.presenter.create_element(self.root, ElementRole::Content);
        self.node_ref.attach(element)?;
        Ok(element)
    }
}

/// A widget's render callback.
pub type Renderer = Box<dyn FnMut(RenderScope<'_>)>;

/// Runs `renderer` (if any) and returns the element it attached.
///
/// Falls back to an empty placeholder when nothing was attached, so the
/// controller always has something to animate and hit-test.
pub(crate) fn render_into(
    renderer: Option<&mut Renderer>,
    node_ref: &mut NodeRef,
    root: ElementId,
    presenter: &mut dyn Presenter,
) -> (ElementId, bool) {
    if let Some(render) = renderer {
        render(RenderScope {
            node_ref: &mut *node_ref,
            root,
            presenter: &mut *presenter,
        });
    }
    if let Some(element) = node_ref.get() {
        return (element, false);
    }
    log::warn!("render callback attached no element under {root:?}; using an empty placeholder");
    let placeholder = presenter.create_element(root, ElementRole::Placeholder);
    // The ref was created live for this mount.
    _ = node_ref.attach(placeholder);
    (placeholder, true)
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::backend::{ContainerRef, DomProbe};
    use crate::headless::HeadlessHost;

    #[test]
    fn detached_ref_rejects_assignment() {
        let mut node_ref = NodeRef::new();
        node_ref.attach(ElementId(1)).unwrap();
        assert_eq!(node_ref.detach(), Some(ElementId(1)));
        assert_eq!(
            node_ref.attach(ElementId(2)),
            Err(RefError::Detached {
                element: ElementId(2)
            })
        );
        assert_eq!(node_ref.get(), None);
    }

    #[test]
    fn renderer_controls_structure() {
        let mut host = HeadlessHost::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let root = host.mount_portal(ContainerRef::DocumentBody);
        let mut renderer: Renderer = Box::new(|mut scope: RenderScope<'_>| {
            let wrapper = scope.presenter.create_element(scope.root, ElementRole::Content);
            let inner = scope.presenter.create_element(wrapper, ElementRole::Content);
            scope.node_ref.attach(inner).unwrap();
        });
        let mut node_ref = NodeRef::new();
        let (element, degraded) = render_into(Some(&mut renderer), &mut node_ref, root, &mut host);
        assert!(!degraded);
        assert_eq!(host.children(root).len(), 1);
        assert!(host.contains(root, element));
        assert_eq!(host.role(element), Some(ElementRole::Content));
    }

    #[test]
    fn missing_attachment_degrades_to_placeholder() {
        let mut host = HeadlessHost::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let root = host.mount_portal(ContainerRef::DocumentBody);
        let mut renderer: Renderer = Box::new(|_scope: RenderScope<'_>| {});
        let mut node_ref = NodeRef::new();
        let (element, degraded) = render_into(Some(&mut renderer), &mut node_ref, root, &mut host);
        assert!(degraded);
        assert_eq!(host.role(element), Some(ElementRole::Placeholder));
        assert_eq!(node_ref.get(), Some(element));
    }
}
