// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for host document integrations.
//!
//! The core never touches a document directly. Backend crates provide two
//! pieces:
//!
//! - **Probe**: [`DomProbe`] answers layout queries (rectangles, the
//!   scroll-ancestor chain, subtree containment) and registers event
//!   listeners. It holds no overlay state.
//!
//! - **Presenter**: [`Presenter`] applies the core's decisions: mounting
//!   portal roots, creating content and backdrop elements, starting and
//!   cancelling animations, and writing inline styles (insets, the affix
//!   translate, the scroll lock).
//!
//! A single backend value usually implements both; [`Host`] names that
//! combination so transitions can take one `&mut dyn Host`.
//!
//! # Event delivery
//!
//! Events flow back as plain handles rather than re-entrant callbacks:
//!
//! ```text
//!   DomProbe::listen() ──► ListenerId        (subscriber keeps it)
//!   host event loop    ──► ListenerId fired  ──► PositionEngine::handle_event()
//!   Presenter::play_animation() ──► AnimationId
//!   animation end      ──► AnimationId       ──► OverlayController::on_animation_end()
//! ```
//!
//! A handle that arrives after its subscription was torn down is ignored by
//! the receiver.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::id::{AnimationId, ElementId, ListenerId};
use crate::position::InsetInstruction;
use crate::time::Duration;

/// A container reference as supplied by configuration.
///
/// [`DocumentBody`](Self::DocumentBody) is a sentinel: it is resolved only
/// when a subtree is mounted or a binding is built, never at configuration
/// time, so configuration can be created in passes with no document at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContainerRef {
    /// The document body, resolved lazily.
    #[default]
    DocumentBody,
    /// An explicit host element.
    Element(ElementId),
}

impl ContainerRef {
    /// Whether this refers to an explicit element rather than the body.
    #[must_use]
    pub const fn is_custom(self) -> bool {
        matches!(self, Self::Element(_))
    }

    /// Resolves the reference to a layout frame.
    ///
    /// The body (sentinel or an explicit body element) resolves to the
    /// viewport, so overlays in the body track the window.
    #[must_use]
    pub fn resolve(self, probe: &(impl DomProbe + ?Sized)) -> Frame {
        match self {
            Self::DocumentBody => Frame::Viewport,
            Self::Element(el) if probe.is_body(el) => Frame::Viewport,
            Self::Element(el) => Frame::Element(el),
        }
    }
}

/// A layout frame: the viewport or a scrollable/positioned element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Frame {
    /// The window viewport.
    Viewport,
    /// An element.
    Element(ElementId),
}

/// Kinds of layout events a probe can deliver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The frame's size changed.
    Resize,
    /// The frame scrolled (registered passively).
    Scroll,
}

/// What an element created by the presenter is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementRole {
    /// Overlay content.
    Content,
    /// A dimming layer inserted before the content.
    Backdrop,
    /// An empty stand-in rendered when the content callback attached nothing.
    Placeholder,
    /// A fixed-height spacer that collapses after a toast leaves.
    Shrink,
}

/// Read-only layout queries plus listener registration.
pub trait DomProbe {
    /// Returns the viewport rectangle (origin at zero).
    fn viewport_rect(&self) -> Rect;

    /// Returns the border box of `element` in viewport coordinates, or `None`
    /// if the element is not attached.
    fn bounding_rect(&self, element: ElementId) -> Option<Rect>;

    /// Whether `element` is the document body.
    fn is_body(&self, element: ElementId) -> bool;

    /// Whether `node` is `ancestor` or lies inside its subtree.
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;

    /// Lists the scroll containers enclosing `element`, innermost first,
    /// ending with [`Frame::Viewport`].
    fn scroll_parents(&self, element: ElementId) -> Vec<Frame>;

    /// Registers a listener for `kind` events on `source`.
    fn listen(&mut self, source: Frame, kind: EventKind) -> ListenerId;

    /// Removes a listener. Unknown ids are ignored.
    fn unlisten(&mut self, listener: ListenerId);

    /// Returns the rectangle of `frame` in viewport coordinates.
    fn frame_rect(&self, frame: Frame) -> Option<Rect> {
        match frame {
            Frame::Viewport => Some(self.viewport_rect()),
            Frame::Element(el) => self.bounding_rect(el),
        }
    }

    /// Returns the border box of `element` relative to the origin of `frame`.
    fn layout_rect(&self, frame: Frame, element: ElementId) -> Option<Rect> {
        let origin = self.frame_rect(frame)?.origin();
        let rect = self.bounding_rect(element)?;
        Some(rect - origin.to_vec2())
    }
}

/// Applies overlay decisions to the host document.
pub trait Presenter {
    /// Creates a portal root inside `host` and returns it.
    ///
    /// The body sentinel is resolved here, at mount time.
    fn mount_portal(&mut self, host: ContainerRef) -> ElementId;

    /// Creates a child of `parent`, appended after existing children.
    fn create_element(&mut self, parent: ElementId, role: ElementRole) -> ElementId;

    /// Detaches `element` and its subtree.
    fn remove_element(&mut self, element: ElementId);

    /// Starts the named animation on `element`.
    fn play_animation(&mut self, element: ElementId, name: &str, duration: Duration)
    -> AnimationId;

    /// Cancels a running animation; its completion must not be delivered.
    fn cancel_animation(&mut self, animation: AnimationId);

    /// Writes position mode and all four inset properties; unset axes are
    /// cleared.
    fn apply_inset(&mut self, element: ElementId, inset: &InsetInstruction);

    /// Sets or clears a vertical translate on `element`.
    fn set_translate_y(&mut self, element: ElementId, dy: Option<f64>);

    /// Pins the height of `element`.
    fn set_fixed_height(&mut self, element: ElementId, height: f64);

    /// Enables or disables page scrolling.
    fn set_scroll_lock(&mut self, locked: bool);
}

/// A backend implementing both halves of the contract.
pub trait Host: DomProbe + Presenter {}

impl<T: DomProbe + Presenter + ?Sized> Host for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessHost;

    #[test]
    fn body_sentinel_and_body_element_resolve_to_viewport() {
        let host = HeadlessHost::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let body = host.body();
        assert_eq!(ContainerRef::DocumentBody.resolve(&host), Frame::Viewport);
        assert_eq!(ContainerRef::Element(body).resolve(&host), Frame::Viewport);
    }

    #[test]
    fn explicit_container_resolves_to_element() {
        let mut host = HeadlessHost::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let panel = host.add_element(host.body(), Rect::new(10.0, 20.0, 210.0, 120.0));
        assert_eq!(
            ContainerRef::Element(panel).resolve(&host),
            Frame::Element(panel)
        );
        assert!(ContainerRef::Element(panel).is_custom());
        assert!(!ContainerRef::DocumentBody.is_custom());
    }

    #[test]
    fn layout_rect_is_relative_to_frame() {
        let mut host = HeadlessHost::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let panel = host.add_element(host.body(), Rect::new(10.0, 20.0, 210.0, 120.0));
        let child = host.add_element(panel, Rect::new(15.0, 30.0, 65.0, 50.0));
        assert_eq!(
            host.layout_rect(Frame::Element(panel), child),
            Some(Rect::new(5.0, 10.0, 55.0, 30.0))
        );
        assert_eq!(
            host.layout_rect(Frame::Viewport, child),
            Some(Rect::new(15.0, 30.0, 65.0, 50.0))
        );
    }
}
