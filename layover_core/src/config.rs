// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay configuration and widget presets.
//!
//! Composite widgets are thin layers over the lifecycle controller: each one
//! is an [`OverlayOptions`] preset plus a render callback. The presets here
//! carry the defaults those widgets use.

use crate::backend::ContainerRef;
use crate::placement::Placement;
use crate::position::PositionMode;
use crate::time::Duration;

/// Entry and exit animation names plus their shared duration.
///
/// Names are unprefixed; backends prepend
/// [`OverlayBehavior::class_name_prefix`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationSpec {
    /// Animation played while opening.
    pub enter: &'static str,
    /// Animation played while closing.
    pub exit: &'static str,
    /// Duration of each animation.
    pub duration: Duration,
}

impl AnimationSpec {
    /// Default duration for overlays that do not set one.
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(200);

    /// Creates a spec with the default duration.
    #[must_use]
    pub const fn new(enter: &'static str, exit: &'static str) -> Self {
        Self {
            enter,
            exit,
            duration: Self::DEFAULT_DURATION,
        }
    }

    /// Returns the animation with a different duration.
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Zoom in and out, used by dialogs and centred toasts.
    #[must_use]
    pub const fn zoom() -> Self {
        Self::new("zoomIn", "zoomOut")
    }

    /// Linear zoom over 100ms, used by tooltips.
    #[must_use]
    pub const fn linear_zoom() -> Self {
        Self::new("linearZoomIn", "linearZoomOut").with_duration(Duration::from_millis(100))
    }

    /// Slide from the drawer's side.
    #[must_use]
    pub const fn slide(side: DrawerSide) -> Self {
        match side {
            DrawerSide::Left => Self::new("slideInLeft", "slideOutLeft"),
            DrawerSide::Right => Self::new("slideInRight", "slideOutRight"),
            DrawerSide::Top => Self::new("slideInTop", "slideOutTop"),
            DrawerSide::Bottom => Self::new("slideInBottom", "slideOutBottom"),
        }
    }

    /// Default animation for a toast at `placement`, over 300ms.
    #[must_use]
    pub const fn toast(placement: Placement) -> Self {
        let spec = match placement {
            Placement::Center => Self::new("zoomIn", "zoomOut"),
            Placement::Top => Self::new("expandInDown", "expandOutUp"),
            Placement::Bottom => Self::new("expandInUp", "expandOutDown"),
            Placement::TopLeft | Placement::Left | Placement::BottomLeft => {
                Self::new("slideInLeft", "slideOutLeft")
            }
            Placement::TopRight | Placement::Right | Placement::BottomRight => {
                Self::new("slideInRight", "slideOutRight")
            }
        };
        spec.with_duration(Duration::from_millis(300))
    }
}

/// Animation collapsing the space a dismissed toast leaves behind.
pub const ZERO_HEIGHT_ANIMATION: &str = "zeroHeight";

/// How a registration interacts with the shared scroll lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScrollLockMode {
    /// Counted: the page unlocks when the last holder leaves.
    #[default]
    Nested,
    /// Reapplies the lock on every mount regardless of the count.
    Force,
}

/// Edge a drawer slides in from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DrawerSide {
    /// Left edge.
    Left,
    /// Right edge.
    #[default]
    Right,
    /// Top edge.
    Top,
    /// Bottom edge.
    Bottom,
}

impl DrawerSide {
    /// The placement a drawer on this side anchors to.
    #[must_use]
    pub const fn placement(self) -> Placement {
        match self {
            Self::Left => Placement::Left,
            Self::Right => Placement::Right,
            Self::Top => Placement::Top,
            Self::Bottom => Placement::Bottom,
        }
    }
}

/// Per-overlay options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OverlayOptions {
    /// Escape closes the overlay when it is the topmost such overlay.
    pub closes_on_escape: bool,
    /// A pointer-down outside the overlay's subtree closes it.
    pub closes_on_outside_click: bool,
    /// Page scrolling is disabled while mounted.
    pub scroll_lock: Option<ScrollLockMode>,
    /// A backdrop element is inserted before the content.
    pub backdrop: bool,
    /// Entry/exit animation; `None` makes transitions synchronous.
    pub animation: Option<AnimationSpec>,
    /// Portal host; `None` defers to [`OverlayBehavior::portal_container`].
    pub portal: Option<ContainerRef>,
    /// Registers with the manager while mounted.
    pub attach_to_manager: bool,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self::popup()
    }
}

impl OverlayOptions {
    /// A bare overlay: no dismissal routes, no lock, no animation.
    #[must_use]
    pub const fn popup() -> Self {
        Self {
            closes_on_escape: false,
            closes_on_outside_click: false,
            scroll_lock: None,
            backdrop: false,
            animation: None,
            portal: None,
            attach_to_manager: true,
        }
    }

    /// Modal dialog: backdrop, scroll lock, zoom animation.
    ///
    /// Escape and outside clicks do not close dialogs unless enabled.
    #[must_use]
    pub const fn dialog() -> Self {
        Self {
            closes_on_escape: false,
            closes_on_outside_click: false,
            scroll_lock: Some(ScrollLockMode::Nested),
            backdrop: true,
            animation: Some(AnimationSpec::zoom()),
            portal: None,
            attach_to_manager: true,
        }
    }

    /// Drawer sliding in from `side`.
    #[must_use]
    pub const fn drawer(side: DrawerSide) -> Self {
        Self {
            closes_on_escape: true,
            closes_on_outside_click: true,
            scroll_lock: Some(ScrollLockMode::Nested),
            backdrop: true,
            animation: Some(AnimationSpec::slide(side)),
            portal: None,
            attach_to_manager: true,
        }
    }

    /// Tooltip: linear zoom, no dismissal routes.
    #[must_use]
    pub const fn tooltip() -> Self {
        Self {
            animation: Some(AnimationSpec::linear_zoom()),
            ..Self::popup()
        }
    }

    /// Container for a group of toasts.
    ///
    /// Unanimated and unmanaged; individual toasts animate themselves.
    #[must_use]
    pub const fn toast_list() -> Self {
        Self {
            attach_to_manager: false,
            ..Self::popup()
        }
    }

    /// A single toast inside a list.
    #[must_use]
    pub const fn toast(placement: Placement) -> Self {
        Self {
            animation: Some(AnimationSpec::toast(placement)),
            attach_to_manager: false,
            ..Self::popup()
        }
    }

    /// Returns the options with the given animation.
    #[must_use]
    pub const fn with_animation(mut self, animation: Option<AnimationSpec>) -> Self {
        self.animation = animation;
        self
    }

    /// Returns the options with an explicit portal host.
    #[must_use]
    pub const fn with_portal(mut self, portal: ContainerRef) -> Self {
        self.portal = Some(portal);
        self
    }
}

/// Defaults shared by every overlay in one document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OverlayBehavior {
    /// Portal host used when an overlay sets none.
    pub portal_container: ContainerRef,
    /// Prefix applied to class and animation names.
    pub class_name_prefix: &'static str,
}

impl Default for OverlayBehavior {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayBehavior {
    /// Body portal, `layover-` prefix.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            portal_container: ContainerRef::DocumentBody,
            class_name_prefix: "layover-",
        }
    }

    /// Resolves the portal host for `options`.
    #[must_use]
    pub fn portal_for(&self, options: &OverlayOptions) -> ContainerRef {
        options.portal.unwrap_or(self.portal_container)
    }

    /// Whether `options` render into an explicit element.
    #[must_use]
    pub fn is_custom_portal(&self, options: &OverlayOptions) -> bool {
        self.portal_for(options).is_custom()
    }

    /// Position mode for content that fills its portal, such as a drawer.
    ///
    /// Content inside a custom container scrolls with it.
    #[must_use]
    pub fn content_position(&self, options: &OverlayOptions) -> PositionMode {
        if self.is_custom_portal(options) {
            PositionMode::Absolute
        } else {
            PositionMode::Fixed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ElementId;

    #[test]
    fn presets_match_widget_defaults() {
        let dialog = OverlayOptions::dialog();
        assert!(dialog.backdrop);
        assert!(!dialog.closes_on_escape);
        assert_eq!(dialog.scroll_lock, Some(ScrollLockMode::Nested));
        assert_eq!(dialog.animation.unwrap().enter, "zoomIn");

        let drawer = OverlayOptions::drawer(DrawerSide::Left);
        assert!(drawer.closes_on_escape && drawer.closes_on_outside_click);
        assert_eq!(drawer.animation.unwrap().exit, "slideOutLeft");
        assert_eq!(DrawerSide::Left.placement(), Placement::Left);

        assert_eq!(
            OverlayOptions::tooltip().animation.unwrap().duration,
            Duration::from_millis(100)
        );
        assert!(!OverlayOptions::toast_list().attach_to_manager);
    }

    #[test]
    fn toast_animation_follows_placement() {
        assert_eq!(AnimationSpec::toast(Placement::Top).enter, "expandInDown");
        assert_eq!(AnimationSpec::toast(Placement::Bottom).exit, "expandOutDown");
        assert_eq!(AnimationSpec::toast(Placement::Center).enter, "zoomIn");
        assert_eq!(AnimationSpec::toast(Placement::BottomLeft).enter, "slideInLeft");
        assert_eq!(AnimationSpec::toast(Placement::TopRight).exit, "slideOutRight");
        assert_eq!(
            AnimationSpec::toast(Placement::Top).duration,
            Duration::from_millis(300)
        );
    }

    #[test]
    fn custom_portal_switches_to_absolute() {
        let behavior = OverlayBehavior::new();
        let drawer = OverlayOptions::drawer(DrawerSide::Right);
        assert_eq!(behavior.content_position(&drawer), PositionMode::Fixed);

        let scoped = drawer.with_portal(ContainerRef::Element(ElementId(7)));
        assert!(behavior.is_custom_portal(&scoped));
        assert_eq!(behavior.content_position(&scoped), PositionMode::Absolute);

        let inherited = OverlayBehavior {
            portal_container: ContainerRef::Element(ElementId(3)),
            ..OverlayBehavior::new()
        };
        assert_eq!(
            inherited.portal_for(&drawer),
            ContainerRef::Element(ElementId(3))
        );
    }
}
