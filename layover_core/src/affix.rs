// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Script-driven sticky positioning.
//!
//! An [`AffixTracker`] keeps an element within `offset_top` of the top (or
//! `offset_bottom` of the bottom) of its nearest scroll container by writing
//! a vertical translate. It listens to scroll events on every scroll
//! ancestor of the element, since any of them can move it.
//!
//! ```text
//!            actual < offset                 accumulated dy < 0
//!   None ─────────────────────► Top ───────────────────────────► None
//!
//!            actual < offset                 accumulated dy > 0
//!   None ─────────────────────► Bottom ────────────────────────► None
//! ```
//!
//! While affixed, each event adds the distance between the measured and
//! the requested offset to `dy`, so the element is held in place until the
//! natural position comes back past the anchor. `offset_top` wins when both
//! are set.

use alloc::vec::Vec;

use crate::backend::{EventKind, Frame, Host};
use crate::id::{ElementId, ListenerId};

/// Requested sticky offsets, in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AffixConfig {
    /// Distance to keep from the container's top edge.
    pub offset_top: Option<f64>,
    /// Distance to keep from the container's bottom edge.
    pub offset_bottom: Option<f64>,
}

impl AffixConfig {
    /// Sticks to the top edge.
    #[must_use]
    pub const fn top(offset: f64) -> Self {
        Self {
            offset_top: Some(offset),
            offset_bottom: None,
        }
    }

    /// Sticks to the bottom edge.
    #[must_use]
    pub const fn bottom(offset: f64) -> Self {
        Self {
            offset_top: None,
            offset_bottom: Some(offset),
        }
    }
}

/// Which edge, if any, the element is currently held against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AffixMode {
    /// In normal flow.
    #[default]
    None,
    /// Held against the top edge.
    Top,
    /// Held against the bottom edge.
    Bottom,
}

/// Sticky state for one element.
#[derive(Debug)]
pub struct AffixTracker {
    target: ElementId,
    config: AffixConfig,
    container: Option<Frame>,
    listeners: Vec<ListenerId>,
    mode: AffixMode,
    dy: f64,
}

impl AffixTracker {
    /// Creates a detached tracker.
    #[must_use]
    pub fn new(target: ElementId, config: AffixConfig) -> Self {
        Self {
            target,
            config,
            container: None,
            listeners: Vec::new(),
            mode: AffixMode::None,
            dy: 0.0,
        }
    }

    /// Starts listening to the target's scroll ancestors and evaluates once.
    ///
    /// The nearest ancestor is the container offsets are measured against.
    /// Attaching again rebuilds the listener set from scratch.
    pub fn attach(&mut self, host: &mut dyn Host) {
        self.detach(host);
        let parents = host.scroll_parents(self.target);
        self.container = parents.first().copied();
        self.listeners = parents
            .into_iter()
            .map(|frame| host.listen(frame, EventKind::Scroll))
            .collect();
        self.update(host);
    }

    /// Releases every listener and clears any translate written.
    pub fn detach(&mut self, host: &mut dyn Host) {
        for listener in self.listeners.drain(..) {
            host.unlisten(listener);
        }
        if self.mode != AffixMode::None {
            host.set_translate_y(self.target, None);
        }
        self.container = None;
        self.mode = AffixMode::None;
        self.dy = 0.0;
    }

    /// Replaces the offsets and re-evaluates with the current state.
    pub fn set_config(&mut self, config: AffixConfig, host: &mut dyn Host) {
        if self.config == config {
            return;
        }
        self.config = config;
        self.update(host);
    }

    /// Handles a fired listener. Returns `false` if it is not one of ours.
    pub fn handle_event(&mut self, listener: ListenerId, host: &mut dyn Host) -> bool {
        if !self.listeners.contains(&listener) {
            return false;
        }
        self.update(host);
        true
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> AffixMode {
        self.mode
    }

    /// Translate currently applied, zero when not affixed.
    #[must_use]
    pub fn dy(&self) -> f64 {
        if self.mode == AffixMode::None {
            0.0
        } else {
            self.dy
        }
    }

    /// Current offsets.
    #[must_use]
    pub fn config(&self) -> AffixConfig {
        self.config
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn update(&mut self, host: &mut dyn Host) {
        let Some(container) = self.container else {
            return;
        };
        let (Some(frame), Some(target)) = (
            host.frame_rect(container),
            host.bounding_rect(self.target),
        ) else {
            return;
        };
        let actual_top = target.y0 - frame.y0;
        let actual_bottom = frame.y1 - target.y1;

        let translate = if let Some(offset) = self.config.offset_top {
            match self.mode {
                AffixMode::None if actual_top < offset => {
                    self.mode = AffixMode::Top;
                    self.dy = offset - actual_top;
                    Some(Some(self.dy))
                }
                AffixMode::Top if actual_top != offset => {
                    self.dy += offset - actual_top;
                    if self.dy < 0.0 {
                        self.mode = AffixMode::None;
                        Some(None)
                    } else {
                        Some(Some(self.dy))
                    }
                }
                _ => None,
            }
        } else if let Some(offset) = self.config.offset_bottom {
            match self.mode {
                AffixMode::None if actual_bottom < offset => {
                    self.mode = AffixMode::Bottom;
                    self.dy = actual_bottom - offset;
                    Some(Some(self.dy))
                }
                AffixMode::Bottom if actual_bottom != offset => {
                    self.dy += actual_bottom - offset;
                    if self.dy > 0.0 {
                        self.mode = AffixMode::None;
                        Some(None)
                    } else {
                        Some(Some(self.dy))
                    }
                }
                _ => None,
            }
        } else {
            None
        };

        if let Some(dy) = translate {
            log::trace!("affix {:?}: {:?} dy={dy:?}", self.target, self.mode);
            host.set_translate_y(self.target, dy);
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::backend::DomProbe;
    use crate::headless::HeadlessHost;

    struct Scene {
        host: HeadlessHost,
        scroller: ElementId,
        target: ElementId,
    }

    /// A 300px tall scroll container holding a 50px tall target at `y`.
    fn scene(y: f64) -> Scene {
        let mut host = HeadlessHost::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let scroller = host.add_element(host.body(), Rect::new(0.0, 0.0, 400.0, 300.0));
        host.set_scrollable(scroller, true);
        let target = host.add_element(scroller, Rect::new(0.0, y, 400.0, y + 50.0));
        Scene {
            host,
            scroller,
            target,
        }
    }

    impl Scene {
        /// Moves the target's untranslated position and delivers the scroll.
        fn scroll_to(&mut self, tracker: &mut AffixTracker, y: f64) {
            self.host
                .set_rect(self.target, Rect::new(0.0, y, 400.0, y + 50.0));
            for listener in self.host.fire(Frame::Element(self.scroller), EventKind::Scroll) {
                assert!(tracker.handle_event(listener, &mut self.host));
            }
        }

        fn top(&self) -> f64 {
            self.host.bounding_rect(self.target).unwrap().y0
        }
    }

    #[test]
    fn listens_on_every_scroll_ancestor() {
        let mut s = scene(100.0);
        let mut tracker = AffixTracker::new(s.target, AffixConfig::top(10.0));
        tracker.attach(&mut s.host);
        assert_eq!(tracker.listener_count(), 2, "scroller and window");
        assert_eq!(s.host.listeners_on(Frame::Element(s.scroller)), 1);
        assert_eq!(s.host.listeners_on(Frame::Viewport), 1);

        tracker.detach(&mut s.host);
        assert_eq!(s.host.listener_count(), 0);
    }

    #[test]
    fn top_affix_holds_then_releases() {
        let mut s = scene(100.0);
        let mut tracker = AffixTracker::new(s.target, AffixConfig::top(10.0));
        tracker.attach(&mut s.host);
        assert_eq!(tracker.mode(), AffixMode::None);

        s.scroll_to(&mut tracker, 5.0);
        assert_eq!(tracker.mode(), AffixMode::Top);
        assert_eq!(tracker.dy(), 5.0);
        assert_eq!(s.top(), 10.0);

        s.scroll_to(&mut tracker, -15.0);
        assert_eq!(tracker.dy(), 25.0);
        assert_eq!(s.top(), 10.0);

        s.scroll_to(&mut tracker, 50.0);
        assert_eq!(tracker.mode(), AffixMode::None);
        assert_eq!(s.host.translate_y(s.target), None);
        assert_eq!(s.top(), 50.0);
    }

    #[test]
    fn bottom_affix_holds() {
        let mut s = scene(240.0);
        let mut tracker = AffixTracker::new(s.target, AffixConfig::bottom(10.0));
        tracker.attach(&mut s.host);
        assert_eq!(tracker.mode(), AffixMode::None);

        s.scroll_to(&mut tracker, 280.0);
        assert_eq!(tracker.mode(), AffixMode::Bottom);
        assert_eq!(tracker.dy(), -40.0);
        assert_eq!(s.host.bounding_rect(s.target).unwrap().y1, 290.0);

        s.scroll_to(&mut tracker, 200.0);
        assert_eq!(tracker.mode(), AffixMode::None);
    }

    #[test]
    fn config_change_reevaluates_in_place() {
        let mut s = scene(5.0);
        let mut tracker = AffixTracker::new(s.target, AffixConfig::top(10.0));
        tracker.attach(&mut s.host);
        assert_eq!(s.top(), 10.0, "affixed on attach");

        tracker.set_config(AffixConfig::top(30.0), &mut s.host);
        assert_eq!(tracker.dy(), 25.0);
        assert_eq!(s.top(), 30.0);
        assert_eq!(tracker.listener_count(), 2, "listeners untouched");
    }

    #[test]
    fn foreign_listener_is_ignored() {
        let mut s = scene(100.0);
        let mut tracker = AffixTracker::new(s.target, AffixConfig::top(10.0));
        tracker.attach(&mut s.host);
        let other = s.host.listen(Frame::Element(s.scroller), EventKind::Resize);
        assert!(!tracker.handle_event(other, &mut s.host));
    }

    #[test]
    fn detach_clears_translate() {
        let mut s = scene(0.0);
        let mut tracker = AffixTracker::new(s.target, AffixConfig::top(10.0));
        tracker.attach(&mut s.host);
        assert_eq!(s.host.translate_y(s.target), Some(10.0));
        tracker.detach(&mut s.host);
        assert_eq!(s.host.translate_y(s.target), None);
        assert_eq!(tracker.mode(), AffixMode::None);
    }
}
