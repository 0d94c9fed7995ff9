// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named anchor points inside a container.
//!
//! ```text
//!   top-left ─────── top ─────── top-right
//!      │                             │
//!    left ───────── center ──────── right
//!      │                             │
//!  bottom-left ──── bottom ──── bottom-right
//! ```
//!
//! Each placement is a pair of steps along the two axes: `0` hugs the start
//! edge, `1` centres, `2` hugs the end edge. The position engine multiplies
//! each step by half the free space on that axis.

use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use kurbo::Vec2;

/// One of the nine anchor points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Top-left corner.
    TopLeft,
    /// Top edge, horizontally centred.
    #[default]
    Top,
    /// Top-right corner.
    TopRight,
    /// Left edge, vertically centred.
    Left,
    /// Centre of the container.
    Center,
    /// Right edge, vertically centred.
    Right,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom edge, horizontally centred.
    Bottom,
    /// Bottom-right corner.
    BottomRight,
}

impl Placement {
    /// All placements in row-major order.
    pub const ALL: [Self; 9] = [
        Self::TopLeft,
        Self::Top,
        Self::TopRight,
        Self::Left,
        Self::Center,
        Self::Right,
        Self::BottomLeft,
        Self::Bottom,
        Self::BottomRight,
    ];

    /// Returns the kebab-case name (`"bottom-right"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::Top => "top",
            Self::TopRight => "top-right",
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::BottomLeft => "bottom-left",
            Self::Bottom => "bottom",
            Self::BottomRight => "bottom-right",
        }
    }

    /// Returns the `(x, y)` step pair, each in `0..=2`.
    #[must_use]
    pub const fn steps(self) -> (u8, u8) {
        match self {
            Self::TopLeft => (0, 0),
            Self::Top => (1, 0),
            Self::TopRight => (2, 0),
            Self::Left => (0, 1),
            Self::Center => (1, 1),
            Self::Right => (2, 1),
            Self::BottomLeft => (0, 2),
            Self::Bottom => (1, 2),
            Self::BottomRight => (2, 2),
        }
    }

    /// Whether the placement touches the left edge.
    #[must_use]
    pub const fn is_left(self) -> bool {
        self.steps().0 == 0
    }

    /// Whether the placement touches the right edge.
    #[must_use]
    pub const fn is_right(self) -> bool {
        self.steps().0 == 2
    }

    /// Whether the placement touches the top edge.
    #[must_use]
    pub const fn is_top(self) -> bool {
        self.steps().1 == 0
    }

    /// Whether the placement touches the bottom edge.
    #[must_use]
    pub const fn is_bottom(self) -> bool {
        self.steps().1 == 2
    }

    /// Default inset for a toast list at this placement.
    ///
    /// Lists are pushed 24px away from every edge they hug; centred axes get
    /// no offset.
    #[must_use]
    pub fn default_toast_offset(self) -> Vec2 {
        let x = if self.is_left() {
            24.0
        } else if self.is_right() {
            -24.0
        } else {
            0.0
        };
        let y = if self.is_top() {
            24.0
        } else if self.is_bottom() {
            -24.0
        } else {
            0.0
        };
        Vec2::new(x, y)
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Placement {
    type Err = PlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PlacementError {
                name: String::from(s),
            })
    }
}

/// An unrecognized placement name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementError {
    name: String,
}

impl PlacementError {
    /// Returns the rejected name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid placement `{}`", self.name)
    }
}

impl core::error::Error for PlacementError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for p in Placement::ALL {
            assert_eq!(p.as_str().parse::<Placement>(), Ok(p));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "middle".parse::<Placement>().unwrap_err();
        assert_eq!(err.name(), "middle");
        assert_eq!(alloc::format!("{err}"), "invalid placement `middle`");
    }

    #[test]
    fn toast_offsets_point_inwards() {
        assert_eq!(Placement::TopLeft.default_toast_offset(), Vec2::new(24.0, 24.0));
        assert_eq!(Placement::Top.default_toast_offset(), Vec2::new(0.0, 24.0));
        assert_eq!(
            Placement::BottomRight.default_toast_offset(),
            Vec2::new(-24.0, -24.0)
        );
        assert_eq!(Placement::Center.default_toast_offset(), Vec2::ZERO);
        assert_eq!(Placement::Left.default_toast_offset(), Vec2::new(24.0, 0.0));
    }
}
