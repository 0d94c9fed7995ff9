// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity types.
//!
//! Host-assigned handles ([`ElementId`], [`ListenerId`], [`AnimationId`]) are
//! opaque to the core. Core-assigned handles ([`BindingId`], [`OverlayId`])
//! carry a slot index and a generation counter so that a handle kept past
//! teardown is detected as stale instead of silently addressing whatever
//! reused its slot.

use alloc::vec::Vec;
use core::fmt;

/// An element in the host document.
///
/// Backends assign these; the core only passes them back.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u32);

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

/// A live event listener registered through
/// [`DomProbe::listen`](crate::backend::DomProbe::listen).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

/// A running animation started through
/// [`Presenter::play_animation`](crate::backend::Presenter::play_animation).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimationId(pub u64);

impl fmt::Debug for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnimationId({})", self.0)
    }
}

macro_rules! generational_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            pub(crate) idx: u32,
            pub(crate) generation: u32,
        }

        impl $name {
            pub(crate) const fn new((idx, generation): (u32, u32)) -> Self {
                Self { idx, generation }
            }

            /// Returns the raw slot index (for diagnostics only).
            #[inline]
            #[must_use]
            pub const fn index(self) -> u32 {
                self.idx
            }

            /// Returns the generation counter.
            #[inline]
            #[must_use]
            pub const fn generation(self) -> u32 {
                self.generation
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({}@gen{})"), self.idx, self.generation)
            }
        }

    };
}

generational_id! {
    /// A handle to a position binding in a
    /// [`PositionEngine`](crate::position::PositionEngine).
    BindingId
}

generational_id! {
    /// A handle to an overlay registered with the
    /// [`OverlayManager`](crate::manager::OverlayManager).
    OverlayId
}

/// Generational slot storage backing the core-assigned handles.
///
/// Freed slots are recycled; each free bumps the slot generation so old
/// handles fail lookup.
#[derive(Debug)]
pub(crate) struct Slots<T> {
    entries: Vec<Option<T>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
        }
    }
}

impl<T> Slots<T> {
    /// Stores `value` and returns `(index, generation)`.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "slot count never approaches u32::MAX"
    )]
    pub(crate) fn insert(&mut self, value: T) -> (u32, u32) {
        if let Some(idx) = self.free_list.pop() {
            self.entries[idx as usize] = Some(value);
            (idx, self.generation[idx as usize])
        } else {
            let idx = self.entries.len() as u32;
            self.entries.push(Some(value));
            self.generation.push(0);
            (idx, 0)
        }
    }

    pub(crate) fn get(&self, idx: u32, generation: u32) -> Option<&T> {
        if self.generation.get(idx as usize) != Some(&generation) {
            return None;
        }
        self.entries.get(idx as usize)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, idx: u32, generation: u32) -> Option<&mut T> {
        if self.generation.get(idx as usize) != Some(&generation) {
            return None;
        }
        self.entries.get_mut(idx as usize)?.as_mut()
    }

    /// Removes the value, bumping the slot generation.
    pub(crate) fn remove(&mut self, idx: u32, generation: u32) -> Option<T> {
        if self.generation.get(idx as usize) != Some(&generation) {
            return None;
        }
        let value = self.entries.get_mut(idx as usize)?.take()?;
        self.generation[idx as usize] = generation.wrapping_add(1);
        self.free_list.push(idx);
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_prevents_stale_access() {
        let mut slots = Slots::default();
        let (idx, generation) = slots.insert("first");
        assert_eq!(slots.remove(idx, generation), Some("first"));
        let (idx2, generation2) = slots.insert("second");
        assert_eq!(idx, idx2, "freed slot should be reused");
        assert_ne!(generation, generation2);
        assert!(slots.get(idx, generation).is_none());
        assert_eq!(slots.get(idx2, generation2), Some(&"second"));
    }

    #[test]
    fn double_remove_is_none() {
        let mut slots = Slots::default();
        let (idx, generation) = slots.insert(1_u8);
        assert!(slots.remove(idx, generation).is_some());
        assert!(slots.remove(idx, generation).is_none());
        assert_eq!(slots.len(), 0);
    }

    #[test]
    fn debug_formats_generation() {
        let id = BindingId::new((3, 7));
        assert_eq!(alloc::format!("{id:?}"), "BindingId(3@gen7)");
    }
}
