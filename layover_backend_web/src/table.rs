// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-side bookkeeping that never touches the DOM.
//!
//! [`ElementTable`] maps [`ElementId`]s to nodes. Freed slots are recycled;
//! each id packs a slot index in its low 20 bits and the slot's generation
//! above them, so an id kept past a sweep fails lookup instead of
//! naming whatever reused its slot. Nodes carry their id as a stamp, which
//! makes looking a node up by identity a single slot probe.
//!
//! [`AnimationBook`] tracks animations awaiting completion, including ones
//! that settled at start because there was nothing to animate.

use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};
use layover_core::id::{AnimationId, ElementId};

const INDEX_BITS: u32 = 20;
const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: u32 = u32::MAX >> INDEX_BITS;

/// An id no slot ever holds; every lookup on it fails.
pub(crate) const DETACHED: ElementId = ElementId(u32::MAX);

/// A node the element table can track.
pub(crate) trait TrackedNode {
    /// Whether `self` and `other` are the same node.
    fn same_node(&self, other: &Self) -> bool;
    /// Whether the node is still in the document.
    fn is_connected(&self) -> bool;
    /// The raw id last stamped on the node, if any.
    fn stamp(&self) -> Option<u32>;
    /// Stamps a raw id on the node.
    fn set_stamp(&self, raw: u32);
}

fn pack(idx: u32, generation: u32) -> ElementId {
    ElementId(((generation & GENERATION_MASK) << INDEX_BITS) | idx)
}

fn unpack(id: ElementId) -> (usize, u32) {
    ((id.0 & INDEX_MASK) as usize, id.0 >> INDEX_BITS)
}

#[derive(Debug)]
struct Slot<N> {
    node: Option<N>,
    generation: u32,
}

/// Generational table of tracked nodes. Slot 0 holds the root and is never
/// swept.
#[derive(Debug)]
pub(crate) struct ElementTable<N> {
    slots: Vec<Slot<N>>,
    free: Vec<u32>,
}

impl<N: TrackedNode> ElementTable<N> {
    /// Creates a table whose slot 0 is `root`.
    pub(crate) fn new(root: N) -> Self {
        root.set_stamp(pack(0, 0).0);
        Self {
            slots: alloc::vec![Slot {
                node: Some(root),
                generation: 0,
            }],
            free: Vec::new(),
        }
    }

    pub(crate) fn get(&self, id: ElementId) -> Option<&N> {
        let (idx, generation) = unpack(id);
        let slot = self.slots.get(idx)?;
        if slot.generation != generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn find(&self, node: &N) -> Option<ElementId> {
        let id = ElementId(node.stamp()?);
        self.get(id)
            .is_some_and(|tracked| tracked.same_node(node))
            .then_some(id)
    }

    /// Returns the id of `node`, tracking it first if needed.
    ///
    /// Returns [`DETACHED`] if every index is in use.
    pub(crate) fn intern(&mut self, node: N) -> ElementId {
        if let Some(id) = self.find(&node) {
            return id;
        }
        let idx = match self.free.pop() {
            Some(idx) => idx,
            None => {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "bounded by INDEX_MASK below"
                )]
                let idx = self.slots.len() as u32;
                if idx >= INDEX_MASK {
                    log::warn!("element table is full; leaving node untracked");
                    return DETACHED;
                }
                self.slots.push(Slot {
                    node: None,
                    generation: 0,
                });
                idx
            }
        };
        let slot = &mut self.slots[idx as usize];
        let id = pack(idx, slot.generation);
        node.set_stamp(id.0);
        slot.node = Some(node);
        id
    }

    /// Frees every slot whose node left the document, except the root.
    ///
    /// Returns the ids that stopped resolving.
    pub(crate) fn sweep(&mut self) -> Vec<ElementId> {
        let mut freed = Vec::new();
        for (idx, slot) in self.slots.iter_mut().enumerate().skip(1) {
            if slot.node.as_ref().is_some_and(|n| !n.is_connected()) {
                slot.node = None;
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "slot count is capped at INDEX_MASK"
                )]
                let idx = idx as u32;
                freed.push(pack(idx, slot.generation));
                slot.generation = (slot.generation + 1) & GENERATION_MASK;
                self.free.push(idx);
            }
        }
        freed
    }

    /// Number of tracked nodes, root included.
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Number of slots ever allocated.
    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// What a queued completion resolves to.
#[derive(Debug)]
pub(crate) enum Completion<A> {
    /// A running animation finished; release its resources, then deliver.
    Ran(A),
    /// An animation that settled at start; deliver.
    Settled,
    /// Cancelled or already delivered; drop.
    Stale,
}

/// Animations whose completion is still owed to the page.
#[derive(Debug)]
pub(crate) struct AnimationBook<A> {
    running: HashMap<AnimationId, A>,
    settled: HashSet<AnimationId>,
}

impl<A> Default for AnimationBook<A> {
    fn default() -> Self {
        Self {
            running: HashMap::new(),
            settled: HashSet::new(),
        }
    }
}

impl<A> AnimationBook<A> {
    pub(crate) fn start(&mut self, id: AnimationId, running: A) {
        self.running.insert(id, running);
    }

    /// Records an animation that completed without running.
    pub(crate) fn settle(&mut self, id: AnimationId) {
        self.settled.insert(id);
    }

    /// Forgets an animation so its completion is never delivered.
    pub(crate) fn cancel(&mut self, id: AnimationId) -> Option<A> {
        self.settled.remove(&id);
        self.running.remove(&id)
    }

    /// Resolves a queued completion. Each id resolves to a delivery at most
    /// once.
    pub(crate) fn complete(&mut self, id: AnimationId) -> Completion<A> {
        if let Some(running) = self.running.remove(&id) {
            Completion::Ran(running)
        } else if self.settled.remove(&id) {
            Completion::Settled
        } else {
            Completion::Stale
        }
    }

    /// Removes every running animation matching `pred`.
    pub(crate) fn remove_where(&mut self, mut pred: impl FnMut(&A) -> bool) -> Vec<A> {
        let ids: Vec<AnimationId> = self
            .running
            .iter()
            .filter(|&(_, a)| pred(a))
            .map(|(&id, _)| id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.running.remove(&id))
            .collect()
    }

    /// Removes every running animation.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = A> + '_ {
        self.settled.clear();
        self.running.drain().map(|(_, a)| a)
    }

    /// Number of completions still owed.
    pub(crate) fn len(&self) -> usize {
        self.running.len() + self.settled.len()
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::Cell;

    use super::*;

    /// A stand-in node: identity is the `Rc` allocation.
    #[derive(Clone, Debug)]
    struct Node(Rc<NodeState>);

    #[derive(Debug, Default)]
    struct NodeState {
        connected: Cell<bool>,
        stamp: Cell<Option<u32>>,
    }

    impl Node {
        fn attached() -> Self {
            let node = Self(Rc::default());
            node.0.connected.set(true);
            node
        }

        fn detach(&self) {
            self.0.connected.set(false);
        }
    }

    impl TrackedNode for Node {
        fn same_node(&self, other: &Self) -> bool {
            Rc::ptr_eq(&self.0, &other.0)
        }

        fn is_connected(&self) -> bool {
            self.0.connected.get()
        }

        fn stamp(&self) -> Option<u32> {
            self.0.stamp.get()
        }

        fn set_stamp(&self, raw: u32) {
            self.0.stamp.set(Some(raw));
        }
    }

    #[test]
    fn root_is_slot_zero() {
        let table = ElementTable::new(Node::attached());
        assert!(table.get(ElementId(0)).is_some());
        assert!(table.get(DETACHED).is_none());
    }

    #[test]
    fn interning_the_same_node_twice_returns_one_id() {
        let mut table = ElementTable::new(Node::attached());
        let node = Node::attached();
        let a = table.intern(node.clone());
        let b = table.intern(node.clone());
        assert_eq!(a, b);
        assert_eq!(table.find(&node), Some(a));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn swept_slots_are_reused_under_a_new_generation() {
        let mut table = ElementTable::new(Node::attached());
        let old = Node::attached();
        let old_id = table.intern(old.clone());
        old.detach();
        assert_eq!(table.sweep(), alloc::vec![old_id]);
        assert!(table.get(old_id).is_none(), "stale ids stop resolving");
        assert_eq!(table.find(&old), None);

        let new_id = table.intern(Node::attached());
        assert_ne!(new_id, old_id);
        assert_eq!(new_id.0 & INDEX_MASK, old_id.0 & INDEX_MASK);
        assert!(table.get(old_id).is_none());
        assert!(table.get(new_id).is_some());
    }

    #[test]
    fn churn_does_not_grow_the_table() {
        let mut table = ElementTable::new(Node::attached());
        for _ in 0..1_000 {
            let nodes: Vec<Node> = (0..3).map(|_| Node::attached()).collect();
            for node in &nodes {
                table.intern(node.clone());
            }
            for node in &nodes {
                node.detach();
            }
            assert_eq!(table.sweep().len(), 3);
        }
        assert_eq!(table.len(), 1);
        assert_eq!(table.capacity(), 4);
    }

    #[test]
    fn reinserted_node_gets_a_fresh_id() {
        let mut table = ElementTable::new(Node::attached());
        let node = Node::attached();
        let first = table.intern(node.clone());
        node.detach();
        table.sweep();
        node.0.connected.set(true);
        let second = table.intern(node.clone());
        assert_ne!(first, second);
        assert_eq!(table.find(&node), Some(second));
    }

    #[test]
    fn settled_animation_is_delivered_once() {
        let mut book = AnimationBook::<&str>::default();
        book.settle(AnimationId(4));
        assert_eq!(book.len(), 1);
        assert!(matches!(book.complete(AnimationId(4)), Completion::Settled));
        assert!(matches!(book.complete(AnimationId(4)), Completion::Stale));
        assert_eq!(book.len(), 0);
    }

    #[test]
    fn cancelled_animations_never_complete() {
        let mut book = AnimationBook::default();
        book.start(AnimationId(1), "enter");
        book.settle(AnimationId(2));
        assert_eq!(book.cancel(AnimationId(1)), Some("enter"));
        assert_eq!(book.cancel(AnimationId(2)), None);
        assert!(matches!(book.complete(AnimationId(1)), Completion::Stale));
        assert!(matches!(book.complete(AnimationId(2)), Completion::Stale));
    }

    #[test]
    fn running_animation_resolves_with_its_state() {
        let mut book = AnimationBook::default();
        book.start(AnimationId(7), "exit");
        book.start(AnimationId(8), "shrink");
        assert!(matches!(book.complete(AnimationId(7)), Completion::Ran("exit")));
        assert_eq!(book.remove_where(|&a| a == "shrink"), alloc::vec!["shrink"]);
        assert_eq!(book.len(), 0);
    }
}
