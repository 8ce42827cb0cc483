//! Union-find (disjoint set union) carrying a seed label per component.
//!
//! Labels are attached to roots. A union adopts whichever label is present,
//! and two components carrying different labels are never united.

use crate::ids::GroupId;

#[derive(Clone, Debug)]
pub(super) struct LabelledDisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
    label: Vec<Option<GroupId>>,
}

impl LabelledDisjointSet {
    /// Creates singleton components, one per entry of `labels`.
    pub(super) fn new(labels: Vec<Option<GroupId>>) -> Self {
        let n = labels.len();
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            label: labels,
        }
    }

    pub(super) fn find(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        while self.parent[node] != node {
            let parent = self.parent[node];
            self.parent[node] = root;
            node = parent;
        }

        root
    }

    /// Returns `true` when the two roots carry different labels.
    pub(super) fn conflicts(&self, left: usize, right: usize) -> bool {
        matches!(
            (self.label[left], self.label[right]),
            (Some(a), Some(b)) if a != b
        )
    }

    /// Unites two distinct, non-conflicting roots and returns
    /// `(survivor, absorbed)`.
    pub(super) fn union_roots(&mut self, left: usize, right: usize) -> (usize, usize) {
        debug_assert_ne!(left, right, "roots must differ");
        debug_assert!(!self.conflicts(left, right), "labels must agree");
        let (mut left, mut right) = (left, right);
        let left_rank = self.rank[left];
        let right_rank = self.rank[right];
        if left_rank < right_rank {
            std::mem::swap(&mut left, &mut right);
        }
        self.parent[right] = left;
        if left_rank == right_rank {
            self.rank[left] = left_rank.saturating_add(1);
        }
        self.label[left] = self.label[left].or(self.label[right]);
        (left, right)
    }

    /// Flattens the forest into `(root per node, label per node)`.
    pub(super) fn into_components(mut self) -> (Vec<usize>, Vec<Option<GroupId>>) {
        let roots = (0..self.parent.len())
            .map(|node| self.find(node))
            .collect();
        (roots, self.label)
    }
}
