use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::error::{HeapError, Result};

/// A node in the heap. `priority` is used to order nodes (smallest = highest priority).
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeapNode<K, P> {
    key: K,
    priority: P,
    /// Where this node's heap index sits inside its key's occurrence stack.
    occurrence: usize,
}

/// An indexed min-heap. The smallest `priority` is at the "top".
///
/// Unlike a plain binary heap, every key is indexed to the heap slots it
/// occupies, so an entry can be found, removed or reprioritized by key in
/// O(log n). The same key may be inserted any number of times; each
/// insertion is a separate entry with its own priority.
///
/// Per key, the occupied slots are kept as an occurrence stack. When a key
/// has several entries, [`delete`](Self::delete) removes the one on top of
/// that stack. Which entry that is carries no meaning for callers beyond
/// being deterministic for a given sequence of operations.
///
/// [`change_priority`](Self::change_priority) refuses keys that occur more
/// than once instead of guessing which entry was meant.
#[derive(Debug, Clone)]
pub struct IndexedMinHeap<K, P> {
    /// The actual heap storage (array-based).
    nodes: Vec<HeapNode<K, P>>,
    /// Maps keys -> every index in `nodes` holding that key. Stacks are never empty.
    positions: HashMap<K, Vec<usize>>,
}

impl<K, P> Default for IndexedMinHeap<K, P> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<K, P> IndexedMinHeap<K, P>
where
    K: Eq + std::hash::Hash + Clone,
    P: Ord + Clone,
{
    /// Creates an empty IndexedMinHeap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty IndexedMinHeap with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// Builds a heap from `(key, priority)` pairs in O(n).
    ///
    /// Duplicate keys are accepted exactly as repeated [`insert`](Self::insert)
    /// calls would accept them.
    pub fn heapify<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
    {
        let mut positions: HashMap<K, Vec<usize>> = HashMap::new();
        let nodes: Vec<_> = entries
            .into_iter()
            .enumerate()
            .map(|(idx, (key, priority))| {
                let stack = positions.entry(key.clone()).or_default();
                let occurrence = stack.len();
                stack.push(idx);
                HeapNode {
                    key,
                    priority,
                    occurrence,
                }
            })
            .collect();

        let mut heap = Self { nodes, positions };
        for idx in (0..heap.nodes.len() / 2).rev() {
            heap.sift_down(idx);
        }
        heap
    }

    /// Returns the number of entries in the heap.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the heap is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if at least one entry has `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Returns how many entries have `key`.
    pub fn occurrences(&self, key: &K) -> usize {
        self.positions.get(key).map_or(0, Vec::len)
    }

    /// Inserts a new `(key, priority)` entry.
    ///
    /// An existing entry with the same key is left alone; the key simply
    /// gains another occurrence.
    pub fn insert(&mut self, key: K, priority: P) {
        let idx = self.nodes.len();
        let stack = self.positions.entry(key.clone()).or_default();
        let occurrence = stack.len();
        stack.push(idx);
        self.nodes.push(HeapNode {
            key,
            priority,
            occurrence,
        });
        self.sift_up(idx);
    }

    /// Returns a copy of the `(key, priority)` with the smallest priority.
    pub fn peek(&self) -> Result<(K, P)> {
        self.nodes
            .first()
            .map(|node| (node.key.clone(), node.priority.clone()))
            .ok_or(HeapError::EmptyContainer)
    }

    /// Removes and returns the `(key, priority)` with the smallest priority.
    pub fn extract_min(&mut self) -> Result<(K, P)> {
        if self.nodes.is_empty() {
            return Err(HeapError::EmptyContainer);
        }
        let min_node = self.remove_slot(0);

        if !self.nodes.is_empty() {
            self.sift_down(0);
        }

        Ok((min_node.key, min_node.priority))
    }

    /// Removes one entry with `key` and returns it.
    ///
    /// With several entries for `key`, the one on top of its occurrence
    /// stack goes.
    pub fn delete(&mut self, key: &K) -> Result<(K, P)> {
        let idx = self
            .positions
            .get(key)
            .and_then(|stack| stack.last())
            .copied()
            .ok_or(HeapError::KeyNotFound)?;

        let removed_node = self.remove_slot(idx);

        // The entry moved into `idx` may belong lower or higher.
        if idx < self.nodes.len() && self.sift_down(idx) == idx {
            self.sift_up(idx);
        }

        Ok((removed_node.key, removed_node.priority))
    }

    /// Sets the priority of the single entry with `key`, returning the old priority.
    ///
    /// Fails with [`HeapError::AmbiguousKey`] when `key` has more than one
    /// entry; delete the extra entries first to reprioritize.
    pub fn change_priority(&mut self, key: &K, new_priority: P) -> Result<P> {
        let stack = self.positions.get(key).ok_or(HeapError::KeyNotFound)?;
        let idx = match stack.as_slice() {
            [idx] => *idx,
            _ => {
                return Err(HeapError::AmbiguousKey {
                    occurrences: stack.len(),
                })
            }
        };

        let old_priority = std::mem::replace(&mut self.nodes[idx].priority, new_priority);
        match self.nodes[idx].priority.cmp(&old_priority) {
            Ordering::Less => {
                self.sift_up(idx);
            }
            Ordering::Greater => {
                self.sift_down(idx);
            }
            Ordering::Equal => {}
        }

        Ok(old_priority)
    }

    /// Returns the priorities of every entry with `key`, in occurrence-stack order.
    pub fn select(&self, key: &K) -> Result<Vec<P>> {
        let stack = self.positions.get(key).ok_or(HeapError::KeyNotFound)?;
        Ok(stack
            .iter()
            .map(|&idx| self.nodes[idx].priority.clone())
            .collect())
    }

    /// Drains the heap into a vector ordered by ascending priority.
    pub fn into_sorted_vec(mut self) -> Vec<(K, P)> {
        let mut sorted = Vec::with_capacity(self.len());
        while let Ok(entry) = self.extract_min() {
            sorted.push(entry);
        }
        sorted
    }

    // Exchanges two slots. The only place positions of live entries change.
    fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.nodes.swap(i, j);
        self.relocate(i);
        self.relocate(j);
    }

    // Points the stack entry of the node at `idx` back at `idx`.
    fn relocate(&mut self, idx: usize) {
        let node = &self.nodes[idx];
        let slot = self
            .positions
            .get_mut(&node.key)
            .and_then(|stack| stack.get_mut(node.occurrence));
        debug_assert!(slot.is_some(), "position index out of sync at {idx}");
        if let Some(slot) = slot {
            *slot = idx;
        }
    }

    // Moves slot `idx` to the end, truncates, and drops the node from its key's stack.
    // Callers check that `idx` is in range before touching anything.
    fn remove_slot(&mut self, idx: usize) -> HeapNode<K, P> {
        debug_assert!(idx < self.nodes.len(), "slot {idx} out of range");
        let last_idx = self.nodes.len() - 1;
        self.swap(idx, last_idx);
        let node = self.nodes.swap_remove(last_idx);

        if let Some(stack) = self.positions.get_mut(&node.key) {
            stack.swap_remove(node.occurrence);
            // The former stack top now fills the hole.
            if let Some(&moved) = stack.get(node.occurrence) {
                self.nodes[moved].occurrence = node.occurrence;
            }
            if stack.is_empty() {
                self.positions.remove(&node.key);
            }
        }
        node
    }

    // Helper: bubble up from `idx` if heap property is violated. Returns the resting index.
    fn sift_up(&mut self, mut idx: usize) -> usize {
        while idx > 0 {
            let parent_idx = (idx - 1) / 2;
            if self.nodes[idx].priority < self.nodes[parent_idx].priority {
                self.swap(idx, parent_idx);
                idx = parent_idx;
            } else {
                break;
            }
        }
        idx
    }

    // Helper: bubble down from `idx` if a child has smaller priority. Returns the resting index.
    fn sift_down(&mut self, mut idx: usize) -> usize {
        let len = self.nodes.len();
        loop {
            let left_child = 2 * idx + 1;
            if left_child >= len {
                break;
            }
            let right_child = left_child + 1;
            let mut child = left_child;
            if right_child < len
                && self.nodes[right_child].priority < self.nodes[left_child].priority
            {
                child = right_child;
            }

            if self.nodes[child].priority < self.nodes[idx].priority {
                self.swap(idx, child);
                idx = child;
            } else {
                break;
            }
        }
        idx
    }

    /// Panics unless the heap order and the position index agree with each other.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self)
    where
        K: fmt::Debug,
    {
        for idx in 1..self.nodes.len() {
            let parent_idx = (idx - 1) / 2;
            assert!(
                self.nodes[parent_idx].priority <= self.nodes[idx].priority,
                "heap order broken between {parent_idx} and {idx}"
            );
        }

        let mut indexed = 0;
        for (key, stack) in &self.positions {
            assert!(!stack.is_empty(), "empty occurrence stack for {key:?}");
            for (occurrence, &idx) in stack.iter().enumerate() {
                assert_eq!(&self.nodes[idx].key, key, "stale position {idx} for {key:?}");
                assert_eq!(self.nodes[idx].occurrence, occurrence, "bad back-pointer at {idx}");
            }
            indexed += stack.len();
        }
        assert_eq!(indexed, self.nodes.len());

        for (idx, node) in self.nodes.iter().enumerate() {
            let count = self
                .positions
                .get(&node.key)
                .map_or(0, |stack| stack.iter().filter(|&&i| i == idx).count());
            assert_eq!(count, 1, "slot {idx} indexed {count} times");
        }
    }
}

impl<K, P> FromIterator<(K, P)> for IndexedMinHeap<K, P>
where
    K: Eq + std::hash::Hash + Clone,
    P: Ord + Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, P)>>(iter: I) -> Self {
        Self::heapify(iter)
    }
}

impl<K, P> From<Vec<(K, P)>> for IndexedMinHeap<K, P>
where
    K: Eq + std::hash::Hash + Clone,
    P: Ord + Clone,
{
    fn from(entries: Vec<(K, P)>) -> Self {
        Self::heapify(entries)
    }
}

/// Prints the heap as a pyramid, one tree level per line.
impl<K, P> fmt::Display for IndexedMinHeap<K, P>
where
    K: fmt::Display,
    P: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.nodes.len();
        let height = (usize::BITS - len.leading_zeros()) as usize;
        let mut start = 0;
        for level in 0..height {
            let end = len.min(2 * start + 1);
            write!(f, "{}", "  ".repeat(height - level - 1))?;
            for node in &self.nodes[start..end] {
                write!(f, "({}, {}) ", node.key, node.priority)?;
            }
            writeln!(f)?;
            start = end;
        }
        Ok(())
    }
}
