//! Trie nodes and the structural rewrites that keep them canonical
//!
//! A node is either *terminal* — it holds a bin of value slots and no
//! edges — or *branching* — it holds a jump table keyed by a single
//! key unit, plus an optional internal slot for the value whose key
//! ends exactly at this node. Terminal bins tolerate out-of-order
//! inserts and sort lazily; once a bin outgrows the configured
//! threshold it bursts into a branching node with one child per
//! distinct next unit.
//!
//! Every node's `skip` is the longest common prefix, from the root of
//! the key space, of all keys in its subtree. Operations always pass
//! the full key down; dispatch happens at unit position `skip.unit_len()`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use ahash::RandomState;

use crate::key::{Keyed, TrieKey};
use crate::trie::{BinTrieConfig, TrieStats};

/// Dispatch unit of a value's key domain.
pub(crate) type UnitOf<V> = <<V as Keyed>::Key as TrieKey>::Unit;

/// Sparse jump table from one key unit to a child node.
pub(crate) type EdgeMap<V> = HashMap<UnitOf<V>, Node<V>, RandomState>;

/// One bin or internal-slot entry: a single value, or every value
/// stored under one duplicated key together with that key.
#[derive(Debug, Clone)]
pub(crate) enum Slot<V: Keyed> {
    /// A lone value; its key is extracted on demand.
    Single(V),
    /// Duplicate-key bucket in arrival order, with the shared key
    /// cached so membership checks never re-extract it.
    Multi {
        values: Vec<V>,
        key: V::Key,
    },
}

impl<V: Keyed> Slot<V> {
    pub(crate) fn key(&self) -> V::Key {
        match self {
            Slot::Single(value) => value.key(),
            Slot::Multi { key, .. } => key.clone(),
        }
    }

    /// Number of values carried by this slot.
    pub(crate) fn len(&self) -> usize {
        match self {
            Slot::Single(_) => 1,
            Slot::Multi { values, .. } => values.len(),
        }
    }

    fn into_values(self) -> Vec<V> {
        match self {
            Slot::Single(value) => vec![value],
            Slot::Multi { values, .. } => values,
        }
    }

    /// Fold `new` into the slot previously stored under the same key.
    ///
    /// Under unique keys the newcomer replaces the prior slot; under
    /// duplicate keys the two merge into a `Multi` bucket that keeps
    /// arrival order.
    pub(crate) fn assign(new: Slot<V>, prior: Option<Slot<V>>, unique_keys: bool) -> Slot<V> {
        match prior {
            None => new,
            Some(_) if unique_keys => new,
            Some(Slot::Multi { mut values, key }) => {
                values.extend(new.into_values());
                Slot::Multi { values, key }
            }
            Some(Slot::Single(prior_value)) => {
                let key = prior_value.key();
                let mut values = vec![prior_value];
                values.extend(new.into_values());
                Slot::Multi { values, key }
            }
        }
    }

    /// Split this slot into kept and removed portions; `pred` returning
    /// true marks a value as removed. Either side collapses back to
    /// `Single` when one value remains and to `None` when none do.
    fn partition(
        self,
        pred: &mut dyn FnMut(&V) -> bool,
    ) -> (Option<Slot<V>>, Option<Slot<V>>) {
        match self {
            Slot::Single(value) => {
                if pred(&value) {
                    (None, Some(Slot::Single(value)))
                } else {
                    (Some(Slot::Single(value)), None)
                }
            }
            Slot::Multi { values, key } => {
                let mut kept = Vec::new();
                let mut removed = Vec::new();
                for value in values {
                    if pred(&value) {
                        removed.push(value);
                    } else {
                        kept.push(value);
                    }
                }
                (
                    Slot::from_values(kept, &key),
                    Slot::from_values(removed, &key),
                )
            }
        }
    }

    fn from_values(mut values: Vec<V>, key: &V::Key) -> Option<Slot<V>> {
        match values.len() {
            0 => None,
            1 => values.pop().map(Slot::Single),
            _ => Some(Slot::Multi {
                values,
                key: key.clone(),
            }),
        }
    }
}

/// A trie node. `edges == None` marks a terminal node; its values live
/// in `bin`. A branching node keeps its edge jump table in `edges` and
/// the exact-prefix value, if any, in `value`.
#[derive(Debug, Clone)]
pub(crate) struct Node<V: Keyed> {
    /// Longest common prefix of every key in this subtree.
    pub(crate) skip: V::Key,
    /// Jump table; absent on terminal nodes.
    pub(crate) edges: Option<EdgeMap<V>>,
    /// Terminal bin, kept sorted-and-deduped only on demand.
    pub(crate) bin: Vec<Slot<V>>,
    /// Internal slot of a branching node.
    pub(crate) value: Option<Slot<V>>,
    /// Set when the bin is no longer known to be sorted.
    pub(crate) dirty: bool,
}

impl<V: Keyed> Node<V> {
    /// Fresh empty terminal with an empty skip; the shape of a new root.
    pub(crate) fn new() -> Self {
        Node {
            skip: V::Key::empty(),
            edges: None,
            bin: Vec::new(),
            value: None,
            dirty: false,
        }
    }

    /// Terminal node holding exactly one value.
    fn leaf(key: V::Key, value: V) -> Self {
        Node {
            skip: key,
            edges: None,
            bin: vec![Slot::Single(value)],
            value: None,
            dirty: false,
        }
    }

    /// Terminal node over an already sorted-and-deduped run of slots,
    /// bursting further if the run alone exceeds the bin threshold.
    fn from_sorted_bin(slots: Vec<Slot<V>>, config: &BinTrieConfig) -> Self {
        debug_assert!(!slots.is_empty());
        let mut node = Node {
            skip: common_prefix(&slots),
            edges: None,
            bin: slots,
            value: None,
            dirty: false,
        };
        node.explode(config);
        node
    }

    pub(crate) fn is_empty_terminal(&self) -> bool {
        self.edges.is_none() && self.bin.is_empty()
    }

    /// Insert `value` under `key`.
    pub(crate) fn insert(&mut self, key: V::Key, value: V, config: &BinTrieConfig) {
        let n = key.common_prefix_len(&self.skip);
        if self.edges.is_none() {
            self.bin_insert(n, key, value);
            self.explode(config);
            return;
        }
        if n < self.skip.unit_len() {
            self.split(n);
            self.insert(key, value, config);
            return;
        }
        if n == key.unit_len() {
            let prior = self.value.take();
            self.value = Some(Slot::assign(
                Slot::Single(value),
                prior,
                config.unique_keys,
            ));
            return;
        }
        let unit = key.unit_at(n);
        if let Some(edges) = self.edges.as_mut() {
            match edges.entry(unit) {
                Entry::Occupied(entry) => entry.into_mut().insert(key, value, config),
                Entry::Vacant(entry) => {
                    entry.insert(Node::leaf(key, value));
                }
            }
        }
    }

    /// Append into the bin, shrinking `skip` to the common prefix and
    /// flagging the bin dirty when the newcomer is not greater than the
    /// current last element.
    fn bin_insert(&mut self, n: usize, key: V::Key, value: V) {
        if self.bin.is_empty() {
            self.skip = key;
            self.bin.push(Slot::Single(value));
            return;
        }
        if n < self.skip.unit_len() {
            self.skip = self.skip.prefix(n);
        }
        if let Some(last) = self.bin.last() {
            if key <= last.key() {
                self.dirty = true;
            }
        }
        self.bin.push(Slot::Single(value));
    }

    /// Push this node's current contents down into a single child and
    /// keep only the first `n` units of the old skip here.
    fn split(&mut self, n: usize) {
        let old_skip = std::mem::replace(&mut self.skip, V::Key::empty());
        let unit = old_skip.unit_at(n);
        let child = Node {
            skip: old_skip,
            edges: self.edges.take(),
            bin: std::mem::take(&mut self.bin),
            value: self.value.take(),
            dirty: std::mem::replace(&mut self.dirty, false),
        };
        self.skip = child.skip.prefix(n);
        let mut edges = EdgeMap::<V>::default();
        edges.insert(unit, child);
        self.edges = Some(edges);
    }

    /// Burst an overfull terminal into a branching node.
    ///
    /// No-op while the bin holds at most `bin_size` slots, and again
    /// after sort-and-dedup brings it back under the threshold.
    /// Idempotent: a node that already has edges is left alone.
    pub(crate) fn explode(&mut self, config: &BinTrieConfig) {
        if self.edges.is_some() || self.bin.len() <= config.bin_size {
            return;
        }
        self.sort_bin(config);
        if self.bin.len() <= config.bin_size {
            return;
        }

        let slots = std::mem::take(&mut self.bin);
        self.skip = common_prefix(&slots);
        let cut = self.skip.unit_len();

        let mut slots = slots.into_iter().peekable();
        if let Some(first) = slots.peek() {
            if first.key().unit_len() == cut {
                self.value = slots.next();
            }
        }

        // Sorted order makes every per-unit run contiguous.
        let mut groups: Vec<(UnitOf<V>, Vec<Slot<V>>)> = Vec::new();
        for slot in slots {
            let unit = slot.key().unit_at(cut);
            match groups.last_mut() {
                Some((u, group)) if *u == unit => group.push(slot),
                _ => groups.push((unit, vec![slot])),
            }
        }
        let mut edges = EdgeMap::<V>::default();
        for (unit, group) in groups {
            edges.insert(unit, Node::from_sorted_bin(group, config));
        }

        log::trace!(
            "bin burst into {} edges at unit depth {}",
            edges.len(),
            cut
        );
        self.edges = Some(edges);
        self.dirty = false;
    }

    /// Sort the bin and fold equal-key neighbors into one slot. Clean
    /// bins are already sorted with distinct keys and are left alone.
    fn sort_bin(&mut self, config: &BinTrieConfig) {
        if !self.dirty {
            return;
        }
        let mut slots = std::mem::take(&mut self.bin);
        slots.sort_by_cached_key(|slot| slot.key());
        let mut folded: Vec<Slot<V>> = Vec::with_capacity(slots.len());
        let mut last_key: Option<V::Key> = None;
        for slot in slots {
            let key = slot.key();
            if last_key.as_ref() == Some(&key) {
                let prior = folded.pop();
                folded.push(Slot::assign(slot, prior, config.unique_keys));
            } else {
                folded.push(slot);
                last_key = Some(key);
            }
        }
        self.bin = folded;
        self.dirty = false;
    }

    /// Exact-key lookup. Sorting a dirty bin on the way down is the
    /// only mutation.
    pub(crate) fn get(&mut self, key: &V::Key, config: &BinTrieConfig) -> Option<&Slot<V>> {
        let n = key.common_prefix_len(&self.skip);
        if n != self.skip.unit_len() {
            return None;
        }
        if self.edges.is_none() {
            self.sort_bin(config);
            let index = self
                .bin
                .binary_search_by(|slot| slot.key().cmp(key))
                .ok()?;
            return self.bin.get(index);
        }
        if n == key.unit_len() {
            return self.value.as_ref();
        }
        let unit = key.unit_at(n);
        self.edges.as_mut()?.get_mut(&unit)?.get(key, config)
    }

    /// Remove the values stored under `key` for which `pred` holds,
    /// returning the removed portion. Compacts on the way back up.
    pub(crate) fn remove(
        &mut self,
        key: &V::Key,
        pred: &mut dyn FnMut(&V) -> bool,
        config: &BinTrieConfig,
    ) -> Option<Slot<V>> {
        let n = key.common_prefix_len(&self.skip);
        if n != self.skip.unit_len() {
            return None;
        }
        if self.edges.is_none() {
            self.sort_bin(config);
            let index = self
                .bin
                .binary_search_by(|slot| slot.key().cmp(key))
                .ok()?;
            let (kept, removed) = self.bin.remove(index).partition(pred);
            if let Some(kept) = kept {
                self.bin.insert(index, kept);
            } else if !self.bin.is_empty() {
                // The spliced-out key may have been the one holding the
                // prefix short; narrow it back to the survivors.
                self.skip = common_prefix(&self.bin);
            }
            return removed;
        }
        if n == key.unit_len() {
            let slot = self.value.take()?;
            let (kept, removed) = slot.partition(pred);
            self.value = kept;
            if self.value.is_none() {
                self.restore_shape();
            }
            return removed;
        }
        let unit = key.unit_at(n);
        let removed = self.edges.as_mut()?.get_mut(&unit)?.remove(key, pred, config)?;
        self.compact(unit);
        Some(removed)
    }

    /// Post-deletion compaction: drop the edge to a child that emptied
    /// out, then restore this node's own shape.
    fn compact(&mut self, unit: UnitOf<V>) {
        if let Some(edges) = self.edges.as_mut() {
            let child_emptied = edges.get(&unit).is_some_and(Node::is_empty_terminal);
            if child_emptied {
                edges.remove(&unit);
            }
        }
        self.restore_shape();
    }

    /// Re-establish the branching arity invariant (edge count plus
    /// internal slot at least two). A node that dropped below it either
    /// reverts to a terminal or absorbs its single remaining child.
    fn restore_shape(&mut self) {
        let Some(edges) = self.edges.as_mut() else {
            return;
        };
        match (edges.len(), self.value.is_some()) {
            (0, false) => {
                self.edges = None;
                self.dirty = false;
            }
            (0, true) => {
                if let Some(slot) = self.value.take() {
                    self.skip = slot.key();
                    self.bin.push(slot);
                }
                self.edges = None;
                self.dirty = false;
            }
            (1, false) => {
                let unit = edges.keys().next().copied();
                if let Some(unit) = unit {
                    if let Some(child) = edges.remove(&unit) {
                        log::trace!("splicing single-edge node out");
                        self.skip = child.skip;
                        self.edges = child.edges;
                        self.bin = child.bin;
                        self.value = child.value;
                        self.dirty = child.dirty;
                    }
                }
            }
            _ => {}
        }
    }

    /// Accumulate structural statistics over this subtree.
    pub(crate) fn crawl(&self, stats: &mut TrieStats) {
        stats.num_nodes += 1;
        stats.max_depth = stats.max_depth.max(self.skip.unit_len());
        match &self.edges {
            None => {
                stats.num_terminals += 1;
                stats.num_slots += self.bin.len();
                stats.num_values += self.bin.iter().map(Slot::len).sum::<usize>();
                if self.dirty {
                    stats.dirty_bins += 1;
                }
            }
            Some(edges) => {
                stats.num_branches += 1;
                stats.num_edges += edges.len();
                if let Some(slot) = &self.value {
                    stats.num_slots += 1;
                    stats.num_values += slot.len();
                }
                for child in edges.values() {
                    child.crawl(stats);
                }
            }
        }
    }
}

/// Longest common prefix of a non-empty run of slot keys.
fn common_prefix<V: Keyed>(slots: &[Slot<V>]) -> V::Key {
    let mut lcp = slots[0].key();
    for slot in &slots[1..] {
        let m = lcp.common_prefix_len(&slot.key());
        if m < lcp.unit_len() {
            lcp = lcp.prefix(m);
        }
    }
    lcp
}

#[cfg(test)]
impl<V: Keyed> Node<V> {
    /// Assert the structural invariants over this subtree: skips are
    /// subtree-wide common prefixes, branching nodes keep at least two
    /// outgoing paths, children hang under the right unit, and no bin
    /// exceeds the threshold.
    pub(crate) fn check_invariants(&self, bin_size: usize) {
        match &self.edges {
            None => {
                assert!(self.value.is_none(), "terminal node with internal slot");
                assert!(
                    self.bin.len() <= bin_size,
                    "bin holds {} slots, threshold {}",
                    self.bin.len(),
                    bin_size
                );
                if !self.bin.is_empty() {
                    let lcp = common_prefix(&self.bin);
                    assert_eq!(self.skip, lcp, "terminal skip is not the bin prefix");
                }
                if !self.dirty {
                    for pair in self.bin.windows(2) {
                        assert!(
                            pair[0].key() < pair[1].key(),
                            "clean bin out of order"
                        );
                    }
                }
            }
            Some(edges) => {
                assert!(self.bin.is_empty(), "branching node with a bin");
                let paths = edges.len() + usize::from(self.value.is_some());
                assert!(paths >= 2, "branching node with {} outgoing paths", paths);
                if let Some(slot) = &self.value {
                    assert_eq!(slot.key(), self.skip, "internal slot key differs from skip");
                }
                let cut = self.skip.unit_len();
                let mut keys = Vec::new();
                self.collect_keys(&mut keys);
                let lcp = keys
                    .iter()
                    .skip(1)
                    .fold(keys[0].clone(), |acc, key| {
                        let m = acc.common_prefix_len(key);
                        if m < acc.unit_len() {
                            acc.prefix(m)
                        } else {
                            acc
                        }
                    });
                assert_eq!(self.skip, lcp, "branch skip is not the subtree prefix");
                for (unit, child) in edges {
                    assert!(
                        !child.is_empty_terminal(),
                        "empty terminal child left behind"
                    );
                    assert_eq!(
                        child.skip.common_prefix_len(&self.skip),
                        cut,
                        "child skip does not extend the parent skip"
                    );
                    assert_eq!(
                        child.skip.unit_at(cut),
                        *unit,
                        "child hangs under the wrong unit"
                    );
                    child.check_invariants(bin_size);
                }
            }
        }
    }

    /// Collect one key per slot across the subtree.
    pub(crate) fn collect_keys(&self, out: &mut Vec<V::Key>) {
        if let Some(slot) = &self.value {
            out.push(slot.key());
        }
        for slot in &self.bin {
            out.push(slot.key());
        }
        if let Some(edges) = &self.edges {
            for child in edges.values() {
                child.collect_keys(out);
            }
        }
    }
}
