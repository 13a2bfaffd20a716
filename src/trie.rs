//! Bin-radix trie facade and configuration
//!
//! [`BinTrie`] owns the root node and the configured policies and
//! exposes the public surface: insertion, exact-key lookup, and
//! (optionally filtered) removal. Keys never need to be supplied
//! separately — values carry them through [`Keyed`].
//!
//! # Examples
//!
//! ```rust
//! use bintrie::{BinTrie, Matched};
//!
//! let mut trie = BinTrie::new();
//! trie.insert(String::from("romane"));
//! trie.insert(String::from("rubicon"));
//!
//! match trie.get("rubicon") {
//!     Some(Matched::One(value)) => assert_eq!(value, "rubicon"),
//!     _ => panic!("rubicon was inserted"),
//! }
//! assert!(trie.get("rom").is_none());
//!
//! let removed = trie.remove("romane");
//! assert!(removed.is_some());
//! assert!(trie.get("romane").is_none());
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{BinTrieError, Result};
use crate::key::{Keyed, TrieKey};
use crate::node::{Node, Slot};

/// Configuration for a [`BinTrie`].
///
/// The key domain and value type are compile-time choices (the trie's
/// type parameter and its [`Keyed`] impl); the runtime knobs are the
/// terminal-bin explosion threshold and the duplicate-key policy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinTrieConfig {
    /// Terminal bins holding more than this many slots after
    /// sort-and-dedup burst into branching nodes. Must be at least 1.
    pub bin_size: usize,
    /// When true (the default) an insert under an existing key replaces
    /// the stored value; when false duplicates accumulate and lookups
    /// can return several values.
    pub unique_keys: bool,
}

impl Default for BinTrieConfig {
    fn default() -> Self {
        Self {
            bin_size: 256,
            unique_keys: true,
        }
    }
}

impl BinTrieConfig {
    /// Preset that preserves duplicate keys.
    pub fn multi_valued() -> Self {
        Self {
            unique_keys: false,
            ..Self::default()
        }
    }

    /// Validate the configuration for correctness and consistency.
    pub fn validate(&self) -> Result<()> {
        if self.bin_size == 0 {
            return Err(BinTrieError::configuration(
                "bin_size must be at least 1: a zero threshold can never be met by a non-empty bin",
            ));
        }
        Ok(())
    }
}

/// Structural statistics gathered by a full crawl of the trie.
///
/// The counts describe the structure as currently stored: bins whose
/// sort-and-dedup is still pending report duplicate-key overwrites as
/// separate slots until a lookup, removal, or burst compacts them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrieStats {
    /// Total nodes in the trie.
    pub num_nodes: usize,
    /// Terminal (bin-holding) nodes.
    pub num_terminals: usize,
    /// Branching nodes.
    pub num_branches: usize,
    /// Total outgoing edges across branching nodes.
    pub num_edges: usize,
    /// Occupied slots (bin entries plus internal slots).
    pub num_slots: usize,
    /// Stored values; a duplicate-key bucket counts each member.
    pub num_values: usize,
    /// Bins currently flagged as unsorted.
    pub dirty_bins: usize,
    /// Deepest prefix length, in key units, consumed by any node.
    pub max_depth: usize,
}

/// Result of a lookup or removal: one value, or several stored under
/// the same key in duplicate-key mode.
///
/// Shapes collapse: an operation that matches exactly one value yields
/// [`Matched::One`] even when the key held a duplicate bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matched<T> {
    /// Exactly one value matched.
    One(T),
    /// Two or more values matched, in insertion order.
    Many(Vec<T>),
}

impl<T> Matched<T> {
    /// All matched values, in insertion order.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Matched::One(value) => vec![value],
            Matched::Many(values) => values,
        }
    }

    /// The single matched value, if exactly one matched.
    pub fn one(self) -> Option<T> {
        match self {
            Matched::One(value) => Some(value),
            Matched::Many(_) => None,
        }
    }
}

/// Compressed radix trie with lazily-sorted terminal bins.
///
/// Keys are decomposed into dispatch units by the value type's key
/// domain ([`TrieKey`]); long shared prefixes are consumed once per
/// node rather than re-compared per entry, so operation cost tracks
/// key length rather than tree size. Terminal bins absorb inserts
/// without sorting and burst into branching nodes only past the
/// configured threshold.
///
/// Lookups take `&mut self`: the first sorted view of a bin that
/// received out-of-order inserts is produced in place.
///
/// # Examples
///
/// Duplicate keys with a record type:
///
/// ```rust
/// use bintrie::{BinTrie, BinTrieConfig, Keyed, Matched};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Row {
///     name: String,
///     score: u32,
/// }
///
/// impl Keyed for Row {
///     type Key = Vec<u8>;
///     fn key(&self) -> Vec<u8> {
///         self.name.as_bytes().to_vec()
///     }
/// }
///
/// let mut trie = BinTrie::with_config(BinTrieConfig::multi_valued()).unwrap();
/// trie.insert(Row { name: "ada".into(), score: 1 });
/// trie.insert(Row { name: "ada".into(), score: 2 });
///
/// match trie.get("ada") {
///     Some(Matched::Many(rows)) => assert_eq!(rows.len(), 2),
///     _ => panic!("both rows share the key"),
/// }
///
/// let removed = trie.remove_matching("ada", |row| row.score == 2);
/// assert_eq!(removed.and_then(Matched::one).map(|row| row.score), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct BinTrie<V: Keyed> {
    root: Node<V>,
    config: BinTrieConfig,
}

impl<V: Keyed> BinTrie<V> {
    /// Create an empty trie with the default configuration.
    pub fn new() -> Self {
        Self {
            root: Node::new(),
            config: BinTrieConfig::default(),
        }
    }

    /// Create an empty trie with a specific configuration.
    pub fn with_config(config: BinTrieConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            root: Node::new(),
            config,
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &BinTrieConfig {
        &self.config
    }

    /// Insert `value` under the key it carries.
    ///
    /// Under unique keys an existing value with the same key is
    /// replaced; otherwise the duplicate is preserved.
    pub fn insert(&mut self, value: V) {
        let key = value.key();
        self.root.insert(key, value, &self.config);
    }

    /// Look up the value(s) stored under `key`.
    pub fn get<Q: Into<V::Key>>(&mut self, key: Q) -> Option<Matched<&V>> {
        self.get_matching(key, |_| true)
    }

    /// Look up `key` and keep only the values for which `pred` holds.
    pub fn get_matching<Q, F>(&mut self, key: Q, mut pred: F) -> Option<Matched<&V>>
    where
        Q: Into<V::Key>,
        F: FnMut(&V) -> bool,
    {
        let key = key.into();
        let slot = self.root.get(&key, &self.config)?;
        match slot {
            Slot::Single(value) => pred(value).then_some(Matched::One(value)),
            Slot::Multi { values, .. } => {
                let mut hits: Vec<&V> = values.iter().filter(|&value| pred(value)).collect();
                match hits.len() {
                    0 => None,
                    1 => hits.pop().map(Matched::One),
                    _ => Some(Matched::Many(hits)),
                }
            }
        }
    }

    /// Remove everything stored under `key`, returning it.
    pub fn remove<Q: Into<V::Key>>(&mut self, key: Q) -> Option<Matched<V>> {
        self.remove_matching(key, |_| true)
    }

    /// Remove the values under `key` for which `pred` holds, returning
    /// the removed portion; values failing `pred` stay in the trie.
    pub fn remove_matching<Q, F>(&mut self, key: Q, mut pred: F) -> Option<Matched<V>>
    where
        Q: Into<V::Key>,
        F: FnMut(&V) -> bool,
    {
        let key = key.into();
        let removed = self.root.remove(&key, &mut pred, &self.config);
        // Compaction cannot retire the root itself; once the last value
        // is gone its skip reverts to the empty prefix.
        if self.root.is_empty_terminal() {
            self.root.skip = V::Key::empty();
        }
        Some(match removed? {
            Slot::Single(value) => Matched::One(value),
            Slot::Multi { values, .. } => Matched::Many(values),
        })
    }

    /// True when the trie holds no values.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty_terminal()
    }

    /// Drop every stored value, keeping the configuration.
    pub fn clear(&mut self) {
        self.root = Node::new();
    }

    /// Crawl the structure and report statistics.
    pub fn stats(&self) -> TrieStats {
        let mut stats = TrieStats::default();
        self.root.crawl(&mut stats);
        stats
    }
}

impl<V: Keyed> Default for BinTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}
