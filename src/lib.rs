//! # Bintrie: Compressed Radix Trie with Lazily-Sorted Bins
//!
//! This crate provides an in-memory associative container built as a
//! compressed prefix tree (radix / PATRICIA trie) whose terminal nodes
//! hold *bins* of values instead of single entries. It targets key
//! sets with long shared prefixes — paths, identifiers, numeric ranges
//! bucketed by high bits — where a balanced search tree would burn
//! comparisons on redundant prefix bytes.
//!
//! ## Key Features
//!
//! - **Path compression**: every node consumes a whole shared prefix
//!   at once; operation cost tracks key length, not tree size
//! - **Lazy bins**: terminal nodes absorb inserts without sorting and
//!   sort on the first lookup; bins burst into branching nodes only
//!   past a configurable threshold
//! - **Pluggable key domains**: variable-length byte-string keys and
//!   fixed-width 64-bit keys addressed nibble-by-nibble, behind one
//!   trait
//! - **Duplicate-key mode**: optionally preserve every value stored
//!   under the same key, in insertion order
//! - **Filtered removal**: delete only the values a predicate selects
//!
//! ## Quick Start
//!
//! ```rust
//! use bintrie::{BinTrie, Matched};
//!
//! let mut trie = BinTrie::new();
//! trie.insert(String::from("romane"));
//! trie.insert(String::from("romanus"));
//! trie.insert(String::from("rubicon"));
//!
//! // Exact-key lookup; prefixes of stored keys miss.
//! assert!(matches!(trie.get("rubicon"), Some(Matched::One(_))));
//! assert!(trie.get("rom").is_none());
//!
//! // Removal hands the value back.
//! let gone = trie.remove("romanus").and_then(Matched::one);
//! assert_eq!(gone.as_deref(), Some("romanus"));
//!
//! // 64-bit keys dispatch nibble-by-nibble in their own domain.
//! let mut numbers = BinTrie::new();
//! numbers.insert(0x1234_5678_9ABC_DEF0u64);
//! assert!(numbers.get(0x1234_5678_9ABC_DEF0u64).is_some());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod key;
mod node;
pub mod trie;

// Re-export core types
pub use error::{BinTrieError, Result};
pub use key::{Keyed, NibbleKey, TrieKey};
pub use trie::{BinTrie, BinTrieConfig, Matched, TrieStats};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(VERSION.len() > 0);
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_re_exports() {
        let _trie = BinTrie::<String>::new();
        let _config = BinTrieConfig::default();
        let _key = NibbleKey::from(42u64);
        let err = BinTrieError::configuration("test");
        assert_eq!(err.category(), "config");
        assert!(std::any::type_name::<Result<()>>().contains("BinTrieError"));
    }
}
