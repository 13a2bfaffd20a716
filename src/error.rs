//! Error handling for the bintrie library
//!
//! Lookup and removal misses are ordinary `None` results, never errors.
//! The error type covers the cases that are genuinely fallible at
//! runtime, which for this crate means construction-time configuration
//! problems; key-domain mismatches are unrepresentable because the key
//! domain is part of the trie's type.

use thiserror::Error;

/// Main error type for the bintrie library
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BinTrieError {
    /// Configuration or parameter errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },
}

impl BinTrieError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Get the error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "config",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, BinTrieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BinTrieError::configuration("bin_size must be at least 1");
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_error_display() {
        let err = BinTrieError::configuration("bad threshold");
        let display = format!("{}", err);
        assert!(display.contains("Invalid configuration"));
        assert!(display.contains("bad threshold"));
    }

    #[test]
    fn test_error_debug() {
        let err = BinTrieError::configuration("debug test");
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Configuration"));
        assert!(debug_str.contains("debug test"));
    }
}
