//! Error types for the caching engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the caching engine.
///
/// Capacity pressure never surfaces here: evictions are transparent to
/// callers. The only caller-visible failures are configuration misuse
/// (unknown or protected layer) and serialization/compression faults.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Operation referenced a layer that was never registered
    #[error("Unknown cache layer: {0}")]
    UnknownLayer(String),

    /// The default layer is protected from removal
    #[error("The '{0}' layer is protected and cannot be removed")]
    ProtectedLayer(String),

    /// Value serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compressing a value failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// Decompressing a stored value failed
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// A single entry is larger than the whole layer budget
    #[error("Entry of {size} bytes exceeds the layer budget of {max_size_bytes} bytes")]
    EntryTooLarge { size: usize, max_size_bytes: usize },

    /// The layer's entry budget is zero, so no entry can ever be admitted
    #[error("Layer '{0}' has an entry budget of zero; nothing can be stored")]
    ZeroEntryBudget(String),
}

// == Result Type Alias ==
/// Convenience Result type for the caching engine.
pub type Result<T> = std::result::Result<T, CacheError>;
