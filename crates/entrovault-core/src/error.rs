//! # Error Types
//!
//! Errors shared across the workspace. Domain crates (`entrovault-fhe`,
//! `entrovault-entropy`, `entrovault-state`) define their own narrower
//! enums; the types here cover parsing, canonicalization, and validation
//! of core values.

use thiserror::Error;

/// Top-level error type for core value handling.
#[derive(Error, Debug)]
pub enum EntrovaultError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Hex decoding failed.
    #[error("hex error: {0}")]
    Hex(#[from] HexError),

    /// A value failed validation (malformed timestamp, conflicting config).
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values have no canonical encoding; amounts and values are integers.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error while decoding a hex string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    /// A character outside `[0-9a-fA-F]` was found.
    #[error("invalid hex character {ch:?} at position {position}")]
    InvalidCharacter {
        /// The offending character.
        ch: char,
        /// Index of the character after any `0x` prefix.
        position: usize,
    },

    /// Hex strings must encode whole bytes.
    #[error("hex string has odd length {0}")]
    OddLength(usize),

    /// Decoded byte length did not match the fixed-size target.
    #[error("expected {expected} bytes, got {actual}")]
    WrongLength {
        /// Required byte length.
        expected: usize,
        /// Decoded byte length.
        actual: usize,
    },
}
