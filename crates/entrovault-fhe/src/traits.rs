//! # Ciphertext Engine Traits
//!
//! The operations a vault may perform on opaque ciphertext handles.
//!
//! ## Permission Model
//!
//! Every handle carries an access list of principals. An operation that
//! names a `caller` fails with [`CipherError::PermissionDenied`] unless the
//! caller is on the access list of every handle it touches. Handles produced
//! by an operation are readable by the caller that produced them.

use entrovault_core::{Address, CiphertextHandle, ExternalCiphertext, HandleId, InputProof};
use thiserror::Error;

/// Errors surfaced by a ciphertext engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The input proof does not verify for this ciphertext and target.
    #[error("input proof rejected for target {target}")]
    InvalidProof {
        /// The principal the input was submitted to.
        target: Address,
    },

    /// The external ciphertext is not in the engine's wire format.
    #[error("malformed external ciphertext: {0}")]
    MalformedInput(String),

    /// The handle identifier is not known to the engine.
    #[error("unknown ciphertext handle {0}")]
    UnknownHandle(HandleId),

    /// The handle identifier exists but the capability token does not match.
    #[error("forged capability for ciphertext handle {0}")]
    ForgedHandle(HandleId),

    /// The caller is not on the handle's access list.
    #[error("{principal} is not permitted to operate on {handle}")]
    PermissionDenied {
        /// The handle that was touched.
        handle: HandleId,
        /// The principal that attempted the operation.
        principal: Address,
    },

    /// Public decryption was requested for a handle not marked revealable.
    #[error("ciphertext handle {0} is not publicly revealable")]
    NotRevealable(HandleId),
}

/// Operations on encrypted 64-bit unsigned values.
///
/// Implementations must be usable from a single serialized execution
/// context; no method blocks or suspends.
pub trait CiphertextEngine: Send + Sync {
    /// Validate caller-supplied encrypted input against its proof and
    /// produce a handle usable by `target`.
    ///
    /// Fails with [`CipherError::InvalidProof`] when the proof does not bind
    /// this ciphertext to `target`.
    fn from_external(
        &mut self,
        input: &ExternalCiphertext,
        proof: &InputProof,
        target: &Address,
    ) -> Result<CiphertextHandle, CipherError>;

    /// Add `grantee` to the access list of `handle`. `caller` must already
    /// be on it.
    fn grant_execution_permission(
        &mut self,
        caller: &Address,
        handle: &CiphertextHandle,
        grantee: &Address,
    ) -> Result<(), CipherError>;

    /// Combine two ciphertexts with an associative, self-inverse operation
    /// (bitwise XOR) without decrypting either operand.
    fn combine(
        &mut self,
        caller: &Address,
        a: &CiphertextHandle,
        b: &CiphertextHandle,
    ) -> Result<CiphertextHandle, CipherError>;

    /// Mark `handle` as decryptable by anyone through [`PublicDecryption`].
    fn mark_publicly_revealable(
        &mut self,
        caller: &Address,
        handle: &CiphertextHandle,
    ) -> Result<CiphertextHandle, CipherError>;
}

/// External decoding mechanism for handles marked publicly revealable.
pub trait PublicDecryption {
    /// Decrypt a revealable handle.
    fn reveal(&self, handle: &CiphertextHandle) -> Result<u64, CipherError>;
}
