//! # entrovault-fhe — Ciphertext Engine Interface
//!
//! The vault operates on encrypted values it can never read. Everything it
//! does to them (verify a caller's input, grant itself permission, combine
//! two values, mark the result publicly revealable) is a call into a
//! ciphertext engine. This crate defines that boundary.
//!
//! ## Architecture
//!
//! - **Traits** (`traits.rs`): `CiphertextEngine` is the capability the vault
//!   consumes. `PublicDecryption` is the external decoding mechanism that
//!   lets anyone read a handle once it has been marked revealable.
//!
//! - **Mock** (`mock.rs`): `MockCiphertextEngine` is a deterministic,
//!   transparent engine. Input proofs are real keyed SHA-256 bindings and
//!   handle permissions are enforced, but values are held in the clear.
//!   It provides **no confidentiality** and exists for tests and the CLI.
//!
//! ## Crate Policy
//!
//! - Depends only on `entrovault-core` internally.
//! - No `unsafe`.

#[cfg(feature = "mock")]
pub mod mock;
pub mod traits;

#[cfg(feature = "mock")]
pub use mock::MockCiphertextEngine;
pub use traits::{CipherError, CiphertextEngine, PublicDecryption};
