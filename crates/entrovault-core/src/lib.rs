//! # entrovault-core — Foundational Types
//!
//! The leaf crate of the entrovault workspace. Every other crate depends on
//! it; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for every identifier.** `Address`, `RequestId`, `RequestTag`,
//!    `HandleId`, `CapabilityToken` — no bare byte arrays or integers cross
//!    a crate boundary. A `RequestId` cannot be passed where an `Amount` is
//!    expected.
//!
//! 2. **Ciphertexts are opaque.** `CiphertextHandle` is an identifier plus a
//!    capability token. Nothing in this crate (or in the vault) can look at
//!    the encrypted value; only a ciphertext engine can operate on it.
//!
//! 3. **`CanonicalBytes` newtype.** Digests that bind structured data (input
//!    proofs, derived handle identifiers) are computed over JCS-canonical
//!    bytes, never over ad-hoc `serde_json::to_vec()` output.
//!
//! 4. **UTC-only timestamps** for transition records.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `entrovault-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod canonical;
pub mod ciphertext;
pub mod digest;
pub mod error;
pub mod hex;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use amount::Amount;
pub use canonical::CanonicalBytes;
pub use ciphertext::{CiphertextHandle, ExternalCiphertext, InputProof};
pub use digest::{sha256_digest, ContentDigest, Sha256Accumulator};
pub use error::{CanonicalizationError, EntrovaultError, HexError};
pub use identity::{Address, CapabilityToken, HandleId, RequestId, RequestTag, VaultId};
pub use temporal::Timestamp;
