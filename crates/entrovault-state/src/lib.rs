//! # entrovault-state — Vault and Request State Machines
//!
//! ## Architecture
//!
//! - **Tracker** (`tracker.rs`): `EntropyRequestTracker`, the single gate
//!   through which entropy payloads are read. Each request identifier moves
//!   `UNREGISTERED → REGISTERED → CONSUMED` and never back.
//!
//! - **Vault** (`vault.rs`): `ValueVault`, a write-once slot holding one
//!   publicly revealable ciphertext handle, filled either directly
//!   (`store_plain`) or after mixing with fulfilled entropy
//!   (`store_with_entropy`).
//!
//! - **Events** (`events.rs`): optional observers notified after commits.
//!
//! ## Execution Model
//!
//! Every operation runs to completion in one serialized context. There are
//! no locks; invariants are enforced by precondition checks that all run
//! before the first mutation.

pub mod events;
pub mod tracker;
pub mod vault;

pub use events::{StorePath, TracingObserver, VaultEvent, VaultObserver};
pub use tracker::{
    AuthorizedRequest, EntropyRequestTracker, RequestRecord, RequestState,
    RequestTransitionRecord, TrackerError,
};
pub use vault::{ValueVault, VaultError, VaultState, VaultTransitionRecord};
