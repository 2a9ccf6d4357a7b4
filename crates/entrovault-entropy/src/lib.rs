//! # entrovault-entropy — External Entropy Service Interface
//!
//! The vault mixes caller values with encrypted entropy produced by a
//! separate service. The service is asynchronous from the vault's point of
//! view: a request is registered (and paid for) in one call, fulfilled
//! out-of-band later, and read back in a subsequent call.
//!
//! ## Architecture
//!
//! - **Traits** (`traits.rs`): `EntropyService` is the four-operation
//!   interface the vault consumes (`current_fee`, `request_entropy`,
//!   `is_request_fulfilled`, `get_encrypted_entropy`).
//!
//! - **Mock** (`mock.rs`): `MockEntropyService` keeps a fee, assigns
//!   sequential request identifiers, and is fulfilled explicitly by the test
//!   or CLI driver using a `MockCiphertextEngine`.
//!
//! ## Crate Policy
//!
//! - The service is the source of truth for fulfillment. Consumers must not
//!   cache fulfillment status.

#[cfg(feature = "mock")]
pub mod mock;
pub mod traits;

#[cfg(feature = "mock")]
pub use mock::MockEntropyService;
pub use traits::{EntropyService, ServiceError};
