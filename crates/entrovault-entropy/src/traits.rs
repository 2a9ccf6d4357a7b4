//! # Entropy Service Trait
//!
//! ## Contract
//!
//! - `request_entropy` may reject a payment below the service's own minimum.
//! - `get_encrypted_entropy` is undefined before fulfillment; callers gate
//!   it with `is_request_fulfilled`.
//! - Fulfillment status is authoritative only at the instant it is queried.

use entrovault_core::{Address, Amount, CiphertextHandle, RequestId, RequestTag};
use entrovault_fhe::CipherError;
use thiserror::Error;

/// Errors surfaced by an entropy service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The payment is below the service's fee.
    #[error("payment {paid} below required fee {required}")]
    FeeTooLow {
        /// Fee at the time of the call.
        required: Amount,
        /// Amount forwarded.
        paid: Amount,
    },

    /// The service has no record of the request.
    #[error("unknown entropy {0}")]
    UnknownRequest(RequestId),

    /// The request exists but has no entropy yet.
    #[error("entropy {0} not fulfilled")]
    NotFulfilled(RequestId),

    /// The request already carries entropy.
    #[error("entropy {0} already fulfilled")]
    AlreadyFulfilled(RequestId),

    /// Producing the encrypted entropy failed inside the ciphertext engine.
    #[error("ciphertext engine error: {0}")]
    Engine(#[from] CipherError),

    /// The service could not process the call.
    #[error("entropy service unavailable: {0}")]
    Unavailable(String),
}

/// External source of encrypted entropy.
pub trait EntropyService: Send + Sync {
    /// Address of the service; recorded on ciphertexts it produces.
    fn address(&self) -> Address;

    /// Fee currently required per request.
    fn current_fee(&self) -> Amount;

    /// Register a request on behalf of `requester`, forwarding `payment`.
    fn request_entropy(
        &mut self,
        requester: &Address,
        tag: &RequestTag,
        payment: Amount,
    ) -> Result<RequestId, ServiceError>;

    /// Whether entropy for `id` is available.
    fn is_request_fulfilled(&self, id: RequestId) -> bool;

    /// Encrypted entropy for a fulfilled request. The requester is on the
    /// handle's access list.
    fn get_encrypted_entropy(&self, id: RequestId) -> Result<CiphertextHandle, ServiceError>;
}
