//! # Mock Entropy Service
//!
//! Registers paid requests and holds them until a driver fulfills them.
//! Fulfillment encrypts the entropy with a [`MockCiphertextEngine`] under the
//! service's own address, then grants the original requester permission on
//! the resulting handle.

use std::collections::BTreeMap;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use entrovault_core::{Address, Amount, CiphertextHandle, RequestId, RequestTag};
use entrovault_fhe::{CiphertextEngine, MockCiphertextEngine};

use crate::traits::{EntropyService, ServiceError};

/// A request as the service sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    /// Who registered the request.
    pub requester: Address,
    /// Caller-supplied tag.
    pub tag: RequestTag,
    /// Amount forwarded with the request.
    pub paid: Amount,
    /// Encrypted entropy once fulfilled.
    pub entropy: Option<CiphertextHandle>,
}

/// In-memory entropy service with explicit fulfillment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockEntropyService {
    address: Address,
    fee: Amount,
    next_id: u64,
    collected: Amount,
    requests: BTreeMap<RequestId, ServiceRequest>,
}

impl MockEntropyService {
    /// Create a service at `address` charging `fee` per request.
    pub fn new(address: Address, fee: Amount) -> Self {
        Self {
            address,
            fee,
            next_id: 1,
            collected: Amount::ZERO,
            requests: BTreeMap::new(),
        }
    }

    /// Change the per-request fee.
    pub fn set_fee(&mut self, fee: Amount) {
        self.fee = fee;
    }

    /// Total fees received.
    pub fn collected(&self) -> Amount {
        self.collected
    }

    /// Look up a request.
    pub fn request(&self, id: RequestId) -> Option<&ServiceRequest> {
        self.requests.get(&id)
    }

    /// Number of requests ever registered.
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// Fulfill `id` with a specific entropy value.
    pub fn fulfill(
        &mut self,
        id: RequestId,
        engine: &mut MockCiphertextEngine,
        value: u64,
    ) -> Result<CiphertextHandle, ServiceError> {
        let address = self.address;
        let request = self
            .requests
            .get_mut(&id)
            .ok_or(ServiceError::UnknownRequest(id))?;
        if request.entropy.is_some() {
            return Err(ServiceError::AlreadyFulfilled(id));
        }

        let handle = engine.trivial_encrypt(value, &address);
        engine.grant_execution_permission(&address, &handle, &request.requester)?;
        request.entropy = Some(handle);
        tracing::info!(request_id = %id, handle = %handle, "entropy fulfilled");
        Ok(handle)
    }

    /// Fulfill `id` with a value drawn from `rng`.
    pub fn fulfill_random(
        &mut self,
        id: RequestId,
        engine: &mut MockCiphertextEngine,
        rng: &mut impl RngCore,
    ) -> Result<CiphertextHandle, ServiceError> {
        let value = rng.next_u64();
        self.fulfill(id, engine, value)
    }

    /// Withdraw fulfillment of `id`.
    ///
    /// A conforming service never does this; it exists to exercise callers
    /// that check fulfillment and read entropy in separate steps.
    pub fn unfulfill(&mut self, id: RequestId) -> Result<(), ServiceError> {
        let request = self
            .requests
            .get_mut(&id)
            .ok_or(ServiceError::UnknownRequest(id))?;
        request.entropy = None;
        Ok(())
    }
}

impl EntropyService for MockEntropyService {
    fn address(&self) -> Address {
        self.address
    }

    fn current_fee(&self) -> Amount {
        self.fee
    }

    fn request_entropy(
        &mut self,
        requester: &Address,
        tag: &RequestTag,
        payment: Amount,
    ) -> Result<RequestId, ServiceError> {
        if !payment.covers(self.fee) {
            return Err(ServiceError::FeeTooLow {
                required: self.fee,
                paid: payment,
            });
        }
        let collected = self
            .collected
            .checked_add(payment)
            .ok_or_else(|| ServiceError::Unavailable("fee ledger overflow".to_string()))?;

        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.collected = collected;
        self.requests.insert(
            id,
            ServiceRequest {
                requester: *requester,
                tag: *tag,
                paid: payment,
                entropy: None,
            },
        );
        tracing::debug!(request_id = %id, requester = %requester, paid = %payment, "entropy requested");
        Ok(id)
    }

    fn is_request_fulfilled(&self, id: RequestId) -> bool {
        self.requests
            .get(&id)
            .map(|r| r.entropy.is_some())
            .unwrap_or(false)
    }

    fn get_encrypted_entropy(&self, id: RequestId) -> Result<CiphertextHandle, ServiceError> {
        let request = self
            .requests
            .get(&id)
            .ok_or(ServiceError::UnknownRequest(id))?;
        request.entropy.ok_or(ServiceError::NotFulfilled(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entrovault_fhe::PublicDecryption;

    fn service_addr() -> Address {
        Address::from_bytes([0x5E; 20])
    }

    fn requester() -> Address {
        Address::from_bytes([0xAA; 20])
    }

    fn tag() -> RequestTag {
        RequestTag::from_bytes([0x01; 32])
    }

    fn service() -> MockEntropyService {
        MockEntropyService::new(service_addr(), Amount(100))
    }

    #[test]
    fn request_ids_are_sequential() {
        let mut s = service();
        let a = s.request_entropy(&requester(), &tag(), Amount(100)).unwrap();
        let b = s.request_entropy(&requester(), &tag(), Amount(150)).unwrap();
        assert_eq!(a, RequestId(1));
        assert_eq!(b, RequestId(2));
        assert_eq!(s.collected(), Amount(250));
        assert_eq!(s.request(b).unwrap().paid, Amount(150));
    }

    #[test]
    fn underpayment_rejected_and_not_recorded() {
        let mut s = service();
        assert_eq!(
            s.request_entropy(&requester(), &tag(), Amount(99)),
            Err(ServiceError::FeeTooLow {
                required: Amount(100),
                paid: Amount(99)
            })
        );
        assert_eq!(s.request_count(), 0);
        assert_eq!(s.collected(), Amount::ZERO);
    }

    #[test]
    fn entropy_unavailable_until_fulfilled() {
        let mut s = service();
        let id = s.request_entropy(&requester(), &tag(), Amount(100)).unwrap();
        assert!(!s.is_request_fulfilled(id));
        assert_eq!(
            s.get_encrypted_entropy(id),
            Err(ServiceError::NotFulfilled(id))
        );
    }

    #[test]
    fn fulfill_grants_requester() {
        let mut engine = MockCiphertextEngine::new([1; 32]);
        let mut s = service();
        let id = s.request_entropy(&requester(), &tag(), Amount(100)).unwrap();
        let h = s.fulfill(id, &mut engine, 0xFEED).unwrap();

        assert!(s.is_request_fulfilled(id));
        assert_eq!(s.get_encrypted_entropy(id).unwrap(), h);
        assert!(engine.is_allowed(&h, &requester()));
        assert!(engine.is_allowed(&h, &service_addr()));
        assert!(engine.reveal(&h).is_err());
    }

    #[test]
    fn double_fulfill_rejected() {
        let mut engine = MockCiphertextEngine::new([1; 32]);
        let mut s = service();
        let id = s.request_entropy(&requester(), &tag(), Amount(100)).unwrap();
        s.fulfill(id, &mut engine, 1).unwrap();
        assert_eq!(
            s.fulfill(id, &mut engine, 2),
            Err(ServiceError::AlreadyFulfilled(id))
        );
    }

    #[test]
    fn fulfill_unknown_rejected() {
        let mut engine = MockCiphertextEngine::new([1; 32]);
        let mut s = service();
        assert_eq!(
            s.fulfill(RequestId(9), &mut engine, 1),
            Err(ServiceError::UnknownRequest(RequestId(9)))
        );
    }

    #[test]
    fn unfulfill_withdraws_entropy() {
        let mut engine = MockCiphertextEngine::new([1; 32]);
        let mut s = service();
        let id = s.request_entropy(&requester(), &tag(), Amount(100)).unwrap();
        s.fulfill(id, &mut engine, 1).unwrap();
        s.unfulfill(id).unwrap();
        assert!(!s.is_request_fulfilled(id));
    }

    #[test]
    fn serde_roundtrip_keeps_requests() {
        let mut s = service();
        let id = s.request_entropy(&requester(), &tag(), Amount(100)).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        let restored: MockEntropyService = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.request(id).unwrap().tag, tag());
        assert_eq!(restored.current_fee(), Amount(100));
    }
}
