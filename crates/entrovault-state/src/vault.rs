//! # Value Vault
//!
//! Holds exactly one opaque ciphertext handle for the lifetime of an
//! instance. The slot is written at most once, and whatever is written is
//! marked publicly revealable before it lands.
//!
//! ## States
//!
//! ```text
//! EMPTY ──store_plain()────────▶ INITIALIZED (terminal)
//! EMPTY ──store_with_entropy()─▶ INITIALIZED (terminal)
//! ```
//!
//! ## Validate, Then Commit
//!
//! Every precondition is checked before the vault or its tracker changes.
//! For `store_with_entropy` the checks run in a fixed order and the first
//! failure wins:
//!
//! 1. `AlreadyInitialized`
//! 2. `ServiceCallFailed` when handed a service other than the bound one
//! 3. `UnknownRequest` (never registered, or already consumed)
//! 4. `EntropyNotReady`
//! 5. `ProofInvalid`
//!
//! Permission grants, the combination, and the reveal mark happen inside the
//! ciphertext engine after those checks. The slot write and the request
//! consumption happen last, together. A failed call leaves the vault and its
//! tracker exactly as they were.
//!
//! ## Collaborators
//!
//! The vault owns its tracker but not the engine or the entropy service.
//! Operations borrow those for the duration of one call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use entrovault_core::{
    Address, Amount, CiphertextHandle, ExternalCiphertext, InputProof, RequestId, RequestTag,
    Timestamp, VaultId,
};
use entrovault_entropy::{EntropyService, ServiceError};
use entrovault_fhe::{CipherError, CiphertextEngine};

use crate::events::{StorePath, VaultEvent, VaultObserver};
use crate::tracker::{EntropyRequestTracker, TrackerError};

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors from vault operations. Every error leaves the vault unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// The slot is already filled.
    #[error("vault is already initialized")]
    AlreadyInitialized,

    /// The slot is empty.
    #[error("vault is not initialized")]
    NotInitialized,

    /// The fee offered is below the service's current fee.
    #[error("insufficient fee: required {required}, paid {paid}")]
    InsufficientFee { required: Amount, paid: Amount },

    /// The request was never registered by this vault, or is already consumed.
    #[error("unknown or consumed entropy {0}")]
    UnknownRequest(RequestId),

    /// The entropy service has not fulfilled the request.
    #[error("entropy for {0} is not ready")]
    EntropyNotReady(RequestId),

    /// The ciphertext engine rejected the input and its proof.
    #[error("input proof invalid: {0}")]
    ProofInvalid(#[source] CipherError),

    /// A call into the entropy service failed.
    #[error("entropy service call failed: {0}")]
    ServiceCallFailed(#[source] ServiceError),

    /// The ciphertext engine failed on an already-validated handle.
    #[error("ciphertext engine error: {0}")]
    CiphertextEngine(#[source] CipherError),
}

impl VaultError {
    /// Classify an engine error raised while turning external input into a
    /// handle.
    fn from_input(err: CipherError) -> Self {
        match err {
            CipherError::InvalidProof { .. } | CipherError::MalformedInput(_) => {
                Self::ProofInvalid(err)
            }
            other => Self::CiphertextEngine(other),
        }
    }

    /// Stable kind name for logs and exit reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::InsufficientFee { .. } => "INSUFFICIENT_FEE",
            Self::UnknownRequest(_) => "UNKNOWN_REQUEST",
            Self::EntropyNotReady(_) => "ENTROPY_NOT_READY",
            Self::ProofInvalid(_) => "PROOF_INVALID",
            Self::ServiceCallFailed(_) => "SERVICE_CALL_FAILED",
            Self::CiphertextEngine(_) => "CIPHERTEXT_ENGINE",
        }
    }
}

impl From<TrackerError> for VaultError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::UnknownRequest(id) => Self::UnknownRequest(id),
            TrackerError::NotFulfilled(id) => Self::EntropyNotReady(id),
            TrackerError::ServiceCallFailed { source } => Self::ServiceCallFailed(source),
        }
    }
}

// ─── State ──────────────────────────────────────────────────────────

/// Lifecycle state of a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VaultState {
    Empty,
    Initialized,
}

impl VaultState {
    /// The canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::Initialized => "INITIALIZED",
        }
    }
}

impl std::fmt::Display for VaultState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Record of the vault's single transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultTransitionRecord {
    pub from_state: VaultState,
    pub to_state: VaultState,
    pub path: StorePath,
    pub handle: CiphertextHandle,
    pub timestamp: Timestamp,
}

/// A single write-once slot for an opaque ciphertext handle.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValueVault {
    id: VaultId,
    address: Address,
    entropy_service: Address,
    slot: Option<CiphertextHandle>,
    tracker: EntropyRequestTracker,
    transition_log: Vec<VaultTransitionRecord>,
    #[serde(skip)]
    observers: Vec<Box<dyn VaultObserver>>,
}

impl ValueVault {
    /// Create an empty vault executing as `address` and bound to the entropy
    /// service at `entropy_service`.
    pub fn new(address: Address, entropy_service: Address) -> Self {
        let id = VaultId::new();
        tracing::debug!(vault = %id, %address, %entropy_service, "vault created");
        Self {
            id,
            address,
            entropy_service,
            slot: None,
            tracker: EntropyRequestTracker::new(address),
            transition_log: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Register an observer for committed events.
    pub fn subscribe(&mut self, observer: Box<dyn VaultObserver>) {
        self.observers.push(observer);
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Store a caller-supplied ciphertext as-is and make it publicly
    /// revealable.
    ///
    /// Irreversible: anyone can decrypt the stored value afterwards.
    pub fn store_plain<E>(
        &mut self,
        engine: &mut E,
        input: &ExternalCiphertext,
        proof: &InputProof,
    ) -> Result<(), VaultError>
    where
        E: CiphertextEngine + ?Sized,
    {
        let result = self.try_store_plain(engine, input, proof);
        self.log_rejection("store_plain", &result);
        result
    }

    fn try_store_plain<E>(
        &mut self,
        engine: &mut E,
        input: &ExternalCiphertext,
        proof: &InputProof,
    ) -> Result<(), VaultError>
    where
        E: CiphertextEngine + ?Sized,
    {
        self.ensure_empty()?;

        let handle = engine
            .from_external(input, proof, &self.address)
            .map_err(VaultError::from_input)?;
        tracing::debug!(vault = %self.id, %handle, "input validated");

        engine
            .grant_execution_permission(&self.address, &handle, &self.address)
            .map_err(VaultError::CiphertextEngine)?;
        let revealable = engine
            .mark_publicly_revealable(&self.address, &handle)
            .map_err(VaultError::CiphertextEngine)?;

        self.commit(revealable, StorePath::Plain);
        Ok(())
    }

    /// Register an entropy request with the service, forwarding `fee_paid`.
    ///
    /// Fails with `InsufficientFee` when `fee_paid` is below the service's
    /// current fee; no request is registered and nothing is forwarded.
    /// Only the service the vault was created with is accepted.
    pub fn request_entropy<S>(
        &mut self,
        service: &mut S,
        tag: RequestTag,
        fee_paid: Amount,
    ) -> Result<RequestId, VaultError>
    where
        S: EntropyService + ?Sized,
    {
        let result = self.try_request_entropy(service, tag, fee_paid);
        self.log_rejection("request_entropy", &result);
        result
    }

    fn try_request_entropy<S>(
        &mut self,
        service: &mut S,
        tag: RequestTag,
        fee_paid: Amount,
    ) -> Result<RequestId, VaultError>
    where
        S: EntropyService + ?Sized,
    {
        self.ensure_bound_service(service)?;
        let required = service.current_fee();
        if !fee_paid.covers(required) {
            return Err(VaultError::InsufficientFee {
                required,
                paid: fee_paid,
            });
        }

        let request_id = self.tracker.register(service, tag, fee_paid)?;
        self.notify(&VaultEvent::EntropyRequested {
            vault: self.id,
            request_id,
            tag,
            fee_paid,
        });
        Ok(request_id)
    }

    /// Combine a caller-supplied ciphertext with the entropy of a fulfilled
    /// request, store the result, and consume the request.
    ///
    /// The service's fulfillment answer is trusted only at the instant it is
    /// checked. If the entropy cannot be read a moment later the call fails
    /// with `ServiceCallFailed` and the request stays consumable.
    pub fn store_with_entropy<E, S>(
        &mut self,
        engine: &mut E,
        service: &S,
        input: &ExternalCiphertext,
        proof: &InputProof,
        request_id: RequestId,
    ) -> Result<(), VaultError>
    where
        E: CiphertextEngine + ?Sized,
        S: EntropyService + ?Sized,
    {
        let result = self.try_store_with_entropy(engine, service, input, proof, request_id);
        self.log_rejection("store_with_entropy", &result);
        result
    }

    fn try_store_with_entropy<E, S>(
        &mut self,
        engine: &mut E,
        service: &S,
        input: &ExternalCiphertext,
        proof: &InputProof,
        request_id: RequestId,
    ) -> Result<(), VaultError>
    where
        E: CiphertextEngine + ?Sized,
        S: EntropyService + ?Sized,
    {
        self.ensure_empty()?;
        self.ensure_bound_service(service)?;
        let authorized = self.tracker.authorize(service, request_id)?;

        let value = engine
            .from_external(input, proof, &self.address)
            .map_err(VaultError::from_input)?;
        tracing::debug!(vault = %self.id, handle = %value, %request_id, "input validated");
        engine
            .grant_execution_permission(&self.address, &value, &self.address)
            .map_err(VaultError::CiphertextEngine)?;

        let entropy = self.tracker.fetch_entropy(service, &authorized)?;
        engine
            .grant_execution_permission(&self.address, &entropy, &self.address)
            .map_err(VaultError::CiphertextEngine)?;

        let combined = engine
            .combine(&self.address, &value, &entropy)
            .map_err(VaultError::CiphertextEngine)?;
        engine
            .grant_execution_permission(&self.address, &combined, &self.address)
            .map_err(VaultError::CiphertextEngine)?;
        let revealable = engine
            .mark_publicly_revealable(&self.address, &combined)
            .map_err(VaultError::CiphertextEngine)?;

        self.tracker.settle(authorized)?;
        self.commit(revealable, StorePath::Entropy { request_id });
        Ok(())
    }

    /// The stored handle.
    pub fn value(&self) -> Result<CiphertextHandle, VaultError> {
        self.slot.ok_or(VaultError::NotInitialized)
    }

    /// Whether the slot has been filled.
    pub fn is_initialized(&self) -> bool {
        self.slot.is_some()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> VaultState {
        if self.is_initialized() {
            VaultState::Initialized
        } else {
            VaultState::Empty
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn id(&self) -> VaultId {
        self.id
    }

    /// The principal the vault executes as.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The entropy service this vault was configured with.
    pub fn entropy_service_address(&self) -> &Address {
        &self.entropy_service
    }

    pub fn tracker(&self) -> &EntropyRequestTracker {
        &self.tracker
    }

    pub fn transition_log(&self) -> &[VaultTransitionRecord] {
        &self.transition_log
    }

    // ── Internals ───────────────────────────────────────────────────

    fn ensure_empty(&self) -> Result<(), VaultError> {
        if self.is_initialized() {
            Err(VaultError::AlreadyInitialized)
        } else {
            Ok(())
        }
    }

    fn ensure_bound_service<S>(&self, service: &S) -> Result<(), VaultError>
    where
        S: EntropyService + ?Sized,
    {
        let actual = service.address();
        if actual == self.entropy_service {
            Ok(())
        } else {
            Err(VaultError::ServiceCallFailed(ServiceError::Unavailable(
                format!(
                    "wrong entropy service {actual}, vault is bound to {}",
                    self.entropy_service
                ),
            )))
        }
    }

    fn commit(&mut self, handle: CiphertextHandle, path: StorePath) {
        self.slot = Some(handle);
        self.transition_log.push(VaultTransitionRecord {
            from_state: VaultState::Empty,
            to_state: VaultState::Initialized,
            path,
            handle,
            timestamp: Timestamp::now(),
        });
        tracing::info!(vault = %self.id, %handle, %path, "value committed");
        self.notify(&VaultEvent::ValueStored {
            vault: self.id,
            handle,
            path,
        });
    }

    fn notify(&self, event: &VaultEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }

    fn log_rejection<T>(&self, operation: &'static str, result: &Result<T, VaultError>) {
        if let Err(e) = result {
            tracing::warn!(vault = %self.id, operation, kind = e.kind(), error = %e, "vault call rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use entrovault_entropy::MockEntropyService;
    use entrovault_fhe::{MockCiphertextEngine, PublicDecryption};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn vault_addr() -> Address {
        Address::from_bytes([0xAA; 20])
    }

    fn service_addr() -> Address {
        Address::from_bytes([0x5E; 20])
    }

    fn tag() -> RequestTag {
        RequestTag::from_bytes([0x42; 32])
    }

    struct Fixture {
        vault: ValueVault,
        engine: MockCiphertextEngine,
        service: MockEntropyService,
        rng: StdRng,
    }

    fn fixture() -> Fixture {
        Fixture {
            vault: ValueVault::new(vault_addr(), service_addr()),
            engine: MockCiphertextEngine::new([7; 32]),
            service: MockEntropyService::new(service_addr(), Amount(100)),
            rng: StdRng::seed_from_u64(1),
        }
    }

    impl Fixture {
        fn input(&mut self, value: u64) -> (ExternalCiphertext, InputProof) {
            self.engine
                .encrypt_input(value, &vault_addr(), &mut self.rng)
                .unwrap()
        }

        fn fulfilled_request(&mut self, entropy: u64) -> RequestId {
            let id = self
                .vault
                .request_entropy(&mut self.service, tag(), Amount(100))
                .unwrap();
            self.service.fulfill(id, &mut self.engine, entropy).unwrap();
            id
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<VaultEvent>>>);

    impl VaultObserver for Recorder {
        fn on_event(&self, event: &VaultEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn new_vault_is_empty() {
        let f = fixture();
        assert!(!f.vault.is_initialized());
        assert_eq!(f.vault.state(), VaultState::Empty);
        assert_eq!(f.vault.value(), Err(VaultError::NotInitialized));
        assert_eq!(f.vault.entropy_service_address(), &service_addr());
        assert_eq!(f.vault.address(), &vault_addr());
        assert!(f.vault.transition_log().is_empty());
    }

    #[test]
    fn store_plain_commits_revealable_value() {
        let mut f = fixture();
        let (ct, proof) = f.input(42);
        f.vault.store_plain(&mut f.engine, &ct, &proof).unwrap();

        let handle = f.vault.value().unwrap();
        assert!(f.vault.is_initialized());
        assert_eq!(f.engine.reveal(&handle).unwrap(), 42);
        assert_eq!(f.vault.transition_log().len(), 1);
        assert_eq!(f.vault.transition_log()[0].path, StorePath::Plain);
    }

    #[test]
    fn store_plain_twice_rejected() {
        let mut f = fixture();
        let (ct, proof) = f.input(42);
        f.vault.store_plain(&mut f.engine, &ct, &proof).unwrap();
        let first = f.vault.value().unwrap();

        let (ct2, proof2) = f.input(9);
        assert_eq!(
            f.vault.store_plain(&mut f.engine, &ct2, &proof2),
            Err(VaultError::AlreadyInitialized)
        );
        assert_eq!(f.vault.value().unwrap(), first);
    }

    #[test]
    fn store_plain_rejects_bad_proof() {
        let mut f = fixture();
        let (ct, _) = f.input(42);
        let (_, other_proof) = f.input(43);
        let err = f
            .vault
            .store_plain(&mut f.engine, &ct, &other_proof)
            .unwrap_err();
        assert!(matches!(err, VaultError::ProofInvalid(_)));
        assert!(!f.vault.is_initialized());
    }

    #[test]
    fn input_for_other_vault_rejected() {
        let mut f = fixture();
        let (ct, proof) = f
            .engine
            .encrypt_input(42, &Address::from_bytes([0x01; 20]), &mut f.rng)
            .unwrap();
        assert!(matches!(
            f.vault.store_plain(&mut f.engine, &ct, &proof),
            Err(VaultError::ProofInvalid(CipherError::InvalidProof { .. }))
        ));
    }

    #[test]
    fn request_entropy_checks_fee() {
        let mut f = fixture();
        assert_eq!(
            f.vault.request_entropy(&mut f.service, tag(), Amount(99)),
            Err(VaultError::InsufficientFee {
                required: Amount(100),
                paid: Amount(99)
            })
        );
        assert!(f.vault.tracker().is_empty());
        assert_eq!(f.service.request_count(), 0);
    }

    #[test]
    fn request_entropy_overpayment_forwarded() {
        let mut f = fixture();
        let id = f
            .vault
            .request_entropy(&mut f.service, tag(), Amount(150))
            .unwrap();
        assert!(f.vault.tracker().is_consumable(id));
        assert_eq!(f.service.collected(), Amount(150));
    }

    #[test]
    fn store_with_entropy_mixes_value() {
        let mut f = fixture();
        let id = f.fulfilled_request(0xFF00);
        let (ct, proof) = f.input(0x0F0F);
        f.vault
            .store_with_entropy(&mut f.engine, &f.service, &ct, &proof, id)
            .unwrap();

        let handle = f.vault.value().unwrap();
        assert_eq!(f.engine.reveal(&handle).unwrap(), 0x0F0F ^ 0xFF00);
        assert!(!f.vault.tracker().is_consumable(id));
        assert_eq!(
            f.vault.transition_log()[0].path,
            StorePath::Entropy { request_id: id }
        );
    }

    #[test]
    fn already_initialized_wins_over_unknown_request() {
        let mut f = fixture();
        let (ct, proof) = f.input(1);
        f.vault.store_plain(&mut f.engine, &ct, &proof).unwrap();
        assert_eq!(
            f.vault
                .store_with_entropy(&mut f.engine, &f.service, &ct, &proof, RequestId(99)),
            Err(VaultError::AlreadyInitialized)
        );
    }

    #[test]
    fn unknown_request_wins_over_bad_proof() {
        let mut f = fixture();
        let (ct, _) = f.input(1);
        let bad = InputProof::new(vec![0; 32]);
        assert_eq!(
            f.vault
                .store_with_entropy(&mut f.engine, &f.service, &ct, &bad, RequestId(5)),
            Err(VaultError::UnknownRequest(RequestId(5)))
        );
    }

    #[test]
    fn not_ready_wins_over_bad_proof() {
        let mut f = fixture();
        let id = f
            .vault
            .request_entropy(&mut f.service, tag(), Amount(100))
            .unwrap();
        let (ct, _) = f.input(1);
        let bad = InputProof::new(vec![0; 32]);
        assert_eq!(
            f.vault
                .store_with_entropy(&mut f.engine, &f.service, &ct, &bad, id),
            Err(VaultError::EntropyNotReady(id))
        );
    }

    #[test]
    fn bad_proof_leaves_request_consumable() {
        let mut f = fixture();
        let id = f.fulfilled_request(3);
        let (ct, _) = f.input(1);
        let bad = InputProof::new(vec![0; 32]);
        assert!(matches!(
            f.vault
                .store_with_entropy(&mut f.engine, &f.service, &ct, &bad, id),
            Err(VaultError::ProofInvalid(_))
        ));
        assert!(f.vault.tracker().is_consumable(id));
        assert!(!f.vault.is_initialized());

        let (ct, proof) = f.input(1);
        f.vault
            .store_with_entropy(&mut f.engine, &f.service, &ct, &proof, id)
            .unwrap();
    }

    #[test]
    fn withdrawn_entropy_fails_without_state_change() {
        let mut f = fixture();
        let id = f.fulfilled_request(3);
        f.service.unfulfill(id).unwrap();
        let (ct, proof) = f.input(1);
        // Withdrawn before the call: the fulfillment check catches it.
        assert_eq!(
            f.vault
                .store_with_entropy(&mut f.engine, &f.service, &ct, &proof, id),
            Err(VaultError::EntropyNotReady(id))
        );
        assert!(f.vault.tracker().is_consumable(id));
    }

    #[test]
    fn request_through_unbound_service_rejected() {
        let mut f = fixture();
        let mut rogue = MockEntropyService::new(Address::from_bytes([0xEE; 20]), Amount(100));
        assert!(matches!(
            f.vault.request_entropy(&mut rogue, tag(), Amount(100)),
            Err(VaultError::ServiceCallFailed(ServiceError::Unavailable(_)))
        ));
        assert!(f.vault.tracker().is_empty());
        assert_eq!(rogue.request_count(), 0);
        assert_eq!(rogue.collected(), Amount(0));
    }

    #[test]
    fn store_through_unbound_service_rejected() {
        let mut f = fixture();
        let id = f
            .vault
            .request_entropy(&mut f.service, tag(), Amount(100))
            .unwrap();

        // Same request id, fulfilled with zero entropy on a service the vault
        // never agreed to use.
        let mut rogue = MockEntropyService::new(Address::from_bytes([0xEE; 20]), Amount(100));
        let rogue_id = rogue
            .request_entropy(&vault_addr(), &tag(), Amount(100))
            .unwrap();
        assert_eq!(rogue_id, id);
        rogue.fulfill(rogue_id, &mut f.engine, 0).unwrap();

        let (ct, proof) = f.input(42);
        assert!(matches!(
            f.vault
                .store_with_entropy(&mut f.engine, &rogue, &ct, &proof, id),
            Err(VaultError::ServiceCallFailed(ServiceError::Unavailable(_)))
        ));
        assert!(!f.vault.is_initialized());
        assert!(f.vault.tracker().is_consumable(id));
        assert!(f.vault.transition_log().is_empty());
    }

    #[test]
    fn already_initialized_wins_over_unbound_service() {
        let mut f = fixture();
        let (ct, proof) = f.input(1);
        f.vault.store_plain(&mut f.engine, &ct, &proof).unwrap();
        let rogue = MockEntropyService::new(Address::from_bytes([0xEE; 20]), Amount(100));
        assert_eq!(
            f.vault
                .store_with_entropy(&mut f.engine, &rogue, &ct, &proof, RequestId(1)),
            Err(VaultError::AlreadyInitialized)
        );
    }

    #[test]
    fn tracker_error_mapping() {
        assert_eq!(
            VaultError::from(TrackerError::NotFulfilled(RequestId(2))),
            VaultError::EntropyNotReady(RequestId(2))
        );
        assert_eq!(
            VaultError::from(TrackerError::ServiceCallFailed {
                source: ServiceError::NotFulfilled(RequestId(2))
            })
            .kind(),
            "SERVICE_CALL_FAILED"
        );
    }

    #[test]
    fn observers_see_committed_events_only() {
        let mut f = fixture();
        let recorder = Recorder::default();
        f.vault.subscribe(Box::new(recorder.clone()));

        assert!(f
            .vault
            .request_entropy(&mut f.service, tag(), Amount(1))
            .is_err());
        assert!(recorder.0.lock().unwrap().is_empty());

        let id = f.fulfilled_request(5);
        let (ct, proof) = f.input(6);
        f.vault
            .store_with_entropy(&mut f.engine, &f.service, &ct, &proof, id)
            .unwrap();

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], VaultEvent::EntropyRequested { request_id, .. } if request_id == id));
        assert!(matches!(
            events[1],
            VaultEvent::ValueStored {
                path: StorePath::Entropy { .. },
                ..
            }
        ));
    }

    #[test]
    fn serde_roundtrip_preserves_slot_and_tracker() {
        let mut f = fixture();
        let id = f.fulfilled_request(5);
        let (ct, proof) = f.input(6);
        f.vault
            .store_with_entropy(&mut f.engine, &f.service, &ct, &proof, id)
            .unwrap();

        let json = serde_json::to_string(&f.vault).unwrap();
        let restored: ValueVault = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.value(), f.vault.value());
        assert_eq!(restored.id(), f.vault.id());
        assert!(!restored.tracker().is_consumable(id));
        assert_eq!(restored.transition_log().len(), 1);
    }
}
