//! # Entropy Request Tracker
//!
//! Mediates between the vault and the external entropy service so that
//! request identifiers cannot be reused, forged, or consumed before the
//! service has fulfilled them.
//!
//! ## States (per request identifier)
//!
//! ```text
//! UNREGISTERED ──register()──▶ REGISTERED ──settle()──▶ CONSUMED (terminal)
//! ```
//!
//! A `REGISTERED` request that is never fulfilled stays `REGISTERED`
//! forever. That is inert state, not an error.
//!
//! ## Fulfillment
//!
//! The tracker never caches fulfillment. It asks the service at the moment
//! of [`EntropyRequestTracker::authorize`]. The service's answer holds only
//! for that instant: if a non-conforming service withdraws fulfillment
//! between the check and [`EntropyRequestTracker::fetch_entropy`], the fetch
//! fails with `ServiceCallFailed` and the request stays consumable.
//!
//! ## Two-Phase Consumption
//!
//! [`EntropyRequestTracker::try_consume`] is the single-call form. The vault
//! uses the split form (`authorize` → `fetch_entropy` → `settle`) so that the
//! request is marked consumed in the same step that commits the vault slot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use entrovault_core::{Address, Amount, CiphertextHandle, RequestId, RequestTag, Timestamp};
use entrovault_entropy::{EntropyService, ServiceError};

/// Lifecycle state of a request identifier, as seen by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    /// Never registered through this tracker.
    Unregistered,
    /// Registered and not yet consumed.
    Registered,
    /// Consumed; can never be used again.
    Consumed,
}

impl RequestState {
    /// The canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unregistered => "UNREGISTERED",
            Self::Registered => "REGISTERED",
            Self::Consumed => "CONSUMED",
        }
    }

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Consumed)
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Local record of a registered request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Tag forwarded to the service.
    pub tag: RequestTag,
    /// Fee forwarded to the service. Never refunded.
    pub fee_paid: Amount,
    /// `true` from registration until consumption, then `false` forever.
    pub consumable: bool,
    /// When the request was registered.
    pub registered_at: Timestamp,
    /// When the request was consumed.
    pub consumed_at: Option<Timestamp>,
}

impl RequestRecord {
    /// The record's lifecycle state.
    pub fn state(&self) -> RequestState {
        if self.consumable {
            RequestState::Registered
        } else {
            RequestState::Consumed
        }
    }
}

/// One entry in the tracker's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestTransitionRecord {
    /// The request that moved.
    pub request_id: RequestId,
    /// State before the transition.
    pub from_state: RequestState,
    /// State after the transition.
    pub to_state: RequestState,
    /// When the transition occurred (UTC).
    pub timestamp: Timestamp,
}

/// Errors from tracker operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// Never registered here, or already consumed.
    #[error("{0} was never registered or is already consumed")]
    UnknownRequest(RequestId),

    /// The service has not fulfilled the request.
    #[error("{0} is not fulfilled by the entropy service")]
    NotFulfilled(RequestId),

    /// The call into the entropy service failed.
    #[error("entropy service call failed: {source}")]
    ServiceCallFailed {
        /// The service's error.
        #[source]
        source: ServiceError,
    },
}

impl From<ServiceError> for TrackerError {
    fn from(source: ServiceError) -> Self {
        Self::ServiceCallFailed { source }
    }
}

/// Proof that a request passed the registration and fulfillment checks.
///
/// Produced by [`EntropyRequestTracker::authorize`] and spent by
/// [`EntropyRequestTracker::settle`]. Not `Clone`: one authorization settles
/// at most once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an authorized request is consumed only when settled"]
pub struct AuthorizedRequest {
    id: RequestId,
}

impl AuthorizedRequest {
    /// The authorized request identifier.
    pub fn id(&self) -> RequestId {
        self.id
    }
}

/// Registry of entropy requests made on behalf of one owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntropyRequestTracker {
    owner: Address,
    requests: BTreeMap<RequestId, RequestRecord>,
    transition_log: Vec<RequestTransitionRecord>,
}

impl EntropyRequestTracker {
    /// Create an empty tracker. `owner` is the requester recorded with the
    /// service and the principal that receives entropy permissions.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            requests: BTreeMap::new(),
            transition_log: Vec::new(),
        }
    }

    /// The principal requests are made for.
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Forward `tag` and `fee_paid` to the service and record the identifier
    /// it assigns as consumable.
    ///
    /// Fee sufficiency is the caller's check; the service may still reject
    /// the payment, which surfaces as `ServiceCallFailed`.
    pub fn register<S: EntropyService + ?Sized>(
        &mut self,
        service: &mut S,
        tag: RequestTag,
        fee_paid: Amount,
    ) -> Result<RequestId, TrackerError> {
        let id = service.request_entropy(&self.owner, &tag, fee_paid)?;
        if self.requests.contains_key(&id) {
            // A reissued identifier would let a consumed request be used again.
            return Err(ServiceError::Unavailable(format!("service reissued {id}")).into());
        }

        let now = Timestamp::now();
        self.requests.insert(
            id,
            RequestRecord {
                tag,
                fee_paid,
                consumable: true,
                registered_at: now,
                consumed_at: None,
            },
        );
        self.transition_log.push(RequestTransitionRecord {
            request_id: id,
            from_state: RequestState::Unregistered,
            to_state: RequestState::Registered,
            timestamp: now,
        });
        tracing::info!(request_id = %id, owner = %self.owner, fee_paid = %fee_paid, "entropy request registered");
        Ok(id)
    }

    /// Check that `id` is registered, unconsumed, and fulfilled.
    ///
    /// Makes no state change.
    pub fn authorize<S: EntropyService + ?Sized>(
        &self,
        service: &S,
        id: RequestId,
    ) -> Result<AuthorizedRequest, TrackerError> {
        if !self.is_consumable(id) {
            return Err(TrackerError::UnknownRequest(id));
        }
        if !service.is_request_fulfilled(id) {
            return Err(TrackerError::NotFulfilled(id));
        }
        tracing::debug!(request_id = %id, "entropy request authorized");
        Ok(AuthorizedRequest { id })
    }

    /// Read the encrypted entropy for an authorized request.
    ///
    /// This is the only path through which entropy payloads are read.
    /// Makes no state change.
    pub fn fetch_entropy<S: EntropyService + ?Sized>(
        &self,
        service: &S,
        authorized: &AuthorizedRequest,
    ) -> Result<CiphertextHandle, TrackerError> {
        Ok(service.get_encrypted_entropy(authorized.id)?)
    }

    /// Mark an authorized request consumed.
    ///
    /// Re-checks consumability, so two authorizations of the same request
    /// cannot both settle.
    pub fn settle(&mut self, authorized: AuthorizedRequest) -> Result<RequestId, TrackerError> {
        let id = authorized.id;
        let record = self
            .requests
            .get_mut(&id)
            .filter(|r| r.consumable)
            .ok_or(TrackerError::UnknownRequest(id))?;

        let now = Timestamp::now();
        record.consumable = false;
        record.consumed_at = Some(now);
        self.transition_log.push(RequestTransitionRecord {
            request_id: id,
            from_state: RequestState::Registered,
            to_state: RequestState::Consumed,
            timestamp: now,
        });
        tracing::info!(request_id = %id, "entropy request consumed");
        Ok(id)
    }

    /// Validate and consume `id` in one call, returning its entropy.
    pub fn try_consume<S: EntropyService + ?Sized>(
        &mut self,
        service: &S,
        id: RequestId,
    ) -> Result<CiphertextHandle, TrackerError> {
        let authorized = self.authorize(service, id)?;
        let entropy = self.fetch_entropy(service, &authorized)?;
        self.settle(authorized)?;
        Ok(entropy)
    }

    /// Lifecycle state of `id`.
    pub fn state_of(&self, id: RequestId) -> RequestState {
        self.requests
            .get(&id)
            .map(RequestRecord::state)
            .unwrap_or(RequestState::Unregistered)
    }

    /// Whether `id` is registered and not yet consumed.
    pub fn is_consumable(&self, id: RequestId) -> bool {
        self.requests.get(&id).map(|r| r.consumable).unwrap_or(false)
    }

    /// Local record for `id`.
    pub fn record(&self, id: RequestId) -> Option<&RequestRecord> {
        self.requests.get(&id)
    }

    /// Registered, unconsumed requests in identifier order.
    pub fn pending(&self) -> impl Iterator<Item = (RequestId, &RequestRecord)> {
        self.requests
            .iter()
            .filter(|(_, r)| r.consumable)
            .map(|(id, r)| (*id, r))
    }

    /// All records in identifier order.
    pub fn records(&self) -> impl Iterator<Item = (RequestId, &RequestRecord)> {
        self.requests.iter().map(|(id, r)| (*id, r))
    }

    /// Number of requests ever registered.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether no request was ever registered.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// The audit trail.
    pub fn transition_log(&self) -> &[RequestTransitionRecord] {
        &self.transition_log
    }
}
