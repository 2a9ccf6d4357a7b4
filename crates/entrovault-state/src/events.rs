//! # Vault Events
//!
//! Side-channel notifications delivered after a vault operation commits.
//! Observers are optional: a vault with none registered behaves identically,
//! and observers are never persisted with the vault.

use serde::{Deserialize, Serialize};

use entrovault_core::{Amount, CiphertextHandle, RequestId, RequestTag, VaultId};

/// How a vault's slot was filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorePath {
    /// Caller value stored as submitted.
    Plain,
    /// Caller value combined with the entropy of a consumed request.
    Entropy {
        /// The consumed request.
        request_id: RequestId,
    },
}

impl StorePath {
    /// The canonical path name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Entropy { .. } => "ENTROPY",
        }
    }
}

impl std::fmt::Display for StorePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => f.write_str("PLAIN"),
            Self::Entropy { request_id } => write!(f, "ENTROPY({request_id})"),
        }
    }
}

/// A committed vault state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VaultEvent {
    /// An entropy request was registered and its fee forwarded.
    EntropyRequested {
        vault: VaultId,
        request_id: RequestId,
        tag: RequestTag,
        fee_paid: Amount,
    },
    /// The slot was filled and marked publicly revealable.
    ValueStored {
        vault: VaultId,
        handle: CiphertextHandle,
        path: StorePath,
    },
}

/// Receives vault events after each successful transition.
pub trait VaultObserver: std::fmt::Debug + Send + Sync {
    fn on_event(&self, event: &VaultEvent);
}

/// Observer that writes every event to the `tracing` pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl VaultObserver for TracingObserver {
    fn on_event(&self, event: &VaultEvent) {
        match event {
            VaultEvent::EntropyRequested {
                vault,
                request_id,
                fee_paid,
                ..
            } => {
                tracing::info!(target: "entrovault::events", %vault, %request_id, %fee_paid, "EntropyRequested");
            }
            VaultEvent::ValueStored {
                vault,
                handle,
                path,
            } => {
                tracing::info!(target: "entrovault::events", %vault, %handle, %path, "ValueStored");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entrovault_core::{CapabilityToken, HandleId};

    #[test]
    fn store_path_names() {
        assert_eq!(StorePath::Plain.name(), "PLAIN");
        let p = StorePath::Entropy {
            request_id: RequestId(3),
        };
        assert_eq!(p.name(), "ENTROPY");
        assert_eq!(p.to_string(), "ENTROPY(request:3)");
    }

    #[test]
    fn event_serializes_tagged() {
        let event = VaultEvent::ValueStored {
            vault: VaultId::new(),
            handle: CiphertextHandle::new(
                HandleId::from_bytes([1; 32]),
                CapabilityToken::from_bytes([2; 16]),
            ),
            path: StorePath::Entropy {
                request_id: RequestId(7),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "value_stored");
        assert_eq!(json["path"]["path"], "ENTROPY");
        assert_eq!(json["path"]["request_id"], 7);
    }

    #[test]
    fn tracing_observer_accepts_events() {
        TracingObserver.on_event(&VaultEvent::EntropyRequested {
            vault: VaultId::new(),
            request_id: RequestId(1),
            tag: RequestTag::from_bytes([0; 32]),
            fee_paid: Amount(5),
        });
    }
}
