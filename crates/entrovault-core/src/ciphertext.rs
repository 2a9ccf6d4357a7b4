//! # Opaque Ciphertext Types
//!
//! The vault never sees plaintext. It holds [`CiphertextHandle`]s, which are
//! references into an external ciphertext engine, and it forwards caller
//! supplied [`ExternalCiphertext`] / [`InputProof`] byte strings to that
//! engine without interpreting them.
//!
//! ## Security Invariant
//!
//! No method here exposes or derives the encrypted value. Combining and
//! revealing are engine operations (`entrovault-fhe`), never core ones.

use serde::{Deserialize, Serialize};

use crate::error::HexError;
use crate::hex;
use crate::identity::{CapabilityToken, HandleId};

/// An opaque reference to an encrypted 64-bit unsigned value.
///
/// The handle is the pair of an engine-assigned identifier and the
/// capability token the engine issued with it. Both are required for any
/// engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CiphertextHandle {
    id: HandleId,
    capability: CapabilityToken,
}

impl CiphertextHandle {
    /// Construct a handle. Only ciphertext engines should call this.
    pub fn new(id: HandleId, capability: CapabilityToken) -> Self {
        Self { id, capability }
    }

    /// The engine-assigned identifier.
    pub fn id(&self) -> &HandleId {
        &self.id
    }

    /// The capability token issued with the identifier.
    pub fn capability(&self) -> &CapabilityToken {
        &self.capability
    }
}

impl std::fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handle:{}", self.id)
    }
}

macro_rules! hex_bytes_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Vec<u8>);

        impl $name {
            /// Wrap raw bytes.
            pub fn new(bytes: Vec<u8>) -> Self {
                Self(bytes)
            }

            /// Access the raw bytes.
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Render as `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(&self.0))
            }

            /// Parse from hex, with or without a `0x` prefix.
            pub fn parse(s: &str) -> Result<Self, HexError> {
                hex::decode(s).map(Self)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.to_hex()
            }
        }

        impl TryFrom<String> for $name {
            type Error = HexError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = HexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

hex_bytes_newtype!(
    /// Caller-supplied encrypted input, in the engine's external wire form.
    ExternalCiphertext
);

hex_bytes_newtype!(
    /// Proof that an [`ExternalCiphertext`] is well formed and bound to the
    /// vault it is submitted to.
    InputProof
);
