//! # Identity Newtypes
//!
//! Newtype wrappers for every identifier that crosses a component
//! boundary. You cannot pass a `HandleId` where a `RequestTag` is expected,
//! even though both are 32 bytes.
//!
//! Fixed-size byte identifiers serialize as `0x`-prefixed lowercase hex
//! strings so they can be used as JSON map keys in persisted state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HexError;
use crate::hex;

/// Declare a fixed-length byte newtype with hex `Display`/`FromStr`/serde.
macro_rules! fixed_bytes_newtype {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name([u8; $len]);

        impl $name {
            /// Length of the identifier in bytes.
            pub const LEN: usize = $len;

            /// Wrap raw bytes.
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Access the raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Render as `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(&self.0))
            }

            /// Parse from hex, with or without a `0x` prefix.
            pub fn parse(s: &str) -> Result<Self, HexError> {
                hex::decode_fixed::<$len>(s).map(Self)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl std::str::FromStr for $name {
            type Err = HexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
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
    };
}

fixed_bytes_newtype!(
    /// A 20-byte account or service address.
    ///
    /// Identifies the vault instance (the principal that ciphertext
    /// permissions are granted to) and the external entropy service.
    Address,
    20
);

fixed_bytes_newtype!(
    /// Caller-chosen 32-byte tag forwarded with an entropy request.
    RequestTag,
    32
);

fixed_bytes_newtype!(
    /// Engine-assigned identifier of a ciphertext.
    HandleId,
    32
);

fixed_bytes_newtype!(
    /// Capability token that must accompany a [`HandleId`] on every engine
    /// operation. A handle with the wrong token is treated as forged.
    CapabilityToken,
    16
);

/// Unique identifier for a vault instance, used in logs and persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultId(pub Uuid);

impl VaultId {
    /// Generate a new random vault identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VaultId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VaultId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vault:{}", self.0)
    }
}

/// Service-assigned identifier of an entropy request.
///
/// Opaque to the vault: it is only ever compared, stored, and passed back
/// to the entropy service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl RequestId {
    /// The raw numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request:{}", self.0)
    }
}

impl std::str::FromStr for RequestId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("request:").unwrap_or(s);
        digits.parse().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_display() {
        let addr = Address::from_bytes([0x11; 20]);
        assert_eq!(addr.to_string(), format!("0x{}", "11".repeat(20)));
    }

    #[test]
    fn address_parse_rejects_wrong_length() {
        assert!(Address::parse("0x1111").is_err());
    }

    #[test]
    fn request_tag_serde_is_hex_string() {
        let tag = RequestTag::from_bytes([0xAB; 32]);
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(32)));
        let parsed: RequestTag = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tag);
    }

    #[test]
    fn handle_id_usable_as_json_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(HandleId::from_bytes([1; 32]), 7u8);
        let json = serde_json::to_string(&map).unwrap();
        let parsed: std::collections::BTreeMap<HandleId, u8> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn request_id_usable_as_json_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(RequestId(42), true);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"42":true}"#);
        let parsed: std::collections::BTreeMap<RequestId, bool> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn request_id_parses_with_or_without_prefix() {
        assert_eq!("7".parse::<RequestId>().unwrap(), RequestId(7));
        assert_eq!("request:7".parse::<RequestId>().unwrap(), RequestId(7));
        assert!("seven".parse::<RequestId>().is_err());
    }

    #[test]
    fn vault_ids_are_unique() {
        assert_ne!(VaultId::new(), VaultId::new());
    }
}
