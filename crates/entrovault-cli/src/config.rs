//! # CLI Configuration
//!
//! `VaultConfig` is read from a YAML file passed with `--config`. Every field
//! has a default, so an empty file (or no file) yields a working local
//! deployment. Command-line flags override file values.
//!
//! ```yaml
//! vault_address: "0x1111111111111111111111111111111111111111"
//! entropy_service_address: "0x5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e"
//! entropy_fee: 100
//! engine_key: "0x0101…01"
//! log_format: pretty
//! state_file: .entrovault/state.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use entrovault_core::{hex, Address, Amount};

/// Default location of the deployment snapshot.
pub const DEFAULT_STATE_FILE: &str = ".entrovault/state.json";

const DEFAULT_VAULT_ADDRESS: Address = Address::from_bytes([0x11; 20]);
const DEFAULT_SERVICE_ADDRESS: Address = Address::from_bytes([0x5E; 20]);
const DEFAULT_ENTROPY_FEE: Amount = Amount(100);

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Deployment and runtime settings.
///
/// `Debug` output redacts `engine_key`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultConfig {
    /// Principal the vault executes as.
    pub vault_address: Address,
    /// Address of the entropy service the vault is bound to.
    pub entropy_service_address: Address,
    /// Fee the mock entropy service charges per request.
    pub entropy_fee: Amount,
    /// 32-byte hex key of the mock ciphertext engine.
    pub engine_key: String,
    pub log_format: LogFormat,
    /// Path of the JSON deployment snapshot.
    pub state_file: PathBuf,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            vault_address: DEFAULT_VAULT_ADDRESS,
            entropy_service_address: DEFAULT_SERVICE_ADDRESS,
            entropy_fee: DEFAULT_ENTROPY_FEE,
            engine_key: hex::encode(&[0x01; 32]),
            log_format: LogFormat::default(),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("vault_address", &self.vault_address)
            .field("entropy_service_address", &self.entropy_service_address)
            .field("entropy_fee", &self.entropy_fee)
            .field("engine_key", &"<redacted>")
            .field("log_format", &self.log_format)
            .field("state_file", &self.state_file)
            .finish()
    }
}

impl VaultConfig {
    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file: {}", path.display()))?;
                Self::from_yaml(&content)
                    .with_context(|| format!("invalid config file: {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        tracing::debug!(
            vault_address = %config.vault_address,
            entropy_service_address = %config.entropy_service_address,
            entropy_fee = %config.entropy_fee,
            log_format = ?config.log_format,
            state_file = %config.state_file.display(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parse YAML. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.vault_address == self.entropy_service_address {
            bail!(
                "vault_address and entropy_service_address must differ (both {})",
                self.vault_address
            );
        }
        self.engine_key_bytes()?;
        Ok(())
    }

    /// Decoded engine key.
    pub fn engine_key_bytes(&self) -> Result<[u8; 32]> {
        hex::decode_fixed::<32>(&self.engine_key).context("engine_key must be 32 bytes of hex")
    }
}
