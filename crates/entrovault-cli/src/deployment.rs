//! # Deployment Snapshot
//!
//! One vault together with the collaborators it runs against, persisted as a
//! single pretty-printed JSON file. Each CLI invocation loads the snapshot,
//! performs one operation, and writes it back only if the operation
//! succeeded.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use entrovault_entropy::MockEntropyService;
use entrovault_fhe::MockCiphertextEngine;
use entrovault_state::{TracingObserver, ValueVault};

use crate::config::VaultConfig;

/// A vault and its local collaborators.
#[derive(Debug, Serialize, Deserialize)]
pub struct Deployment {
    pub vault: ValueVault,
    pub engine: MockCiphertextEngine,
    pub service: MockEntropyService,
}

impl Deployment {
    /// Build a fresh deployment from configuration.
    pub fn new(config: &VaultConfig) -> Result<Self> {
        let mut vault = ValueVault::new(config.vault_address, config.entropy_service_address);
        vault.subscribe(Box::new(TracingObserver));
        Ok(Self {
            vault,
            engine: MockCiphertextEngine::new(config.engine_key_bytes()?),
            service: MockEntropyService::new(config.entropy_service_address, config.entropy_fee),
        })
    }

    /// Read a snapshot and reattach the logging observer.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "no deployment at {} (run `entrovault init` first)",
                path.display()
            );
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read state file: {}", path.display()))?;
        let mut deployment: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse state file: {}", path.display()))?;
        deployment.vault.subscribe(Box::new(TracingObserver));
        Ok(deployment)
    }

    /// Write the snapshot, replacing any previous file in one rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create state directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write state file: {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace state file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "deployment saved");
        Ok(())
    }
}
