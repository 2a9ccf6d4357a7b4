//! # Vault Subcommands
//!
//! Every public vault operation, driven against the deployment snapshot.
//!
//! ## Subcommands
//!
//! - `init` — Create a fresh deployment from configuration.
//! - `encrypt` — Client-side encryption of a value for the vault.
//! - `store-plain` — Store a ciphertext as-is (EMPTY → INITIALIZED).
//! - `request-entropy` — Pay for and register an entropy request.
//! - `fulfill` — Fulfill a request out-of-band, as the entropy service.
//! - `store-with-entropy` — Mix a ciphertext with fulfilled entropy and store it.
//! - `value` — Print the stored handle.
//! - `reveal` — Publicly decrypt the stored value.
//! - `status` — Show vault state and transition history.
//! - `requests` — List entropy requests and their states.
//!
//! ## Exit Codes
//!
//! `0` on success, `2` when the vault rejects the operation (the snapshot is
//! left untouched), `1` for any other failure.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use entrovault_core::{Address, Amount, ExternalCiphertext, InputProof, RequestId, RequestTag};
use entrovault_entropy::EntropyService;
use entrovault_fhe::PublicDecryption;
use entrovault_state::VaultError;

use crate::config::VaultConfig;
use crate::deployment::Deployment;

/// Exit code for an operation the vault rejected.
pub const EXIT_REJECTED: u8 = 2;

/// Vault subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new deployment with an empty vault.
    Init {
        /// Replace an existing deployment.
        #[arg(long)]
        force: bool,
    },

    /// Encrypt a value for submission to the vault.
    Encrypt {
        /// The plaintext value.
        value: u64,
        /// Principal the input is bound to (defaults to the vault).
        #[arg(long)]
        target: Option<Address>,
    },

    /// Store a ciphertext without entropy (EMPTY → INITIALIZED).
    StorePlain {
        /// Hex external ciphertext, as printed by `encrypt`.
        #[arg(long)]
        ciphertext: ExternalCiphertext,
        /// Hex input proof, as printed by `encrypt`.
        #[arg(long)]
        proof: InputProof,
    },

    /// Register an entropy request, forwarding the fee to the service.
    RequestEntropy {
        /// 32-byte hex request tag.
        #[arg(long)]
        tag: RequestTag,
        /// Fee to pay (defaults to the service's current fee).
        #[arg(long)]
        fee: Option<u64>,
    },

    /// Fulfill an entropy request as the service would.
    Fulfill {
        /// Request identifier.
        request: RequestId,
        /// Entropy value (random when omitted).
        #[arg(long)]
        value: Option<u64>,
    },

    /// Mix a ciphertext with fulfilled entropy and store it.
    StoreWithEntropy {
        /// Hex external ciphertext.
        #[arg(long)]
        ciphertext: ExternalCiphertext,
        /// Hex input proof.
        #[arg(long)]
        proof: InputProof,
        /// Fulfilled request to consume.
        #[arg(long)]
        request: RequestId,
    },

    /// Print the stored ciphertext handle.
    Value,

    /// Publicly decrypt the stored value.
    Reveal,

    /// Show vault state.
    Status,

    /// List entropy requests made by the vault.
    Requests {
        /// Only requests not yet consumed.
        #[arg(long)]
        pending: bool,
    },
}

/// Execute a subcommand against the snapshot at `state_file`.
pub fn run_command(command: &Command, config: &VaultConfig, state_file: &Path) -> Result<u8> {
    match command {
        Command::Init { force } => cmd_init(config, state_file, *force),
        Command::Encrypt { value, target } => cmd_encrypt(state_file, *value, target.as_ref()),
        Command::StorePlain { ciphertext, proof } => cmd_store_plain(state_file, ciphertext, proof),
        Command::RequestEntropy { tag, fee } => {
            cmd_request_entropy(state_file, *tag, fee.map(Amount))
        }
        Command::Fulfill { request, value } => cmd_fulfill(state_file, *request, *value),
        Command::StoreWithEntropy {
            ciphertext,
            proof,
            request,
        } => cmd_store_with_entropy(state_file, ciphertext, proof, *request),
        Command::Value => cmd_value(state_file),
        Command::Reveal => cmd_reveal(state_file),
        Command::Status => cmd_status(state_file),
        Command::Requests { pending } => cmd_requests(state_file, *pending),
    }
}

/// Report a vault rejection and return its exit code.
fn rejected(err: &VaultError) -> u8 {
    eprintln!("REJECTED [{}]: {err}", err.kind());
    EXIT_REJECTED
}

fn cmd_init(config: &VaultConfig, state_file: &Path, force: bool) -> Result<u8> {
    if state_file.exists() && !force {
        bail!(
            "deployment already exists at {} (use --force to replace it)",
            state_file.display()
        );
    }
    let deployment = Deployment::new(config)?;
    deployment.save(state_file)?;
    println!(
        "OK: created {} at {} (entropy service {}, fee {})",
        deployment.vault.id(),
        deployment.vault.address(),
        deployment.vault.entropy_service_address(),
        deployment.service.current_fee()
    );
    Ok(0)
}

fn cmd_encrypt(state_file: &Path, value: u64, target: Option<&Address>) -> Result<u8> {
    let deployment = Deployment::load(state_file)?;
    let target = target.copied().unwrap_or(*deployment.vault.address());
    let (ciphertext, proof) = deployment
        .engine
        .encrypt_input(value, &target, &mut rand::thread_rng())
        .context("client-side encryption failed")?;

    let out = serde_json::json!({
        "target": target,
        "ciphertext": ciphertext,
        "proof": proof,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(0)
}

fn cmd_store_plain(state_file: &Path, ciphertext: &ExternalCiphertext, proof: &InputProof) -> Result<u8> {
    let mut d = Deployment::load(state_file)?;
    if let Err(e) = d.vault.store_plain(&mut d.engine, ciphertext, proof) {
        return Ok(rejected(&e));
    }
    d.save(state_file)?;
    println!("OK: value stored ({})", d.vault.value()?);
    Ok(0)
}

fn cmd_request_entropy(state_file: &Path, tag: RequestTag, fee: Option<Amount>) -> Result<u8> {
    let mut d = Deployment::load(state_file)?;
    let fee = fee.unwrap_or_else(|| d.service.current_fee());
    let id = match d.vault.request_entropy(&mut d.service, tag, fee) {
        Ok(id) => id,
        Err(e) => return Ok(rejected(&e)),
    };
    d.save(state_file)?;
    println!("OK: registered {id} (paid {fee})");
    Ok(0)
}

fn cmd_fulfill(state_file: &Path, request: RequestId, value: Option<u64>) -> Result<u8> {
    let mut d = Deployment::load(state_file)?;
    let handle = match value {
        Some(v) => d.service.fulfill(request, &mut d.engine, v),
        None => d
            .service
            .fulfill_random(request, &mut d.engine, &mut rand::thread_rng()),
    }
    .with_context(|| format!("entropy service could not fulfill {request}"))?;
    d.save(state_file)?;
    println!("OK: fulfilled {request} ({handle})");
    Ok(0)
}

fn cmd_store_with_entropy(
    state_file: &Path,
    ciphertext: &ExternalCiphertext,
    proof: &InputProof,
    request: RequestId,
) -> Result<u8> {
    let mut d = Deployment::load(state_file)?;
    if let Err(e) = d
        .vault
        .store_with_entropy(&mut d.engine, &d.service, ciphertext, proof, request)
    {
        return Ok(rejected(&e));
    }
    d.save(state_file)?;
    println!("OK: value stored with entropy from {request} ({})", d.vault.value()?);
    Ok(0)
}

fn cmd_value(state_file: &Path) -> Result<u8> {
    let d = Deployment::load(state_file)?;
    match d.vault.value() {
        Ok(handle) => {
            println!("{handle}");
            Ok(0)
        }
        Err(e) => Ok(rejected(&e)),
    }
}

fn cmd_reveal(state_file: &Path) -> Result<u8> {
    let d = Deployment::load(state_file)?;
    let handle = match d.vault.value() {
        Ok(handle) => handle,
        Err(e) => return Ok(rejected(&e)),
    };
    let value = d
        .engine
        .reveal(&handle)
        .with_context(|| format!("failed to reveal {handle}"))?;
    println!("{value}");
    Ok(0)
}

fn cmd_status(state_file: &Path) -> Result<u8> {
    let d = Deployment::load(state_file)?;
    let vault = &d.vault;

    println!("Vault: {}", vault.id());
    println!("  Address: {}", vault.address());
    println!("  Entropy service: {}", vault.entropy_service_address());
    println!("  Current fee: {}", d.service.current_fee());
    println!("  State: {}", vault.state());
    if let Ok(handle) = vault.value() {
        println!("  Value: {handle}");
    }
    println!(
        "  Requests: {} ({} pending)",
        vault.tracker().len(),
        vault.tracker().pending().count()
    );
    for (i, t) in vault.transition_log().iter().enumerate() {
        println!(
            "    [{i}] {} → {} via {} at {}",
            t.from_state, t.to_state, t.path, t.timestamp
        );
    }
    Ok(0)
}

fn cmd_requests(state_file: &Path, pending_only: bool) -> Result<u8> {
    let d = Deployment::load(state_file)?;
    let tracker = d.vault.tracker();
    if tracker.is_empty() {
        println!("No entropy requests.");
        return Ok(0);
    }

    for (id, record) in tracker.records() {
        if pending_only && !record.consumable {
            continue;
        }
        let fulfilled = if d.service.is_request_fulfilled(id) {
            "fulfilled"
        } else {
            "unfulfilled"
        };
        println!(
            "{id}  {}  {fulfilled}  fee {}  tag {}",
            record.state(),
            record.fee_paid,
            record.tag
        );
    }
    Ok(0)
}

/// Resolve the snapshot path: flag, then configuration.
pub fn resolve_state_file(flag: Option<&Path>, config: &VaultConfig) -> PathBuf {
    flag.map(Path::to_path_buf)
        .unwrap_or_else(|| config.state_file.clone())
}
