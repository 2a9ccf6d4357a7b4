//! # entrovault-cli — CLI Tool for entrovault
//!
//! Provides the `entrovault` command-line interface: a local deployment of
//! one `ValueVault` wired to the mock ciphertext engine and mock entropy
//! service, persisted as a JSON snapshot between invocations.
//!
//! ```bash
//! entrovault init
//! entrovault encrypt 42
//! entrovault store-plain --ciphertext 0x… --proof 0x…
//! entrovault request-entropy --tag 0x…
//! entrovault fulfill 1
//! entrovault store-with-entropy --ciphertext 0x… --proof 0x… --request 1
//! entrovault reveal
//! ```

pub mod commands;
pub mod config;
pub mod deployment;

pub use commands::{resolve_state_file, run_command, Command, EXIT_REJECTED};
pub use config::{LogFormat, VaultConfig, DEFAULT_STATE_FILE};
pub use deployment::Deployment;
