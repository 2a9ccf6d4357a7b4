//! # Mock Ciphertext Engine
//!
//! A deterministic, transparent engine for tests and local runs.
//!
//! ## How It Works
//!
//! - **External wire form**: 24 bytes, `nonce (16) || masked (8, big-endian)`
//!   where `masked = value XOR SHA256("entrovault/mask" || key || nonce)[..8]`.
//! - **Input proof**: `SHA256(key || canonical({ciphertext, engine, target}))`.
//!   A proof issued for one target does not verify for another, and any
//!   change to the ciphertext invalidates it.
//! - **Handles**: identifiers are derived from the key and a counter;
//!   capability tokens are derived from the key and the identifier. Every
//!   operation checks both.
//! - **Values** are kept in the clear next to their access lists.
//!
//! ## Security Warning
//!
//! **NOT CONFIDENTIAL.** Anyone holding the serialized engine can read every
//! value. This exists to exercise the vault's protocol, not to protect data.

use std::collections::{BTreeMap, BTreeSet};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use entrovault_core::{
    sha256_digest, Address, CanonicalBytes, CapabilityToken, CiphertextHandle, ContentDigest,
    ExternalCiphertext, HandleId, InputProof, Sha256Accumulator,
};

use crate::traits::{CipherError, CiphertextEngine, PublicDecryption};

const NONCE_LEN: usize = 16;
const WIRE_LEN: usize = NONCE_LEN + 8;

/// State of a single ciphertext inside the mock engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    plaintext: u64,
    capability: CapabilityToken,
    acl: BTreeSet<Address>,
    revealable: bool,
}

/// The fields an input proof binds together.
#[derive(Serialize)]
struct InputBinding<'a> {
    ciphertext: String,
    engine: String,
    target: &'a Address,
}

/// Deterministic transparent ciphertext engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockCiphertextEngine {
    key: [u8; 32],
    counter: u64,
    entries: BTreeMap<HandleId, Entry>,
}

impl MockCiphertextEngine {
    /// Create an engine with the given secret key.
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key,
            counter: 0,
            entries: BTreeMap::new(),
        }
    }

    /// Public identifier of this engine's key.
    pub fn engine_id(&self) -> ContentDigest {
        let mut acc = Sha256Accumulator::new();
        acc.update(b"entrovault/engine-id").update(&self.key);
        acc.finalize()
    }

    /// Client-side encryption: produce the external ciphertext and proof a
    /// caller submits to `target`.
    pub fn encrypt_input(
        &self,
        value: u64,
        target: &Address,
        rng: &mut impl RngCore,
    ) -> Result<(ExternalCiphertext, InputProof), CipherError> {
        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce);
        let masked = value ^ self.keystream(&nonce);

        let mut wire = Vec::with_capacity(WIRE_LEN);
        wire.extend_from_slice(&nonce);
        wire.extend_from_slice(&masked.to_be_bytes());
        let ciphertext = ExternalCiphertext::new(wire);
        let proof = self.input_proof(&ciphertext, target)?;
        Ok((ciphertext, proof))
    }

    /// Encrypt a value directly into a handle owned by `owner`.
    ///
    /// Used by collaborators that produce ciphertexts themselves (an entropy
    /// service fulfilling a request) rather than receiving them as input.
    pub fn trivial_encrypt(&mut self, value: u64, owner: &Address) -> CiphertextHandle {
        self.insert(value, BTreeSet::from([*owner]))
    }

    /// Whether `principal` is on the access list of `handle`.
    pub fn is_allowed(&self, handle: &CiphertextHandle, principal: &Address) -> bool {
        self.lookup(handle)
            .map(|e| e.acl.contains(principal))
            .unwrap_or(false)
    }

    /// Whether `handle` has been marked publicly revealable.
    pub fn is_revealable(&self, handle: &CiphertextHandle) -> bool {
        self.lookup(handle).map(|e| e.revealable).unwrap_or(false)
    }

    /// Number of ciphertexts the engine tracks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the engine tracks no ciphertexts.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn keystream(&self, nonce: &[u8]) -> u64 {
        let mut acc = Sha256Accumulator::new();
        acc.update(b"entrovault/mask").update(&self.key).update(nonce);
        let digest = acc.finalize();
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest.as_bytes()[..8]);
        u64::from_be_bytes(word)
    }

    fn input_proof(
        &self,
        ciphertext: &ExternalCiphertext,
        target: &Address,
    ) -> Result<InputProof, CipherError> {
        let binding = InputBinding {
            ciphertext: ciphertext.to_hex(),
            engine: self.engine_id().to_hex(),
            target,
        };
        let canonical = CanonicalBytes::new(&binding).map_err(|e| {
            CipherError::MalformedInput(format!("cannot canonicalize input binding: {e}"))
        })?;
        let mut acc = Sha256Accumulator::new();
        acc.update(&self.key)
            .update(sha256_digest(&canonical).as_bytes());
        Ok(InputProof::new(acc.finalize().as_bytes().to_vec()))
    }

    fn insert(&mut self, plaintext: u64, acl: BTreeSet<Address>) -> CiphertextHandle {
        self.counter += 1;
        let mut id_acc = Sha256Accumulator::new();
        id_acc
            .update(b"entrovault/handle")
            .update(&self.key)
            .update(&self.counter.to_be_bytes());
        let id = HandleId::from_bytes(*id_acc.finalize().as_bytes());

        let mut cap_acc = Sha256Accumulator::new();
        cap_acc
            .update(b"entrovault/capability")
            .update(&self.key)
            .update(id.as_bytes());
        let mut cap = [0u8; 16];
        cap.copy_from_slice(&cap_acc.finalize().as_bytes()[..16]);
        let capability = CapabilityToken::from_bytes(cap);

        self.entries.insert(
            id,
            Entry {
                plaintext,
                capability,
                acl,
                revealable: false,
            },
        );
        CiphertextHandle::new(id, capability)
    }

    fn lookup(&self, handle: &CiphertextHandle) -> Result<&Entry, CipherError> {
        let entry = self
            .entries
            .get(handle.id())
            .ok_or(CipherError::UnknownHandle(*handle.id()))?;
        if &entry.capability != handle.capability() {
            return Err(CipherError::ForgedHandle(*handle.id()));
        }
        Ok(entry)
    }

    fn authorized(
        &mut self,
        caller: &Address,
        handle: &CiphertextHandle,
    ) -> Result<&mut Entry, CipherError> {
        self.lookup(handle)?;
        let entry = self
            .entries
            .get_mut(handle.id())
            .ok_or(CipherError::UnknownHandle(*handle.id()))?;
        if !entry.acl.contains(caller) {
            return Err(CipherError::PermissionDenied {
                handle: *handle.id(),
                principal: *caller,
            });
        }
        Ok(entry)
    }
}

impl CiphertextEngine for MockCiphertextEngine {
    fn from_external(
        &mut self,
        input: &ExternalCiphertext,
        proof: &InputProof,
        target: &Address,
    ) -> Result<CiphertextHandle, CipherError> {
        let wire = input.as_bytes();
        if wire.len() != WIRE_LEN {
            return Err(CipherError::MalformedInput(format!(
                "expected {WIRE_LEN} bytes, got {}",
                wire.len()
            )));
        }
        let expected = self.input_proof(input, target)?;
        if &expected != proof {
            return Err(CipherError::InvalidProof { target: *target });
        }

        let (nonce, masked) = wire.split_at(NONCE_LEN);
        let mut word = [0u8; 8];
        word.copy_from_slice(masked);
        let plaintext = u64::from_be_bytes(word) ^ self.keystream(nonce);
        Ok(self.insert(plaintext, BTreeSet::from([*target])))
    }

    fn grant_execution_permission(
        &mut self,
        caller: &Address,
        handle: &CiphertextHandle,
        grantee: &Address,
    ) -> Result<(), CipherError> {
        self.authorized(caller, handle)?.acl.insert(*grantee);
        Ok(())
    }

    fn combine(
        &mut self,
        caller: &Address,
        a: &CiphertextHandle,
        b: &CiphertextHandle,
    ) -> Result<CiphertextHandle, CipherError> {
        let lhs = self.authorized(caller, a)?.plaintext;
        let rhs = self.authorized(caller, b)?.plaintext;
        Ok(self.insert(lhs ^ rhs, BTreeSet::from([*caller])))
    }

    fn mark_publicly_revealable(
        &mut self,
        caller: &Address,
        handle: &CiphertextHandle,
    ) -> Result<CiphertextHandle, CipherError> {
        self.authorized(caller, handle)?.revealable = true;
        Ok(*handle)
    }
}

impl PublicDecryption for MockCiphertextEngine {
    fn reveal(&self, handle: &CiphertextHandle) -> Result<u64, CipherError> {
        let entry = self.lookup(handle)?;
        if !entry.revealable {
            return Err(CipherError::NotRevealable(*handle.id()));
        }
        Ok(entry.plaintext)
    }
}
