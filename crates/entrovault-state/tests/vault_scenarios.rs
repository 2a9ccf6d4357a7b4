//! End-to-end vault scenarios against the mock collaborators.

use rand::rngs::StdRng;
use rand::SeedableRng;

use entrovault_core::{Address, Amount, RequestTag};
use entrovault_entropy::{EntropyService, MockEntropyService};
use entrovault_fhe::{MockCiphertextEngine, PublicDecryption};
use entrovault_state::{
    RequestState, StorePath, TracingObserver, ValueVault, VaultError, VaultState,
};

fn vault_addr() -> Address {
    Address::from_bytes([0xAA; 20])
}

fn service_addr() -> Address {
    Address::from_bytes([0x5E; 20])
}

#[test]
fn entropy_request_unlocks_after_fulfillment() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut engine = MockCiphertextEngine::new([3; 32]);
    let mut service = MockEntropyService::new(service_addr(), Amount(25));
    let mut vault = ValueVault::new(vault_addr(), service_addr());
    vault.subscribe(Box::new(TracingObserver));

    let tag = RequestTag::from_bytes([0x77; 32]);
    let fee = service.current_fee();
    let id = vault.request_entropy(&mut service, tag, fee).unwrap();
    assert_eq!(service.request(id).unwrap().tag, tag);

    let (ct, proof) = engine.encrypt_input(1234, &vault_addr(), &mut rng).unwrap();
    assert_eq!(
        vault.store_with_entropy(&mut engine, &service, &ct, &proof, id),
        Err(VaultError::EntropyNotReady(id))
    );
    assert!(!vault.is_initialized());

    service.fulfill(id, &mut engine, 0xABCD).unwrap();
    vault
        .store_with_entropy(&mut engine, &service, &ct, &proof, id)
        .unwrap();

    assert!(vault.is_initialized());
    assert_eq!(vault.state(), VaultState::Initialized);
    assert_eq!(vault.tracker().state_of(id), RequestState::Consumed);
    assert_eq!(engine.reveal(&vault.value().unwrap()).unwrap(), 1234 ^ 0xABCD);

    let log = vault.tracker().transition_log();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].to_state, RequestState::Consumed);
}

#[test]
fn plain_store_reveals_and_locks() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut engine = MockCiphertextEngine::new([3; 32]);
    let mut vault = ValueVault::new(vault_addr(), service_addr());

    let (ct, proof) = engine.encrypt_input(42, &vault_addr(), &mut rng).unwrap();
    vault.store_plain(&mut engine, &ct, &proof).unwrap();
    let handle = vault.value().unwrap();
    assert_eq!(engine.reveal(&handle).unwrap(), 42);

    let (ct2, proof2) = engine.encrypt_input(43, &vault_addr(), &mut rng).unwrap();
    assert_eq!(
        vault.store_plain(&mut engine, &ct2, &proof2),
        Err(VaultError::AlreadyInitialized)
    );
    assert_eq!(vault.value().unwrap(), handle);
    assert_eq!(vault.transition_log()[0].path, StorePath::Plain);
}

#[test]
fn abandoned_request_lingers_unconsumed() {
    let mut rng = StdRng::seed_from_u64(10);
    let mut engine = MockCiphertextEngine::new([3; 32]);
    let mut service = MockEntropyService::new(service_addr(), Amount(5));
    let mut vault = ValueVault::new(vault_addr(), service_addr());

    let abandoned = vault
        .request_entropy(&mut service, RequestTag::from_bytes([1; 32]), Amount(5))
        .unwrap();
    let used = vault
        .request_entropy(&mut service, RequestTag::from_bytes([2; 32]), Amount(5))
        .unwrap();
    service.fulfill(used, &mut engine, 1).unwrap();

    let (ct, proof) = engine.encrypt_input(2, &vault_addr(), &mut rng).unwrap();
    vault
        .store_with_entropy(&mut engine, &service, &ct, &proof, used)
        .unwrap();

    let pending: Vec<_> = vault.tracker().pending().map(|(id, _)| id).collect();
    assert_eq!(pending, vec![abandoned]);
    assert_eq!(service.collected(), Amount(10));
}

#[test]
fn fee_change_applies_to_next_request() {
    let mut service = MockEntropyService::new(service_addr(), Amount(5));
    let mut vault = ValueVault::new(vault_addr(), service_addr());
    let tag = RequestTag::from_bytes([0; 32]);

    vault.request_entropy(&mut service, tag, Amount(5)).unwrap();
    service.set_fee(Amount(8));
    assert_eq!(
        vault.request_entropy(&mut service, tag, Amount(5)),
        Err(VaultError::InsufficientFee {
            required: Amount(8),
            paid: Amount(5)
        })
    );
    assert_eq!(vault.tracker().len(), 1);
}
