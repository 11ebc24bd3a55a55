//! Ledger reducer and store tests over realistic payment chains

use pop_cash::builder::{create, create_coinbase};
use pop_cash::*;

fn key(seed: u8) -> KeyPair {
    KeyPair::from_secret_bytes(&[seed; 32]).unwrap()
}

fn org() -> OrganizationId {
    Hash::new("fzJSZjKf-2cbXH7kds9H8NORuuFIRLkevJlN7qQemjo=")
}

/// Pay `amount` from `from` using everything the store says they can spend
fn pay(ledger: &Ledger, from: &KeyPair, to: &KeyPair, amount: Amount) -> Transaction {
    let store = LedgerStore::new(ledger);
    let balance = store.balance_of(&org(), from.public_key());
    let spendable = store.transactions_owned_by(&org(), from.public_key());
    create(from, to.public_key(), balance, amount, &spendable).unwrap()
}

#[test]
fn test_scenario_issue_then_pay() {
    let organizer = key(1);
    let alice = key(2);
    let bob = key(3);

    let coinbase = create_coinbase(&organizer, &[alice.public_key().clone()], 100).unwrap();
    let ledger = Ledger::new().apply(&org(), &coinbase.to_state()).unwrap();
    assert_eq!(LedgerStore::new(&ledger).balance_of(&org(), alice.public_key()), 100);

    let payment = pay(&ledger, &alice, &bob, 40);
    let ledger = ledger.apply(&org(), &payment.to_state()).unwrap();
    let store = LedgerStore::new(&ledger);

    assert_eq!(store.balance_of(&org(), alice.public_key()), 60);
    assert_eq!(store.balance_of(&org(), bob.public_key()), 40);
    assert_eq!(store.balance_of(&org(), organizer.public_key()), 0);
}

#[test]
fn test_chain_of_payments() {
    let alice = key(2);
    let bob = key(3);
    let carol = key(4);

    let recipients = [alice.public_key().clone(), bob.public_key().clone()];
    let coinbase = create_coinbase(&key(1), &recipients, 50).unwrap();
    let mut ledger = Ledger::new().apply(&org(), &coinbase.to_state()).unwrap();

    for (from, to, amount) in [(&alice, &bob, 20), (&bob, &carol, 70), (&carol, &alice, 5)] {
        let tx = pay(&ledger, from, to, amount);
        ledger = ledger.apply(&org(), &tx.to_state()).unwrap();
    }

    let store = LedgerStore::new(&ledger);
    assert_eq!(store.balance_of(&org(), alice.public_key()), 35);
    assert_eq!(store.balance_of(&org(), bob.public_key()), 0);
    assert_eq!(store.balance_of(&org(), carol.public_key()), 65);
    assert_eq!(store.all_transactions(&org()).len(), 4);
}

#[test]
fn test_exact_balance_spends_to_zero() {
    let alice = key(2);
    let bob = key(3);

    let coinbase = create_coinbase(&key(1), &[alice.public_key().clone()], 100).unwrap();
    let ledger = Ledger::new().apply(&org(), &coinbase.to_state()).unwrap();

    let payment = pay(&ledger, &alice, &bob, 100);
    assert_eq!(payment.outputs().len(), 1);

    let ledger = ledger.apply(&org(), &payment.to_state()).unwrap();
    let store = LedgerStore::new(&ledger);
    assert_eq!(store.balance_of(&org(), alice.public_key()), 0);
    assert!(store.transactions_owned_by(&org(), alice.public_key()).is_empty());
}

#[test]
fn test_spend_discards_unreferenced_outputs() {
    let alice = key(2);
    let bob = key(3);

    let first = create_coinbase(&key(1), &[alice.public_key().clone()], 100).unwrap();
    let recipients = [alice.public_key().clone(), bob.public_key().clone()];
    let second = create_coinbase(&key(1), &recipients, 30).unwrap();
    let ledger = Ledger::fold(&org(), [&first.to_state(), &second.to_state()]).unwrap();
    assert_eq!(LedgerStore::new(&ledger).balance_of(&org(), alice.public_key()), 130);

    // A payment built from a stale view that only knows `first`
    let stale = create(&alice, bob.public_key(), 100, 10, &[first.to_state()]).unwrap();
    let ledger = ledger.apply(&org(), &stale.to_state()).unwrap();

    // Every spend resets the spender, so `second`'s 30 is gone
    let store = LedgerStore::new(&ledger);
    assert_eq!(store.balance_of(&org(), alice.public_key()), 90);
    assert_eq!(store.balance_of(&org(), bob.public_key()), 40);
}

#[test]
fn test_redelivery_is_ignored() {
    let alice = key(2);
    let bob = key(3);

    let coinbase = create_coinbase(&key(1), &[alice.public_key().clone()], 100).unwrap();
    let ledger = Ledger::new().apply(&org(), &coinbase.to_state()).unwrap();
    let payment = pay(&ledger, &alice, &bob, 40);

    let once = ledger.apply(&org(), &payment.to_state()).unwrap();
    let twice = once.apply(&org(), &payment.to_state()).unwrap();
    let coinbase_again = twice.apply(&org(), &coinbase.to_state()).unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice, coinbase_again);
}

#[test]
fn test_history_and_lookup() {
    let alice = key(2);
    let bob = key(3);
    let carol = key(4);

    let coinbase = create_coinbase(&key(1), &[alice.public_key().clone()], 100).unwrap();
    let ledger = Ledger::new().apply(&org(), &coinbase.to_state()).unwrap();
    let payment = pay(&ledger, &alice, &bob, 40);
    let ledger = ledger.apply(&org(), &payment.to_state()).unwrap();
    let store = LedgerStore::new(&ledger);

    let history: Vec<Hash> = store
        .transaction_history(&org(), alice.public_key())
        .into_iter()
        .filter_map(|tx| tx.transaction_id)
        .collect();
    assert_eq!(history, vec![coinbase.id().clone(), payment.id().clone()]);

    assert_eq!(store.transaction_history(&org(), bob.public_key()).len(), 1);
    assert!(store.transaction_history(&org(), carol.public_key()).is_empty());

    let found = store.transaction(&org(), payment.id()).unwrap();
    assert_eq!(Transaction::from_state(found.clone()).unwrap(), payment);
    assert!(store.transaction(&org(), &Hash::new("unknown")).is_none());
}

#[test]
fn test_organizations_are_independent() {
    let alice = key(2);
    let other = Hash::new("another-organization");

    let coinbase = create_coinbase(&key(1), &[alice.public_key().clone()], 100).unwrap();
    let ledger = Ledger::new().apply(&org(), &coinbase.to_state()).unwrap();
    let store = LedgerStore::new(&ledger);

    assert_eq!(store.balance_of(&other, alice.public_key()), 0);
    assert!(!store.has_organization(&other));
    assert!(store.transactions_owned_by(&other, alice.public_key()).is_empty());
    assert!(store.transactions_by_hash(&other).is_none());
}

#[test]
fn test_rejected_transaction_keeps_previous_ledger() {
    let alice = key(2);
    let coinbase = create_coinbase(&key(1), &[alice.public_key().clone()], 100).unwrap();
    let ledger = Ledger::new().apply(&org(), &coinbase.to_state()).unwrap();

    let mut orphan = pay(&ledger, &alice, &key(3), 10).to_state();
    orphan.transaction_id = None;

    assert_eq!(ledger.apply(&org(), &orphan), Err(CashError::MissingTransactionId));
    assert_eq!(LedgerStore::new(&ledger).balance_of(&org(), alice.public_key()), 100);
}

#[test]
fn test_state_serializes_with_index_names() {
    let coinbase = create_coinbase(&key(1), &[key(2).public_key().clone()], 100).unwrap();
    let state = LedgerState::from_transactions([&coinbase.to_state()]).unwrap();
    let value = serde_json::to_value(&state).unwrap();

    for field in [
        "balances",
        "allTransactionHashes",
        "transactionsByHash",
        "transactionsByOwnerHash",
        "transactionsByInvolvedHash",
    ] {
        assert!(value.get(field).is_some(), "missing {}", field);
    }

    let restored: LedgerState = serde_json::from_value(value).unwrap();
    assert_eq!(restored, state);
}

#[test]
fn test_fold_of_thousands_of_transactions() {
    const ISSUANCES: u64 = 3_000;
    let organizer = key(1);
    let alice = key(2);

    let issuances: Vec<TransactionState> = (1..=ISSUANCES)
        .map(|amount| {
            create_coinbase(&organizer, &[alice.public_key().clone()], amount)
                .unwrap()
                .to_state()
        })
        .collect();

    let ledger = Ledger::fold(&org(), &issuances).unwrap();
    let halfway = Ledger::fold(&org(), &issuances[..1_500]).unwrap();
    let snapshot = halfway.clone();

    // Redelivering everything on top of the full fold changes nothing
    let redelivered = issuances
        .iter()
        .try_fold(ledger.clone(), |ledger, tx| ledger.apply(&org(), tx))
        .unwrap();
    assert_eq!(redelivered, ledger);

    let store = LedgerStore::new(&ledger);
    assert_eq!(store.all_transactions(&org()).len(), ISSUANCES as usize);
    assert_eq!(store.transactions_owned_by(&org(), alice.public_key()).len(), ISSUANCES as usize);
    assert_eq!(store.balance_of(&org(), alice.public_key()), ISSUANCES * (ISSUANCES + 1) / 2);

    // Extending a shared snapshot leaves the snapshot as it was
    let extended = issuances[1_500..]
        .iter()
        .try_fold(halfway, |ledger, tx| ledger.apply(&org(), tx))
        .unwrap();
    assert_eq!(extended, ledger);
    assert_eq!(LedgerStore::new(&snapshot).all_transactions(&org()).len(), 1_500);
}
