//! Wire format and identity tests for transactions

use pop_cash::builder::{create, create_coinbase};
use pop_cash::transaction::*;
use pop_cash::*;
use serde_json::json;
use std::collections::HashMap;

const VECTOR_PUBKEY: &str = "J9fBzJV70Jk5c-i3277Uq4CmeL4t53WDfUghaK0HpeM=";
const VECTOR_SIG: &str =
    "FEvAcmeOh-wPHMzLXXJfwEPt6Fdqg1J-4dEhyRA0Uqv1Rp9_Lg8_AlIN5b8FxY_yVZI3AD81u3sl0Xa8mo3VBw==";
const VECTOR_PUBKEY_HASH: &str = "-_qR4IHwsiq50raa8jURNArds54=";
const VECTOR_ID: &str = "Hm5fdUyZsjM2-zqlBpY5oBR-X1ukUNnd_GwzvjNAlX8=";

fn vector_json() -> serde_json::Value {
    json!({
        "version": 1,
        "inputs": [{
            "tx_out_hash": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=",
            "tx_out_index": 0,
            "script": { "type": "P2PKH", "pubkey": VECTOR_PUBKEY, "sig": VECTOR_SIG }
        }],
        "outputs": [{
            "value": 32,
            "script": { "type": "P2PKH", "pubkey_hash": VECTOR_PUBKEY_HASH }
        }],
        "lock_time": 0
    })
}

fn no_history() -> HashMap<Hash, TransactionState> {
    HashMap::new()
}

fn key(seed: u8) -> KeyPair {
    KeyPair::from_secret_bytes(&[seed; 32]).unwrap()
}

#[test]
fn test_conformance_vector_id() {
    let tx = Transaction::from_json_value(vector_json(), None).unwrap();

    assert_eq!(tx.id().as_str(), VECTOR_ID);
    assert_eq!(tx.compute_id().as_str(), VECTOR_ID);
    assert!(tx.is_coinbase());
}

#[test]
fn test_conformance_vector_public_key_hash() {
    let public_key = PublicKey::from_base64url(VECTOR_PUBKEY).unwrap();
    assert_eq!(public_key.hash().as_str(), VECTOR_PUBKEY_HASH);
}

#[test]
fn test_conformance_vector_serializes_back() {
    let tx = Transaction::from_json_value(vector_json(), None).unwrap();
    assert_eq!(serde_json::to_value(tx.to_json()).unwrap(), vector_json());
}

#[test]
fn test_field_hash_vector() {
    assert_eq!(
        Hash::from_strings(["abc"]).as_str(),
        "ewOTvv3Cj_KnxeCPqKOKTIRdpcYAR26wGue4Zfo0Txg="
    );
}

#[test]
fn test_supplied_id_is_trusted() {
    let supplied = Hash::new("not-the-real-id");
    let tx = Transaction::from_json_value(vector_json(), Some(supplied.clone())).unwrap();

    assert_eq!(tx.id(), &supplied);
    assert_eq!(tx.compute_id().as_str(), VECTOR_ID);
}

#[test]
fn test_id_changes_with_any_field() {
    let original = Transaction::from_json_value(vector_json(), None).unwrap();

    let mut value = vector_json();
    value["outputs"][0]["value"] = json!(33);
    let bumped = Transaction::from_json_value(value, None).unwrap();
    assert_ne!(bumped.id(), original.id());

    let mut value = vector_json();
    value["lock_time"] = json!(1);
    let locked = Transaction::from_json_value(value, None).unwrap();
    assert_ne!(locked.id(), original.id());
}

#[test]
fn test_unknown_script_type_is_rejected() {
    let mut value = vector_json();
    value["outputs"][0]["script"]["type"] = json!("P2SH");

    assert!(matches!(
        Transaction::from_json_value(value, None),
        Err(CashError::MalformedTransaction(_))
    ));
}

#[test]
fn test_missing_field_is_rejected() {
    let mut value = vector_json();
    value["inputs"][0].as_object_mut().unwrap().remove("tx_out_index");

    assert!(matches!(
        Transaction::from_json_value(value, None),
        Err(CashError::MalformedTransaction(_))
    ));
}

#[test]
fn test_bad_base64_is_rejected() {
    let mut value = vector_json();
    value["inputs"][0]["script"]["sig"] = json!("not base64 !!");

    assert!(matches!(
        Transaction::from_json_value(value, None),
        Err(CashError::MalformedTransaction(_))
    ));
}

#[test]
fn test_empty_lists_are_rejected() {
    let mut value = vector_json();
    value["inputs"] = json!([]);
    assert!(matches!(
        Transaction::from_json_value(value, None),
        Err(CashError::MalformedTransaction(_))
    ));

    let mut value = vector_json();
    value["outputs"] = json!([]);
    assert!(matches!(
        Transaction::from_json_value(value, None),
        Err(CashError::MalformedTransaction(_))
    ));
}

#[test]
fn test_negative_value_is_rejected() {
    let mut value = vector_json();
    value["outputs"][0]["value"] = json!(-32);

    assert!(matches!(
        Transaction::from_json_value(value, None),
        Err(CashError::MalformedTransaction(_))
    ));
}

#[test]
fn test_state_round_trip_keeps_id() {
    let tx = create_coinbase(&key(1), &[key(2).public_key().clone()], 10).unwrap();
    let restored = Transaction::from_state(tx.to_state()).unwrap();

    assert_eq!(restored, tx);
}

#[test]
fn test_state_without_id_is_recomputed() {
    let tx = create_coinbase(&key(1), &[key(2).public_key().clone()], 10).unwrap();
    let mut state = tx.to_state();
    state.transaction_id = None;

    assert_eq!(Transaction::from_state(state).unwrap().id(), tx.id());
}

#[test]
fn test_built_transactions_verify() {
    let organizer = key(1);
    let alice = key(2);
    let bob = key(3);

    let coinbase = create_coinbase(&organizer, &[alice.public_key().clone()], 100).unwrap();
    let payment = create(&alice, bob.public_key(), 100, 30, &[coinbase.to_state()]).unwrap();

    let known = HashMap::from([(coinbase.id().clone(), coinbase.to_state())]);
    check_transaction_validity(&coinbase, organizer.public_key(), &no_history()).unwrap();
    check_transaction_validity(&payment, organizer.public_key(), &known).unwrap();
}

#[test]
fn test_tampered_output_fails_validity() {
    let organizer = key(1);
    let coinbase = create_coinbase(&organizer, &[key(2).public_key().clone()], 100).unwrap();

    let mut json = coinbase.to_json();
    json.outputs[0].value = 1_000_000;
    let tampered = Transaction::from_json(json, None).unwrap();

    assert!(matches!(
        check_transaction_validity(&tampered, organizer.public_key(), &no_history()),
        Err(CashError::InvalidSignature(_))
    ));
}

#[test]
fn test_ed25519_signed_coinbase_vector() {
    let organizer = key(7);
    let recipient = key(8);
    assert_eq!(organizer.public_key().as_bytes().len(), 32);

    let coinbase = create_coinbase(&organizer, &[recipient.public_key().clone()], 100).unwrap();
    let script = &coinbase.inputs()[0].script;

    assert_eq!(script.public_key.to_base64url(), "6kpsY-KcUgq-9VB7Ey7F-ZVHdq6-vnuSQh7qaRRG0iw=");
    assert_eq!(
        script.signature.to_base64url(),
        "HK1GsHBXPfq_b5dhxuY9M_MILI8bMeyIYP1YRQQv56dsUeOTGWpbpg53mJ2R9eCMM7Nuoe8-XAKviQXSZZYwBQ=="
    );
    assert_eq!(
        coinbase.outputs()[0].script.public_key_hash.as_str(),
        "XCm3jxCjWkmmIx0I7oQKBLzDo3o="
    );
    assert_eq!(coinbase.id().as_str(), "luhsdDEZqYpvWLsOPDsTVI6Dzu9VApHMAiqjY0zoEqk=");

    check_transaction_validity(&coinbase, organizer.public_key(), &no_history()).unwrap();
}

#[test]
fn test_ed25519_vector_verifies_after_wire_round_trip() {
    let organizer_key =
        PublicKey::from_base64url("6kpsY-KcUgq-9VB7Ey7F-ZVHdq6-vnuSQh7qaRRG0iw=").unwrap();
    let coinbase = create_coinbase(&key(7), &[key(8).public_key().clone()], 100).unwrap();

    let text = serde_json::to_string(&coinbase.to_json()).unwrap();
    let parsed = Transaction::from_json_value(serde_json::from_str(&text).unwrap(), None).unwrap();

    assert_eq!(parsed.id(), coinbase.id());
    check_transaction_validity(&parsed, &organizer_key, &no_history()).unwrap();
    assert!(check_transaction_validity(&parsed, key(9).public_key(), &no_history()).is_err());
}
