//! Coin transactions: the immutable value object, its id, and its wire/state forms
//!
//! A transaction `tx = (version, inputs, outputs, lock_time)` is identified by
//! the field hash of all of its fields, taken in lexicographic field-name order:
//!
//! ```text
//! for each input:  pubkey, sig, type, tx_out_hash, tx_out_index
//! lock_time
//! for each output: pubkey_hash, type, value
//! version
//! ```
//!
//! Signatures cover the same transaction with every unlocking script blanked:
//!
//! ```text
//! for each input:  tx_out_hash ‖ tx_out_index
//! for each output: value ‖ type ‖ pubkey_hash
//! ```

use crate::error::{CashError, Result};
use crate::script::*;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::BuildHasher;
use tracing::warn;

/// Reference to an output of a prior transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outpoint {
    pub tx_out_hash: Hash,
    pub tx_out_index: u32,
}

impl Outpoint {
    /// The sentinel outpoint of an issuance input
    pub fn coinbase() -> Self {
        Self {
            tx_out_hash: Hash::coinbase(),
            tx_out_index: crate::constants::COINBASE_INDEX,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.tx_out_hash.is_coinbase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    #[serde(flatten)]
    pub outpoint: Outpoint,
    pub script: UnlockingScript,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: Amount,
    pub script: LockingScript,
}

/// Ledger-internal representation of a transaction
///
/// The id is optional here: states built by hand may omit it, and the ledger
/// refuses to index a state without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionState {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Hash>,
}

// ============================================================================
// WIRE FORM
// ============================================================================

/// Wire form of a transaction. Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionJson {
    pub version: u32,
    pub inputs: Vec<TransactionInputJson>,
    pub outputs: Vec<TransactionOutputJson>,
    pub lock_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionInputJson {
    pub tx_out_hash: Hash,
    pub tx_out_index: u32,
    pub script: UnlockingScriptJson,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnlockingScriptJson {
    #[serde(rename = "type")]
    pub script_type: ScriptType,
    pub pubkey: PublicKey,
    pub sig: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionOutputJson {
    pub value: Amount,
    pub script: LockingScriptJson,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockingScriptJson {
    #[serde(rename = "type")]
    pub script_type: ScriptType,
    pub pubkey_hash: Hash,
}

impl From<&TransactionInput> for TransactionInputJson {
    fn from(input: &TransactionInput) -> Self {
        Self {
            tx_out_hash: input.outpoint.tx_out_hash.clone(),
            tx_out_index: input.outpoint.tx_out_index,
            script: UnlockingScriptJson {
                script_type: input.script.script_type,
                pubkey: input.script.public_key.clone(),
                sig: input.script.signature.clone(),
            },
        }
    }
}

impl From<TransactionInputJson> for TransactionInput {
    fn from(json: TransactionInputJson) -> Self {
        Self {
            outpoint: Outpoint {
                tx_out_hash: json.tx_out_hash,
                tx_out_index: json.tx_out_index,
            },
            script: UnlockingScript {
                script_type: json.script.script_type,
                public_key: json.script.pubkey,
                signature: json.script.sig,
            },
        }
    }
}

impl From<&TransactionOutput> for TransactionOutputJson {
    fn from(output: &TransactionOutput) -> Self {
        Self {
            value: output.value,
            script: LockingScriptJson {
                script_type: output.script.script_type,
                pubkey_hash: output.script.public_key_hash.clone(),
            },
        }
    }
}

impl From<TransactionOutputJson> for TransactionOutput {
    fn from(json: TransactionOutputJson) -> Self {
        Self {
            value: json.value,
            script: LockingScript {
                script_type: json.script.script_type,
                public_key_hash: json.script.pubkey_hash,
            },
        }
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// An immutable coin transaction together with its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    version: u32,
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
    lock_time: u64,
    transaction_id: Hash,
}

impl Transaction {
    /// Build a transaction and compute its id
    pub fn new(
        version: u32,
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
        lock_time: u64,
    ) -> Result<Self> {
        Self::with_id(version, inputs, outputs, lock_time, None)
    }

    /// Build a transaction, trusting `transaction_id` when one is supplied
    fn with_id(
        version: u32,
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
        lock_time: u64,
        transaction_id: Option<Hash>,
    ) -> Result<Self> {
        if inputs.is_empty() {
            return Err(CashError::MalformedTransaction("Empty inputs".to_string()));
        }
        if outputs.is_empty() {
            return Err(CashError::MalformedTransaction("Empty outputs".to_string()));
        }

        let transaction_id = transaction_id
            .unwrap_or_else(|| compute_transaction_id(version, &inputs, &outputs, lock_time));

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
            transaction_id,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn inputs(&self) -> &[TransactionInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TransactionOutput] {
        &self.outputs
    }

    pub fn lock_time(&self) -> u64 {
        self.lock_time
    }

    /// The id this transaction was created or delivered with
    pub fn id(&self) -> &Hash {
        &self.transaction_id
    }

    /// Recompute the id from the transaction's fields
    pub fn compute_id(&self) -> Hash {
        compute_transaction_id(self.version, &self.inputs, &self.outputs, self.lock_time)
    }

    /// Issuance transactions reference the sentinel from their first input
    pub fn is_coinbase(&self) -> bool {
        self.inputs
            .first()
            .map(|input| input.outpoint.is_coinbase())
            .unwrap_or(false)
    }

    /// Sum of output values, `None` on overflow
    pub fn total_output_value(&self) -> Option<Amount> {
        total_output_value(&self.outputs)
    }

    /// Text every input of this transaction signs
    pub fn signing_string(&self) -> String {
        let outpoints: Vec<Outpoint> = self.inputs.iter().map(|i| i.outpoint.clone()).collect();
        signing_string(&outpoints, &self.outputs)
    }

    /// Parse the wire form; `precomputed_id` is trusted as-is
    pub fn from_json(json: TransactionJson, precomputed_id: Option<Hash>) -> Result<Self> {
        Self::with_id(
            json.version,
            json.inputs.into_iter().map(TransactionInput::from).collect(),
            json.outputs.into_iter().map(TransactionOutput::from).collect(),
            json.lock_time,
            precomputed_id,
        )
    }

    /// Parse an untyped JSON value holding the wire form
    pub fn from_json_value(value: serde_json::Value, precomputed_id: Option<Hash>) -> Result<Self> {
        let json: TransactionJson = serde_json::from_value(value)
            .map_err(|e| CashError::MalformedTransaction(e.to_string()))?;
        Self::from_json(json, precomputed_id)
    }

    pub fn to_json(&self) -> TransactionJson {
        TransactionJson {
            version: self.version,
            inputs: self.inputs.iter().map(TransactionInputJson::from).collect(),
            outputs: self.outputs.iter().map(TransactionOutputJson::from).collect(),
            lock_time: self.lock_time,
        }
    }

    /// Restore from the ledger representation, computing a missing id
    pub fn from_state(state: TransactionState) -> Result<Self> {
        Self::with_id(
            state.version,
            state.inputs,
            state.outputs,
            state.lock_time,
            state.transaction_id,
        )
    }

    pub fn to_state(&self) -> TransactionState {
        TransactionState {
            version: self.version,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            lock_time: self.lock_time,
            transaction_id: Some(self.transaction_id.clone()),
        }
    }
}

/// Field hash over every transaction field except the id
pub fn compute_transaction_id(
    version: u32,
    inputs: &[TransactionInput],
    outputs: &[TransactionOutput],
    lock_time: u64,
) -> Hash {
    let mut fields: Vec<String> = Vec::with_capacity(inputs.len() * 5 + outputs.len() * 3 + 2);

    for input in inputs {
        fields.push(input.script.public_key.to_base64url());
        fields.push(input.script.signature.to_base64url());
        fields.push(input.script.script_type.to_string());
        fields.push(input.outpoint.tx_out_hash.to_string());
        fields.push(input.outpoint.tx_out_index.to_string());
    }

    fields.push(lock_time.to_string());

    for output in outputs {
        fields.push(output.script.public_key_hash.to_string());
        fields.push(output.script.script_type.to_string());
        fields.push(output.value.to_string());
    }

    fields.push(version.to_string());

    Hash::from_strings(fields)
}

/// Text signed by every input: the transaction with unlocking scripts blanked
pub fn signing_string(outpoints: &[Outpoint], outputs: &[TransactionOutput]) -> String {
    let mut data = String::new();

    for outpoint in outpoints {
        data.push_str(outpoint.tx_out_hash.as_str());
        data.push_str(&outpoint.tx_out_index.to_string());
    }

    for output in outputs {
        data.push_str(&output.value.to_string());
        data.push_str(output.script.script_type.as_str());
        data.push_str(output.script.public_key_hash.as_str());
    }

    data
}

pub fn total_output_value(outputs: &[TransactionOutput]) -> Option<Amount> {
    outputs
        .iter()
        .try_fold(0 as Amount, |total, output| total.checked_add(output.value))
}

// ============================================================================
// VALIDITY
// ============================================================================

/// Id → transaction lookup consulted by the validity check
pub trait TransactionLookup {
    fn lookup(&self, transaction_id: &Hash) -> Option<&TransactionState>;
}

impl<S: BuildHasher> TransactionLookup for HashMap<Hash, TransactionState, S> {
    fn lookup(&self, transaction_id: &Hash) -> Option<&TransactionState> {
        self.get(transaction_id)
    }
}

impl<S: BuildHasher> TransactionLookup for im::HashMap<Hash, TransactionState, S> {
    fn lookup(&self, transaction_id: &Hash) -> Option<&TransactionState> {
        self.get(transaction_id)
    }
}

/// CheckTransactionValidity: 𝒯𝒳 × PK × (ℍ → 𝒯𝒳) → {valid, invalid}
///
/// 1. Every input signature verifies over the signing string
/// 2. Coinbase: every signer is the organizer
/// 3. Otherwise: every outpoint names a known output locked to the signer
/// 4. Otherwise: Σ referenced outputs ≥ Σ outputs
pub fn check_transaction_validity<L>(
    tx: &Transaction,
    organizer: &PublicKey,
    transactions_by_hash: &L,
) -> Result<()>
where
    L: TransactionLookup + ?Sized,
{
    let message = tx.signing_string();
    let coinbase = tx.is_coinbase();
    let mut total_input_value: Amount = 0;

    for (i, input) in tx.inputs().iter().enumerate() {
        if !verify_unlocking_script(&input.script, message.as_bytes()) {
            warn!(transaction = %tx.id(), input = i, "invalid input signature");
            return Err(CashError::InvalidSignature(format!(
                "Input {} of {} is not signed by its public key",
                i,
                tx.id()
            )));
        }

        if coinbase {
            if &input.script.public_key != organizer {
                warn!(transaction = %tx.id(), input = i, "coinbase not signed by the organizer");
                return Err(CashError::InvalidSignature(format!(
                    "Coinbase input {} of {} is not signed by the organizer",
                    i,
                    tx.id()
                )));
            }
            continue;
        }

        let outpoint = &input.outpoint;
        let origin = transactions_by_hash.lookup(&outpoint.tx_out_hash).ok_or_else(|| {
            warn!(
                transaction = %tx.id(),
                origin = %outpoint.tx_out_hash,
                "unknown input transaction"
            );
            CashError::MalformedTransaction(format!(
                "Input {} refers to unknown transaction {}",
                i, outpoint.tx_out_hash
            ))
        })?;

        let output = origin
            .outputs
            .get(outpoint.tx_out_index as usize)
            .ok_or_else(|| {
                warn!(
                    transaction = %tx.id(),
                    index = outpoint.tx_out_index,
                    "unknown output index"
                );
                CashError::MalformedTransaction(format!(
                    "Input {} refers to unknown output {} of {}",
                    i, outpoint.tx_out_index, outpoint.tx_out_hash
                ))
            })?;

        if !output.script.is_unlocked_by(&input.script.public_key) {
            warn!(transaction = %tx.id(), input = i, "spender does not own the referenced output");
            return Err(CashError::InvalidSignature(format!(
                "Input {} spends an output not locked to its public key",
                i
            )));
        }

        total_input_value = total_input_value
            .checked_add(output.value)
            .ok_or_else(|| CashError::MalformedTransaction("Input value overflow".to_string()))?;
    }

    let total_output_value = tx
        .total_output_value()
        .ok_or_else(|| CashError::MalformedTransaction("Output value overflow".to_string()))?;

    if !coinbase && total_input_value < total_output_value {
        warn!(
            transaction = %tx.id(),
            total_input_value,
            total_output_value,
            "outputs exceed inputs"
        );
        return Err(CashError::MalformedTransaction(format!(
            "Outputs ({}) exceed inputs ({})",
            total_output_value, total_input_value
        )));
    }

    Ok(())
}
