//! Transaction construction from a payment intent
//!
//! Both builders are pure: given the same keys and ledger view they produce
//! the same transaction. Business preconditions (amount within balance,
//! spendable set owned by the sender) are the caller's job.

use crate::constants::*;
use crate::error::{CashError, Result};
use crate::script::*;
use crate::transaction::*;
use crate::types::*;

/// Create: KeyPair × PK × ℕ × ℕ × 𝒯𝒳* → 𝒯𝒳
///
/// 1. One input per output owned by `from` in each spendable transaction
/// 2. One output paying `amount` to H(to)
/// 3. A change output paying `available_balance - amount` to H(from), only when non-zero
/// 4. Every input signs the signing string with `from`'s key
pub fn create(
    from: &KeyPair,
    to: &PublicKey,
    available_balance: Amount,
    amount: Amount,
    spendable_transactions: &[TransactionState],
) -> Result<Transaction> {
    let mut outputs = vec![TransactionOutput {
        value: amount,
        script: LockingScript::pay_to(to),
    }];

    if available_balance > amount {
        outputs.push(TransactionOutput {
            value: available_balance - amount,
            script: LockingScript::pay_to(from.public_key()),
        });
    }

    let outpoints = owned_outpoints(from.public_key(), spendable_transactions)?;
    if outpoints.is_empty() {
        return Err(CashError::NoSpendableOutputs(from.public_key().to_base64url()));
    }

    sign_and_build(from, outpoints, outputs)
}

/// CreateCoinbase: KeyPair × PK* × ℕ → 𝒯𝒳
///
/// One sentinel input signed by the organizer and one output of `amount`
/// per recipient.
pub fn create_coinbase(
    organizer: &KeyPair,
    recipients: &[PublicKey],
    amount: Amount,
) -> Result<Transaction> {
    let outputs = recipients
        .iter()
        .map(|recipient| TransactionOutput {
            value: amount,
            script: LockingScript::pay_to(recipient),
        })
        .collect();

    sign_and_build(organizer, vec![Outpoint::coinbase()], outputs)
}

/// Outpoints of every output locked to `owner` inside `transactions`
fn owned_outpoints(owner: &PublicKey, transactions: &[TransactionState]) -> Result<Vec<Outpoint>> {
    let owner_hash = owner.hash();
    let mut outpoints = Vec::new();

    for tx in transactions {
        let tx_out_hash = tx.transaction_id.as_ref().ok_or_else(|| {
            CashError::MalformedTransaction("Spendable transaction has no id".to_string())
        })?;

        for (index, output) in tx.outputs.iter().enumerate() {
            if output.script.public_key_hash != owner_hash {
                continue;
            }
            let tx_out_index = u32::try_from(index).map_err(|_| {
                CashError::MalformedTransaction(format!("Output index {} out of range", index))
            })?;
            outpoints.push(Outpoint {
                tx_out_hash: tx_out_hash.clone(),
                tx_out_index,
            });
        }
    }

    Ok(outpoints)
}

fn sign_and_build(
    signer: &KeyPair,
    outpoints: Vec<Outpoint>,
    outputs: Vec<TransactionOutput>,
) -> Result<Transaction> {
    let signature = signer.sign(signing_string(&outpoints, &outputs).as_bytes());

    let inputs = outpoints
        .into_iter()
        .map(|outpoint| TransactionInput {
            outpoint,
            script: UnlockingScript {
                script_type: ScriptType::P2pkh,
                public_key: signer.public_key().clone(),
                signature: signature.clone(),
            },
        })
        .collect();

    Transaction::new(TRANSACTION_VERSION, inputs, outputs, TRANSACTION_LOCK_TIME)
}
