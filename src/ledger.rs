//! Ledger reducer: folds accepted transactions into balance and history indices
//!
//! Application is a pure function from the previous state to the next one.
//! The previous state is never touched, so a rejected transaction leaves the
//! caller holding exactly what it had. Indices are persistent maps: the next
//! state shares every entry the transaction did not touch with the previous
//! one, so applying a transaction costs the same however large the ledger is.
//!
//! Spending is modeled as "consume everything visible, re-accrue via outputs":
//! every non-coinbase input zeroes its owner's balance and spendable list before
//! the outputs are credited. A sender's change output is what carries the rest
//! of their balance forward.

use crate::error::{CashError, Result};
use crate::transaction::TransactionState;
use crate::types::*;
use im::{HashMap, Vector};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Derived indices of one organization's ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    balances: HashMap<Hash, Amount>,
    all_transaction_hashes: Vector<Hash>,
    transactions_by_hash: HashMap<Hash, TransactionState>,
    transactions_by_owner_hash: HashMap<Hash, Vector<Hash>>,
    transactions_by_involved_hash: HashMap<Hash, Vector<Hash>>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a sequence of transactions from the empty state
    pub fn from_transactions<'a, I>(transactions: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a TransactionState>,
    {
        transactions
            .into_iter()
            .try_fold(Self::new(), |state, tx| state.apply(tx))
    }

    /// Apply: 𝓛 × 𝒯𝒳 → 𝓛
    ///
    /// 1. Record the transaction and its id (a known id is a no-op)
    /// 2. For each input, H = H(input.pubkey): unless coinbase, balance[H] = 0 and
    ///    owned[H] = []; always involved[H] += id
    /// 3. For each output, H = output.pubkey_hash: balance[H] += value,
    ///    owned[H] += id, involved[H] += id
    pub fn apply(&self, tx: &TransactionState) -> Result<Self> {
        let id = tx
            .transaction_id
            .as_ref()
            .ok_or(CashError::MissingTransactionId)?;

        if self.transactions_by_hash.contains_key(id) {
            debug!(transaction = %id, "transaction already applied");
            return Ok(self.clone());
        }

        let mut next = self.clone();
        next.transactions_by_hash.insert(id.clone(), tx.clone());
        next.all_transaction_hashes.push_back(id.clone());

        for input in &tx.inputs {
            let owner_hash = input.script.public_key.hash();

            if !input.outpoint.is_coinbase() {
                next.balances.insert(owner_hash.clone(), 0);
                next.transactions_by_owner_hash.insert(owner_hash.clone(), Vector::new());
            }

            push_once(
                next.transactions_by_involved_hash
                    .entry(owner_hash)
                    .or_insert_with(Vector::new),
                id,
            );
        }

        for output in &tx.outputs {
            let owner_hash = &output.script.public_key_hash;

            let balance = next.balances.entry(owner_hash.clone()).or_insert(0);
            *balance = balance.checked_add(output.value).ok_or_else(|| {
                CashError::MalformedTransaction(format!("Balance overflow for {}", owner_hash))
            })?;

            push_once(
                next.transactions_by_owner_hash
                    .entry(owner_hash.clone())
                    .or_insert_with(Vector::new),
                id,
            );
            push_once(
                next.transactions_by_involved_hash
                    .entry(owner_hash.clone())
                    .or_insert_with(Vector::new),
                id,
            );
        }

        debug!(
            transaction = %id,
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            "applied transaction"
        );
        Ok(next)
    }

    pub fn balance_of(&self, public_key_hash: &Hash) -> Amount {
        self.balances.get(public_key_hash).copied().unwrap_or(0)
    }

    pub fn balances(&self) -> &HashMap<Hash, Amount> {
        &self.balances
    }

    /// Every transaction id in application order
    pub fn all_transaction_hashes(&self) -> &Vector<Hash> {
        &self.all_transaction_hashes
    }

    pub fn transactions_by_hash(&self) -> &HashMap<Hash, TransactionState> {
        &self.transactions_by_hash
    }

    /// Transactions `public_key_hash` can currently spend from
    pub fn owned_by(&self, public_key_hash: &Hash) -> impl Iterator<Item = &Hash> + '_ {
        self.transactions_by_owner_hash
            .get(public_key_hash)
            .into_iter()
            .flatten()
    }

    /// Every transaction `public_key_hash` appears in, as input or output
    pub fn involving(&self, public_key_hash: &Hash) -> impl Iterator<Item = &Hash> + '_ {
        self.transactions_by_involved_hash
            .get(public_key_hash)
            .into_iter()
            .flatten()
    }
}

/// Append `id` unless this transaction already put it there
///
/// An id being applied is new to every list, so a repeat can only be the
/// last entry.
fn push_once(list: &mut Vector<Hash>, id: &Hash) {
    if list.last() != Some(id) {
        list.push_back(id.clone());
    }
}

/// Ledger states of every organization seen so far
///
/// Organizations are created lazily by their first transaction. Updating one
/// organization shares every other organization's state with the previous
/// ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    organizations: HashMap<OrganizationId, LedgerState>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `transactions` for a single organization from an empty ledger
    pub fn fold<'a, I>(organization: &OrganizationId, transactions: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a TransactionState>,
    {
        transactions
            .into_iter()
            .try_fold(Self::new(), |ledger, tx| ledger.apply(organization, tx))
    }

    /// Apply a transaction to one organization's state
    pub fn apply(&self, organization: &OrganizationId, tx: &TransactionState) -> Result<Self> {
        let next_state = match self.organizations.get(organization) {
            Some(state) => state.apply(tx)?,
            None => {
                debug!(organization = %organization, "creating ledger state");
                LedgerState::new().apply(tx)?
            }
        };

        Ok(Self {
            organizations: self.organizations.update(organization.clone(), next_state),
        })
    }

    /// Ledger without `organization`'s state
    pub fn without(&self, organization: &OrganizationId) -> Self {
        Self {
            organizations: self.organizations.without(organization),
        }
    }

    pub fn state(&self, organization: &OrganizationId) -> Option<&LedgerState> {
        self.organizations.get(organization)
    }

    pub fn organizations(&self) -> impl Iterator<Item = &OrganizationId> {
        self.organizations.keys()
    }
}
