//! Read-only queries over the current ledger
//!
//! Every query is an index lookup; nothing here scans the transaction log.

use crate::ledger::{Ledger, LedgerState};
use crate::transaction::TransactionState;
use crate::types::*;
use im::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct LedgerStore<'a> {
    ledger: &'a Ledger,
}

impl<'a> LedgerStore<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    fn state(&self, organization: &OrganizationId) -> Option<&'a LedgerState> {
        self.ledger.state(organization)
    }

    pub fn has_organization(&self, organization: &OrganizationId) -> bool {
        self.state(organization).is_some()
    }

    /// Balance of `public_key`, zero when unknown
    pub fn balance_of(&self, organization: &OrganizationId, public_key: &PublicKey) -> Amount {
        self.state(organization)
            .map(|state| state.balance_of(&public_key.hash()))
            .unwrap_or(0)
    }

    /// Transactions holding outputs `public_key` can currently spend
    pub fn transactions_owned_by(
        &self,
        organization: &OrganizationId,
        public_key: &PublicKey,
    ) -> Vec<TransactionState> {
        self.state(organization)
            .map(|state| resolve(state, state.owned_by(&public_key.hash())))
            .unwrap_or_default()
    }

    /// Every transaction `public_key` took part in, oldest first
    pub fn transaction_history(
        &self,
        organization: &OrganizationId,
        public_key: &PublicKey,
    ) -> Vec<TransactionState> {
        self.state(organization)
            .map(|state| resolve(state, state.involving(&public_key.hash())))
            .unwrap_or_default()
    }

    /// Every transaction of the organization in application order
    pub fn all_transactions(&self, organization: &OrganizationId) -> Vec<TransactionState> {
        self.state(organization)
            .map(|state| resolve(state, state.all_transaction_hashes()))
            .unwrap_or_default()
    }

    pub fn transactions_by_hash(
        &self,
        organization: &OrganizationId,
    ) -> Option<&'a HashMap<Hash, TransactionState>> {
        self.state(organization).map(LedgerState::transactions_by_hash)
    }

    pub fn transaction(
        &self,
        organization: &OrganizationId,
        transaction_id: &Hash,
    ) -> Option<&'a TransactionState> {
        self.state(organization)?
            .transactions_by_hash()
            .get(transaction_id)
    }
}

fn resolve<'h, I>(state: &LedgerState, hashes: I) -> Vec<TransactionState>
where
    I: IntoIterator<Item = &'h Hash>,
{
    hashes
        .into_iter()
        .filter_map(|hash| state.transactions_by_hash().get(hash))
        .cloned()
        .collect()
}
