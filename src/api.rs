//! Payment intents: validate against the ledger, build, wrap, publish
//!
//! Every business rule is checked before a transaction is built, and the
//! transaction is built before anything touches the network. Publishing is
//! the only suspending step; its failure is returned as-is and never retried.

use crate::builder;
use crate::error::{CashError, Result};
use crate::message::{coin_channel, PostTransaction};
use crate::script::KeyPair;
use crate::store::LedgerStore;
use crate::types::*;
use async_trait::async_trait;
use tracing::{info, warn};

/// Outbound side of the pub-sub bus
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `message` on `channel`
    async fn publish(&self, channel: &str, message: &PostTransaction) -> anyhow::Result<()>;
}

/// Roll-call account of the local member in an organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollCallAccount {
    pub public_key: PublicKey,
    pub balance_hint: Amount,
}

/// Source of roll-call accounts (the attendance-certified keys)
pub trait RollCallAccounts {
    fn roll_call_account_of(&self, organization: &OrganizationId) -> Option<RollCallAccount>;
}

pub struct TransactionMessageApi<P: Publisher> {
    publisher: P,
    root_channel: String,
}

impl<P: Publisher> TransactionMessageApi<P> {
    pub fn new(publisher: P, root_channel: impl Into<String>) -> Self {
        Self {
            publisher,
            root_channel: root_channel.into(),
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// RequestSendTransaction
    ///
    /// 1. Spendable set of `from` must be non-empty
    /// 2. 0 ≤ amount ≤ balance(from)
    /// 3. Build, wrap and publish on the organization's coin channel
    pub async fn request_send_transaction(
        &self,
        store: &LedgerStore<'_>,
        from: &KeyPair,
        to: &PublicKey,
        amount: i64,
        organization: &OrganizationId,
    ) -> Result<Hash> {
        let spendable = store.transactions_owned_by(organization, from.public_key());
        if spendable.is_empty() {
            warn!(
                organization = %organization,
                sender = %from.public_key(),
                "no spendable outputs"
            );
            return Err(CashError::NoSpendableOutputs(from.public_key().to_base64url()));
        }

        let balance = store.balance_of(organization, from.public_key());
        let amount = checked_amount(amount)?;
        if amount > balance {
            warn!(organization = %organization, amount, balance, "insufficient funds");
            return Err(CashError::InsufficientFunds {
                requested: amount,
                available: balance,
            });
        }

        let transaction = builder::create(from, to, balance, amount, &spendable)?;
        self.submit(organization, PostTransaction::new(&transaction)).await
    }

    /// RequestCoinbaseTransaction
    ///
    /// Issues `amount` to each recipient. Whether the signer may issue is
    /// decided by the receiving side, not here.
    pub async fn request_coinbase_transaction(
        &self,
        organizer: &KeyPair,
        recipients: &[PublicKey],
        amount: i64,
        organization: &OrganizationId,
    ) -> Result<Hash> {
        let amount = checked_amount(amount)?;
        let transaction = builder::create_coinbase(organizer, recipients, amount)?;
        self.submit(organization, PostTransaction::new(&transaction)).await
    }

    async fn submit(
        &self,
        organization: &OrganizationId,
        message: PostTransaction,
    ) -> Result<Hash> {
        let channel = coin_channel(&self.root_channel, organization);

        self.publisher
            .publish(&channel, &message)
            .await
            .map_err(|e| {
                warn!(channel = %channel, error = %e, "publish rejected");
                CashError::NetworkSubmission(format!("{:#}", e))
            })?;

        info!(channel = %channel, transaction = %message.transaction_id, "transaction submitted");
        Ok(message.transaction_id)
    }
}

fn checked_amount(amount: i64) -> Result<Amount> {
    Amount::try_from(amount).map_err(|_| CashError::InvalidAmount(amount))
}
