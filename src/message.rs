//! Wire envelope for coin messages on the pub-sub bus
//!
//! ```text
//! { object: "coin", action: "post_transaction",
//!   transaction_id: <base64url>, transaction: { version, inputs, outputs, lock_time } }
//! ```
//!
//! Raw messages are parsed once, here, into typed values. A structurally
//! broken envelope is `MalformedMessage`; a well-formed envelope carrying a
//! broken transaction is `MalformedTransaction`.

use crate::constants::*;
use crate::error::{CashError, Result};
use crate::transaction::{Transaction, TransactionJson};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Coin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinAction {
    PostTransaction,
}

/// Transaction broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostTransaction {
    pub object: ObjectKind,
    pub action: CoinAction,
    pub transaction_id: Hash,
    pub transaction: TransactionJson,
}

/// Envelope as received, before the transaction body is typed
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    object: ObjectKind,
    action: CoinAction,
    transaction_id: Hash,
    transaction: serde_json::Value,
}

impl PostTransaction {
    pub fn new(transaction: &Transaction) -> Self {
        Self {
            object: ObjectKind::Coin,
            action: CoinAction::PostTransaction,
            transaction_id: transaction.id().clone(),
            transaction: transaction.to_json(),
        }
    }

    /// Parse a raw message
    pub fn parse(raw: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| CashError::MalformedMessage(e.to_string()))?;
        Self::from_value(value)
    }

    /// Parse an already-decoded JSON message
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let envelope: Envelope =
            serde_json::from_value(value).map_err(|e| CashError::MalformedMessage(e.to_string()))?;

        let transaction: TransactionJson = serde_json::from_value(envelope.transaction)
            .map_err(|e| CashError::MalformedTransaction(e.to_string()))?;

        Ok(Self {
            object: envelope.object,
            action: envelope.action,
            transaction_id: envelope.transaction_id,
            transaction,
        })
    }

    /// The carried transaction, identified by the envelope's id
    pub fn to_transaction(&self) -> Result<Transaction> {
        Transaction::from_json(self.transaction.clone(), Some(self.transaction_id.clone()))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CashError::MalformedMessage(e.to_string()))
    }
}

/// Coin channel of an organization: `<root>/<organization>/coin`
pub fn coin_channel(root: &str, organization: &OrganizationId) -> String {
    format!(
        "{}/{}/{}",
        root.trim_end_matches('/'),
        organization,
        COIN_CHANNEL_SUFFIX
    )
}

/// Organization owning a coin channel under `root`
pub fn organization_of_channel(root: &str, channel: &str) -> Option<OrganizationId> {
    let rest = channel.strip_prefix(root.trim_end_matches('/'))?;
    let organization = rest
        .strip_prefix('/')?
        .strip_suffix(COIN_CHANNEL_SUFFIX)?
        .strip_suffix('/')?;

    if organization.is_empty() || organization.contains('/') {
        return None;
    }
    Some(Hash::new(organization))
}
