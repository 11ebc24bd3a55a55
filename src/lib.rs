//! # PoP Cash
//!
//! Per-organization digital cash ledger.
//!
//! Members holding attendance-certified keys issue, transfer and track an
//! internal unit of value. Transactions arrive over a broadcast bus in a single
//! total order and are folded into per-organization indices.
//!
//! ## Architecture
//!
//! - `transaction` - immutable transaction value, id, wire and state forms
//! - `builder` - payment intent → signed transaction
//! - `ledger` - pure reducer producing balance and history indices
//! - `store` - read-only queries over the ledger
//! - `api` - validate, build, wrap and publish payment intents
//! - `message` - the `post_transaction` wire envelope
//!
//! ## Design Principles
//!
//! 1. **Pure Reducer**: applying a transaction returns a new ledger; the old one is untouched
//! 2. **Parse at the Boundary**: raw messages become typed values once, on arrival
//! 3. **Validate Before I/O**: business rules are checked before building or publishing
//! 4. **Single Writer**: only the session applies transactions; everything else reads
//!    through `LedgerStore`
//!
//! ## Usage
//!
//! ```rust
//! use pop_cash::*;
//!
//! let organizer = KeyPair::from_secret_bytes(&[1; 32]).unwrap();
//! let alice = KeyPair::from_secret_bytes(&[2; 32]).unwrap();
//! let org = Hash::new("my-organization");
//!
//! let coinbase =
//!     builder::create_coinbase(&organizer, &[alice.public_key().clone()], 100).unwrap();
//! let ledger = Ledger::new().apply(&org, &coinbase.to_state()).unwrap();
//!
//! assert_eq!(LedgerStore::new(&ledger).balance_of(&org, alice.public_key()), 100);
//! ```

pub mod types;
pub mod constants;
pub mod script;
pub mod transaction;
pub mod builder;
pub mod ledger;
pub mod store;
pub mod message;
pub mod api;
pub mod config;
pub mod logging;
pub mod error;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use script::{KeyPair, LockingScript, ScriptType, UnlockingScript};
pub use transaction::{Outpoint, Transaction, TransactionInput, TransactionOutput, TransactionState};
pub use ledger::{Ledger, LedgerState};
pub use store::LedgerStore;
pub use message::PostTransaction;
pub use api::{Publisher, RollCallAccount, RollCallAccounts, TransactionMessageApi};
pub use config::CashConfig;
pub use error::{CashError, Result};

use std::collections::HashMap;
use tracing::{info, warn};

/// What the UI shows for the local member of an organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountOverview {
    pub public_key: PublicKey,
    pub balance: Amount,
}

/// Digital cash session
///
/// Owns the ledger of every organization, and is its only writer.
///
/// # Examples
///
/// ```
/// use pop_cash::*;
///
/// struct Offline;
///
/// #[async_trait::async_trait]
/// impl Publisher for Offline {
///     async fn publish(&self, _channel: &str, _message: &PostTransaction) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
///
/// let mut session = DigitalCash::new(CashConfig::default(), Offline);
/// let org = Hash::new("my-organization");
/// let organizer = KeyPair::from_secret_bytes(&[1; 32]).unwrap();
/// let alice = KeyPair::from_secret_bytes(&[2; 32]).unwrap();
///
/// let coinbase =
///     builder::create_coinbase(&organizer, &[alice.public_key().clone()], 100).unwrap();
/// let raw = PostTransaction::new(&coinbase).to_json_string().unwrap();
/// session.handle_message(&org, &raw).unwrap();
///
/// assert_eq!(session.store().balance_of(&org, alice.public_key()), 100);
/// ```
pub struct DigitalCash<P: Publisher> {
    config: CashConfig,
    ledger: Ledger,
    organizers: HashMap<OrganizationId, PublicKey>,
    api: TransactionMessageApi<P>,
}

impl<P: Publisher> DigitalCash<P> {
    pub fn new(config: CashConfig, publisher: P) -> Self {
        let api = TransactionMessageApi::new(publisher, config.root_channel.clone());
        Self {
            config,
            ledger: Ledger::new(),
            organizers: HashMap::new(),
            api,
        }
    }

    pub fn config(&self) -> &CashConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn api(&self) -> &TransactionMessageApi<P> {
        &self.api
    }

    /// Read-only view of the current ledger
    pub fn store(&self) -> LedgerStore<'_> {
        LedgerStore::new(&self.ledger)
    }

    /// Record the organizer whose key may sign coinbase transactions
    pub fn set_organizer(&mut self, organization: OrganizationId, organizer: PublicKey) {
        self.organizers.insert(organization, organizer);
    }

    /// Handle a raw `post_transaction` message delivered for `organization`
    pub fn handle_message(&mut self, organization: &OrganizationId, raw: &str) -> Result<Hash> {
        let message = PostTransaction::parse(raw).map_err(|e| {
            warn!(organization = %organization, error = %e, "rejected coin message");
            e
        })?;
        let transaction = message.to_transaction().map_err(|e| {
            warn!(organization = %organization, error = %e, "rejected coin transaction");
            e
        })?;
        self.handle_transaction(organization, &transaction)
    }

    /// Handle a raw message delivered on a coin channel
    pub fn handle_channel_message(&mut self, channel: &str, raw: &str) -> Result<Hash> {
        let organization = message::organization_of_channel(&self.config.root_channel, channel)
            .ok_or_else(|| {
                CashError::MalformedMessage(format!("Not a coin channel: {}", channel))
            })?;
        self.handle_message(&organization, raw)
    }

    /// Apply a delivered transaction, verifying it first when configured to
    pub fn handle_transaction(
        &mut self,
        organization: &OrganizationId,
        transaction: &Transaction,
    ) -> Result<Hash> {
        if self.config.verify_signatures {
            self.verify(organization, transaction)?;
        }

        self.ledger = self.ledger.apply(organization, &transaction.to_state())?;

        info!(organization = %organization, transaction = %transaction.id(), "transaction applied");
        Ok(transaction.id().clone())
    }

    fn verify(&self, organization: &OrganizationId, transaction: &Transaction) -> Result<()> {
        let organizer = self.organizers.get(organization).ok_or_else(|| {
            CashError::InvalidSignature(format!("No organizer known for {}", organization))
        })?;
        let empty = im::HashMap::new();
        let known = self.store().transactions_by_hash(organization).unwrap_or(&empty);

        transaction::check_transaction_validity(transaction, organizer, known)
    }

    /// Drop an organization's ledger, e.g. when a new roll call closes
    pub fn reset_organization(&mut self, organization: &OrganizationId) {
        info!(organization = %organization, "resetting ledger");
        self.ledger = self.ledger.without(organization);
    }

    /// Send `amount` from `from` to `to`
    pub async fn send(
        &self,
        from: &KeyPair,
        to: &PublicKey,
        amount: i64,
        organization: &OrganizationId,
    ) -> Result<Hash> {
        self.api
            .request_send_transaction(&self.store(), from, to, amount, organization)
            .await
    }

    /// Issue `amount` to each recipient
    pub async fn issue(
        &self,
        organizer: &KeyPair,
        recipients: &[PublicKey],
        amount: i64,
        organization: &OrganizationId,
    ) -> Result<Hash> {
        self.api
            .request_coinbase_transaction(organizer, recipients, amount, organization)
            .await
    }

    /// Balance display for the local roll-call account
    ///
    /// The ledger balance wins once the organization has ledger state; before
    /// that the roll-call hint is shown. The hint is never written to the ledger.
    pub fn account_overview<R: RollCallAccounts>(
        &self,
        roll_calls: &R,
        organization: &OrganizationId,
    ) -> Option<AccountOverview> {
        let account = roll_calls.roll_call_account_of(organization)?;
        let store = self.store();

        let balance = if store.has_organization(organization) {
            store.balance_of(organization, &account.public_key)
        } else {
            account.balance_hint
        };

        Some(AccountOverview {
            public_key: account.public_key,
            balance,
        })
    }
}
