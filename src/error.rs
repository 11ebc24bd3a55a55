//! Error types for the digital cash ledger

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CashError {
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Transaction has no id")]
    MissingTransactionId,

    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    #[error("No spendable outputs for {0}")]
    NoSpendableOutputs(String),

    #[error("Network submission failed: {0}")]
    NetworkSubmission(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CashError {
    /// Amount exceeds the balance, or there is nothing to spend from.
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(
            self,
            CashError::InsufficientFunds { .. } | CashError::NoSpendableOutputs(_)
        )
    }

    /// Business-rule rejections raised before any state mutation or network I/O.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            CashError::InvalidAmount(_)
                | CashError::InsufficientFunds { .. }
                | CashError::NoSpendableOutputs(_)
                | CashError::NetworkSubmission(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CashError>;
