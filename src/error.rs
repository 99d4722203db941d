use thiserror::Error;

use crate::fixedpoint::Amount;

pub type Result<T> = std::result::Result<T, BankError>;

/// Everything that can make a banking command fail.
///
/// All variants except `Storage` are recoverable at the command prompt, the
/// ledger is left exactly as it was before the command.
#[derive(Error, Debug)]
pub enum BankError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Account {0:05} not found")]
    AccountNotFound(u32),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds: requested ${requested}, available ${available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Checkbook already issued for account {0:05}")]
    AlreadyIssued(u32),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("Inconsistent snapshot: {0}")]
    Inconsistent(String),
}
