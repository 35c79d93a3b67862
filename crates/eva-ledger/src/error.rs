use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user already exists: {0}")]
    DuplicateUser(Uuid),

    #[error("user not found: {0}")]
    UserNotFound(Uuid),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("user not found: {0}")]
    UserNotFound(Uuid),

    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Decimal, required: Decimal },

    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    #[error("balance {balance} cannot take a credit of {amount}")]
    BalanceOverflow { balance: Decimal, amount: Decimal },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
