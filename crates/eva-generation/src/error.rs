use thiserror::Error;

use eva_ledger::error::{LedgerError, StoreError};

/// Failures surfaced to the caller. Everything that goes wrong after the
/// debit is absorbed into an empty result instead.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
