//! eva-ledger
//!
//! Prepaid balances and the append-only transaction trail. Every balance
//! mutation goes through [`ledger::Ledger`], which serializes work per user
//! and commits the new balance together with its transaction.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod snapshot;
pub mod store;
