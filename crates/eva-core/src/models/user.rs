use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account holder. The balance is only ever mutated by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    pub balance: Decimal,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl User {
    pub fn new(email: impl Into<String>, balance: Decimal) -> Self {
        let now = jiff::Timestamp::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            first_name: None,
            balance,
            created_at: now,
            updated_at: now,
        }
    }
}
