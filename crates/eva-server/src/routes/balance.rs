use axum::extract::{Extension, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use eva_core::models::transaction::{Transaction, TransactionStatus, TransactionType};
use eva_ledger::ledger::RECENT_TRANSACTIONS;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub description: String,
    pub created_at: jiff::Timestamp,
}

impl From<Transaction> for TransactionView {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            kind: t.kind,
            amount: t.amount,
            status: t.status,
            description: t.description,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: Decimal,
    pub transactions: Vec<TransactionView>,
}

pub async fn get_balance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let ledger = state.ledger();
    let balance = ledger.balance(user.user_id).await?;
    let transactions = ledger
        .recent_transactions(user.user_id, RECENT_TRANSACTIONS)
        .await?
        .into_iter()
        .map(TransactionView::from)
        .collect();

    Ok(Json(BalanceResponse {
        balance,
        transactions,
    }))
}
