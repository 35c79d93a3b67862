use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{Algorithm, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: u64,
}

/// Authenticated user extracted from JWT claims.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Bearer token validation.
///
/// Verifies the HS256 signature and expiry, then makes sure the account
/// exists, opening it with the starting balance on first sight. Inserts
/// [`AuthUser`] into the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    let validation = Validation::new(Algorithm::HS256);
    let claims = decode::<Claims>(token, &state.jwt_key, &validation)
        .map_err(|e| ApiError::Unauthorized(format!("invalid token: {e}")))?
        .claims;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("token subject is not a user id".to_string()))?;
    let email = claims.email.unwrap_or_default();

    state
        .ledger()
        .ensure_account(user_id, &email, state.config.pricing.initial_balance)
        .await?;

    req.extensions_mut().insert(AuthUser { user_id, email });

    Ok(next.run(req).await)
}
