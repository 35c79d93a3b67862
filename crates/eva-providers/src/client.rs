//! Shared HTTP plumbing for the provider adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::error::ProviderError;

/// Upper bound on a single provider round trip. Long-running jobs are
/// polled, so no individual request should come close to this.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Build the HTTP client shared by every adapter.
pub fn build_client() -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))
}

/// Send a request and decode its body as JSON.
///
/// A non-2xx status becomes `Rejected` carrying the response body, and a
/// body that is not JSON becomes `ResponseParse`.
pub async fn send_json(request: RequestBuilder) -> Result<Value, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(ProviderError::Rejected(format!("status={status} body={text}")));
    }

    serde_json::from_str(&text)
        .map_err(|e| ProviderError::ResponseParse(format!("{e}; body={text}")))
}

/// Read a string at a JSON pointer, treating empty strings as absent.
pub fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
