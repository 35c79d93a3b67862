//! DeepSeek chat completions.

use reqwest::Client;
use serde_json::json;
use tracing::info;

use eva_core::config::{ApiKey, DeepSeekSettings};

use crate::client::{send_json, str_at};
use crate::error::ProviderError;
use crate::media::{BoxFuture, TextModel};

const NAME: &str = "deepseek";

pub struct TextProvider {
    client: Client,
    api_key: ApiKey,
    settings: DeepSeekSettings,
}

impl TextProvider {
    pub fn new(client: Client, api_key: ApiKey, settings: DeepSeekSettings) -> Self {
        Self {
            client,
            api_key,
            settings,
        }
    }

    async fn chat(&self, prompt: &str) -> Result<String, ProviderError> {
        let key = self.api_key.get().ok_or(ProviderError::MissingCredential(NAME))?;

        let body = json!({
            "model": self.settings.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.settings.max_tokens,
        });

        info!(provider = NAME, model = %self.settings.model, "requesting completion");

        let response = send_json(
            self.client
                .post(format!(
                    "{}/v1/chat/completions",
                    self.settings.base_url.trim_end_matches('/')
                ))
                .bearer_auth(key)
                .json(&body),
        )
        .await?;

        let content = str_at(&response, "/choices/0/message/content").ok_or_else(|| {
            ProviderError::ResponseParse(format!("no message content in response: {response}"))
        })?;

        info!(provider = NAME, content_len = content.len(), "completion received");
        Ok(content.to_string())
    }
}

impl TextModel for TextProvider {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(self.chat(prompt))
    }
}
