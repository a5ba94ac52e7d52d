//! Gmail REST API client.
//!
//! Uses two endpoints of Gmail API v1:
//! - `users.messages.list` to search (`q`, `maxResults`)
//! - `users.messages.get` with `format=full` to fetch
//!
//! The caller supplies an OAuth access token per request. Nothing is cached
//! or refreshed here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::MailProvider;
use super::types::{MessageRef, RawMessage};
use crate::error::ProviderError;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail API message list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    messages: Option<Vec<MessageRef>>,
    #[allow(dead_code)]
    result_size_estimate: Option<u32>,
}

/// Gmail API client.
pub struct GmailClient {
    base_url: String,
    client: reqwest::Client,
}

impl GmailClient {
    /// Create a client against `base_url` (normally [`GMAIL_API_BASE`]).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Makes an authenticated GET request to the Gmail API.
    async fn get<T: DeserializeOwned>(
        &self,
        token: &SecretString,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("parse response: {e}")))
    }

    /// Map a non-2xx response onto a provider error.
    async fn handle_error(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => ProviderError::Authentication(format!("{status}: {body}")),
            404 => ProviderError::NotFound(body),
            429 => ProviderError::RateLimited { retry_after_secs },
            code => ProviderError::Api { status: code, body },
        }
    }
}

/// Gmail ids are URL-safe tokens; anything else is refused before it reaches a path.
fn is_valid_message_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl MailProvider for GmailClient {
    fn name(&self) -> &str {
        "gmail"
    }

    async fn search(
        &self,
        token: &SecretString,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<MessageRef>, ProviderError> {
        debug!(query, max_results, "Searching Gmail");
        let response: MessageListResponse = self
            .get(
                token,
                "/messages",
                &[("q", query.to_string()), ("maxResults", max_results.to_string())],
            )
            .await?;
        Ok(response.messages.unwrap_or_default())
    }

    async fn fetch(&self, token: &SecretString, id: &str) -> Result<RawMessage, ProviderError> {
        if !is_valid_message_id(id) {
            return Err(ProviderError::InvalidResponse(format!(
                "malformed message id {id:?}"
            )));
        }
        self.get(
            token,
            &format!("/messages/{id}"),
            &[("format", "full".to_string())],
        )
        .await
    }
}
