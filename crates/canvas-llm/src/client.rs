//! Model client that talks to the `/api/messages` proxy.

use std::sync::Arc;

use async_trait::async_trait;
use canvas_core::{ChatMessage, ModelClient, ModelError};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::Config;
use crate::credentials::CredentialStore;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Keys issued by the model provider all carry this prefix.
pub const API_KEY_PREFIX: &str = "sk-ant-";

const PROBE_MAX_TOKENS: u32 = 10;

/// Why a key was refused at login. `Display` is the user-facing text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyValidationError {
    #[error("Please enter an API key")]
    Empty,

    #[error("Invalid API key format. Claude API keys start with \"sk-ant-\"")]
    BadFormat,

    #[error("Invalid API key. Please check your key and try again.")]
    Rejected,

    #[error("{0}")]
    Failed(String),

    #[error("Network error. Please check your connection and try again.")]
    Network,
}

/// Body for one exchange. The proxy fills in the model name.
pub fn build_request_body(messages: &[ChatMessage], max_tokens: u32, system: &str) -> Value {
    let messages: Vec<Value> = messages
        .iter()
        .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
        .collect();

    json!({
        "max_tokens": max_tokens,
        "system": system,
        "messages": messages,
    })
}

/// First content block's text, if the reply has one.
pub fn extract_reply_text(data: &Value) -> Option<String> {
    data.get("content")?
        .as_array()?
        .first()?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

/// `error.message` from a failure body, or a bare `error` string.
pub fn extract_error_message(data: &Value) -> Option<String> {
    let error = data.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
}

pub struct ProxyClient {
    http: Client,
    config: Config,
    credentials: Arc<dyn CredentialStore>,
}

impl ProxyClient {
    pub fn new(config: Config, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            http: Client::new(),
            config,
            credentials,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    fn build_headers(api_key: &str) -> Option<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(api_key).ok()?);
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Some(headers)
    }

    /// Check a candidate key: format first, then a tiny probe request.
    pub async fn validate_api_key(&self, api_key: &str) -> Result<(), KeyValidationError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(KeyValidationError::Empty);
        }
        if !api_key.starts_with(API_KEY_PREFIX) {
            return Err(KeyValidationError::BadFormat);
        }
        let headers = Self::build_headers(api_key).ok_or(KeyValidationError::BadFormat)?;

        let body = json!({
            "max_tokens": PROBE_MAX_TOKENS,
            "messages": [{ "role": "user", "content": "Hi" }],
        });

        let response = self
            .http
            .post(self.config.messages_url())
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                log::warn!("API key probe failed to reach {}: {}", self.config.api_url, e);
                KeyValidationError::Network
            })?;

        let status = response.status();
        if status.is_success() {
            log::info!("API key accepted");
            return Ok(());
        }
        if status.as_u16() == 401 {
            return Err(KeyValidationError::Rejected);
        }

        let message = response
            .json::<Value>()
            .await
            .ok()
            .as_ref()
            .and_then(extract_error_message)
            .unwrap_or_else(|| "Failed to validate API key. Please try again.".to_string());
        Err(KeyValidationError::Failed(message))
    }

    /// Validate `api_key` and persist it on success.
    pub async fn login(&self, api_key: &str) -> Result<(), KeyValidationError> {
        self.validate_api_key(api_key).await?;
        if let Err(e) = self.credentials.save(api_key.trim()).await {
            log::error!("API key validated but could not be stored: {}", e);
            return Err(KeyValidationError::Failed(e.to_string()));
        }
        Ok(())
    }

    pub async fn logout(&self) {
        if let Err(e) = self.credentials.clear().await {
            log::error!("Failed to clear stored API key: {}", e);
        }
    }
}

#[async_trait]
impl ModelClient for ProxyClient {
    async fn send_messages(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let api_key = self
            .credentials
            .get()
            .await
            .ok_or(ModelError::MissingCredential)?;
        let headers = Self::build_headers(&api_key).ok_or(ModelError::MissingCredential)?;

        let body = build_request_body(messages, self.config.max_tokens, &self.config.system_prompt);
        log::debug!("Sending {} messages to {}", messages.len(), self.config.messages_url());

        let response = self
            .http
            .post(self.config.messages_url())
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                log::error!("Error sending message: {}", e);
                ModelError::Network {
                    detail: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let data = response.json::<Value>().await.ok();
            let err = ModelError::from_status(
                status.as_u16(),
                data.as_ref().and_then(extract_error_message),
            );
            log::error!("Proxy returned HTTP {}: {}", status, err);
            return Err(err);
        }

        let data = response.json::<Value>().await.map_err(|e| {
            log::error!("Proxy returned a non-JSON body: {}", e);
            ModelError::InvalidResponse
        })?;
        extract_reply_text(&data).ok_or(ModelError::InvalidResponse)
    }
}
