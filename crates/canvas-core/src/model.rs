//! Model-call seam
//!
//! The canvas never talks HTTP itself. Anything that can turn a transcript
//! into reply text implements [`ModelClient`].

use async_trait::async_trait;
use thiserror::Error;

use crate::history::ChatMessage;

/// Default cap on response length.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// System prompt sent with every exchange unless configured otherwise.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant having a conversation with a user.
Pay careful attention to the full conversation history provided.
Remember details the user has shared (like their name, preferences, or previous topics) and use them in your responses.
Be consistent with what you've said earlier in the conversation.";

/// Failures of one model call. The `Display` text is what ends up on the
/// assistant node after the `Error:` prefix.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("No API key found. Please log in again.")]
    MissingCredential,

    #[error("Invalid response format from API")]
    InvalidResponse,

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Network error. Please check your connection and try again.")]
    Network { detail: String },
}

impl ModelError {
    /// Non-success status: prefer the body's error message when present.
    pub fn from_status(status: u16, body_message: Option<String>) -> Self {
        let message = body_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("API request failed with status {}", status));
        ModelError::Status { status, message }
    }
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the ordered transcript and return the first text segment of the
    /// reply.
    async fn send_messages(&self, messages: &[ChatMessage]) -> Result<String, ModelError>;
}
