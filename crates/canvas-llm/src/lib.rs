//! canvas-llm - HTTP side of the canvas
//!
//! Implements [`canvas_core::ModelClient`] against the local messages proxy
//! and owns the pieces a client session needs around it: configuration and
//! API key storage.

pub mod client;
pub mod config;
pub mod credentials;

pub use client::{
    build_request_body, extract_error_message, extract_reply_text, KeyValidationError,
    ProxyClient, ANTHROPIC_VERSION, API_KEY_PREFIX,
};
pub use config::{canvas_dir, Config, DEFAULT_API_URL};
pub use credentials::{
    CredentialError, CredentialStore, FileCredentialStore, MemoryCredentialStore,
};
