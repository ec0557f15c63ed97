//! LLM collaborator contract

use async_trait::async_trait;

/// Errors from the LLM transport.
///
/// The validator never propagates these; they become fail-soft
/// validation results. The taxonomy exists so transports can report
/// what actually happened.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// The single operation the reasoning core requires from an LLM.
///
/// The transport is expected to often, but not always, return parseable
/// JSON; no schema is enforced here, only by the caller's defensive
/// parsing.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}
