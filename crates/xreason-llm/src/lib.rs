//! # XReason LLM
//!
//! LLM collaborator contract and structured validation checks.
//! The validator turns natural-language compliance questions into one
//! `generate` call each and parses the reply defensively into a uniform
//! [`ValidationResult`].

pub mod client;
pub mod result;
pub mod validator;

pub use client::{LlmClient, LlmError};
pub use result::ValidationResult;
pub use validator::LlmValidator;
