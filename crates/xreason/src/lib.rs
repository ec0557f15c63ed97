//! # XReason - Hybrid Reasoning Stack
//!
//! XReason combines LLM-backed validation with deterministic knowledge
//! graph reasoning and a cryptographically signed ruleset registry.
//! Structural questions (paths, relations, reachability) are answered by
//! the graph; judgment calls (compliance, consistency) are delegated to
//! an LLM and parsed defensively; rule bundles are distributed with
//! integrity hashes and RSA-PSS signatures tied to a trust table.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xreason::prelude::*;
//!
//! # struct MyClient;
//! # #[async_trait::async_trait]
//! # impl LlmClient for MyClient {
//! #     async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
//! #         Ok("{}".to_string())
//! #     }
//! # }
//! #[tokio::main]
//! async fn main() {
//!     let client: Arc<dyn LlmClient> = Arc::new(MyClient);
//!     let service = ReasoningService::new(client);
//!
//!     let outcome = service
//!         .reason_about_text("Patient records require HIPAA safeguards", "healthcare")
//!         .await;
//!
//!     println!(
//!         "confidence {:.2}, {} related concepts",
//!         outcome.overall_confidence,
//!         outcome.graph_insights.related_concepts.len()
//!     );
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`xreason-core`**: knowledge graph model and traversal
//! - **`xreason-audit`**: structured compliance audit events
//! - **`xreason-llm`**: LLM client contract and validators
//! - **`xreason-rules`**: signed, tamper-evident ruleset registry
//! - **`xreason-store`**: graph persistence backends
//! - **`xreason-engine`**: reasoning orchestration

pub use xreason_audit as audit;
pub use xreason_core as core;
pub use xreason_engine as engine;
pub use xreason_llm as llm;
pub use xreason_rules as rules;
pub use xreason_store as store;

// Convenience re-exports for common types
pub use xreason_audit::{AuditEvent, AuditSink, MemorySink, TracingAuditSink};
pub use xreason_core::{GraphEdge, GraphError, GraphNode, KnowledgeGraph, NodeType};
pub use xreason_engine::{InsightOptions, ReasoningOutcome, ReasoningService};
pub use xreason_llm::{LlmClient, LlmError, LlmValidator, ValidationResult};
pub use xreason_rules::{RulesetRegistry, RulesetStatus, RulesetSubmission, SignedRuleset};
pub use xreason_store::{GraphStore, JsonFileStore};

// Commonly used external dependencies
pub use anyhow;
pub use serde;
pub use serde_json;
pub use tokio;

/// Prelude module for convenient imports
///
/// ```rust
/// use xreason::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AuditSink, GraphEdge, GraphNode, GraphStore, InsightOptions, JsonFileStore,
        KnowledgeGraph, LlmClient, LlmError, LlmValidator, NodeType, ReasoningOutcome,
        ReasoningService, RulesetRegistry, RulesetStatus, RulesetSubmission, ValidationResult,
    };
}
