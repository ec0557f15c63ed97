//! # XReason Engine
//!
//! Orchestrates hybrid reasoning: LLM validators for judgment calls,
//! the knowledge graph for structural context, audit events for every
//! completed run.

pub mod outcome;
pub mod service;

pub use outcome::{GraphInsights, InsightOptions, ReasoningOutcome};
pub use service::{ReasoningService, ReasoningError};
