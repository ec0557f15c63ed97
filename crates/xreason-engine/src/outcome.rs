//! Reasoning run output types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use xreason_llm::ValidationResult;

/// Full result of one reasoning run over a piece of text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningOutcome {
    pub text: String,
    pub domain: String,

    /// Validator results keyed by validator name ("hipaa", "financial",
    /// "logical"); empty when no validator applied
    pub validation_results: HashMap<String, ValidationResult>,

    pub graph_insights: GraphInsights,

    /// Arithmetic mean of invoked validator confidences, 0.0 with none
    pub overall_confidence: f64,

    /// Validator recommendations, concatenated in invocation order
    pub recommendations: Vec<String>,
}

/// Knowledge-graph context gathered alongside validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphInsights {
    /// Node ids related to extracted terms, accumulated per term
    pub related_concepts: Vec<String>,

    /// Regulation-to-term paths found for healthcare texts
    pub compliance_paths: Vec<Vec<String>>,

    /// Terms with no graph coverage at all
    pub knowledge_gaps: Vec<String>,
}

/// Tuning knobs for insight extraction
#[derive(Debug, Clone, Default)]
pub struct InsightOptions {
    /// Deduplicate `related_concepts` across terms, keeping first
    /// occurrence order. Off by default: repeated hits signal that a
    /// concept is reachable from several terms.
    pub dedupe_related: bool,
}
