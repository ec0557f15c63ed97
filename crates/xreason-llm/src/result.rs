//! Uniform output shape of LLM-backed validation checks

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of one LLM validation call. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Unique id of this validation
    pub validation_id: String,

    /// Whether the checked content passed
    pub is_valid: bool,

    /// Confidence as reported by the LLM, 0.0 when absent or unparseable
    pub confidence: f64,

    /// Free-text explanation
    pub reasoning: String,

    /// Supporting evidence, in the order reported
    pub evidence: Vec<String>,

    /// Improvement suggestions, in the order reported
    pub recommendations: Vec<String>,

    /// Domain-specific substructure (e.g. per-safeguard HIPAA details)
    pub compliance_status: serde_json::Value,

    /// Wall-clock time of the call, recorded on success and failure alike
    pub execution_time_ms: f64,
}

impl ValidationResult {
    /// Fail-soft result carrying the failure cause in-band
    pub fn failed(cause: &str, execution_time_ms: f64) -> Self {
        Self {
            validation_id: Uuid::new_v4().to_string(),
            is_valid: false,
            confidence: 0.0,
            reasoning: format!("Validation failed: {cause}"),
            evidence: Vec::new(),
            recommendations: Vec::new(),
            compliance_status: serde_json::Value::Object(serde_json::Map::new()),
            execution_time_ms,
        }
    }
}
