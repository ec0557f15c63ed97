//! Structured validation prompts and defensive result parsing

use crate::client::LlmClient;
use crate::result::ValidationResult;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;
use uuid::Uuid;

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Expected JSON response of the HIPAA compliance check.
/// Every field defaults so a partially conforming reply still parses.
#[derive(Debug, Deserialize)]
struct HipaaResponse {
    #[serde(default)]
    is_compliant: bool,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    evidence: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default = "empty_object")]
    compliance_details: serde_json::Value,
}

/// Expected JSON response of the financial calculation check
#[derive(Debug, Deserialize)]
struct FinancialResponse {
    #[serde(default)]
    is_valid: bool,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    evidence: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    calculations: Vec<serde_json::Value>,
}

/// Expected JSON response of the logical consistency check
#[derive(Debug, Deserialize)]
struct ConsistencyResponse {
    #[serde(default)]
    is_consistent: bool,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    contradictions: Vec<String>,
    #[serde(default)]
    inconsistencies: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
}

/// LLM-backed validation service.
///
/// Every check is one `generate` call under a per-call timeout, parsed
/// defensively. Failures of any kind (transport, timeout, malformed
/// JSON) are reported in-band as a failed [`ValidationResult`] and are
/// never propagated: validation failures are domain data, not
/// control-flow exceptions. There is no automatic retry; callers own
/// retry policy.
pub struct LlmValidator {
    client: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl LlmValidator {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate HIPAA compliance of free text
    pub async fn validate_hipaa_compliance(&self, text: &str) -> ValidationResult {
        let start = Instant::now();
        let raw = match self.complete(&hipaa_prompt(text)).await {
            Ok(raw) => raw,
            Err(cause) => return self.fail_soft("hipaa", &cause, start),
        };

        match serde_json::from_str::<HipaaResponse>(&raw) {
            Ok(response) => ValidationResult {
                validation_id: Uuid::new_v4().to_string(),
                is_valid: response.is_compliant,
                confidence: response.confidence,
                reasoning: response.reasoning,
                evidence: response.evidence,
                recommendations: response.recommendations,
                compliance_status: response.compliance_details,
                execution_time_ms: elapsed_ms(start),
            },
            Err(e) => self.fail_soft("hipaa", &e.to_string(), start),
        }
    }

    /// Validate financial calculations in free text
    pub async fn validate_financial_calculations(&self, text: &str) -> ValidationResult {
        let start = Instant::now();
        let raw = match self.complete(&financial_prompt(text)).await {
            Ok(raw) => raw,
            Err(cause) => return self.fail_soft("financial", &cause, start),
        };

        match serde_json::from_str::<FinancialResponse>(&raw) {
            Ok(response) => ValidationResult {
                validation_id: Uuid::new_v4().to_string(),
                is_valid: response.is_valid,
                confidence: response.confidence,
                reasoning: response.reasoning,
                evidence: response.evidence,
                recommendations: response.recommendations,
                compliance_status: serde_json::json!({ "calculations": response.calculations }),
                execution_time_ms: elapsed_ms(start),
            },
            Err(e) => self.fail_soft("financial", &e.to_string(), start),
        }
    }

    /// Validate logical consistency of a list of statements
    pub async fn validate_logical_consistency(&self, statements: &[String]) -> ValidationResult {
        let start = Instant::now();
        let raw = match self.complete(&consistency_prompt(statements)).await {
            Ok(raw) => raw,
            Err(cause) => return self.fail_soft("logical", &cause, start),
        };

        match serde_json::from_str::<ConsistencyResponse>(&raw) {
            Ok(response) => {
                let mut evidence = response.contradictions;
                evidence.extend(response.inconsistencies);
                ValidationResult {
                    validation_id: Uuid::new_v4().to_string(),
                    is_valid: response.is_consistent,
                    confidence: response.confidence,
                    reasoning: response.reasoning,
                    evidence,
                    recommendations: response.recommendations,
                    compliance_status: empty_object(),
                    execution_time_ms: elapsed_ms(start),
                }
            }
            Err(e) => self.fail_soft("logical", &e.to_string(), start),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, String> {
        match tokio::time::timeout(self.timeout, self.client.generate(prompt)).await {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {:?}", self.timeout)),
        }
    }

    fn fail_soft(&self, check: &str, cause: &str, start: Instant) -> ValidationResult {
        warn!(check, cause, "validation failed");
        ValidationResult::failed(cause, elapsed_ms(start))
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn hipaa_prompt(text: &str) -> String {
    format!(
        r#"Analyze the following text for HIPAA compliance:

TEXT: "{text}"

Evaluate compliance with these key HIPAA requirements:
1. Access Control (164.312(a)(1)) - Technical policies for electronic PHI access
2. Integrity (164.312(c)(1)) - Protection from improper alteration/destruction
3. Authentication (164.312(d)) - Verification of person/entity identity
4. Transmission Security (164.312(e)(1)) - Encryption of electronic PHI

Return a JSON response with this structure:
{{
    "is_compliant": boolean,
    "confidence": float (0-1),
    "reasoning": "detailed explanation",
    "evidence": ["list of supporting evidence"],
    "recommendations": ["list of improvement suggestions"],
    "compliance_details": {{
        "access_control": {{"compliant": boolean, "details": "string"}},
        "integrity": {{"compliant": boolean, "details": "string"}},
        "authentication": {{"compliant": boolean, "details": "string"}},
        "transmission_security": {{"compliant": boolean, "details": "string"}}
    }}
}}"#
    )
}

fn financial_prompt(text: &str) -> String {
    format!(
        r#"Analyze the following text for financial calculation accuracy:

TEXT: "{text}"

Check for:
1. Mathematical accuracy of calculations
2. Proper use of financial formulas
3. Logical consistency of financial statements
4. Appropriate financial metrics and ratios

Return a JSON response with this structure:
{{
    "is_valid": boolean,
    "confidence": float (0-1),
    "reasoning": "detailed explanation",
    "evidence": ["list of supporting evidence"],
    "recommendations": ["list of improvement suggestions"],
    "calculations": [
        {{
            "formula": "formula used",
            "result": "calculated result",
            "is_correct": boolean,
            "explanation": "why correct/incorrect"
        }}
    ]
}}"#
    )
}

fn consistency_prompt(statements: &[String]) -> String {
    let numbered = statements
        .iter()
        .enumerate()
        .map(|(i, stmt)| format!("{}. {}", i + 1, stmt))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze the following statements for logical consistency:

STATEMENTS:
{numbered}

Check for:
1. Direct contradictions between statements
2. Logical inconsistencies
3. Circular reasoning
4. Unsupported assumptions

Return a JSON response with this structure:
{{
    "is_consistent": boolean,
    "confidence": float (0-1),
    "reasoning": "detailed explanation",
    "contradictions": ["list of contradictions found"],
    "inconsistencies": ["list of logical inconsistencies"],
    "recommendations": ["list of improvement suggestions"]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmError;
    use async_trait::async_trait;

    /// Client returning a fixed response
    struct StaticClient {
        response: String,
    }

    impl StaticClient {
        fn new(response: &str) -> Arc<Self> {
            Arc::new(Self {
                response: response.to_string(),
            })
        }
    }

    #[async_trait]
    impl LlmClient for StaticClient {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok(self.response.clone())
        }
    }

    /// Client whose transport always fails
    struct FailingClient;

    #[async_trait]
    impl LlmClient for FailingClient {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::Transport("connection refused".to_string()))
        }
    }

    /// Client that never answers within any reasonable timeout
    struct HangingClient;

    #[async_trait]
    impl LlmClient for HangingClient {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_hipaa_validation_parses_response() {
        let client = StaticClient::new(
            r#"{
                "is_compliant": true,
                "confidence": 0.92,
                "reasoning": "Encryption and access controls are described",
                "evidence": ["AES-256 at rest"],
                "recommendations": ["Document key rotation"],
                "compliance_details": {"access_control": {"compliant": true, "details": "RBAC"}}
            }"#,
        );
        let validator = LlmValidator::new(client);

        let result = validator.validate_hipaa_compliance("PHI is encrypted").await;
        assert!(result.is_valid);
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.evidence, vec!["AES-256 at rest"]);
        assert_eq!(result.recommendations, vec!["Document key rotation"]);
        assert!(result.compliance_status["access_control"]["compliant"]
            .as_bool()
            .unwrap());
        assert!(result.execution_time_ms >= 0.0);
    }

    #[tokio::test]
    async fn test_missing_fields_clamp_to_defaults() {
        let validator = LlmValidator::new(StaticClient::new(r#"{"is_compliant": true}"#));

        let result = validator.validate_hipaa_compliance("some text").await;
        assert!(result.is_valid);
        assert_eq!(result.confidence, 0.0);
        assert!(result.evidence.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_fail_soft() {
        let validator = LlmValidator::new(Arc::new(FailingClient));

        let result = validator.validate_hipaa_compliance("anything").await;
        assert!(!result.is_valid);
        assert_eq!(result.confidence, 0.0);
        assert!(result.reasoning.contains("Validation failed"));
        assert!(result.reasoning.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_fail_soft() {
        let validator = LlmValidator::new(StaticClient::new("I am not JSON, sorry."));

        let result = validator.validate_financial_calculations("revenue = 10").await;
        assert!(!result.is_valid);
        assert_eq!(result.confidence, 0.0);
        assert!(result.reasoning.starts_with("Validation failed:"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_fail_soft() {
        let validator =
            LlmValidator::new(Arc::new(HangingClient)).with_timeout(Duration::from_millis(50));

        let result = validator.validate_hipaa_compliance("slow").await;
        assert!(!result.is_valid);
        assert!(result.reasoning.contains("timed out"));
    }

    #[tokio::test]
    async fn test_financial_calculations_substructure() {
        let client = StaticClient::new(
            r#"{
                "is_valid": false,
                "confidence": 0.7,
                "reasoning": "Ratio is wrong",
                "calculations": [{"formula": "debt/equity", "result": "2.0", "is_correct": false, "explanation": "sign error"}]
            }"#,
        );
        let validator = LlmValidator::new(client);

        let result = validator.validate_financial_calculations("D/E = 2.0").await;
        assert!(!result.is_valid);
        assert_eq!(result.confidence, 0.7);
        let calcs = result.compliance_status["calculations"].as_array().unwrap();
        assert_eq!(calcs.len(), 1);
        assert_eq!(calcs[0]["formula"], "debt/equity");
    }

    #[tokio::test]
    async fn test_consistency_evidence_merges_contradictions() {
        let client = StaticClient::new(
            r#"{
                "is_consistent": false,
                "confidence": 0.8,
                "reasoning": "Statements 1 and 2 conflict",
                "contradictions": ["1 contradicts 2"],
                "inconsistencies": ["circular definition in 3"],
                "recommendations": ["Reword statement 2"]
            }"#,
        );
        let validator = LlmValidator::new(client);

        let statements = vec![
            "All data is encrypted".to_string(),
            "No data is encrypted".to_string(),
        ];
        let result = validator.validate_logical_consistency(&statements).await;
        assert!(!result.is_valid);
        assert_eq!(
            result.evidence,
            vec!["1 contradicts 2", "circular definition in 3"]
        );
        assert_eq!(result.recommendations, vec!["Reword statement 2"]);
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let a = hipaa_prompt("same input");
        let b = hipaa_prompt("same input");
        assert_eq!(a, b);
        assert!(a.contains("164.312(a)(1)"));

        let statements = vec!["first".to_string(), "second".to_string()];
        let prompt = consistency_prompt(&statements);
        assert!(prompt.contains("1. first"));
        assert!(prompt.contains("2. second"));
    }
}
