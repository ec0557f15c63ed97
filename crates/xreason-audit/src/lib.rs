//! # XReason Audit
//!
//! Structured compliance audit events emitted by the reasoning core.
//! Signing, verification, registry retrieval and reasoning runs all
//! report through a fire-and-forget [`AuditSink`]; the core never waits
//! on or inspects a response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

/// Category of an audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    RulesetModify,
    RulesetAccess,
    SecurityViolation,
    KeyRotation,
    ReasoningExecuted,
}

/// Outcome of an audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
    Blocked,
}

/// Risk classification attached to every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// A single audit trail entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event id
    pub id: String,

    /// When the event was recorded
    pub timestamp: DateTime<Utc>,

    /// Event category
    pub event_type: AuditEventType,

    /// Operation name (e.g. "register_ruleset")
    pub action: String,

    /// Operation outcome
    pub result: AuditOutcome,

    /// Operation-specific payload
    pub details: serde_json::Value,

    /// Compliance frameworks the operation is relevant to
    pub compliance_frameworks: Vec<String>,

    /// Risk classification
    pub risk_level: RiskLevel,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType, action: &str, result: AuditOutcome) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            action: action.to_string(),
            result,
            details: serde_json::Value::Object(serde_json::Map::new()),
            compliance_frameworks: Vec::new(),
            risk_level: RiskLevel::Low,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_frameworks(mut self, frameworks: &[&str]) -> Self {
        self.compliance_frameworks = frameworks.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }
}

/// Fire-and-forget audit event sink
pub trait AuditSink: Send + Sync {
    fn log_event(&self, event: AuditEvent);
}

/// Default sink that forwards events to `tracing`
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn log_event(&self, event: AuditEvent) {
        match event.risk_level {
            RiskLevel::Low | RiskLevel::Medium => tracing::info!(
                event_id = %event.id,
                event_type = ?event.event_type,
                action = %event.action,
                result = ?event.result,
                details = %event.details,
                "audit event"
            ),
            RiskLevel::High | RiskLevel::Critical => tracing::warn!(
                event_id = %event.id,
                event_type = ?event.event_type,
                action = %event.action,
                result = ?event.result,
                details = %event.details,
                "audit event"
            ),
        }
    }
}

/// In-memory sink for tests and short-lived inspection
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemorySink {
    fn log_event(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Sink that discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl AuditSink for NullSink {
    fn log_event(&self, _event: AuditEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = AuditEvent::new(
            AuditEventType::RulesetModify,
            "register_ruleset",
            AuditOutcome::Success,
        )
        .with_details(serde_json::json!({"ruleset_id": "healthcare_hipaa_1.0.0"}))
        .with_frameworks(&["soc2_type_ii"])
        .with_risk_level(RiskLevel::Medium);

        assert_eq!(event.action, "register_ruleset");
        assert_eq!(event.result, AuditOutcome::Success);
        assert_eq!(event.compliance_frameworks, vec!["soc2_type_ii"]);
        assert_eq!(event.risk_level, RiskLevel::Medium);
        assert_eq!(event.details["ruleset_id"], "healthcare_hipaa_1.0.0");
    }

    #[test]
    fn test_memory_sink_captures_events() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.log_event(AuditEvent::new(
            AuditEventType::SecurityViolation,
            "get_invalid_ruleset",
            AuditOutcome::Blocked,
        ));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AuditEventType::SecurityViolation);
        assert_eq!(events[0].result, AuditOutcome::Blocked);
    }

    #[test]
    fn test_event_serialization() {
        let event = AuditEvent::new(
            AuditEventType::RulesetAccess,
            "get_ruleset",
            AuditOutcome::Success,
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"ruleset_access\""));
        assert!(json.contains("\"success\""));

        let back: AuditEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_type, AuditEventType::RulesetAccess);
    }

    #[test]
    fn test_null_sink_discards() {
        let sink = NullSink;
        sink.log_event(AuditEvent::new(
            AuditEventType::ReasoningExecuted,
            "reason_about_text",
            AuditOutcome::Success,
        ));
    }
}
