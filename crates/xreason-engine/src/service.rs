//! Hybrid reasoning orchestration
//!
//! Combines LLM-backed validation with knowledge-graph insight
//! extraction. Validation is fail-soft: a broken LLM call degrades the
//! result instead of failing the run.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use xreason_audit::{AuditEvent, AuditEventType, AuditOutcome, AuditSink, TracingAuditSink};
use xreason_core::{EdgeMatch, GraphEdge, GraphError, KnowledgeGraph, NodeType};
use xreason_llm::{LlmClient, LlmValidator, ValidationResult};

use crate::outcome::{GraphInsights, InsightOptions, ReasoningOutcome};

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("graph operation failed: {0}")]
    Graph(#[from] GraphError),
}

/// Reasoning service over a shared knowledge graph
pub struct ReasoningService {
    validator: LlmValidator,
    graph: Arc<RwLock<KnowledgeGraph>>,
    audit: Arc<dyn AuditSink>,
    options: InsightOptions,
}

impl ReasoningService {
    /// Service with the built-in domain knowledge seeded into the graph.
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            validator: LlmValidator::new(client),
            graph: Arc::new(RwLock::new(KnowledgeGraph::with_domain_knowledge())),
            audit: Arc::new(TracingAuditSink),
            options: InsightOptions::default(),
        }
    }

    pub fn with_graph(mut self, graph: KnowledgeGraph) -> Self {
        self.graph = Arc::new(RwLock::new(graph));
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_options(mut self, options: InsightOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_validator(mut self, validator: LlmValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Shared handle to the underlying graph, e.g. for persistence.
    pub fn graph(&self) -> Arc<RwLock<KnowledgeGraph>> {
        Arc::clone(&self.graph)
    }

    /// Run hybrid reasoning over free text.
    ///
    /// Validator dispatch by domain: healthcare runs the HIPAA check,
    /// finance the financial check, anything else a logical-consistency
    /// check when the text splits into more than one statement.
    pub async fn reason_about_text(&self, text: &str, domain: &str) -> ReasoningOutcome {
        debug!(domain, text_len = text.len(), "reasoning started");
        let mut validation_results: HashMap<String, ValidationResult> = HashMap::new();

        match domain {
            "healthcare" => {
                validation_results.insert(
                    "hipaa".to_string(),
                    self.validator.validate_hipaa_compliance(text).await,
                );
            }
            "finance" => {
                validation_results.insert(
                    "financial".to_string(),
                    self.validator.validate_financial_calculations(text).await,
                );
            }
            _ => {
                let statements = split_statements(text);
                if statements.len() > 1 {
                    validation_results.insert(
                        "logical".to_string(),
                        self.validator.validate_logical_consistency(&statements).await,
                    );
                }
            }
        }

        let graph_insights = self.extract_graph_insights(text, domain).await;

        let overall_confidence = if validation_results.is_empty() {
            0.0
        } else {
            validation_results.values().map(|v| v.confidence).sum::<f64>()
                / validation_results.len() as f64
        };

        // invocation order is deterministic: at most one validator runs
        let mut recommendations = Vec::new();
        for validation in validation_results.values() {
            recommendations.extend(validation.recommendations.iter().cloned());
        }

        info!(
            domain,
            validators = validation_results.len(),
            overall_confidence,
            "reasoning complete"
        );
        self.audit.log_event(
            AuditEvent::new(
                AuditEventType::ReasoningExecuted,
                "reason_about_text",
                AuditOutcome::Success,
            )
            .with_details(json!({
                "domain": domain,
                "validators": validation_results.keys().collect::<Vec<_>>(),
                "overall_confidence": overall_confidence,
            })),
        );

        ReasoningOutcome {
            text: text.to_string(),
            domain: domain.to_string(),
            validation_results,
            graph_insights,
            overall_confidence,
            recommendations,
        }
    }

    async fn extract_graph_insights(&self, text: &str, domain: &str) -> GraphInsights {
        let mut insights = GraphInsights::default();
        let terms = extract_terms(text);
        let graph = self.graph.read().await;

        for term in &terms {
            if graph.find_by_label(term).is_empty() {
                insights.knowledge_gaps.push(term.clone());
            }
            insights
                .related_concepts
                .extend(graph.get_related_concepts(term, 2));
        }
        if self.options.dedupe_related {
            let mut seen = std::collections::HashSet::new();
            insights.related_concepts.retain(|c| seen.insert(c.clone()));
        }

        if domain == "healthcare" {
            for term in &terms {
                if term.to_lowercase().contains("hipaa") {
                    let path = graph.find_path("HIPAA", term, 3);
                    if !path.is_empty() {
                        insights.compliance_paths.push(path);
                    }
                }
            }
        }

        insights
    }

    /// Validate against one named regulation, independent of domain
    /// dispatch.
    pub async fn validate_compliance(&self, text: &str, regulation: &str) -> ValidationResult {
        match regulation.to_lowercase().as_str() {
            "hipaa" => self.validator.validate_hipaa_compliance(text).await,
            "financial" => self.validator.validate_financial_calculations(text).await,
            _ => {
                let statements = split_statements(text);
                self.validator.validate_logical_consistency(&statements).await
            }
        }
    }

    /// Add a subject-predicate-object fact, creating concept nodes for
    /// unknown labels.
    pub async fn add_knowledge(
        &self,
        subject: &str,
        predicate: &str,
        object: &str,
        confidence: f64,
    ) -> Result<(), ReasoningError> {
        let mut graph = self.graph.write().await;
        let subject_id = graph.get_or_create_by_label(subject, NodeType::Concept);
        let object_id = graph.get_or_create_by_label(object, NodeType::Concept);
        graph.add_edge(
            GraphEdge::new(subject_id, object_id, predicate).with_confidence(confidence),
        )?;
        Ok(())
    }

    /// Query the graph. `"subject -> predicate"` filters by predicate;
    /// anything else returns all outgoing edges of the subject.
    pub async fn query_knowledge(&self, query: &str) -> Vec<EdgeMatch> {
        let graph = self.graph.read().await;
        if let Some((subject, predicate)) = query.split_once("->") {
            return graph.query(subject.trim(), Some(predicate.trim()));
        }
        graph.query(query.trim(), None)
    }
}

/// Naive sentence split on periods, empty fragments dropped
fn split_statements(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Keyword-driven term extraction, stable order
fn extract_terms(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    if text.is_empty() {
        return terms;
    }
    let lower = text.to_lowercase();
    if lower.contains("hipaa") || lower.contains("health") {
        terms.push("HIPAA".to_string());
        terms.push("healthcare".to_string());
    }
    if lower.contains("debt") || lower.contains("equity") || lower.contains("ratio") {
        terms.push("financial".to_string());
        terms.push("metrics".to_string());
    }
    terms
}
