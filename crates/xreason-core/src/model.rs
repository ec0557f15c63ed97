//! Graph data models for hybrid reasoning

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of entity a graph node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Regulation,
    Requirement,
    Concept,
    Control,
    Metric,
    Entity,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeType::Regulation => "regulation",
            NodeType::Requirement => "requirement",
            NodeType::Concept => "concept",
            NodeType::Control => "control",
            NodeType::Metric => "metric",
            NodeType::Entity => "entity",
        };
        write!(f, "{}", s)
    }
}

/// A node in the knowledge graph.
///
/// Identity is `id`; `label` is a display string and is not guaranteed
/// unique. Label-based lookups go through the graph's label index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub node_type: NodeType,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
    pub confidence: f64,
}

impl GraphNode {
    /// Create a node with an explicit id
    pub fn new(id: impl Into<String>, label: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type,
            properties: HashMap::new(),
            confidence: 1.0,
        }
    }

    /// Create a node with a generated id
    pub fn with_generated_id(label: impl Into<String>, node_type: NodeType) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), label, node_type)
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// A directed edge in the knowledge graph.
///
/// Identity is the composite key `"{source}->{target}:{relationship}"`;
/// inserting an edge with an existing key overwrites the previous edge.
/// `confidence` is metadata and is never used as a traversal weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relationship: String,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
    pub confidence: f64,
}

impl GraphEdge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relationship: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relationship: relationship.into(),
            properties: HashMap::new(),
            confidence: 1.0,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Composite identity key
    pub fn key(&self) -> String {
        format!("{}->{}:{}", self.source, self.target, self.relationship)
    }
}

/// One outgoing relationship returned by [`crate::KnowledgeGraph::query`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeMatch {
    pub source: String,
    pub target: String,
    pub relationship: String,
    pub properties: HashMap<String, serde_json::Value>,
    pub confidence: f64,
}

impl From<&GraphEdge> for EdgeMatch {
    fn from(edge: &GraphEdge) -> Self {
        Self {
            source: edge.source.clone(),
            target: edge.target.clone(),
            relationship: edge.relationship.clone(),
            properties: edge.properties.clone(),
            confidence: edge.confidence,
        }
    }
}
