//! On-disk JSON document format for saved graphs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xreason_core::{GraphEdge, GraphNode, KnowledgeGraph};

pub const FORMAT_VERSION: &str = "1.0";

/// A serialized knowledge graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub metadata: DocumentMetadata,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<StoredEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub created_at: DateTime<Utc>,
    pub version: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub description: String,
}

/// Edge record carrying its composite key as `id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relationship: String,
    #[serde(default)]
    pub properties: std::collections::HashMap<String, serde_json::Value>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl From<&GraphEdge> for StoredEdge {
    fn from(edge: &GraphEdge) -> Self {
        Self {
            id: edge.key(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            relationship: edge.relationship.clone(),
            properties: edge.properties.clone(),
            confidence: edge.confidence,
        }
    }
}

impl StoredEdge {
    pub fn into_edge(self) -> GraphEdge {
        let mut edge = GraphEdge::new(self.source, self.target, self.relationship)
            .with_confidence(self.confidence);
        edge.properties = self.properties;
        edge
    }
}

impl GraphDocument {
    pub fn from_graph(graph: &KnowledgeGraph, description: &str) -> Self {
        let mut nodes: Vec<GraphNode> = graph.nodes().values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        let mut edges: Vec<StoredEdge> = graph.edges().values().map(StoredEdge::from).collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));

        Self {
            metadata: DocumentMetadata {
                created_at: Utc::now(),
                version: FORMAT_VERSION.to_string(),
                node_count: nodes.len(),
                edge_count: edges.len(),
                description: description.to_string(),
            },
            nodes,
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xreason_core::NodeType;

    #[test]
    fn test_document_from_graph() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(GraphNode::new("a", "A", NodeType::Concept));
        graph.add_node(GraphNode::new("b", "B", NodeType::Concept));
        graph
            .add_edge(GraphEdge::new("a", "b", "relates_to"))
            .unwrap();

        let doc = GraphDocument::from_graph(&graph, "test graph");
        assert_eq!(doc.metadata.node_count, 2);
        assert_eq!(doc.metadata.edge_count, 1);
        assert_eq!(doc.metadata.version, FORMAT_VERSION);
        assert_eq!(doc.edges[0].id, "a->b:relates_to");
    }

    #[test]
    fn test_stored_edge_defaults() {
        let json = r#"{"id": "x->y:r", "source": "x", "target": "y", "relationship": "r"}"#;
        let edge: StoredEdge = serde_json::from_str(json).unwrap();
        assert_eq!(edge.confidence, 1.0);
        assert!(edge.properties.is_empty());
    }
}
