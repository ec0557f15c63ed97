//! Built-in domain knowledge bootstrap

use crate::graph::KnowledgeGraph;
use crate::model::{GraphEdge, GraphNode, NodeType};

/// Seed the starter facts for the healthcare and finance domains.
///
/// Node ids are stable slugs so persisted graphs and compliance paths
/// stay comparable across processes.
pub fn seed_domain_knowledge(graph: &mut KnowledgeGraph) {
    // HIPAA knowledge
    graph.add_node(GraphNode::new("hipaa", "HIPAA", NodeType::Regulation));
    graph.add_node(GraphNode::new(
        "access_control",
        "Access Control",
        NodeType::Requirement,
    ));
    graph.add_node(GraphNode::new(
        "authentication",
        "Authentication",
        NodeType::Requirement,
    ));
    graph.add_node(GraphNode::new(
        "phi",
        "Protected Health Information",
        NodeType::Concept,
    ));

    // Financial knowledge
    graph.add_node(GraphNode::new(
        "financial_metrics",
        "Financial Metrics",
        NodeType::Concept,
    ));
    graph.add_node(GraphNode::new(
        "debt_to_equity",
        "Debt-to-Equity Ratio",
        NodeType::Metric,
    ));
    graph.add_node(GraphNode::new(
        "current_ratio",
        "Current Ratio",
        NodeType::Metric,
    ));

    let edges = [
        GraphEdge::new("hipaa", "access_control", "requires"),
        GraphEdge::new("hipaa", "authentication", "requires"),
        GraphEdge::new("access_control", "phi", "protects"),
        GraphEdge::new("financial_metrics", "debt_to_equity", "includes"),
        GraphEdge::new("financial_metrics", "current_ratio", "includes"),
    ];
    for edge in edges {
        // All endpoints were inserted above
        graph
            .add_edge(edge)
            .unwrap_or_else(|e| unreachable!("seed edge references a seeded node: {e}"));
    }
}
