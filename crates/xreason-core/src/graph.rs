//! In-memory knowledge graph with structural query operations

use crate::model::{EdgeMatch, GraphEdge, GraphNode, NodeType};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info};

/// Graph structural errors
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Edge {edge_key} references missing node: {missing}")]
    DanglingReference { edge_key: String, missing: String },
}

/// Directed knowledge graph of domain facts and regulations.
///
/// Nodes are keyed by `id`, edges by their composite
/// `source->target:relationship` key. A label index in insertion order
/// backs the best-effort label lookups; all traversal algorithms
/// operate on ids only.
///
/// Structural queries never fail: unresolved labels, missing paths and
/// empty neighborhoods are normal zero-result outcomes. Only edges that
/// reference nonexistent nodes are rejected.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: HashMap<String, GraphNode>,
    edges: HashMap<String, GraphEdge>,
    /// Outgoing edge keys per source node, in insertion order
    adjacency: HashMap<String, Vec<String>>,
    /// Node ids per label, in insertion order
    label_index: HashMap<String, Vec<String>>,
}

impl KnowledgeGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph pre-seeded with the HIPAA and financial starter facts
    pub fn with_domain_knowledge() -> Self {
        let mut graph = Self::new();
        crate::domain::seed_domain_knowledge(&mut graph);
        graph
    }

    /// Insert or overwrite a node by id. Idempotent.
    pub fn add_node(&mut self, node: GraphNode) {
        if let Some(previous) = self.nodes.get(&node.id) {
            if previous.label != node.label {
                if let Some(ids) = self.label_index.get_mut(&previous.label) {
                    ids.retain(|id| id != &node.id);
                }
                self.label_index
                    .entry(node.label.clone())
                    .or_default()
                    .push(node.id.clone());
            }
        } else {
            self.label_index
                .entry(node.label.clone())
                .or_default()
                .push(node.id.clone());
        }
        debug!(node_id = %node.id, label = %node.label, "added node");
        self.nodes.insert(node.id.clone(), node);
    }

    /// Insert or overwrite an edge by composite key.
    ///
    /// Both endpoints must already exist; a dangling reference fails
    /// fast instead of corrupting adjacency.
    pub fn add_edge(&mut self, edge: GraphEdge) -> Result<(), GraphError> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::DanglingReference {
                    edge_key: edge.key(),
                    missing: endpoint.clone(),
                });
            }
        }

        let key = edge.key();
        if !self.edges.contains_key(&key) {
            self.adjacency
                .entry(edge.source.clone())
                .or_default()
                .push(key.clone());
        }
        debug!(edge_key = %key, "added edge");
        self.edges.insert(key, edge);
        Ok(())
    }

    /// All nodes whose label equals `label`, in insertion order.
    ///
    /// Best-effort helper: labels are not unique, so callers that need
    /// a single node must pick deterministically (the graph's own
    /// label-based operations take the first match).
    pub fn find_by_label(&self, label: &str) -> Vec<&GraphNode> {
        self.label_index
            .get(label)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default()
    }

    /// First node id registered under `label`, if any
    fn resolve_label(&self, label: &str) -> Option<&str> {
        self.label_index
            .get(label)
            .and_then(|ids| ids.first())
            .map(String::as_str)
    }

    /// Resolve a node by label or create a concept-typed node for it.
    ///
    /// This is the single routing point for label-keyed mutations such
    /// as `add_knowledge`: first match wins, node replacement is
    /// last-write-wins.
    pub fn get_or_create_by_label(&mut self, label: &str, node_type: NodeType) -> String {
        if let Some(id) = self.resolve_label(label) {
            return id.to_string();
        }
        let node = GraphNode::with_generated_id(label, node_type);
        let id = node.id.clone();
        self.add_node(node);
        id
    }

    /// Outgoing relationships of the first node labelled `subject_label`,
    /// optionally filtered by relationship name. Empty when the label
    /// does not resolve.
    pub fn query(&self, subject_label: &str, predicate: Option<&str>) -> Vec<EdgeMatch> {
        let Some(subject_id) = self.resolve_label(subject_label) else {
            return Vec::new();
        };

        self.outgoing(subject_id)
            .filter(|edge| predicate.map_or(true, |p| edge.relationship == p))
            .map(EdgeMatch::from)
            .collect()
    }

    /// Shortest path (unweighted BFS) between two labelled nodes.
    ///
    /// Returns node ids from source to target inclusive. Empty when
    /// either label is unresolved, no path exists, or the shortest path
    /// spans more than `max_length` nodes.
    pub fn find_path(&self, source_label: &str, target_label: &str, max_length: usize) -> Vec<String> {
        let (Some(source_id), Some(target_id)) = (
            self.resolve_label(source_label),
            self.resolve_label(target_label),
        ) else {
            return Vec::new();
        };

        if source_id == target_id {
            return if max_length >= 1 {
                vec![source_id.to_string()]
            } else {
                Vec::new()
            };
        }

        let mut predecessors: HashMap<&str, &str> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        visited.insert(source_id);
        queue.push_back(source_id);

        while let Some(current) = queue.pop_front() {
            for edge in self.outgoing(current) {
                let next = edge.target.as_str();
                if !visited.insert(next) {
                    continue;
                }
                predecessors.insert(next, current);
                if next == target_id {
                    let path = Self::reconstruct_path(&predecessors, source_id, target_id);
                    return if path.len() <= max_length { path } else { Vec::new() };
                }
                queue.push_back(next);
            }
        }

        Vec::new()
    }

    /// Depth-limited reachability over outgoing edges, excluding the
    /// origin node. `max_depth` bounds recursion depth, not edge count.
    /// Pure reachability: confidence is never consulted.
    pub fn get_related_concepts(&self, label: &str, max_depth: usize) -> Vec<String> {
        let Some(origin) = self.resolve_label(label) else {
            return Vec::new();
        };

        let mut visited: HashSet<&str> = HashSet::new();
        let mut related: Vec<String> = Vec::new();
        self.collect_related(origin, 0, max_depth, &mut visited, &mut related);
        related.retain(|id| id.as_str() != origin);
        related
    }

    fn collect_related<'a>(
        &'a self,
        node_id: &'a str,
        depth: usize,
        max_depth: usize,
        visited: &mut HashSet<&'a str>,
        related: &mut Vec<String>,
    ) {
        if depth > max_depth || !visited.insert(node_id) {
            return;
        }
        related.push(node_id.to_string());
        for edge in self.outgoing(node_id) {
            self.collect_related(&edge.target, depth + 1, max_depth, visited, related);
        }
    }

    fn outgoing<'g>(&'g self, source_id: &str) -> impl Iterator<Item = &'g GraphEdge> {
        self.adjacency
            .get(source_id)
            .into_iter()
            .flatten()
            .filter_map(|key| self.edges.get(key))
    }

    fn reconstruct_path(
        predecessors: &HashMap<&str, &str>,
        source_id: &str,
        target_id: &str,
    ) -> Vec<String> {
        let mut path = vec![target_id.to_string()];
        let mut current = target_id;
        while current != source_id {
            match predecessors.get(current) {
                Some(prev) => {
                    path.push((*prev).to_string());
                    current = prev;
                }
                // Unreachable for targets discovered by the BFS
                None => return Vec::new(),
            }
        }
        path.reverse();
        path
    }

    /// Node by id
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Edge by composite key
    pub fn edge(&self, key: &str) -> Option<&GraphEdge> {
        self.edges.get(key)
    }

    /// All nodes, keyed by id
    pub fn nodes(&self) -> &HashMap<String, GraphNode> {
        &self.nodes
    }

    /// All edges, keyed by composite key
    pub fn edges(&self) -> &HashMap<String, GraphEdge> {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Drop all nodes and edges so the graph can be repopulated
    pub fn clear(&mut self) {
        let node_count = self.nodes.len();
        self.nodes.clear();
        self.edges.clear();
        self.adjacency.clear();
        self.label_index.clear();
        info!(node_count, "cleared knowledge graph");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeType;

    fn sample_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(GraphNode::new("n1", "HIPAA", NodeType::Regulation));
        graph.add_node(GraphNode::new("n2", "Access Control", NodeType::Requirement));
        graph.add_node(GraphNode::new("n3", "PHI", NodeType::Concept));
        graph.add_edge(GraphEdge::new("n1", "n2", "requires")).unwrap();
        graph.add_edge(GraphEdge::new("n2", "n3", "protects")).unwrap();
        graph
    }

    #[test]
    fn test_add_node_idempotent() {
        let mut graph = KnowledgeGraph::new();
        let node = GraphNode::new("n1", "HIPAA", NodeType::Regulation);
        graph.add_node(node.clone());
        graph.add_node(node.clone());

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.find_by_label("HIPAA").len(), 1);
        assert_eq!(graph.node("n1"), Some(&node));
    }

    #[test]
    fn test_add_node_relabel_updates_index() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(GraphNode::new("n1", "Old Label", NodeType::Concept));
        graph.add_node(GraphNode::new("n1", "New Label", NodeType::Concept));

        assert!(graph.find_by_label("Old Label").is_empty());
        assert_eq!(graph.find_by_label("New Label").len(), 1);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_add_edge_overwrites_by_composite_key() {
        let mut graph = sample_graph();
        graph
            .add_edge(GraphEdge::new("n1", "n2", "requires").with_confidence(0.5))
            .unwrap();

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edge("n1->n2:requires").unwrap().confidence, 0.5);
        // Adjacency must not accumulate a duplicate entry
        assert_eq!(graph.query("HIPAA", None).len(), 1);
    }

    #[test]
    fn test_add_edge_rejects_dangling_reference() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(GraphNode::new("n1", "HIPAA", NodeType::Regulation));

        let err = graph.add_edge(GraphEdge::new("n1", "ghost", "requires")).unwrap_err();
        match err {
            GraphError::DanglingReference { missing, .. } => assert_eq!(missing, "ghost"),
        }
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_query_by_label() {
        let graph = sample_graph();
        let results = graph.query("HIPAA", None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "n1");
        assert_eq!(results[0].target, "n2");
        assert_eq!(results[0].relationship, "requires");
    }

    #[test]
    fn test_query_with_predicate_filter() {
        let mut graph = sample_graph();
        graph.add_edge(GraphEdge::new("n1", "n3", "mentions")).unwrap();

        assert_eq!(graph.query("HIPAA", Some("requires")).len(), 1);
        assert_eq!(graph.query("HIPAA", Some("mentions")).len(), 1);
        assert_eq!(graph.query("HIPAA", None).len(), 2);
        assert!(graph.query("HIPAA", Some("forbids")).is_empty());
    }

    #[test]
    fn test_query_unknown_label_is_empty() {
        let graph = sample_graph();
        assert!(graph.query("Nonexistent", None).is_empty());
    }

    #[test]
    fn test_query_first_match_on_duplicate_labels() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(GraphNode::new("a", "Dup", NodeType::Concept));
        graph.add_node(GraphNode::new("b", "Dup", NodeType::Concept));
        graph.add_node(GraphNode::new("c", "Other", NodeType::Concept));
        graph.add_edge(GraphEdge::new("a", "c", "links")).unwrap();
        graph.add_edge(GraphEdge::new("b", "c", "links")).unwrap();

        // First inserted node wins; find_by_label exposes the ambiguity
        let results = graph.query("Dup", None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "a");
        assert_eq!(graph.find_by_label("Dup").len(), 2);
    }

    #[test]
    fn test_find_path_shortest() {
        let graph = sample_graph();
        assert_eq!(graph.find_path("HIPAA", "Access Control", 3), vec!["n1", "n2"]);
        assert_eq!(graph.find_path("HIPAA", "PHI", 3), vec!["n1", "n2", "n3"]);
    }

    #[test]
    fn test_find_path_unresolved_or_disconnected() {
        let mut graph = sample_graph();
        graph.add_node(GraphNode::new("n4", "Island", NodeType::Entity));

        assert!(graph.find_path("HIPAA", "Nonexistent", 3).is_empty());
        assert!(graph.find_path("Nonexistent", "HIPAA", 3).is_empty());
        assert!(graph.find_path("HIPAA", "Island", 3).is_empty());
        // Edges are directed; no reverse path
        assert!(graph.find_path("PHI", "HIPAA", 3).is_empty());
    }

    #[test]
    fn test_find_path_respects_max_length() {
        let graph = sample_graph();
        // Shortest path has 3 nodes; a 2-node budget yields empty, never truncated
        assert!(graph.find_path("HIPAA", "PHI", 2).is_empty());
        assert_eq!(graph.find_path("HIPAA", "PHI", 3).len(), 3);
    }

    #[test]
    fn test_find_path_same_endpoint() {
        let graph = sample_graph();
        assert_eq!(graph.find_path("HIPAA", "HIPAA", 3), vec!["n1"]);
    }

    #[test]
    fn test_related_concepts_excludes_origin() {
        let graph = sample_graph();
        let related = graph.get_related_concepts("HIPAA", 2);
        assert_eq!(related, vec!["n2".to_string(), "n3".to_string()]);
    }

    #[test]
    fn test_related_concepts_depth_limit() {
        let graph = sample_graph();
        assert_eq!(graph.get_related_concepts("HIPAA", 1), vec!["n2".to_string()]);
        assert!(graph.get_related_concepts("PHI", 2).is_empty());
        assert!(graph.get_related_concepts("Nonexistent", 2).is_empty());
    }

    #[test]
    fn test_related_concepts_handles_cycles() {
        let mut graph = sample_graph();
        graph.add_edge(GraphEdge::new("n3", "n1", "regulated_by")).unwrap();

        let related = graph.get_related_concepts("HIPAA", 5);
        assert_eq!(related, vec!["n2".to_string(), "n3".to_string()]);
    }

    #[test]
    fn test_get_or_create_by_label() {
        let mut graph = sample_graph();
        let existing = graph.get_or_create_by_label("HIPAA", NodeType::Concept);
        assert_eq!(existing, "n1");

        let created = graph.get_or_create_by_label("Brand New", NodeType::Concept);
        assert_eq!(graph.node(&created).unwrap().label, "Brand New");
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn test_clear() {
        let mut graph = sample_graph();
        graph.clear();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.query("HIPAA", None).is_empty());
    }
}
