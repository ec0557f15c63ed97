//! Graph persistence backends

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use xreason_core::{GraphError, KnowledgeGraph};

use crate::document::GraphDocument;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("saved graph not found: {0}")]
    NotFound(String),

    #[error("graph reconstruction failed: {0}")]
    Graph(#[from] GraphError),
}

/// Summary of one saved graph file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSummary {
    pub filename: String,
    pub path: PathBuf,
    pub created_at: Option<DateTime<Utc>>,
    pub node_count: usize,
    pub edge_count: usize,
    pub size_bytes: u64,
    pub description: String,
}

/// Pluggable graph persistence backend
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Persist a graph, returning the name it was stored under.
    async fn save(&self, graph: &KnowledgeGraph, name: Option<&str>) -> Result<String, StoreError>;

    /// Load a previously saved graph.
    async fn load(&self, name: &str) -> Result<KnowledgeGraph, StoreError>;

    /// Summaries of all saved graphs, newest first.
    async fn list(&self) -> Result<Vec<GraphSummary>, StoreError>;

    /// Remove a saved graph. Returns false when it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, StoreError>;
}

/// JSON-file backend storing one document per graph
pub struct JsonFileStore {
    storage_dir: PathBuf,
    description: String,
}

impl JsonFileStore {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            description: "XReason Knowledge Graph".to_string(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let filename = if name.ends_with(".json") {
            name.to_string()
        } else {
            format!("{name}.json")
        };
        self.storage_dir.join(filename)
    }

    fn rebuild(document: GraphDocument) -> Result<KnowledgeGraph, StoreError> {
        let mut graph = KnowledgeGraph::new();
        for node in document.nodes {
            graph.add_node(node);
        }
        for stored in document.edges {
            graph.add_edge(stored.into_edge())?;
        }
        Ok(graph)
    }
}

#[async_trait]
impl GraphStore for JsonFileStore {
    async fn save(&self, graph: &KnowledgeGraph, name: Option<&str>) -> Result<String, StoreError> {
        tokio::fs::create_dir_all(&self.storage_dir).await?;

        let filename = match name {
            Some(name) if name.ends_with(".json") => name.to_string(),
            Some(name) => format!("{name}.json"),
            None => format!(
                "knowledge_graph_{}.json",
                Utc::now().format("%Y%m%d_%H%M%S")
            ),
        };
        let path = self.storage_dir.join(&filename);

        let document = GraphDocument::from_graph(graph, &self.description);
        let json = serde_json::to_string_pretty(&document)?;
        tokio::fs::write(&path, json).await?;

        info!(path = %path.display(), nodes = document.metadata.node_count, "graph saved");
        Ok(filename)
    }

    async fn load(&self, name: &str) -> Result<KnowledgeGraph, StoreError> {
        let path = self.resolve(name);
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let document: GraphDocument = serde_json::from_str(&data)?;
        let graph = Self::rebuild(document)?;
        info!(path = %path.display(), nodes = graph.node_count(), "graph loaded");
        Ok(graph)
    }

    async fn list(&self) -> Result<Vec<GraphSummary>, StoreError> {
        let mut summaries = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.storage_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(summaries),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = match tokio::fs::read_to_string(&path).await {
                Ok(data) => data,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable graph file");
                    continue;
                }
            };
            let document: GraphDocument = match serde_json::from_str(&data) {
                Ok(document) => document,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping malformed graph file");
                    continue;
                }
            };
            let size_bytes = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
            summaries.push(GraphSummary {
                filename: entry.file_name().to_string_lossy().into_owned(),
                path,
                created_at: Some(document.metadata.created_at),
                node_count: document.metadata.node_count,
                edge_count: document.metadata.edge_count,
                size_bytes,
                description: document.metadata.description,
            });
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let path = self.resolve(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "graph file deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "graph file not found");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Backend that never persists anything, for ephemeral deployments
#[derive(Debug, Default)]
pub struct NullStore;

#[async_trait]
impl GraphStore for NullStore {
    async fn save(&self, _graph: &KnowledgeGraph, name: Option<&str>) -> Result<String, StoreError> {
        Ok(name.unwrap_or("ephemeral").to_string())
    }

    async fn load(&self, name: &str) -> Result<KnowledgeGraph, StoreError> {
        Err(StoreError::NotFound(name.to_string()))
    }

    async fn list(&self) -> Result<Vec<GraphSummary>, StoreError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _name: &str) -> Result<bool, StoreError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xreason_core::{GraphEdge, GraphNode, NodeType};

    fn sample_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(
            GraphNode::new("hipaa", "HIPAA", NodeType::Regulation)
                .with_property("sector", serde_json::json!("healthcare")),
        );
        graph.add_node(GraphNode::new("phi", "PHI", NodeType::Concept));
        graph
            .add_edge(GraphEdge::new("hipaa", "phi", "protects").with_confidence(0.9))
            .unwrap();
        graph
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        let name = store.save(&sample_graph(), Some("roundtrip")).await.unwrap();
        assert_eq!(name, "roundtrip.json");

        let graph = store.load("roundtrip").await.unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let node = graph.node("hipaa").unwrap();
        assert_eq!(node.label, "HIPAA");
        assert_eq!(node.properties["sector"], "healthcare");
        let edge = graph.edge("hipaa->phi:protects").unwrap();
        assert_eq!(edge.confidence, 0.9);
    }

    #[tokio::test]
    async fn test_generated_filename() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let name = store.save(&sample_graph(), None).await.unwrap();
        assert!(name.starts_with("knowledge_graph_"));
        assert!(name.ends_with(".json"));
        assert!(store.load(&name).await.is_ok());
    }

    #[tokio::test]
    async fn test_load_missing_graph() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let err = store.load("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_skips_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save(&sample_graph(), Some("good")).await.unwrap();
        tokio::fs::write(dir.path().join("bad.json"), "{not json")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "ignored")
            .await
            .unwrap();

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].filename, "good.json");
        assert_eq!(summaries[0].node_count, 2);
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save(&sample_graph(), Some("doomed")).await.unwrap();
        assert!(store.delete("doomed").await.unwrap());
        assert!(!store.delete("doomed").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_on_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("never_created"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dangling_edge_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let doc = serde_json::json!({
            "metadata": {
                "created_at": "2024-01-15T00:00:00Z",
                "version": "1.0",
                "node_count": 1,
                "edge_count": 1,
                "description": "broken"
            },
            "nodes": [
                {"id": "a", "label": "A", "node_type": "concept", "properties": {}, "confidence": 1.0}
            ],
            "edges": [
                {"id": "a->ghost:links", "source": "a", "target": "ghost", "relationship": "links"}
            ]
        });
        tokio::fs::write(
            dir.path().join("broken.json"),
            serde_json::to_string(&doc).unwrap(),
        )
        .await
        .unwrap();

        let store = JsonFileStore::new(dir.path());
        let err = store.load("broken").await.unwrap_err();
        assert!(matches!(err, StoreError::Graph(_)));
    }
}
