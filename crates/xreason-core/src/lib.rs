//! # XReason Core
//!
//! Knowledge graph data models and structural reasoning.
//! Provides the typed node/edge model, the in-memory directed graph,
//! and the path/neighborhood algorithms the reasoning service builds on.

pub mod domain;
pub mod graph;
pub mod model;

pub use domain::seed_domain_knowledge;
pub use graph::{GraphError, KnowledgeGraph};
pub use model::{EdgeMatch, GraphEdge, GraphNode, NodeType};
