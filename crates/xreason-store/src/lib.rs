//! # XReason Store
//!
//! Persistence backends for knowledge graphs. The JSON file backend
//! writes one self-describing document per graph; loading validates
//! every edge endpoint against the restored node set.

pub mod document;
pub mod store;

pub use document::{DocumentMetadata, GraphDocument, StoredEdge, FORMAT_VERSION};
pub use store::{GraphStore, GraphSummary, JsonFileStore, NullStore, StoreError};
