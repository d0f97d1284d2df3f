//! Node-graph view over raw Unity asset text.
//!
//! This path works on the original, un-normalized text. [`extractor`]
//! recovers one [`extractor::GraphNode`] per named document, [`query`] holds
//! the helpers that filter and cross-reference them, and [`operators`] wraps
//! both as query-language operators producing [`crate::document::YamlNode`]s.

pub mod extractor;
pub mod operators;
pub mod query;

pub use extractor::{extract_nodes, extract_nodes_with, GraphNode, PropertyCatalog};
pub use query::{
    filter_by_name, find_by_id, property_value_counts, referencing_document_ids,
    spawner_distance_properties,
};
