//! Query-language operators backed by the graph extractor.
//!
//! Each operator takes the nodes currently matched by a query and produces
//! one mapping node per input. The asset text comes from the file the input
//! node was loaded from, or from the node's own scalar value when it has no
//! file, so the operators work both at a document root and on inline text.
//! Properties are captured with the caller's catalog, normally the one built
//! from configuration.

use super::extractor::{extract_nodes_with, GraphNode, PropertyCatalog};
use super::query::spawner_distance_properties;
use crate::document::node::{YamlNode, YamlValue};
use crate::file::loader::read_source;
use anyhow::{Context, Result};
use indexmap::IndexMap;

/// Maps every named node to its `FileID` and captured properties.
///
/// Nodes sharing a name collapse into one entry holding the last node's
/// fields.
pub fn graph_nodes_operator(
    context: &[YamlNode],
    catalog: &PropertyCatalog,
) -> Result<Vec<YamlNode>> {
    context
        .iter()
        .map(|candidate| {
            let nodes = extract_nodes_with(&source_text(candidate)?, catalog);
            let entries = nodes
                .iter()
                .map(|node| (node.name.clone(), node_fields(node)))
                .collect();
            Ok(YamlNode::new(YamlValue::Object(entries)))
        })
        .collect()
}

/// Maps every spawner label to its distance-like properties.
pub fn spawner_distances_operator(
    context: &[YamlNode],
    catalog: &PropertyCatalog,
) -> Result<Vec<YamlNode>> {
    context
        .iter()
        .map(|candidate| {
            let nodes = extract_nodes_with(&source_text(candidate)?, catalog);
            let entries = spawner_distance_properties(&nodes)
                .into_iter()
                .map(|(label, distances)| (label, string_map(distances)))
                .collect();
            Ok(YamlNode::new(YamlValue::Object(entries)))
        })
        .collect()
}

fn source_text(candidate: &YamlNode) -> Result<String> {
    if let Some(path) = candidate.filename() {
        return read_source(path)
            .with_context(|| format!("failed to read unity file {}", path.display()));
    }
    if candidate.value().is_scalar() {
        Ok(candidate.scalar_text().unwrap_or_default())
    } else {
        Ok(String::new())
    }
}

fn node_fields(node: &GraphNode) -> YamlNode {
    let mut fields = IndexMap::new();
    if let Some(id) = node.id {
        fields.insert("FileID".to_string(), YamlNode::plain_string(id.to_string()));
    }
    for (key, value) in &node.properties {
        fields.insert(key.clone(), YamlNode::plain_string(value.clone()));
    }
    YamlNode::new(YamlValue::Object(fields))
}

fn string_map(values: IndexMap<String, String>) -> YamlNode {
    let fields = values
        .into_iter()
        .map(|(key, value)| (key, YamlNode::plain_string(value)))
        .collect();
    YamlNode::new(YamlValue::Object(fields))
}
