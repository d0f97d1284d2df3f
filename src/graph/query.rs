//! Queries over extracted graph nodes and the raw asset text.

use super::extractor::{header_id, property_pattern, GraphNode, DOCUMENT_SEPARATOR};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Node names treated as spawners.
static SPAWNER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(spawner|pose.*set)").unwrap());

/// Lowercase key fragments that mark a property as distance-like.
pub const DISTANCE_KEYWORDS: &[&str] = &["distance", "extent", "spacing", "cell", "radius"];

/// Keeps the nodes whose name matches `pattern`, in input order.
pub fn filter_by_name<'a>(nodes: &'a [GraphNode], pattern: &Regex) -> Vec<&'a GraphNode> {
    nodes
        .iter()
        .filter(|node| pattern.is_match(&node.name))
        .collect()
}

/// Whether a property key contains one of [`DISTANCE_KEYWORDS`], ignoring case.
pub fn is_distance_key(key: &str) -> bool {
    let key = key.to_lowercase();
    DISTANCE_KEYWORDS.iter().any(|kw| key.contains(kw))
}

/// Distance-like properties of every spawner node, keyed by [`GraphNode::label`].
///
/// Spawners without a distance-like property are left out. When two nodes
/// share a label the later node's properties replace the earlier ones while
/// the entry keeps its original position.
pub fn spawner_distance_properties(
    nodes: &[GraphNode],
) -> IndexMap<String, IndexMap<String, String>> {
    let mut result = IndexMap::new();

    for node in filter_by_name(nodes, &SPAWNER_NAME) {
        let distances: IndexMap<String, String> = node
            .properties
            .iter()
            .filter(|(key, _)| is_distance_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        if !distances.is_empty() {
            result.insert(node.label(), distances);
        }
    }

    result
}

/// The first node carrying `id`.
pub fn find_by_id(nodes: &[GraphNode], id: i64) -> Option<&GraphNode> {
    nodes.iter().find(|node| node.id == Some(id))
}

/// Ids of the documents that reference `node` through `{fileID: <id>}`.
///
/// Every reference yields one entry, so a document referencing the node twice
/// appears twice. The enclosing document is found by plain substring search
/// for the nearest `---` before the reference; a `---` inside a value between
/// the header and the reference hides the real header.
pub fn referencing_document_ids(text: &str, node: &GraphNode) -> Vec<i64> {
    let Some(id) = node.id else {
        return Vec::new();
    };
    let Ok(reference) = Regex::new(&format!(r"\{{fileID:\s*{}\}}", id)) else {
        return Vec::new();
    };

    reference
        .find_iter(text)
        .filter_map(|found| {
            let doc_start = text[..found.start()].rfind(DOCUMENT_SEPARATOR)?;
            let after = doc_start + DOCUMENT_SEPARATOR.len();
            let doc_end = text[after..]
                .find(DOCUMENT_SEPARATOR)
                .map_or(text.len(), |next| after + next);
            header_id(&text[doc_start..doc_end])
        })
        .collect()
}

/// Counts the distinct values of `property` across the whole text.
///
/// Values are trimmed and ordered by first appearance. An empty map means the
/// property does not occur.
pub fn property_value_counts(text: &str, property: &str) -> IndexMap<String, usize> {
    let mut counts = IndexMap::new();
    for captures in property_pattern(property).captures_iter(text) {
        if let Some(value) = captures.get(1) {
            *counts.entry(value.as_str().trim().to_string()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_distance_key() {
        assert!(is_distance_key("GridCellSize"));
        assert!(is_distance_key("MinimumDistance"));
        assert!(is_distance_key("SpawnRADIUS"));
        assert!(!is_distance_key("Jittering"));
        assert!(!is_distance_key("EligibleForInjection"));
    }

    #[test]
    fn test_property_value_counts_orders_by_first_appearance() {
        let text = "Spacing: 2\nSpacing: 1\nSpacing: 2 \n";
        let counts = property_value_counts(text, "Spacing");
        assert_eq!(
            counts.into_iter().collect::<Vec<_>>(),
            vec![("2".to_string(), 2), ("1".to_string(), 1)]
        );
    }

    #[test]
    fn test_property_name_is_literal() {
        assert!(property_value_counts("a.b: 1\n", "a*b").is_empty());
        assert_eq!(property_value_counts("a.b: 1\n", "a.b")["1"], 1);
    }
}
