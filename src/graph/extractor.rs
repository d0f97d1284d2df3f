//! Pattern-based extraction of graph nodes from raw Unity asset text.
//!
//! The extractor never parses YAML. It splits the original text on the
//! literal `---` separator and runs a set of independent regular expressions
//! against every segment, because the identity it needs lives in the
//! `--- !u!<type> &<id>` headers that normalization throws away.
//!
//! # Example
//!
//! ```
//! use unityquill::graph::extractor::extract_nodes;
//!
//! let asset = "--- !u!114 &42\nMonoBehaviour:\n  m_Name: Grid Spawner\n  GridCellSize: 5\n";
//! let nodes = extract_nodes(asset);
//!
//! assert_eq!(nodes.len(), 1);
//! assert_eq!(nodes[0].id, Some(42));
//! assert_eq!(nodes[0].properties["GridCellSize"], "5");
//! ```

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// Literal token the extractor splits documents on.
pub const DOCUMENT_SEPARATOR: &str = "---";

/// Scalar properties captured from every document.
///
/// These are the fields Unity's spawner and pose-set graph nodes serialize
/// their placement parameters under.
pub const DEFAULT_PROPERTIES: &[&str] = &[
    "Extents",
    "GridCellSize",
    "MinimumDistance",
    "RoadPoseDistance",
    "Spacing",
    "Jittering",
    "EligibleForInjection",
];

static HEADER_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"!u!\d+\s*&(-?\d+)").unwrap());

static NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"m_Name:[ \t]*(.+)").unwrap());

static SCRIPT_GUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"m_Script:\s*\{fileID:\s*\d+,\s*guid:\s*([a-f0-9]+)").unwrap()
});

static PAYLOAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"serializedData:\s*'([^']*)'").unwrap());

static DEFAULT_CATALOG: Lazy<PropertyCatalog> = Lazy::new(PropertyCatalog::default);

/// One named node recovered from a document segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    /// The `&<id>` anchor from the document header.
    pub id: Option<i64>,
    pub name: String,
    /// GUID of the script referenced by `m_Script`.
    pub script_type: Option<String>,
    /// Raw text of every catalog property present in the document.
    pub properties: IndexMap<String, String>,
    /// Contents of a single-quoted `serializedData` field, never decoded.
    pub payload: Option<String>,
}

impl GraphNode {
    /// `"name (id)"`, with nothing between the parentheses when the id is unknown.
    pub fn label(&self) -> String {
        let id = self.id.map(|id| id.to_string()).unwrap_or_default();
        format!("{} ({})", self.name, id)
    }
}

/// The table of property names the extractor looks for.
#[derive(Debug, Clone)]
pub struct PropertyCatalog {
    entries: Vec<(String, Regex)>,
}

impl Default for PropertyCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_PROPERTIES.iter().copied())
    }
}

impl PropertyCatalog {
    /// Builds a catalog from property names; duplicates are ignored.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self {
            entries: Vec::new(),
        };
        catalog.extend(names);
        catalog
    }

    /// Adds property names to the catalog.
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || self.contains(name) {
                continue;
            }
            self.entries.push((name.to_string(), property_pattern(name)));
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn capture(&self, segment: &str) -> IndexMap<String, String> {
        self.entries
            .iter()
            .filter_map(|(name, pattern)| {
                let value = pattern.captures(segment)?.get(1)?.as_str().trim();
                Some((name.clone(), value.to_string()))
            })
            .collect()
    }
}

/// `<name>:` followed by its raw value.
pub(crate) fn property_pattern(name: &str) -> Regex {
    // An escaped literal always compiles.
    Regex::new(&format!(r"{}:\s*(.+)", regex::escape(name))).unwrap()
}

/// Extracts graph nodes using the default property catalog.
pub fn extract_nodes(text: &str) -> Vec<GraphNode> {
    extract_nodes_with(text, &DEFAULT_CATALOG)
}

/// Extracts graph nodes, capturing the properties named in `catalog`.
///
/// Segments without a usable `m_Name` are skipped. Every other field is
/// optional and matched independently.
pub fn extract_nodes_with(text: &str, catalog: &PropertyCatalog) -> Vec<GraphNode> {
    text.split(DOCUMENT_SEPARATOR)
        .filter(|segment| !segment.trim().is_empty())
        .filter_map(|segment| extract_segment(segment, catalog))
        .collect()
}

fn extract_segment(segment: &str, catalog: &PropertyCatalog) -> Option<GraphNode> {
    let name = first_capture(&NAME, segment).map(str::trim).unwrap_or("");
    if name.is_empty() {
        trace!("skipping segment without a name");
        return None;
    }

    Some(GraphNode {
        id: header_id(segment),
        name: name.to_string(),
        script_type: first_capture(&SCRIPT_GUID, segment).map(str::to_string),
        properties: catalog.capture(segment),
        payload: first_capture(&PAYLOAD, segment).map(str::to_string),
    })
}

/// The id from the first `!u!<type> &<id>` header in `text`.
pub(crate) fn header_id(text: &str) -> Option<i64> {
    first_capture(&HEADER_ID, text)?.parse().ok()
}

fn first_capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    Some(pattern.captures(text)?.get(1)?.as_str())
}
