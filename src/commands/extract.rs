//! The `extract` command: print graph data recovered from an asset file.

use crate::file::loader::read_source;
use crate::graph::extractor::{extract_nodes_with, PropertyCatalog};
use crate::graph::query::{property_value_counts, spawner_distance_properties};
use anyhow::Result;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Misuse of the command line, reported before any file is read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown extraction type: {0}")]
    UnknownKind(String),
    #[error("property extraction requires --property flag")]
    MissingProperty,
}

/// What to extract from the asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractKind {
    /// Spawner nodes with their distance-like properties
    Spawners,
    /// Every named node
    Nodes,
    /// All values of one property
    Property,
}

impl FromStr for ExtractKind {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spawners" => Ok(ExtractKind::Spawners),
            "nodes" => Ok(ExtractKind::Nodes),
            "property" => Ok(ExtractKind::Property),
            other => Err(CommandError::UnknownKind(other.to_string())),
        }
    }
}

/// A validated extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Spawners,
    Nodes,
    Property(String),
}

impl Extraction {
    /// Validates the kind and the `--property` flag together.
    pub fn parse(kind: &str, property: Option<&str>) -> Result<Self, CommandError> {
        match kind.parse::<ExtractKind>()? {
            ExtractKind::Spawners => Ok(Extraction::Spawners),
            ExtractKind::Nodes => Ok(Extraction::Nodes),
            ExtractKind::Property => match property {
                Some(name) if !name.is_empty() => Ok(Extraction::Property(name.to_string())),
                _ => Err(CommandError::MissingProperty),
            },
        }
    }

    /// Writes the extraction result for `content` to `out`.
    pub fn write_report<W: Write>(
        &self,
        content: &str,
        catalog: &PropertyCatalog,
        out: &mut W,
    ) -> Result<()> {
        match self {
            Extraction::Spawners => write_spawners(content, catalog, out),
            Extraction::Nodes => write_nodes(content, catalog, out),
            Extraction::Property(name) => write_property(content, name, out),
        }
    }
}

/// Runs `extract <kind> <file>`.
///
/// The request is validated before the file is touched, so a bad kind or a
/// missing `--property` fails without any I/O.
pub fn run_extract<W: Write>(
    kind: &str,
    path: &Path,
    property: Option<&str>,
    catalog: &PropertyCatalog,
    out: &mut W,
) -> Result<()> {
    let extraction = Extraction::parse(kind, property)?;
    let content = read_source(path)?;
    debug!(?extraction, path = %path.display(), bytes = content.len(), "extracting");
    extraction.write_report(&content, catalog, out)
}

fn write_spawners<W: Write>(content: &str, catalog: &PropertyCatalog, out: &mut W) -> Result<()> {
    let nodes = extract_nodes_with(content, catalog);
    let spawners = spawner_distance_properties(&nodes);

    for (label, properties) in &spawners {
        writeln!(out, "{}:", label)?;
        for (key, value) in properties {
            writeln!(out, "  {}: {}", key, value)?;
        }
        writeln!(out)?;
    }

    if spawners.is_empty() {
        writeln!(out, "No spawners with distance properties found")?;
    } else {
        writeln!(out, "Total spawners found: {}", spawners.len())?;
    }
    Ok(())
}

fn write_nodes<W: Write>(content: &str, catalog: &PropertyCatalog, out: &mut W) -> Result<()> {
    let nodes = extract_nodes_with(content, catalog);
    for node in &nodes {
        writeln!(out, "- {}", node.name)?;
    }
    writeln!(out, "\nTotal nodes: {}", nodes.len())?;
    Ok(())
}

fn write_property<W: Write>(content: &str, property: &str, out: &mut W) -> Result<()> {
    let counts = property_value_counts(content, property);
    if counts.is_empty() {
        writeln!(out, "Property '{}' not found", property)?;
        return Ok(());
    }

    writeln!(out, "Property '{}' values:", property)?;
    for (value, count) in &counts {
        writeln!(out, "  {}: {} occurrences", value, count)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert_eq!(Extraction::parse("nodes", None), Ok(Extraction::Nodes));
        assert_eq!(
            Extraction::parse("spawners", Some("ignored")),
            Ok(Extraction::Spawners)
        );
        assert_eq!(
            Extraction::parse("property", Some("Spacing")),
            Ok(Extraction::Property("Spacing".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_misuse() {
        assert_eq!(
            Extraction::parse("meshes", None),
            Err(CommandError::UnknownKind("meshes".to_string()))
        );
        assert_eq!(
            Extraction::parse("property", None),
            Err(CommandError::MissingProperty)
        );
        assert_eq!(
            Extraction::parse("property", Some("")),
            Err(CommandError::MissingProperty)
        );
    }

    #[test]
    fn test_report_nodes() {
        let mut out = Vec::new();
        Extraction::Nodes
            .write_report(
                "--- !u!1 &1\nm_Name: A\n--- !u!1 &2\nm_Name: B\n",
                &PropertyCatalog::default(),
                &mut out,
            )
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "- A\n- B\n\nTotal nodes: 2\n");
    }
}
