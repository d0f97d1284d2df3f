//! The `decode` and `normalize` commands.

use crate::document::normalizer::normalize;
use crate::file::loader::{load_documents, open_source};
use crate::file::render::render_document;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Prints every document of `path` as standard YAML.
pub fn run_decode<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    for (index, document) in load_documents(path)?.iter().enumerate() {
        if index > 0 {
            writeln!(out, "---")?;
        }
        out.write_all(render_document(document)?.as_bytes())?;
    }
    Ok(())
}

/// Prints the normalized stream of `path`.
pub fn run_normalize<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    let normalized = normalize(open_source(path)?)
        .with_context(|| format!("Failed to normalize {}", path.display()))?;
    out.write_all(&normalized.stream)?;
    Ok(())
}
