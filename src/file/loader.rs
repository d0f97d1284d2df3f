//! Asset file loading functionality.
//!
//! This module reads Unity asset files from disk, transparently decompressing
//! `.gz` files, either as raw text for the graph extractor or as a sequence of
//! decoded documents.

use crate::document::decoder::DocumentDecoder;
use crate::document::node::YamlNode;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Reads a whole asset file as text.
///
/// # Errors
///
/// This function will return an error if:
/// - The file path does not exist or cannot be read
/// - A `.gz` file is not valid gzip data
/// - The contents are not valid UTF-8
///
/// # Examples
///
/// ```no_run
/// use unityquill::file::loader::read_source;
///
/// let text = read_source("Assets/Spawners.asset").unwrap();
/// ```
pub fn read_source<P: AsRef<Path>>(path: P) -> Result<String> {
    let path_ref = path.as_ref();

    if is_gzipped(path_ref) {
        let mut content = String::new();
        GzDecoder::new(fs::File::open(path_ref).context("Failed to open gzipped file")?)
            .read_to_string(&mut content)
            .context("Failed to decompress gzipped file - file may be corrupted")?;
        Ok(content)
    } else {
        fs::read_to_string(path_ref).context("Failed to read file")
    }
}

/// Opens an asset file as a buffered reader, decompressing `.gz` files.
pub fn open_source<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path_ref = path.as_ref();
    let file = fs::File::open(path_ref)
        .with_context(|| format!("Failed to open {}", path_ref.display()))?;

    if is_gzipped(path_ref) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Decodes every document in an asset file.
///
/// Each returned node is tagged with the file name so that graph operators
/// applied to it read the original file.
pub fn load_documents<P: AsRef<Path>>(path: P) -> Result<Vec<YamlNode>> {
    let path_ref = path.as_ref();
    let mut decoder = DocumentDecoder::default();
    decoder
        .init(open_source(path_ref)?)
        .with_context(|| format!("Failed to read {}", path_ref.display()))?;

    let mut documents = Vec::new();
    for document in decoder {
        let node = document.with_context(|| format!("Failed to decode {}", path_ref.display()))?;
        documents.push(node.with_filename(path_ref));
    }
    debug!(count = documents.len(), path = %path_ref.display(), "loaded documents");
    Ok(documents)
}

/// Checks for a `.gz` extension.
fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_is_gzipped() {
        assert!(is_gzipped(Path::new("scene.asset.gz")));
        assert!(!is_gzipped(Path::new("scene.asset")));
    }

    #[test]
    fn test_read_gzipped_source() {
        let content = "MonoBehaviour:\n  m_Name: Rock\n";
        let temp_file = NamedTempFile::new().unwrap();
        let gz_path = temp_file.path().with_extension("asset.gz");

        let file = fs::File::create(&gz_path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_source(&gz_path).unwrap(), content);
        let _ = fs::remove_file(gz_path);
    }

    #[test]
    fn test_read_gzipped_source_corrupted() {
        let temp_file = NamedTempFile::new().unwrap();
        let gz_path = temp_file.path().with_extension("asset.gz");
        fs::write(&gz_path, b"not gzip data").unwrap();

        let err_msg = read_source(&gz_path).unwrap_err().to_string();
        assert!(err_msg.contains("decompress") || err_msg.contains("corrupted"));
        let _ = fs::remove_file(gz_path);
    }

    #[test]
    fn test_load_documents_tags_filename() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "a: 1\n---\nb: 2\n").unwrap();

        let documents = load_documents(temp_file.path()).unwrap();
        assert_eq!(documents.len(), 2);
        assert!(documents
            .iter()
            .all(|d| d.filename() == Some(temp_file.path())));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_source("/nonexistent/scene.asset").unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
