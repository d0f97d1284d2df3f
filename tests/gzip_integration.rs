use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use unityquill::commands::run_extract;
use unityquill::file::loader::{load_documents, read_source};
use unityquill::graph::PropertyCatalog;

const SCENE: &str = "%YAML 1.1
%TAG !u! tag:unity3d.com,2011:
--- !u!114 &21
MonoBehaviour:
  m_Name: Tree Spawner
  MinimumDistance: 1.25
";

/// Writes `contents` gzip-compressed to `name` inside `dir`.
fn write_gzipped(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let file = fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(contents.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

#[test]
fn test_read_gzipped_asset() {
    let dir = TempDir::new().unwrap();
    let path = write_gzipped(&dir, "Forest.unity.gz", SCENE);
    assert_eq!(read_source(&path).unwrap(), SCENE);
}

#[test]
fn test_decode_gzipped_asset() {
    let dir = TempDir::new().unwrap();
    let path = write_gzipped(&dir, "Forest.unity.gz", SCENE);

    let documents = load_documents(&path).unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].filename(), Some(path.as_path()));
}

#[test]
fn test_extract_from_gzipped_asset() {
    let dir = TempDir::new().unwrap();
    let path = write_gzipped(&dir, "Forest.unity.gz", SCENE);

    let mut out = Vec::new();
    run_extract("spawners", &path, None, &PropertyCatalog::default(), &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Tree Spawner (21):\n  MinimumDistance: 1.25\n\nTotal spawners found: 1\n"
    );
}

#[test]
fn test_corrupted_gzip_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Broken.asset.gz");
    fs::write(&path, b"plain text, not gzip").unwrap();

    let err = read_source(Path::new(&path)).unwrap_err();
    assert!(err.to_string().contains("corrupted"));
}
