//! File I/O for Unity asset sources.
//!
//! This module loads asset files from disk (optionally gzipped) for both the
//! document decoder and the graph extractor, and renders decoded documents
//! back to standard YAML for printing.

pub mod loader;
pub mod render;
