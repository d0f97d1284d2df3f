//! Error types for normalizing and decoding Unity YAML sources.

use yaml_rust2::scanner::ScanError;

/// Errors that end a decoder session.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Reading the underlying source failed.
    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),
    /// The normalized stream is not UTF-8 text.
    #[error("source is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// The YAML engine rejected the normalized stream.
    #[error("YAML parse error: {0}")]
    Parse(#[from] ScanError),
    /// The engine stopped in the middle of a document without reporting why.
    #[error("unexpected end of YAML event stream")]
    UnexpectedEnd,
}
