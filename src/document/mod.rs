//! Standard-YAML view over Unity asset files.
//!
//! The [`normalizer`] rewrites the dialect into YAML a standard engine
//! accepts, and the [`decoder`] runs `yaml-rust2` over the result to produce
//! one [`node::YamlNode`] per document.

pub mod decoder;
pub mod error;
pub mod node;
pub mod normalizer;

pub use decoder::DocumentDecoder;
pub use error::DecodeError;
pub use node::{YamlNode, YamlValue};
