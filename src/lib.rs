//! UnityQuill - normalize and query Unity YAML asset files.
//!
//! Two independent views over the same asset text:
//!
//! - [`document`]: rewrites Unity's YAML dialect into standard YAML and
//!   decodes it document by document.
//! - [`graph`]: pattern-matches the raw text to recover named nodes, their
//!   properties and the references between them.

pub mod commands;
pub mod config;
pub mod document;
pub mod file;
pub mod graph;
