//! Command implementations behind the `unityquill` binary.
//!
//! Commands write to any `io::Write` so they can be driven from tests.

pub mod decode;
pub mod extract;

pub use decode::{run_decode, run_normalize};
pub use extract::{run_extract, CommandError, ExtractKind, Extraction};
