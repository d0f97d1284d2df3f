//! Rewrites Unity's YAML dialect into standard YAML.
//!
//! Unity asset files are almost YAML: they declare a vendor tag namespace,
//! put a type tag in front of every document anchor (`--- !u!114 &1234`),
//! and link documents with inline `{fileID: ...}` objects. A standard YAML
//! engine trips over exactly those constructs, so the normalizer makes one
//! forward pass over the input and rewrites them while copying everything
//! else through byte for byte.
//!
//! The pass is a two-state machine. While *scanning the header* every line
//! is classified from its first four bytes and handled individually. The
//! first line that is real document content switches the machine to *bulk
//! rewrite*: the remainder of the input is read in one go, the two inline
//! substitutions are applied if the Unity namespace was declared, and the
//! scan ends.
//!
//! # Example
//!
//! ```
//! use unityquill::document::normalizer::normalize;
//!
//! let asset = "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n--- !u!1 &100\nGameObject:\n  m_Script: {fileID: 0}\n";
//! let normalized = normalize(asset.as_bytes()).unwrap();
//!
//! assert!(normalized.dialect_detected);
//! assert_eq!(
//!     String::from_utf8(normalized.stream).unwrap(),
//!     "%YAML 1.1\n--- &100\nGameObject:\n  m_Script: null\n"
//! );
//! ```

use once_cell::sync::Lazy;
use regex::bytes::{NoExpand, Regex};
use std::borrow::Cow;
use std::io::{self, BufRead};
use tracing::{debug, trace};

/// Tag prefix that marks a stream as Unity YAML.
pub const UNITY_TAG_NAMESPACE: &str = "tag:unity3d.com,2011:";

/// Separator token written in place of document breaks that the decoder
/// must turn back into real `---` lines.
pub const DOC_SEPARATOR_PLACEHOLDER: &str = "$docSeparator$";

/// Number of bytes inspected to classify the upcoming line.
const LOOKAHEAD: usize = 4;

static CROSS_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{fileID:\s*-?\d+(?:,\s*guid:\s*[a-f0-9]+,\s*type:\s*\d+)?\}").unwrap()
});

static INLINE_TYPE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"!u!\d+").unwrap());

static PLACEHOLDER_LINE: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(&format!(
        r"(?m)^{}( .*|\r)?$",
        regex::escape(DOC_SEPARATOR_PLACEHOLDER)
    ))
    .unwrap()
});

/// Result of one normalization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSource {
    /// Standard YAML, with header document breaks replaced by the placeholder.
    pub stream: Vec<u8>,
    /// Blank, comment, directive and separator lines seen before the first
    /// content line, in their original form.
    pub leading_content: String,
    /// Whether the Unity tag namespace was declared.
    pub dialect_detected: bool,
    /// Whether a separator or content line was seen at all.
    pub body_started: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    ScanningHeader,
    BulkRewrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Blank,
    TagDirective,
    TypedSeparator,
    BareSeparator,
    CommentOrDirective,
    Content,
}

impl LineClass {
    /// Classifies a line, most specific rule first.
    fn of(line: &[u8]) -> Self {
        let peek = &line[..line.len().min(LOOKAHEAD)];

        if peek.starts_with(b"\n") || peek.starts_with(b"\r\n") {
            LineClass::Blank
        } else if starts_after_whitespace(peek, b"%TAG") {
            LineClass::TagDirective
        } else if peek == b"--- " {
            LineClass::TypedSeparator
        } else if strip_line_ending(line) == b"---" {
            LineClass::BareSeparator
        } else if starts_after_whitespace(peek, b"#") || starts_after_whitespace(peek, b"%YA") {
            LineClass::CommentOrDirective
        } else {
            LineClass::Content
        }
    }
}

fn starts_after_whitespace(peek: &[u8], token: &[u8]) -> bool {
    let start = peek
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(peek.len());
    peek[start..].starts_with(token)
}

fn line_ending(line: &[u8]) -> &'static [u8] {
    if line.ends_with(b"\r\n") {
        b"\r\n"
    } else if line.ends_with(b"\n") {
        b"\n"
    } else {
        b""
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    &line[..line.len() - line_ending(line).len()]
}

/// The `&<id>` anchor token on a typed separator line, without the `&`.
fn anchor_token(line: &[u8]) -> Option<&[u8]> {
    let amp = line.iter().position(|&b| b == b'&')?;
    let rest = &line[amp + 1..];
    let end = rest
        .iter()
        .position(|b| b.is_ascii_whitespace())
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

/// Single-pass dialect rewriter over a buffered reader.
pub struct DialectNormalizer<R> {
    reader: R,
    state: ScanState,
    dialect: bool,
    body_started: bool,
    stream: Vec<u8>,
    header: Vec<u8>,
}

impl<R: BufRead> DialectNormalizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            state: ScanState::ScanningHeader,
            dialect: false,
            body_started: false,
            stream: Vec::new(),
            header: Vec::new(),
        }
    }

    /// Consumes the reader and returns the normalized source.
    ///
    /// End of input finalizes whatever has been accumulated; any other read
    /// error aborts the pass.
    pub fn run(mut self) -> io::Result<NormalizedSource> {
        let mut line = Vec::new();
        while self.state == ScanState::ScanningHeader {
            line.clear();
            if self.reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            self.step(&line)?;
        }

        Ok(NormalizedSource {
            stream: self.stream,
            leading_content: String::from_utf8_lossy(&self.header).into_owned(),
            dialect_detected: self.dialect,
            body_started: self.body_started,
        })
    }

    fn step(&mut self, line: &[u8]) -> io::Result<()> {
        let class = LineClass::of(line);
        trace!(?class, "classified header line");

        match class {
            LineClass::Blank | LineClass::CommentOrDirective => {
                self.header.extend_from_slice(line);
                self.stream.extend_from_slice(line);
            }
            LineClass::TagDirective => {
                self.header.extend_from_slice(line);
                if contains(line, UNITY_TAG_NAMESPACE.as_bytes()) {
                    debug!("unity tag directive detected");
                    self.dialect = true;
                } else {
                    self.stream.extend_from_slice(line);
                }
            }
            LineClass::TypedSeparator if self.dialect => {
                self.body_started = true;
                self.header.extend_from_slice(line);
                self.stream.extend_from_slice(b"---");
                if let Some(anchor) = anchor_token(line) {
                    self.stream.extend_from_slice(b" &");
                    self.stream.extend_from_slice(anchor);
                }
                self.stream.extend_from_slice(line_ending(line));
            }
            LineClass::TypedSeparator => {
                // Only the `--- ` marker is replaced; the rest of the line
                // belongs to the document.
                self.body_started = true;
                let tail = &line[LOOKAHEAD..];
                for out in [&mut self.header, &mut self.stream] {
                    out.extend_from_slice(DOC_SEPARATOR_PLACEHOLDER.as_bytes());
                    out.push(b' ');
                    out.extend_from_slice(tail);
                }
            }
            LineClass::BareSeparator => {
                self.body_started = true;
                let ending = line_ending(line);
                for out in [&mut self.header, &mut self.stream] {
                    out.extend_from_slice(DOC_SEPARATOR_PLACEHOLDER.as_bytes());
                    out.extend_from_slice(ending);
                }
            }
            LineClass::Content => {
                self.body_started = true;
                let mut rest = line.to_vec();
                self.reader.read_to_end(&mut rest)?;
                debug!(bytes = rest.len(), dialect = self.dialect, "bulk rewrite");

                if self.dialect {
                    let rest = rewrite_inline_dialect(&rest);
                    self.stream.extend_from_slice(&rest);
                } else {
                    self.stream.extend_from_slice(&rest);
                }
                self.state = ScanState::BulkRewrite;
            }
        }
        Ok(())
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Nulls out inline cross-references and strips inline type tags.
fn rewrite_inline_dialect(body: &[u8]) -> Vec<u8> {
    let without_refs = CROSS_REFERENCE.replace_all(body, NoExpand(b"null"));
    INLINE_TYPE_TAG
        .replace_all(&without_refs, NoExpand(b""))
        .into_owned()
}

/// Runs a normalization pass over `reader`.
pub fn normalize<R: BufRead>(reader: R) -> io::Result<NormalizedSource> {
    DialectNormalizer::new(reader).run()
}

/// Turns placeholder separator lines back into `---` lines, keeping any
/// content that followed the separator.
pub fn restore_separators(text: &str) -> Cow<'_, str> {
    PLACEHOLDER_LINE.replace_all(text, "---${1}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_lines() {
        assert_eq!(LineClass::of(b"\n"), LineClass::Blank);
        assert_eq!(LineClass::of(b"\r\n"), LineClass::Blank);
        assert_eq!(LineClass::of(b"%TAG !u! x\n"), LineClass::TagDirective);
        assert_eq!(LineClass::of(b"--- !u!1 &2\n"), LineClass::TypedSeparator);
        assert_eq!(LineClass::of(b"---\n"), LineClass::BareSeparator);
        assert_eq!(LineClass::of(b"---\r\n"), LineClass::BareSeparator);
        assert_eq!(LineClass::of(b"---"), LineClass::BareSeparator);
        assert_eq!(LineClass::of(b"  # note\n"), LineClass::CommentOrDirective);
        assert_eq!(LineClass::of(b"%YAML 1.1\n"), LineClass::CommentOrDirective);
        assert_eq!(LineClass::of(b"key: value\n"), LineClass::Content);
        assert_eq!(LineClass::of(b"----\n"), LineClass::Content);
    }

    #[test]
    fn test_comment_beyond_lookahead_is_content() {
        assert_eq!(LineClass::of(b"    # deep\n"), LineClass::Content);
    }

    #[test]
    fn test_anchor_token() {
        assert_eq!(anchor_token(b"--- !u!114 &-867\n"), Some(&b"-867"[..]));
        assert_eq!(anchor_token(b"--- !u!1001 &42 stripped\n"), Some(&b"42"[..]));
        assert_eq!(anchor_token(b"--- !u!1\n"), None);
        assert_eq!(anchor_token(b"--- & \n"), None);
    }

    #[test]
    fn test_rewrite_inline_dialect() {
        let body = b"a: {fileID: 0}\nb: {fileID: -12, guid: 0af3, type: 2}\nc: !u!4 x\n";
        assert_eq!(
            rewrite_inline_dialect(body),
            b"a: null\nb: null\nc:  x\n".to_vec()
        );
    }

    #[test]
    fn test_restore_separators() {
        let text = "$docSeparator$\na: 1\n$docSeparator$\r\nb: $docSeparator$\n";
        assert_eq!(
            restore_separators(text),
            "---\na: 1\n---\r\nb: $docSeparator$\n"
        );
    }

    #[test]
    fn test_restore_separators_keeps_tail() {
        let text = "$docSeparator$ |\r\n  x\n$docSeparator$ {a: 1}\n$docSeparator$x\n";
        assert_eq!(
            restore_separators(text),
            "--- |\r\n  x\n--- {a: 1}\n$docSeparator$x\n"
        );
    }

    #[test]
    fn test_short_input_is_not_dropped() {
        let normalized = normalize(&b"a:"[..]).unwrap();
        assert_eq!(normalized.stream, b"a:".to_vec());
        assert!(normalized.body_started);
    }
}
