//! Document decoder over normalized Unity YAML.
//!
//! A session starts with [`DocumentDecoder::init`], which runs the
//! normalizer once and feeds the result to the `yaml-rust2` event parser.
//! Every call to [`DocumentDecoder::decode_next`] then converts exactly one
//! document's events into a [`YamlNode`], so an engine error is only
//! surfaced when the caller reaches the document that caused it.
//!
//! Anchors are tracked for the whole session: an alias resolves to a copy of
//! the anchored node, even when the anchor lives in an earlier document. The
//! engine forgets anchor names at every document start, so before decoding,
//! each alias it rejects that names an anchor declared in an earlier
//! document is rewritten into a plain placeholder scalar pointing at that
//! declaration.
//!
//! # Example
//!
//! ```
//! use unityquill::document::decoder::DocumentDecoder;
//!
//! let mut decoder = DocumentDecoder::default();
//! decoder.init("a: 1\n---\nb: 2\n".as_bytes()).unwrap();
//!
//! let documents: Vec<_> = decoder.collect::<Result<_, _>>().unwrap();
//! assert_eq!(documents.len(), 2);
//! assert_eq!(documents[1].document_index(), 1);
//! ```

use super::error::DecodeError;
use super::node::{SourcePosition, YamlNode, YamlNumber, YamlString, YamlValue};
use super::normalizer::{normalize, restore_separators};
use crate::file::render::node_to_serde_value;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::BufRead;
use tracing::{debug, trace, warn};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, ScanError, TScalarStyle};

/// Prefix of the placeholder scalar standing in for an alias to an earlier
/// document. The suffix is the char offset of the anchor declaration.
const SESSION_ALIAS_PREFIX: &str = "$docAlias$";

/// Collects engine events so documents can be converted one at a time.
#[derive(Default)]
struct EventBuffer {
    events: VecDeque<(Event, Marker)>,
}

impl MarkedEventReceiver for EventBuffer {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        self.events.push_back((ev, mark));
    }
}

/// Decoder session state for one source.
#[derive(Debug, Default)]
pub struct DocumentDecoder {
    events: VecDeque<(Event, Marker)>,
    pending_error: Option<ScanError>,
    anchors: HashMap<usize, YamlNode>,
    /// Anchored nodes keyed by the char offset of their engine marker.
    session_anchors: BTreeMap<usize, YamlNode>,
    leading_content: String,
    read_anything: bool,
    document_index: usize,
    finished: bool,
}

impl DocumentDecoder {
    /// Starts a new session over `reader`, discarding any previous state.
    ///
    /// Only read failures are reported here; YAML errors are deferred to the
    /// `decode_next` call that reaches them.
    pub fn init<R: BufRead>(&mut self, reader: R) -> Result<(), DecodeError> {
        let source = normalize(reader)?;

        self.events.clear();
        self.pending_error = None;
        self.anchors.clear();
        self.session_anchors.clear();
        self.leading_content = source.leading_content;
        self.read_anything = false;
        self.document_index = 0;
        self.finished = false;

        // A header-only stream has no document for the engine to find.
        if source.body_started {
            let text = String::from_utf8(source.stream)?;
            let mut text = restore_separators(&text).into_owned();
            let (events, error) = parse_session(&mut text);
            self.events = events;
            self.pending_error = error;
        }

        debug!(
            events = self.events.len(),
            dialect = source.dialect_detected,
            leading = !self.leading_content.is_empty(),
            "decoder session initialized"
        );
        Ok(())
    }

    /// Returns the next document, `Ok(None)` once the session is exhausted.
    ///
    /// The first error ends the session; later calls return `Ok(None)`.
    pub fn decode_next(&mut self) -> Result<Option<YamlNode>, DecodeError> {
        if self.finished {
            return Ok(None);
        }

        let document = match self.next_document() {
            Ok(document) => document,
            Err(err) => {
                self.finished = true;
                return Err(err);
            }
        };

        let Some(mut node) = document else {
            if !self.leading_content.is_empty() && !self.read_anything {
                self.read_anything = true;
                return Ok(Some(self.blank_node_with_comment()));
            }
            self.finished = true;
            return Ok(None);
        };

        if !self.leading_content.is_empty() {
            node.leading_content = Some(std::mem::take(&mut self.leading_content));
        }
        trace!(index = self.document_index, "decoded document");
        self.read_anything = true;
        self.document_index += 1;
        Ok(Some(node))
    }

    fn blank_node_with_comment(&mut self) -> YamlNode {
        let mut node = YamlNode::plain_string("");
        node.document_index = self.document_index;
        node.leading_content = Some(std::mem::take(&mut self.leading_content));
        node
    }

    fn next_event(&mut self) -> Result<Option<(Event, Marker)>, DecodeError> {
        match self.events.pop_front() {
            Some(event) => Ok(Some(event)),
            None => match self.pending_error.take() {
                Some(err) => Err(err.into()),
                None => Ok(None),
            },
        }
    }

    fn expect_event(&mut self) -> Result<(Event, Marker), DecodeError> {
        self.next_event()?.ok_or(DecodeError::UnexpectedEnd)
    }

    fn next_document(&mut self) -> Result<Option<YamlNode>, DecodeError> {
        loop {
            match self.next_event()? {
                None | Some((Event::StreamEnd, _)) => return Ok(None),
                Some((Event::DocumentStart { .. }, _)) => {
                    let root_event = self.expect_event()?;
                    let root = self.build_node(root_event)?;
                    match self.next_event()? {
                        Some((Event::DocumentEnd, _)) | None => {}
                        Some((other, mark)) => {
                            warn!(?other, line = mark.line(), "expected end of document")
                        }
                    }
                    return Ok(Some(root));
                }
                Some(_) => continue,
            }
        }
    }

    fn build_node(&mut self, (event, mark): (Event, Marker)) -> Result<YamlNode, DecodeError> {
        let position = Some(SourcePosition {
            line: mark.line(),
            col: mark.col(),
        });

        let (value, anchor) = match event {
            Event::Scalar(text, style, anchor, tag, ..) => {
                if let Some(declared_at) = session_alias_target(&text, style, tag.as_ref()) {
                    if let Some(anchored) = self.session_anchors.range(declared_at..).next() {
                        return Ok(anchored.1.clone());
                    }
                    warn!(line = mark.line(), "alias placeholder without an anchored node");
                }
                (resolve_scalar(text, style, tag.as_ref()), anchor)
            }
            Event::SequenceStart(anchor, ..) => {
                let mut items = Vec::new();
                loop {
                    let next = self.expect_event()?;
                    if matches!(next.0, Event::SequenceEnd) {
                        break;
                    }
                    items.push(self.build_node(next)?);
                }
                (YamlValue::Array(items), anchor)
            }
            Event::MappingStart(anchor, ..) => {
                let mut entries = IndexMap::new();
                loop {
                    let next = self.expect_event()?;
                    if matches!(next.0, Event::MappingEnd) {
                        break;
                    }
                    let key = self.build_node(next)?;
                    let value_event = self.expect_event()?;
                    let value = self.build_node(value_event)?;
                    entries.insert(key_text(&key), value);
                }
                (YamlValue::Object(entries), anchor)
            }
            Event::Alias(id) => {
                if let Some(anchored) = self.anchors.get(&id) {
                    return Ok(anchored.clone());
                }
                warn!(id, line = mark.line(), "alias to unknown anchor");
                let mut node = YamlNode::new(YamlValue::Alias(id));
                node.document_index = self.document_index;
                node.position = position;
                return Ok(node);
            }
            _ => return Err(DecodeError::UnexpectedEnd),
        };

        let node = YamlNode {
            value,
            anchor: (anchor != 0).then_some(anchor),
            document_index: self.document_index,
            leading_content: None,
            position,
            filename: None,
        };
        if anchor != 0 {
            self.anchors.insert(anchor, node.clone());
            self.session_anchors.insert(mark.index(), node.clone());
        }
        Ok(node)
    }
}

impl Iterator for DocumentDecoder {
    type Item = Result<YamlNode, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decode_next().transpose()
    }
}

/// Runs the engine over `text`, rewriting every rejected alias that names an
/// anchor from an earlier document and parsing again, until the engine either
/// succeeds or fails for another reason.
fn parse_session(text: &mut String) -> (VecDeque<(Event, Marker)>, Option<ScanError>) {
    loop {
        let mut buffer = EventBuffer::default();
        let result = Parser::new_from_str(text.as_str()).load(&mut buffer, true);
        let Err(err) = result else {
            return (buffer.events, None);
        };

        if rewrite_session_alias(text, &buffer.events, err.marker()) {
            trace!(line = err.marker().line(), "alias rewritten to an earlier document");
            continue;
        }
        debug!(%err, "engine stopped early");
        return (buffer.events, Some(err));
    }
}

/// Replaces the alias at `at` with a placeholder scalar when its anchor is
/// declared before the current document. Returns whether `text` changed.
fn rewrite_session_alias(
    text: &mut String,
    events: &VecDeque<(Event, Marker)>,
    at: &Marker,
) -> bool {
    let Some(alias_start) = byte_offset(text, at.index()) else {
        return false;
    };
    let Some(name) = text[alias_start..].strip_prefix('*').map(alias_name) else {
        return false;
    };
    if name.is_empty() {
        return false;
    }

    // The current document starts at the last document start before the error.
    let Some(document_start) = events
        .iter()
        .rev()
        .find(|(event, _)| matches!(event, Event::DocumentStart { .. }))
        .and_then(|(_, mark)| byte_offset(text, mark.index()))
    else {
        return false;
    };
    let Some(declaration) = last_declaration(&text[..document_start], name) else {
        return false;
    };

    let declared_at = text[..declaration].chars().count();
    let alias_end = alias_start + 1 + name.len();
    text.replace_range(
        alias_start..alias_end,
        &format!("{}{}", SESSION_ALIAS_PREFIX, declared_at),
    );
    true
}

fn byte_offset(text: &str, char_index: usize) -> Option<usize> {
    text.char_indices().nth(char_index).map(|(offset, _)| offset)
}

fn alias_name(after_star: &str) -> &str {
    let end = after_star.find(ends_token).unwrap_or(after_star.len());
    &after_star[..end]
}

fn ends_token(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// Byte offset of the last `&<name>` anchor token in `haystack`.
fn last_declaration(haystack: &str, name: &str) -> Option<usize> {
    let token = format!("&{}", name);
    haystack
        .rmatch_indices(token.as_str())
        .map(|(at, _)| at)
        .find(|&at| {
            let before = haystack[..at].chars().next_back();
            let after = haystack[at + token.len()..].chars().next();
            before.map_or(true, ends_token) && after.map_or(true, ends_token)
        })
}

/// The declaration offset carried by an alias placeholder scalar.
fn session_alias_target(text: &str, style: TScalarStyle, tag: Option<&Tag>) -> Option<usize> {
    if tag.is_some() || !matches!(style, TScalarStyle::Plain) {
        return None;
    }
    text.strip_prefix(SESSION_ALIAS_PREFIX)?.parse().ok()
}

fn key_text(key: &YamlNode) -> String {
    key.scalar_text().unwrap_or_else(|| {
        serde_yaml::to_string(&node_to_serde_value(key.value()))
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default()
    })
}

fn resolve_scalar(text: String, style: TScalarStyle, tag: Option<&Tag>) -> YamlValue {
    if tag.is_some_and(|t| t.suffix == "str") {
        return YamlValue::String(YamlString::Quoted(text));
    }
    match style {
        TScalarStyle::Plain => resolve_plain(text),
        TScalarStyle::SingleQuoted | TScalarStyle::DoubleQuoted => {
            YamlValue::String(YamlString::Quoted(text))
        }
        TScalarStyle::Literal => YamlValue::String(YamlString::Literal(text)),
        _ => YamlValue::String(YamlString::Folded(text)),
    }
}

/// Applies the YAML core schema to a plain scalar.
fn resolve_plain(text: String) -> YamlValue {
    match text.as_str() {
        "" | "~" | "null" | "Null" | "NULL" => return YamlValue::Null,
        "true" | "True" | "TRUE" => return YamlValue::Boolean(true),
        "false" | "False" | "FALSE" => return YamlValue::Boolean(false),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return YamlValue::Number(YamlNumber::Float(f64::INFINITY))
        }
        "-.inf" | "-.Inf" | "-.INF" => {
            return YamlValue::Number(YamlNumber::Float(f64::NEG_INFINITY))
        }
        ".nan" | ".NaN" | ".NAN" => return YamlValue::Number(YamlNumber::Float(f64::NAN)),
        _ => {}
    }

    if let Some(i) = parse_integer(&text) {
        return YamlValue::Number(YamlNumber::Integer(i));
    }
    if looks_numeric(&text) {
        if let Ok(f) = text.parse::<f64>() {
            return YamlValue::Number(YamlNumber::Float(f));
        }
    }
    YamlValue::String(YamlString::Plain(text))
}

fn parse_integer(text: &str) -> Option<i64> {
    if let Some(hex) = text.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = text.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else {
        text.parse::<i64>().ok()
    }
}

fn looks_numeric(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(source: &str) -> Vec<YamlNode> {
        let mut decoder = DocumentDecoder::default();
        decoder.init(source.as_bytes()).unwrap();
        decoder.collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_resolve_plain_scalars() {
        assert_eq!(resolve_plain("~".to_string()), YamlValue::Null);
        assert_eq!(resolve_plain("True".to_string()), YamlValue::Boolean(true));
        assert_eq!(
            resolve_plain("-42".to_string()),
            YamlValue::Number(YamlNumber::Integer(-42))
        );
        assert_eq!(
            resolve_plain("0x1F".to_string()),
            YamlValue::Number(YamlNumber::Integer(31))
        );
        assert_eq!(
            resolve_plain("0.25".to_string()),
            YamlValue::Number(YamlNumber::Float(0.25))
        );
        assert_eq!(
            resolve_plain("nan".to_string()),
            YamlValue::String(YamlString::Plain("nan".to_string()))
        );
        assert_eq!(
            resolve_plain("1.2.3".to_string()),
            YamlValue::String(YamlString::Plain("1.2.3".to_string()))
        );
    }

    #[test]
    fn test_quoted_scalar_stays_string() {
        let docs = decode_all("a: '12'\n");
        match docs[0].value() {
            YamlValue::Object(map) => assert_eq!(
                map["a"].value(),
                &YamlValue::String(YamlString::Quoted("12".to_string()))
            ),
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_positions_are_recorded() {
        let docs = decode_all("first: 1\nsecond: 2\n");
        let YamlValue::Object(map) = docs[0].value() else {
            panic!("Expected object");
        };
        let first = map["first"].position().unwrap();
        let second = map["second"].position().unwrap();
        assert_eq!(second.line, first.line + 1);
    }

    #[test]
    fn test_last_declaration_respects_token_boundaries() {
        let text = "a: &xy 1\nb: '&x'\nc: &x 2\nd: &x\n";
        assert_eq!(last_declaration(text, "x"), Some(text.rfind("&x").unwrap()));
        assert_eq!(last_declaration("a: &xy 1\n", "x"), None);
        assert_eq!(last_declaration("a: [&x 1]", "x"), Some(4));
    }

    #[test]
    fn test_alias_name_stops_at_flow_indicators() {
        assert_eq!(alias_name("ref, b]"), "ref");
        assert_eq!(alias_name("ref\n"), "ref");
        assert_eq!(alias_name(""), "");
    }

    #[test]
    fn test_rewrite_points_at_earlier_declaration() {
        let mut text = "a: &x 1\n---\nb: *x\n".to_string();
        let (events, error) = parse_session(&mut text);
        assert!(error.is_none());
        assert!(!events.is_empty());
        assert_eq!(text, "a: &x 1\n---\nb: $docAlias$3\n");
    }

    #[test]
    fn test_unknown_alias_is_still_an_error() {
        let mut text = "a: 1\n---\nb: *missing\n".to_string();
        let (_, error) = parse_session(&mut text);
        assert!(error.is_some());
        assert_eq!(text, "a: 1\n---\nb: *missing\n");
    }

    #[test]
    fn test_uninitialized_decoder_is_exhausted() {
        let mut decoder = DocumentDecoder::default();
        assert!(decoder.decode_next().unwrap().is_none());
    }
}
