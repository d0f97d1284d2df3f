//! YAML node representation produced by the document decoder.
//!
//! Each decoded YAML value is wrapped in a `YamlNode` that carries the
//! bookkeeping the decoder threads through a session: the engine anchor id,
//! the index of the document it came from, any leading header content that
//! preceded the first document, and the position of the node in the
//! normalized source.
//!
//! # Example
//!
//! ```
//! use unityquill::document::node::{YamlNode, YamlValue, YamlString, YamlNumber};
//! use indexmap::IndexMap;
//!
//! let mut map = IndexMap::new();
//! map.insert("m_Name".to_string(), YamlNode::new(YamlValue::String(YamlString::Plain("Rock".to_string()))));
//! map.insert("m_Layer".to_string(), YamlNode::new(YamlValue::Number(YamlNumber::Integer(0))));
//! let object = YamlNode::new(YamlValue::Object(map));
//!
//! assert!(object.value().is_object());
//! assert_eq!(object.document_index(), 0);
//! ```

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Line and column of a node in the normalized source, as reported by the
/// YAML engine marker.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub struct SourcePosition {
    pub line: usize,
    pub col: usize,
}

/// Represents different YAML string styles
#[derive(Debug, Clone, PartialEq)]
pub enum YamlString {
    Plain(String),
    Quoted(String),
    Literal(String),
    Folded(String),
}

impl std::fmt::Display for YamlString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl YamlString {
    pub fn as_str(&self) -> &str {
        match self {
            YamlString::Plain(s)
            | YamlString::Quoted(s)
            | YamlString::Literal(s)
            | YamlString::Folded(s) => s,
        }
    }
}

/// Represents YAML numbers (integer or float)
#[derive(Debug, Clone, PartialEq)]
pub enum YamlNumber {
    Integer(i64),
    Float(f64),
}

impl std::fmt::Display for YamlNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            YamlNumber::Integer(i) => write!(f, "{}", i),
            YamlNumber::Float(fl) => write!(f, "{}", fl),
        }
    }
}

/// A YAML value without session metadata.
///
/// Objects and arrays contain `YamlNode` instances so that anchors, positions
/// and document indices survive throughout the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum YamlValue {
    /// A YAML mapping with insertion-ordered keys
    Object(IndexMap<String, YamlNode>),
    /// A YAML sequence
    Array(Vec<YamlNode>),
    /// A YAML string with style information
    String(YamlString),
    /// A YAML number (integer or float)
    Number(YamlNumber),
    /// A YAML boolean
    Boolean(bool),
    /// A YAML null value
    Null,
    /// An alias whose anchor was never seen in this session
    Alias(usize),
}

impl YamlValue {
    pub fn is_object(&self) -> bool {
        matches!(self, YamlValue::Object(_))
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, YamlValue::Object(_) | YamlValue::Array(_))
    }
}

/// A YAML value wrapped with decoder session metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlNode {
    pub(crate) value: YamlValue,
    pub(crate) anchor: Option<usize>,
    pub(crate) document_index: usize,
    pub(crate) leading_content: Option<String>,
    pub(crate) position: Option<SourcePosition>,
    pub(crate) filename: Option<PathBuf>,
}

impl YamlNode {
    /// Creates a new node with no anchor, position or leading content.
    ///
    /// # Example
    ///
    /// ```
    /// use unityquill::document::node::{YamlNode, YamlValue};
    ///
    /// let node = YamlNode::new(YamlValue::Null);
    /// assert!(node.anchor().is_none());
    /// ```
    pub fn new(value: YamlValue) -> Self {
        Self {
            value,
            anchor: None,
            document_index: 0,
            leading_content: None,
            position: None,
            filename: None,
        }
    }

    /// Creates a plain string scalar node.
    pub fn plain_string(text: impl Into<String>) -> Self {
        Self::new(YamlValue::String(YamlString::Plain(text.into())))
    }

    /// Attaches the path of the file this node was read from.
    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Returns an immutable reference to the node's value.
    pub fn value(&self) -> &YamlValue {
        &self.value
    }

    /// Returns the engine anchor id if this node was anchored.
    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    /// Index of the document this node belongs to within its session.
    pub fn document_index(&self) -> usize {
        self.document_index
    }

    /// Header content (comments, directives, separators) that preceded the
    /// first document, attached to the first node a session produces.
    pub fn leading_content(&self) -> Option<&str> {
        self.leading_content.as_deref()
    }

    pub fn position(&self) -> Option<SourcePosition> {
        self.position
    }

    /// The file this node was loaded from, if any.
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Returns the textual form of a scalar node, `None` for collections.
    ///
    /// Null renders as an empty string so that inline text nodes holding
    /// nothing behave like empty input.
    pub fn scalar_text(&self) -> Option<String> {
        match &self.value {
            YamlValue::String(s) => Some(s.as_str().to_string()),
            YamlValue::Number(n) => Some(n.to_string()),
            YamlValue::Boolean(b) => Some(b.to_string()),
            YamlValue::Null => Some(String::new()),
            YamlValue::Alias(_) | YamlValue::Object(_) | YamlValue::Array(_) => None,
        }
    }
}
