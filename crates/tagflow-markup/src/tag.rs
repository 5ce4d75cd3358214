//! Tag scanner
//!
//! Extracts `<name attrs>content</name>` occurrences from resolved pipeline
//! text. Tag names are one or more ASCII lowercase letters and must be
//! followed by whitespace and a non-empty attribute run. The content ends at
//! the first matching closing tag, so a tag nested inside another tag of the
//! same name is not supported.

use indexmap::IndexMap;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tagflow_core::{Diagnostic, DiagnosticCode, Location};

/// Reserved key holding the tag name
pub const TYPE_KEY: &str = "type";

/// Reserved key holding the trimmed inner content
pub const CODE_KEY: &str = "code";

static ATTRIBUTE_REGEX: OnceLock<Regex> = OnceLock::new();

fn attribute_regex() -> &'static Regex {
    ATTRIBUTE_REGEX.get_or_init(|| {
        Regex::new(r#"(?P<key>[a-z_]+)="(?P<value>[^"]*)""#).expect("attribute regex is valid")
    })
}

/// One matched tag occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedElement {
    tag: String,
    code: String,
    attributes: IndexMap<String, String>,
}

impl TaggedElement {
    /// Create an element with no attributes
    pub fn new(tag: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            code: code.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Add an attribute; a repeated key replaces the earlier value
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The tag name (reserved `type` field)
    pub fn element_type(&self) -> &str {
        &self.tag
    }

    /// The trimmed inner content (reserved `code` field)
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Raw attributes in declaration order
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Look up a field; `type` and `code` always return the reserved values
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            TYPE_KEY => Some(&self.tag),
            CODE_KEY => Some(&self.code),
            _ => self.attributes.get(key).map(String::as_str),
        }
    }

    /// Look up a field, defaulting to the empty string
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// Look up a raw attribute, ignoring the reserved fields
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Flatten into a single mapping with the reserved fields applied
    pub fn to_map(&self) -> IndexMap<String, String> {
        let mut map = self.attributes.clone();
        map.insert(CODE_KEY.to_string(), self.code.clone());
        map.insert(TYPE_KEY.to_string(), self.tag.clone());
        map
    }
}

impl Serialize for TaggedElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let flat = self.to_map();
        let mut map = serializer.serialize_map(Some(flat.len()))?;
        for (key, value) in &flat {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Error reading a pipeline source
#[derive(Debug, thiserror::Error)]
pub enum TagParseError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TagParseError {
    /// Convert to a diagnostic naming the offending file
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            TagParseError::Io { path, source } => Diagnostic::from_code(
                DiagnosticCode::FileReadError,
                format!("Failed to read pipeline file: {}", source),
            )
            .with_location(Location::new(path.display().to_string())),
        }
    }
}

/// Scan text for tags, in document order
///
/// Text without any matching tag yields an empty list. Malformed
/// occurrences are skipped silently.
pub fn parse_tags(text: &str) -> Vec<TaggedElement> {
    let mut elements = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('<') {
        let start = pos + offset;
        match scan_tag(text, start) {
            Some((element, end)) => {
                elements.push(element);
                pos = end;
            }
            None => pos = start + 1,
        }
    }

    elements
}

/// Read a file and scan it for tags
pub fn parse_file(path: &Path) -> Result<Vec<TaggedElement>, TagParseError> {
    let text = std::fs::read_to_string(path).map_err(|source| TagParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_tags(&text))
}

/// Try to match one tag starting at the `<` at `start`
///
/// Returns the element and the byte offset just past its closing tag.
fn scan_tag(text: &str, start: usize) -> Option<(TaggedElement, usize)> {
    let bytes = text.as_bytes();
    let name_start = start + 1;
    let mut name_end = name_start;
    while name_end < bytes.len() && bytes[name_end].is_ascii_lowercase() {
        name_end += 1;
    }
    if name_end == name_start {
        return None;
    }
    let name = &text[name_start..name_end];

    let separator = text[name_end..].chars().next()?;
    if !separator.is_whitespace() {
        return None;
    }
    let attrs_start = name_end + separator.len_utf8();
    let attrs_end = attrs_start + text[attrs_start..].find('>')?;
    if attrs_end == attrs_start {
        return None;
    }

    let content_start = attrs_end + 1;
    let closing = format!("</{}>", name);
    let content_end = content_start + text[content_start..].find(&closing)?;

    let mut element = TaggedElement::new(name, text[content_start..content_end].trim());
    for caps in attribute_regex().captures_iter(&text[attrs_start..attrs_end]) {
        element.attributes.insert(caps["key"].to_string(), caps["value"].to_string());
    }

    Some((element, content_end + closing.len()))
}
