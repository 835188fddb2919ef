use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static SPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());
static NEWLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\n\s*\n\s*").unwrap());
static SINGLE_NEWLINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" *\n *").unwrap());

/// A value read for one field of a selector table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Serialised sub-document. Empty when the node was absent.
    Fragment(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) | Self::Fragment(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

/// Field name to value. Every field of the table that produced it is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRecord {
    values: BTreeMap<&'static str, FieldValue>,
}

impl ExtractedRecord {
    pub(crate) fn insert(&mut self, name: &'static str, value: FieldValue) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text or fragment value of `name`, `""` for lists and unknown names.
    pub fn text(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(FieldValue::Text(s)) | Some(FieldValue::Fragment(s)) => s,
            _ => "",
        }
    }

    pub fn list(&self, name: &str) -> &[String] {
        match self.values.get(name) {
            Some(FieldValue::List(items)) => items,
            _ => &[],
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Collapse runs of spaces, keep paragraph breaks, trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.trim();
    let spaced = SPACE_REGEX.replace_all(text, " ");
    let paragraphs = NEWLINE_REGEX.replace_all(&spaced, "\n\n");
    SINGLE_NEWLINE_REGEX
        .replace_all(&paragraphs, "\n")
        .to_string()
}
