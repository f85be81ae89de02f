//! In-memory notebook document model.
//!
//! Only the fields the transform stages read or write are modelled explicitly
//! (`cells`, `cell_type`, `source`, `metadata.tags`, `outputs`). Everything else
//! is captured in flattened `extra` maps so a parse/serialize round trip keeps
//! the rest of the document intact.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::TransformError;

/// A parsed `.ipynb` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notebook {
    /// Parse notebook JSON. Any structural mismatch is a malformed document.
    pub fn from_json(raw: &str) -> Result<Self, TransformError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String, TransformError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Kernel language from `metadata.language_info.name`, if declared.
    pub fn language(&self) -> Option<&str> {
        self.extra
            .get("metadata")?
            .get("language_info")?
            .get("name")?
            .as_str()
    }
}

/// One notebook cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    /// Source lines, each keeping its trailing newline.
    #[serde(default, deserialize_with = "deserialize_source")]
    pub source: Vec<String>,
    #[serde(default)]
    pub metadata: CellMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cell {
    /// A markdown cell with the given source lines and metadata.
    pub fn markdown(source: Vec<String>, metadata: CellMetadata) -> Self {
        Self {
            cell_type: CellType::Markdown,
            source,
            metadata,
            outputs: None,
            extra: Map::new(),
        }
    }

    pub fn is_code(&self) -> bool {
        self.cell_type == CellType::Code
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata
            .tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }

    /// Add a metadata tag with set semantics: existing duplicates are collapsed
    /// and the tag is appended only if absent.
    pub fn add_tag(&mut self, tag: &str) {
        let tags = self.metadata.tags.get_or_insert_with(Vec::new);
        let mut seen = std::collections::HashSet::new();
        tags.retain(|t| seen.insert(t.clone()));
        if !seen.contains(tag) {
            tags.push(tag.to_string());
        }
    }

    /// `metadata.collapsed`, as written by notebook front-ends.
    pub fn is_collapsed(&self) -> bool {
        self.metadata
            .extra
            .get("collapsed")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Kind of cell. Unknown kinds are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CellType {
    Code,
    Markdown,
    Raw,
    Other(String),
}

impl From<String> for CellType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "code" => CellType::Code,
            "markdown" => CellType::Markdown,
            "raw" => CellType::Raw,
            _ => CellType::Other(s),
        }
    }
}

impl From<CellType> for String {
    fn from(kind: CellType) -> Self {
        match kind {
            CellType::Code => "code".to_string(),
            CellType::Markdown => "markdown".to_string(),
            CellType::Raw => "raw".to_string(),
            CellType::Other(s) => s,
        }
    }
}

/// The notebook format allows `source` as either a list of lines or one
/// string; both end up as a list of newline-terminated lines.
fn deserialize_source<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Source {
        Lines(Vec<String>),
        Text(String),
    }

    Ok(match Source::deserialize(deserializer)? {
        Source::Lines(lines) => lines,
        Source::Text(text) => text.split_inclusive('\n').map(str::to_owned).collect(),
    })
}
