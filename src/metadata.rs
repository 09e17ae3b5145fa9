//! Metadata Records
//!
//! Typed view over loosely structured token metadata JSON.

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("metadata root must be a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attributes {
    Absent,
    List(Vec<AttributeEntry>),
    /// `attributes` was present but not an array.
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeEntry {
    Trait { trait_type: String, value: String },
    /// Element that is not an object; contributes nothing.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub uri: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub attributes: Attributes,
    pub image: Option<String>,
    pub files: Vec<FileRef>,
}

impl MetadataRecord {
    pub fn from_value(value: &Value) -> Result<Self, MetadataError> {
        let obj = value.as_object().ok_or(MetadataError::NotAnObject)?;

        let attributes = match obj.get("attributes") {
            None => Attributes::Absent,
            Some(Value::Array(items)) => {
                Attributes::List(items.iter().map(attribute_entry).collect())
            }
            Some(_) => Attributes::Malformed,
        };

        let image = obj.get("image").and_then(Value::as_str).map(str::to_string);

        let files = obj
            .get("properties")
            .and_then(|p| p.get("files"))
            .and_then(Value::as_array)
            .map(|files| {
                files
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|f| FileRef {
                        uri: f.get("uri").and_then(Value::as_str).map(str::to_string),
                        mime_type: f.get("type").and_then(Value::as_str).map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { attributes, image, files })
    }

    pub fn from_json_str(s: &str) -> Result<Self, MetadataError> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_value(&value)
    }

    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

fn attribute_entry(item: &Value) -> AttributeEntry {
    match item.as_object() {
        Some(map) => AttributeEntry::Trait {
            trait_type: field_text(map, "trait_type"),
            value: field_text(map, "value"),
        },
        None => AttributeEntry::Skipped,
    }
}

/// Text form of a field. A missing key reads as empty, an explicit null as `None`.
fn field_text(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        None => String::new(),
        Some(Value::Null) => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}
