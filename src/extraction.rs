use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::FieldMapping;
use crate::scoring::{NO_MATCH, NOT_AVAILABLE, UNMAPPABLE};

const UNKNOWN_SOURCE_FIELD: &str = "unknown";
const UNKNOWN_MAPPING_TYPE: &str = "Unknown";

#[derive(Debug, Default, Deserialize)]
struct MappingDocument {
    #[serde(default)]
    mapped_fields: Option<MappedFields>,
}

/// The two container shapes a `mapped_fields` value arrives in.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MappedFields {
    ListShaped(Vec<RawFieldRecord>),
    ObjectShaped(BTreeMap<String, RawFieldRecord>),
}

#[derive(Debug, Default, Deserialize)]
struct RawFieldRecord {
    #[serde(default)]
    source_field: Option<String>,
    /// `None` when the key is missing, `Some(Value::Null)` for an explicit null.
    #[serde(default, deserialize_with = "present")]
    target_field: Option<Value>,
    #[serde(default)]
    notes: Option<Value>,
    #[serde(default)]
    mapping_type: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

impl RawFieldRecord {
    fn into_mapping(self, field_name: String) -> FieldMapping {
        let target_field = match self.target_field {
            None => NOT_AVAILABLE.to_string(),
            Some(Value::Null) => UNMAPPABLE.to_string(),
            Some(Value::String(target)) if target == NO_MATCH => UNMAPPABLE.to_string(),
            Some(Value::String(target)) => target,
            Some(other) => other.to_string(),
        };

        FieldMapping {
            source_field: field_name,
            target_field,
            notes: text(self.notes).unwrap_or_default(),
            mapping_type: text(self.mapping_type)
                .unwrap_or_else(|| UNKNOWN_MAPPING_TYPE.to_string()),
        }
    }
}

impl MappedFields {
    fn normalize(self) -> BTreeMap<String, FieldMapping> {
        let mut fields = BTreeMap::new();
        match self {
            Self::ListShaped(records) => {
                for mut record in records {
                    let field_name = record
                        .source_field
                        .take()
                        .unwrap_or_else(|| UNKNOWN_SOURCE_FIELD.to_string());
                    fields.insert(field_name.clone(), record.into_mapping(field_name));
                }
            }
            Self::ObjectShaped(records) => {
                for (field_name, record) in records {
                    fields.insert(field_name.clone(), record.into_mapping(field_name));
                }
            }
        }
        fields
    }
}

/// Normalizes one mapping document into `source_field -> FieldMapping`.
///
/// A document without `mapped_fields` yields an empty mapping. `null` and
/// `"(No Match)"` targets are rewritten to `"unmappable"` here, so nothing
/// downstream sees them from an extracted source.
pub fn extract(document: &Value) -> Result<BTreeMap<String, FieldMapping>> {
    let document = MappingDocument::deserialize(document)
        .context("mapped_fields is neither a list of records nor an object of records")?;
    Ok(document
        .mapped_fields
        .map(MappedFields::normalize)
        .unwrap_or_default())
}

pub fn extract_file(path: &Path) -> Result<BTreeMap<String, FieldMapping>> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let document: Value = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    extract(&document).with_context(|| format!("unexpected mapping layout in {}", path.display()))
}

/// Like [`extract_file`], but a missing or malformed document is logged and
/// treated as having no fields.
pub fn load_field_mappings(path: &Path) -> BTreeMap<String, FieldMapping> {
    if !path.exists() {
        debug!(path = %path.display(), "mapping document missing");
        return BTreeMap::new();
    }

    match extract_file(path) {
        Ok(fields) => fields,
        Err(err) => {
            warn!(path = %path.display(), error = %format!("{err:#}"), "skipping unreadable mapping document");
            BTreeMap::new()
        }
    }
}
