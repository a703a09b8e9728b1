use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

use crate::scoring::{ConfusionCounts, DerivedMetrics, NOT_AVAILABLE};

#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Approach {
    SinglePrompt,
    Rag,
    EnhancedRag,
    CompleteArch,
}

impl Approach {
    pub const ALL: [Approach; 4] = [
        Approach::SinglePrompt,
        Approach::Rag,
        Approach::EnhancedRag,
        Approach::CompleteArch,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::SinglePrompt => "single_prompt",
            Self::Rag => "rag",
            Self::EnhancedRag => "enhanced_rag",
            Self::CompleteArch => "complete_arch",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|approach| approach.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SinglePrompt => "Single-Prompt",
            Self::Rag => "Basic RAG",
            Self::EnhancedRag => "Enhanced RAG",
            Self::CompleteArch => "Complete Architecture",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::SinglePrompt => {
                "Single-Prompt approach using only LLM intrinsic knowledge without external context"
            }
            Self::Rag => {
                "Basic RAG (Retrieval-Augmented Generation) with direct access to API specifications"
            }
            Self::EnhancedRag => {
                "Enhanced RAG with structured retrieval pipelines and intelligent terminology normalization"
            }
            Self::CompleteArch => {
                "Complete Architecture with integrated tool-use, validation, and verification modules"
            }
        }
    }
}

/// One input document per API: the ground truth or one approach's output.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Source {
    GroundTruth,
    Approach(Approach),
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::GroundTruth,
        Source::Approach(Approach::SinglePrompt),
        Source::Approach(Approach::Rag),
        Source::Approach(Approach::EnhancedRag),
        Source::Approach(Approach::CompleteArch),
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::GroundTruth => "ground_truth",
            Self::Approach(approach) => approach.key(),
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::GroundTruth => "ground truth",
            Self::Approach(Approach::SinglePrompt) => "single prompt",
            Self::Approach(Approach::Rag) => "RAG",
            Self::Approach(Approach::EnhancedRag) => "enhanced RAG",
            Self::Approach(Approach::CompleteArch) => "complete architecture",
        }
    }
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

fn unknown_mapping_type() -> String {
    "Unknown".to_string()
}

/// `null` or a missing value both read as the string default.
fn string_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn target_or_not_available<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(not_available))
}

fn mapping_type_or_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(unknown_mapping_type))
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_field: String,
    #[serde(
        default = "not_available",
        deserialize_with = "target_or_not_available"
    )]
    pub target_field: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub notes: String,
    #[serde(
        default = "unknown_mapping_type",
        deserialize_with = "mapping_type_or_unknown"
    )]
    pub mapping_type: String,
}

impl FieldMapping {
    /// Placeholder for a field the given source never produced.
    pub fn absent(field_name: &str, source: Source) -> Self {
        Self {
            source_field: field_name.to_string(),
            target_field: not_available(),
            notes: format!("Field not found in {}", source.display_name()),
            mapping_type: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Every source's mapping of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldComparisonRecord {
    pub field_name: String,
    pub ground_truth: FieldMapping,
    pub approach_results: BTreeMap<Approach, FieldMapping>,
}

impl FieldComparisonRecord {
    pub fn assemble(
        field_name: &str,
        extracted: &BTreeMap<Source, BTreeMap<String, FieldMapping>>,
    ) -> Self {
        let lookup = |source: Source| {
            extracted
                .get(&source)
                .and_then(|fields| fields.get(field_name))
                .cloned()
                .unwrap_or_else(|| FieldMapping::absent(field_name, source))
        };

        Self {
            field_name: field_name.to_string(),
            ground_truth: lookup(Source::GroundTruth),
            approach_results: Approach::ALL
                .into_iter()
                .map(|approach| (approach, lookup(Source::Approach(approach))))
                .collect(),
        }
    }

    pub fn from_sources(field_name: &str, sources: &FieldSources) -> Self {
        let lookup = |source: Source| {
            sources
                .0
                .get(source.key())
                .cloned()
                .unwrap_or_else(|| FieldMapping::absent(field_name, source))
        };

        Self {
            field_name: field_name.to_string(),
            ground_truth: lookup(Source::GroundTruth),
            approach_results: Approach::ALL
                .into_iter()
                .map(|approach| (approach, lookup(Source::Approach(approach))))
                .collect(),
        }
    }

    pub fn to_sources(&self) -> FieldSources {
        let mut sources = BTreeMap::new();
        sources.insert(
            Source::GroundTruth.key().to_string(),
            self.ground_truth.clone(),
        );
        for (approach, mapping) in &self.approach_results {
            sources.insert(approach.key().to_string(), mapping.clone());
        }
        FieldSources(sources)
    }

    pub fn target_for(&self, approach: Approach) -> &str {
        self.approach_results
            .get(&approach)
            .map(|mapping| mapping.target_field.as_str())
            .unwrap_or(NOT_AVAILABLE)
    }

    pub fn approach_mapping(&self, approach: Approach) -> FieldMapping {
        self.approach_results
            .get(&approach)
            .cloned()
            .unwrap_or_else(|| FieldMapping::absent(&self.field_name, Source::Approach(approach)))
    }
}

/// Wire form of one `fields_comparison` entry, keyed by source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSources(pub BTreeMap<String, FieldMapping>);

/// Legacy exact-string accuracy of one approach at one API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExactAccuracy {
    pub correct: usize,
    pub incorrect: usize,
    pub unmappable: usize,
    pub accuracy: f64,
    pub total_evaluated: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ApproachScore {
    #[serde(flatten)]
    pub counts: ConfusionCounts,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonDocument {
    #[serde(default)]
    pub api_name: String,
    #[serde(default)]
    pub total_fields: usize,
    #[serde(default)]
    pub files_analyzed: BTreeMap<String, String>,
    #[serde(default)]
    pub fields_comparison: BTreeMap<String, FieldSources>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub accuracy_metrics: BTreeMap<Approach, ExactAccuracy>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub confusion_metrics: BTreeMap<Approach, ApproachScore>,
}

impl ComparisonDocument {
    /// Records in field-name order.
    pub fn records(&self) -> Vec<FieldComparisonRecord> {
        self.fields_comparison
            .iter()
            .map(|(field_name, sources)| FieldComparisonRecord::from_sources(field_name, sources))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverallAccuracy {
    pub total_correct: usize,
    pub total_incorrect: usize,
    pub total_unmappable: usize,
    pub overall_accuracy: f64,
    pub total_evaluated: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiAccuracy {
    pub accuracy: f64,
    pub correct: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryDocument {
    pub total_apis_analyzed: usize,
    pub generated_at: String,
    pub overall_metrics: BTreeMap<Approach, OverallAccuracy>,
    pub per_api_summary: BTreeMap<String, BTreeMap<Approach, ApiAccuracy>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceInventoryEntry {
    pub api: String,
    pub source: String,
    pub path: String,
    pub present: bool,
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub base_directory: String,
    pub api_count: usize,
    pub present_count: usize,
    pub missing_count: usize,
    pub sources: Vec<SourceInventoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_mapping_defaults_missing_and_null_values() {
        let mapping: FieldMapping = serde_json::from_value(serde_json::json!({
            "notes": null
        }))
        .expect("sparse mapping should deserialize");
        assert_eq!(mapping.target_field, "N/A");
        assert_eq!(mapping.notes, "");
        assert_eq!(mapping.mapping_type, "Unknown");

        let null_target: FieldMapping =
            serde_json::from_value(serde_json::json!({"target_field": null}))
                .expect("null target should deserialize");
        assert_eq!(null_target.target_field, "N/A");
    }

    #[test]
    fn record_round_trips_through_wire_sources() {
        let raw = serde_json::json!({
            "ground_truth": {"target_field": "worker.id", "notes": "", "mapping_type": "Direct"},
            "rag": {"target_field": "data.worker.id", "notes": "", "mapping_type": "Direct"}
        });
        let sources: FieldSources = serde_json::from_value(raw).expect("sources should parse");
        let record = FieldComparisonRecord::from_sources("employeeId", &sources);

        assert_eq!(record.ground_truth.target_field, "worker.id");
        assert_eq!(record.target_for(Approach::Rag), "data.worker.id");
        assert_eq!(record.target_for(Approach::SinglePrompt), "N/A");
        assert_eq!(
            record.approach_mapping(Approach::CompleteArch).notes,
            "Field not found in complete architecture"
        );

        let wire = record.to_sources();
        assert_eq!(wire.0.len(), 5);
        assert!(wire.0.contains_key("enhanced_rag"));
    }

    #[test]
    fn approach_keys_round_trip() {
        for approach in Approach::ALL {
            assert_eq!(Approach::from_key(approach.key()), Some(approach));
            let json = serde_json::to_value(approach).expect("approach should serialize");
            assert_eq!(json, serde_json::Value::String(approach.key().to_string()));
        }
        assert_eq!(Approach::from_key("singel_prompt"), None);
    }
}
