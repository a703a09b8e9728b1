use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, info};

use crate::model::Approach;

pub const CONFIG_FILE_NAME: &str = "mapeval.toml";
const API_PLACEHOLDER: &str = "{api}";

/// Evaluation layout and naming conventions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalConfig {
    /// APIs to evaluate, in report order.
    pub apis: Vec<String>,
    /// Where comparison documents are written and read, relative to the base directory.
    pub comparison_dir: PathBuf,
    pub ground_truth: GroundTruthConfig,
    /// Per-approach overrides keyed by approach id (`single_prompt`, `rag`, ...).
    pub approaches: BTreeMap<String, ApproachSourceConfig>,
    /// Table labels per API; unlisted APIs are upper-cased.
    pub display_names: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroundTruthConfig {
    pub dir: PathBuf,
    /// Tried in order; the first existing file wins.
    pub patterns: Vec<String>,
    /// Per-API pattern lists that replace `patterns` for that API.
    pub overrides: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApproachSourceConfig {
    pub dir: PathBuf,
    pub pattern: String,
    /// File stems that differ from the API name, e.g. `adb = "adp"`.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl Default for GroundTruthConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("ground_truth"),
            patterns: vec![
                "{api}_enhanced_ground_truth.json".to_string(),
                "{api}_ground_truth.json".to_string(),
            ],
            overrides: ["adb", "bamboo"]
                .iter()
                .map(|api| (api.to_string(), vec!["{api}_ground_truth.json".to_string()]))
                .collect(),
        }
    }
}

impl GroundTruthConfig {
    pub fn patterns_for(&self, api: &str) -> &[String] {
        self.overrides.get(api).unwrap_or(&self.patterns)
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        let apis = [
            "adb", "bamboo", "flip", "hibob", "oracle", "personio", "rippling", "sage", "sap",
            "stackone", "workday",
        ];
        let display_names = [
            ("adb", "ADP"),
            ("bamboo", "BambooHR"),
            ("flip", "Flip"),
            ("hibob", "HiBob"),
            ("stackone", "StackOne"),
        ];

        Self {
            apis: apis.iter().map(|api| api.to_string()).collect(),
            comparison_dir: PathBuf::from("comparison_results"),
            ground_truth: GroundTruthConfig::default(),
            approaches: BTreeMap::new(),
            display_names: display_names
                .iter()
                .map(|(api, name)| (api.to_string(), name.to_string()))
                .collect(),
        }
    }
}

fn default_approach_source(approach: Approach) -> ApproachSourceConfig {
    let (dir, pattern) = match approach {
        Approach::SinglePrompt => ("singel_prompt", "{api}_mapping.json"),
        Approach::Rag => ("rag", "{api}_to_flip_mapping.json"),
        Approach::EnhancedRag => ("enhanced_rag", "{api}_mapping_template.json"),
        Approach::CompleteArch => ("complete_arch", "{api}_mapping.json"),
    };

    let mut aliases = BTreeMap::new();
    if approach == Approach::SinglePrompt {
        aliases.insert("adb".to_string(), "adp".to_string());
    }

    ApproachSourceConfig {
        dir: PathBuf::from(dir),
        pattern: pattern.to_string(),
        aliases,
    }
}

impl EvalConfig {
    /// Loads configuration for a run rooted at `base_dir`.
    ///
    /// An explicit path must exist. Otherwise `mapeval.toml` in the base
    /// directory is used when present, and the built-in layout when not.
    pub fn load(explicit: Option<&Path>, base_dir: &Path) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let candidate = base_dir.join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    Self::from_file(&candidate)?
                } else {
                    debug!(base_dir = %base_dir.display(), "no config file, using built-in layout");
                    Self::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&raw)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("invalid mapeval configuration")
    }

    fn validate(&self) -> Result<()> {
        if self.apis.is_empty() {
            bail!("config lists no APIs to evaluate");
        }

        if self.ground_truth.patterns.is_empty() {
            bail!("ground_truth.patterns must name at least one file pattern");
        }
        for pattern in &self.ground_truth.patterns {
            ensure_placeholder(pattern, "ground_truth.patterns")?;
        }
        for (api, patterns) in &self.ground_truth.overrides {
            let setting = format!("ground_truth.overrides.{api}");
            if patterns.is_empty() {
                bail!("{setting} must name at least one file pattern");
            }
            for pattern in patterns {
                ensure_placeholder(pattern, &setting)?;
            }
        }

        for (key, source) in &self.approaches {
            if Approach::from_key(key).is_none() {
                let known = Approach::ALL
                    .iter()
                    .map(|approach| approach.key())
                    .collect::<Vec<_>>()
                    .join(", ");
                bail!("unknown approach '{key}' in config (expected one of: {known})");
            }
            ensure_placeholder(&source.pattern, &format!("approaches.{key}.pattern"))?;
        }

        Ok(())
    }

    pub fn approach_source(&self, approach: Approach) -> ApproachSourceConfig {
        self.approaches
            .get(approach.key())
            .cloned()
            .unwrap_or_else(|| default_approach_source(approach))
    }

    pub fn display_name(&self, api: &str) -> String {
        self.display_names
            .get(api)
            .cloned()
            .unwrap_or_else(|| api.to_uppercase())
    }

    /// The configured APIs, narrowed to `selected` when it is non-empty.
    pub fn selected_apis(&self, selected: &[String]) -> Result<Vec<String>> {
        if selected.is_empty() {
            return Ok(self.apis.clone());
        }

        for api in selected {
            if !self.apis.contains(api) {
                bail!("API '{api}' is not configured");
            }
        }

        Ok(self
            .apis
            .iter()
            .filter(|api| selected.contains(api))
            .cloned()
            .collect())
    }
}

fn ensure_placeholder(pattern: &str, setting: &str) -> Result<()> {
    if !pattern.contains(API_PLACEHOLDER) {
        bail!("{setting} pattern '{pattern}' must contain {API_PLACEHOLDER}");
    }
    Ok(())
}

pub fn expand_pattern(pattern: &str, api: &str) -> String {
    pattern.replace(API_PLACEHOLDER, api)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_eleven_apis() {
        let config = EvalConfig::default();
        assert_eq!(config.apis.len(), 11);
        assert_eq!(config.display_name("adb"), "ADP");
        assert_eq!(config.display_name("sap"), "SAP");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_single_prompt_source_aliases_adb() {
        let source = EvalConfig::default().approach_source(Approach::SinglePrompt);
        assert_eq!(source.dir, PathBuf::from("singel_prompt"));
        assert_eq!(source.aliases.get("adb").map(String::as_str), Some("adp"));
    }

    #[test]
    fn toml_overrides_replace_defaults() {
        let config = EvalConfig::from_toml(
            r#"
            apis = ["sap", "workday"]
            comparison_dir = "out"

            [ground_truth]
            dir = "gt"
            patterns = ["{api}.json"]

            [approaches.rag]
            dir = "basic_rag"
            pattern = "{api}_rag.json"

            [display_names]
            sap = "SAP SuccessFactors"
            "#,
        )
        .expect("config should parse");

        assert!(config.validate().is_ok());
        assert_eq!(config.apis, vec!["sap", "workday"]);
        assert_eq!(config.comparison_dir, PathBuf::from("out"));
        assert_eq!(config.approach_source(Approach::Rag).dir, PathBuf::from("basic_rag"));
        assert_eq!(
            config.approach_source(Approach::CompleteArch).pattern,
            "{api}_mapping.json"
        );
        assert_eq!(config.display_name("sap"), "SAP SuccessFactors");
        assert_eq!(config.display_name("workday"), "WORKDAY");
    }

    #[test]
    fn validate_rejects_unknown_approach() {
        let config = EvalConfig::from_toml(
            r#"
            [approaches.fine_tuned]
            dir = "ft"
            pattern = "{api}.json"
            "#,
        )
        .expect("config should parse");

        let error = config.validate().expect_err("unknown approach should fail");
        assert!(error.to_string().contains("fine_tuned"), "unexpected error: {error}");
    }

    #[test]
    fn validate_rejects_pattern_without_placeholder() {
        let config = EvalConfig::from_toml(
            r#"
            [ground_truth]
            dir = "gt"
            patterns = ["ground_truth.json"]
            "#,
        )
        .expect("config should parse");

        assert!(config.validate().is_err());
    }

    #[test]
    fn ground_truth_prefers_enhanced_except_for_overridden_apis() {
        let ground_truth = EvalConfig::default().ground_truth;
        assert_eq!(
            ground_truth.patterns_for("sap")[0],
            "{api}_enhanced_ground_truth.json"
        );
        assert_eq!(ground_truth.patterns_for("adb"), ["{api}_ground_truth.json"]);
        assert_eq!(ground_truth.patterns_for("bamboo"), ["{api}_ground_truth.json"]);
    }

    #[test]
    fn ground_truth_overrides_load_from_toml() {
        let config = EvalConfig::from_toml(
            r#"
            [ground_truth.overrides]
            sap = ["{api}_ground_truth.json"]
            "#,
        )
        .expect("config should parse");

        assert!(config.validate().is_ok());
        assert_eq!(
            config.ground_truth.patterns_for("sap"),
            ["{api}_ground_truth.json"]
        );
        assert_eq!(config.ground_truth.patterns_for("adb").len(), 2);

        let empty = EvalConfig::from_toml(
            r#"
            [ground_truth.overrides]
            sap = []
            "#,
        )
        .expect("config should parse");
        assert!(empty.validate().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(EvalConfig::from_toml("api = [\"sap\"]").is_err());
    }

    #[test]
    fn load_prefers_config_in_base_dir() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        fs::write(dir.path().join(CONFIG_FILE_NAME), "apis = [\"personio\"]\n")
            .expect("config should be written");

        let config = EvalConfig::load(None, dir.path()).expect("config should load");
        assert_eq!(config.apis, vec!["personio"]);

        let missing = dir.path().join("elsewhere.toml");
        assert!(EvalConfig::load(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn selected_apis_keeps_config_order() {
        let config = EvalConfig::default();
        let selected = config
            .selected_apis(&["workday".to_string(), "adb".to_string()])
            .expect("known APIs should be selectable");
        assert_eq!(selected, vec!["adb", "workday"]);
        assert!(config.selected_apis(&["unknown".to_string()]).is_err());
    }
}
