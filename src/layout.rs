use std::path::{Path, PathBuf};

use crate::config::{EvalConfig, expand_pattern};
use crate::model::{Approach, Source};

pub const SUMMARY_FILE_NAME: &str = "SUMMARY_COMPARISON.json";
pub const INVENTORY_FILE_NAME: &str = "source_inventory.json";

/// Resolves input and output paths under one base directory.
pub struct SourceLayout<'a> {
    base_dir: PathBuf,
    config: &'a EvalConfig,
}

impl<'a> SourceLayout<'a> {
    pub fn new(base_dir: &Path, config: &'a EvalConfig) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            config,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config(&self) -> &EvalConfig {
        self.config
    }

    pub fn comparison_dir(&self) -> PathBuf {
        self.base_dir.join(&self.config.comparison_dir)
    }

    pub fn source_path(&self, api: &str, source: Source) -> PathBuf {
        match source {
            Source::GroundTruth => self.ground_truth_path(api),
            Source::Approach(approach) => {
                let settings = self.config.approach_source(approach);
                let stem = settings
                    .aliases
                    .get(api)
                    .map(String::as_str)
                    .unwrap_or(api);
                self.base_dir
                    .join(&settings.dir)
                    .join(expand_pattern(&settings.pattern, stem))
            }
        }
    }

    /// First existing candidate, or the first pattern when none exists.
    fn ground_truth_path(&self, api: &str) -> PathBuf {
        let dir = self.base_dir.join(&self.config.ground_truth.dir);
        let candidates = self
            .config
            .ground_truth
            .patterns_for(api)
            .iter()
            .map(|pattern| dir.join(expand_pattern(pattern, api)))
            .collect::<Vec<_>>();

        candidates
            .iter()
            .find(|path| path.is_file())
            .or_else(|| candidates.first())
            .cloned()
            .unwrap_or(dir)
    }
}

pub fn comparison_file_name(api: &str) -> String {
    format!("{api}_comparison.json")
}

pub fn approach_report_file_name(approach: Approach) -> String {
    format!("{}_all_apis.json", approach.key())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn approach_paths_follow_naming_conventions() {
        let config = EvalConfig::default();
        let layout = SourceLayout::new(Path::new("/data"), &config);

        assert_eq!(
            layout.source_path("adb", Source::Approach(Approach::SinglePrompt)),
            PathBuf::from("/data/singel_prompt/adp_mapping.json")
        );
        assert_eq!(
            layout.source_path("sap", Source::Approach(Approach::SinglePrompt)),
            PathBuf::from("/data/singel_prompt/sap_mapping.json")
        );
        assert_eq!(
            layout.source_path("adb", Source::Approach(Approach::Rag)),
            PathBuf::from("/data/rag/adb_to_flip_mapping.json")
        );
        assert_eq!(
            layout.source_path("hibob", Source::Approach(Approach::EnhancedRag)),
            PathBuf::from("/data/enhanced_rag/hibob_mapping_template.json")
        );
        assert_eq!(
            layout.source_path("sage", Source::Approach(Approach::CompleteArch)),
            PathBuf::from("/data/complete_arch/sage_mapping.json")
        );
        assert_eq!(
            layout.comparison_dir(),
            PathBuf::from("/data/comparison_results")
        );
    }

    #[test]
    fn ground_truth_prefers_enhanced_file_unless_overridden() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let gt_dir = dir.path().join("ground_truth");
        fs::create_dir_all(&gt_dir).expect("ground truth dir should be created");
        for name in [
            "sap_ground_truth.json",
            "sap_enhanced_ground_truth.json",
            "workday_ground_truth.json",
            "bamboo_ground_truth.json",
            "bamboo_enhanced_ground_truth.json",
        ] {
            fs::write(gt_dir.join(name), "{}").expect("fixture should be written");
        }

        let config = EvalConfig::default();
        let layout = SourceLayout::new(dir.path(), &config);

        assert_eq!(
            layout.source_path("sap", Source::GroundTruth),
            gt_dir.join("sap_enhanced_ground_truth.json")
        );
        assert_eq!(
            layout.source_path("workday", Source::GroundTruth),
            gt_dir.join("workday_ground_truth.json")
        );
        assert_eq!(
            layout.source_path("bamboo", Source::GroundTruth),
            gt_dir.join("bamboo_ground_truth.json")
        );
        assert_eq!(
            layout.source_path("oracle", Source::GroundTruth),
            gt_dir.join("oracle_enhanced_ground_truth.json")
        );
        assert_eq!(
            layout.source_path("adb", Source::GroundTruth),
            gt_dir.join("adb_ground_truth.json")
        );
    }
}
