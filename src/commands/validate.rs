use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::ValidateArgs;
use crate::layout::{SUMMARY_FILE_NAME, SourceLayout};
use crate::model::Source;
use crate::util::{now_utc_string, read_json, write_json_pretty};

const REQUIRED_KEYS: [&str; 4] = [
    "api_name",
    "total_fields",
    "files_analyzed",
    "fields_comparison",
];
const SUMMARY_KEYS: [&str; 3] = ["total_apis_analyzed", "overall_metrics", "per_api_summary"];

#[derive(Debug, Default, Clone, Serialize)]
pub struct ValidationStats {
    pub total_files: usize,
    pub total_fields: usize,
    pub total_comparisons: usize,
    pub missing_data: usize,
    pub inconsistencies: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub generated_at: String,
    pub comparison_dir: String,
    pub status: String,
    pub stats: ValidationStats,
    pub issues: Vec<ValidationIssue>,
}

/// Collects structural defects across comparison documents without stopping
/// at the first one.
#[derive(Debug, Default)]
pub struct Validator {
    stats: ValidationStats,
    issues: Vec<ValidationIssue>,
}

impl Validator {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn stats(&self) -> &ValidationStats {
        &self.stats
    }

    fn push(&mut self, file: &str, message: String) {
        warn!(file = %file, "{message}");
        self.issues.push(ValidationIssue {
            file: file.to_string(),
            message,
        });
    }

    pub fn validate_comparison_file(&mut self, path: &Path) {
        let file = display_name(path);
        info!(file = %file, "validating comparison document");

        match read_json::<Value>(path) {
            Ok(data) => self.validate_comparison(&file, &data),
            Err(err) => self.push(&file, format!("could not read document: {err:#}")),
        }
    }

    pub fn validate_comparison(&mut self, file: &str, data: &Value) {
        self.stats.total_files += 1;

        for key in REQUIRED_KEYS {
            if data.get(key).is_none() {
                self.push(file, format!("missing required key: {key}"));
            }
        }

        if let Some(files_analyzed) = data.get("files_analyzed") {
            for source in Source::ALL {
                if files_analyzed.get(source.key()).is_none() {
                    self.push(file, format!("missing source file: {}", source.key()));
                }
            }
        }

        if let Some(fields) = data.get("fields_comparison").and_then(Value::as_object) {
            self.stats.total_fields += fields.len();

            for (field_name, field_data) in fields {
                self.stats.total_comparisons += Source::ALL.len();

                for source in Source::ALL {
                    match field_data.get(source.key()) {
                        None => {
                            self.stats.missing_data += 1;
                            self.push(
                                file,
                                format!("field '{field_name}' missing source: {}", source.key()),
                            );
                        }
                        Some(source_data) if source_data.get("target_field").is_none() => {
                            self.stats.missing_data += 1;
                            self.push(
                                file,
                                format!(
                                    "field '{field_name}' -> {} missing 'target_field'",
                                    source.key()
                                ),
                            );
                        }
                        Some(_) => {}
                    }
                }
            }

            let declared = data.get("total_fields").and_then(Value::as_u64);
            if let Some(declared) = declared {
                if declared != fields.len() as u64 {
                    self.stats.inconsistencies += 1;
                    self.push(
                        file,
                        format!(
                            "total_fields is {declared} but {} fields are compared",
                            fields.len()
                        ),
                    );
                }
            }
        }

        if let Some(metrics) = data.get("accuracy_metrics").and_then(Value::as_object) {
            for (approach, scores) in metrics {
                let Some(accuracy) = scores.get("accuracy").and_then(Value::as_f64) else {
                    continue;
                };
                let correct = scores.get("correct").and_then(Value::as_u64).unwrap_or(0);
                let evaluated = scores
                    .get("total_evaluated")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                info!(
                    file = %file,
                    approach = %approach,
                    accuracy,
                    correct,
                    evaluated,
                    "exact-match accuracy"
                );
            }
        }
    }

    pub fn validate_summary_file(&mut self, path: &Path) {
        let file = display_name(path);
        info!(file = %file, "validating summary document");

        let data = match read_json::<Value>(path) {
            Ok(data) => data,
            Err(err) => {
                self.push(&file, format!("could not read document: {err:#}"));
                return;
            }
        };

        for key in SUMMARY_KEYS {
            if data.get(key).is_none() {
                self.push(&file, format!("missing required key: {key}"));
            }
        }

        if let Some(apis) = data.get("per_api_summary").and_then(Value::as_object) {
            info!(file = %file, apis = apis.len(), "per-API summary present");
        }
    }

    pub fn into_report(self, comparison_dir: &Path) -> ValidationReport {
        ValidationReport {
            generated_at: now_utc_string(),
            comparison_dir: comparison_dir.display().to_string(),
            status: if self.issues.is_empty() {
                "pass".to_string()
            } else {
                "failed".to_string()
            },
            stats: self.stats,
            issues: self.issues,
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn discover_comparison_files(comparison_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern =
        Regex::new(r"^(.+)_comparison\.json$").context("failed to compile comparison regex")?;

    let entries = fs::read_dir(comparison_dir)
        .with_context(|| format!("failed to read {}", comparison_dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", comparison_dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name != SUMMARY_FILE_NAME && pattern.is_match(name))
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let config = args.workspace.load_config()?;
    let layout = SourceLayout::new(&args.workspace.base_dir, &config);
    let comparison_dir = args
        .comparison_dir
        .clone()
        .unwrap_or_else(|| layout.comparison_dir());

    let files = discover_comparison_files(&comparison_dir)?;
    info!(
        comparison_dir = %comparison_dir.display(),
        files = files.len(),
        "found API comparison documents"
    );

    let mut validator = Validator::default();
    for path in &files {
        validator.validate_comparison_file(path);
    }

    let summary_path = comparison_dir.join(SUMMARY_FILE_NAME);
    if summary_path.is_file() {
        validator.validate_summary_file(&summary_path);
    } else {
        warn!(path = %summary_path.display(), "summary document not found");
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    write_summary(&mut output, &validator)?;
    output.flush()?;

    let passed = validator.passed();
    let issue_count = validator.issues().len();
    let report = validator.into_report(&comparison_dir);
    if let Some(report_path) = &args.report_path {
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote validation report");
    }

    if !passed {
        bail!("{issue_count} validation issues need attention");
    }

    info!("all validation checks passed");
    Ok(())
}

fn write_summary<W: Write>(output: &mut W, validator: &Validator) -> Result<()> {
    let stats = validator.stats();
    writeln!(output, "VALIDATION SUMMARY")?;
    writeln!(output, "  Total files validated:     {}", stats.total_files)?;
    writeln!(output, "  Total fields compared:     {}", stats.total_fields)?;
    writeln!(output, "  Total comparisons made:    {}", stats.total_comparisons)?;
    writeln!(output, "  Missing data points:       {}", stats.missing_data)?;
    writeln!(output, "  Inconsistencies:           {}", stats.inconsistencies)?;
    writeln!(output, "  Total issues found:        {}", validator.issues().len())?;
    for issue in validator.issues() {
        writeln!(output, "  - {}: {}", issue.file, issue.message)?;
    }
    Ok(())
}
