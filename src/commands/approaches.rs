use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::ApproachesArgs;
use crate::commands::metrics::{load_records, score_records};
use crate::layout::{SourceLayout, approach_report_file_name, comparison_file_name};
use crate::model::{Approach, ApproachScore, FieldComparisonRecord, FieldMapping};
use crate::scoring::{ConfusionCounts, ConfusionLabel, classify, derive};
use crate::util::{ensure_directory, write_json_pretty};

#[derive(Debug, Serialize)]
pub struct FieldVerdict {
    pub ground_truth: FieldMapping,
    pub mapped: FieldMapping,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiApproachReport {
    pub api_name: String,
    pub total_fields: usize,
    pub fields: BTreeMap<String, FieldVerdict>,
    pub metrics: ApproachScore,
}

#[derive(Debug, Serialize)]
pub struct ApproachReport {
    pub approach: Approach,
    pub description: String,
    pub total_apis: usize,
    pub apis: BTreeMap<String, ApiApproachReport>,
    pub overall_metrics: ApproachScore,
}

pub fn run(args: ApproachesArgs) -> Result<()> {
    let config = args.workspace.load_config()?;
    let layout = SourceLayout::new(&args.workspace.base_dir, &config);
    let comparison_dir = args
        .comparison_dir
        .clone()
        .unwrap_or_else(|| layout.comparison_dir());
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| comparison_dir.clone());
    ensure_directory(&output_dir)?;

    let records_by_api = load_available(&comparison_dir, &config.apis);
    info!(
        comparison_dir = %comparison_dir.display(),
        available = records_by_api.len(),
        configured = config.apis.len(),
        "loaded comparison documents"
    );

    for approach in Approach::ALL {
        let report = build_approach_report(approach, config.apis.len(), &records_by_api);
        let path = output_dir.join(approach_report_file_name(approach));
        write_json_pretty(&path, &report)?;

        let overall = &report.overall_metrics;
        info!(
            approach = approach.key(),
            path = %path.display(),
            apis = report.apis.len(),
            precision = overall.metrics.precision,
            recall = overall.metrics.recall,
            f1 = overall.metrics.f1,
            tp = overall.counts.tp,
            fp = overall.counts.fp,
            fn_ = overall.counts.fn_,
            tn = overall.counts.tn,
            labelled = overall.counts.total(),
            "wrote approach report"
        );
    }

    Ok(())
}

/// APIs without a readable comparison document are left out; a document
/// with no fields keeps its API with zeroed metrics.
fn load_available(
    comparison_dir: &Path,
    apis: &[String],
) -> Vec<(String, Vec<FieldComparisonRecord>)> {
    apis.iter()
        .filter_map(|api| {
            let path = comparison_dir.join(comparison_file_name(api));
            let Some(records) = load_records(&path) else {
                debug!(api = %api, "no comparison document, leaving API out");
                return None;
            };
            Some((api.clone(), records))
        })
        .collect()
}

pub fn build_api_report(
    api: &str,
    approach: Approach,
    records: &[FieldComparisonRecord],
) -> ApiApproachReport {
    let fields = records
        .iter()
        .map(|record| {
            let mapped = record.approach_mapping(approach);
            let is_correct = classify(&record.ground_truth.target_field, &mapped.target_field)
                == Some(ConfusionLabel::TruePositive);
            (
                record.field_name.clone(),
                FieldVerdict {
                    ground_truth: record.ground_truth.clone(),
                    mapped,
                    is_correct,
                },
            )
        })
        .collect::<BTreeMap<_, _>>();

    let counts = score_records(records, approach);

    ApiApproachReport {
        api_name: api.to_string(),
        total_fields: fields.len(),
        fields,
        metrics: ApproachScore {
            counts,
            metrics: derive(counts).rounded(2),
        },
    }
}

pub fn build_approach_report(
    approach: Approach,
    total_apis: usize,
    records_by_api: &[(String, Vec<FieldComparisonRecord>)],
) -> ApproachReport {
    let apis = records_by_api
        .iter()
        .map(|(api, records)| (api.clone(), build_api_report(api, approach, records)))
        .collect::<BTreeMap<_, _>>();

    let totals = apis
        .values()
        .map(|report| report.metrics.counts)
        .sum::<ConfusionCounts>();

    ApproachReport {
        approach,
        description: approach.description().to_string(),
        total_apis,
        apis,
        overall_metrics: ApproachScore {
            counts: totals,
            metrics: derive(totals).rounded(2),
        },
    }
}
