use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::MetricsArgs;
use crate::config::EvalConfig;
use crate::layout::{SourceLayout, comparison_file_name};
use crate::model::{Approach, ComparisonDocument, FieldComparisonRecord};
use crate::scoring::{ConfusionCounts, DerivedMetrics, aggregate, classify, derive};
use crate::util::{now_utc_string, read_json, write_json_pretty};

const RULE: &str =
    "================================================================================";

#[derive(Debug, Serialize)]
pub struct MetricsReport {
    pub generated_at: String,
    pub comparison_dir: String,
    pub approaches: Vec<ApproachMetrics>,
}

#[derive(Debug, Serialize)]
pub struct ApproachMetrics {
    pub approach: Approach,
    pub label: String,
    pub apis: Vec<ApiMetrics>,
    pub totals: ConfusionCounts,
    pub overall: DerivedMetrics,
}

#[derive(Debug, Serialize)]
pub struct ApiMetrics {
    pub api: String,
    pub display_name: String,
    #[serde(flatten)]
    pub counts: ConfusionCounts,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
}

pub fn run(args: MetricsArgs) -> Result<()> {
    let config = args.workspace.load_config()?;
    let layout = SourceLayout::new(&args.workspace.base_dir, &config);
    let comparison_dir = args
        .comparison_dir
        .clone()
        .unwrap_or_else(|| layout.comparison_dir());
    let approaches = selected_approaches(&args.approaches);

    info!(comparison_dir = %comparison_dir.display(), "calculating confusion metrics");

    let records_by_api = config
        .apis
        .iter()
        .map(|api| {
            let records = load_records(&comparison_dir.join(comparison_file_name(api)))
                .unwrap_or_default();
            (api.clone(), records)
        })
        .collect::<Vec<_>>();

    let report = build_report(&config, &comparison_dir, &records_by_api, &approaches);

    if let Some(report_path) = &args.report_path {
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote metrics report");
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &report)
            .context("failed to serialize metrics json output")?;
        writeln!(output)?;
    } else {
        write_text_report(&mut output, &report)?;
    }
    output.flush()?;

    Ok(())
}

fn selected_approaches(requested: &[Approach]) -> Vec<Approach> {
    if requested.is_empty() {
        return Approach::ALL.to_vec();
    }
    Approach::ALL
        .into_iter()
        .filter(|approach| requested.contains(approach))
        .collect()
}

/// Confusion counts of one approach over one API's records.
pub fn score_records(records: &[FieldComparisonRecord], approach: Approach) -> ConfusionCounts {
    aggregate(records.iter().filter_map(|record| {
        classify(&record.ground_truth.target_field, record.target_for(approach))
    }))
}

/// Reads one comparison document. `None` when it is missing or malformed;
/// a readable document without fields yields `Some` of an empty list.
pub fn load_records(path: &Path) -> Option<Vec<FieldComparisonRecord>> {
    if !path.is_file() {
        warn!(path = %path.display(), "comparison document missing");
        return None;
    }

    match read_json::<ComparisonDocument>(path) {
        Ok(document) => Some(document.records()),
        Err(err) => {
            warn!(path = %path.display(), error = %format!("{err:#}"), "skipping malformed comparison document");
            None
        }
    }
}

pub fn build_report(
    config: &EvalConfig,
    comparison_dir: &Path,
    records_by_api: &[(String, Vec<FieldComparisonRecord>)],
    approaches: &[Approach],
) -> MetricsReport {
    let approaches = approaches
        .iter()
        .map(|&approach| {
            let apis = records_by_api
                .iter()
                .map(|(api, records)| {
                    let counts = score_records(records, approach);
                    ApiMetrics {
                        api: api.clone(),
                        display_name: config.display_name(api),
                        counts,
                        metrics: derive(counts),
                    }
                })
                .collect::<Vec<_>>();

            let totals = apis.iter().map(|api| api.counts).sum::<ConfusionCounts>();

            ApproachMetrics {
                approach,
                label: approach.label().to_string(),
                apis,
                totals,
                overall: derive(totals),
            }
        })
        .collect();

    MetricsReport {
        generated_at: now_utc_string(),
        comparison_dir: comparison_dir.display().to_string(),
        approaches,
    }
}

fn write_text_report<W: Write>(output: &mut W, report: &MetricsReport) -> Result<()> {
    for approach in &report.approaches {
        writeln!(output, "\n{RULE}")?;
        writeln!(output, "{} Results", approach.label)?;
        writeln!(output, "{RULE}")?;
        writeln!(
            output,
            "API Spec Name\tTP\tFP\tFN\tTN\tPrecision (%)\tRecall (%)\tF1-Score (%)"
        )?;
        for api in &approach.apis {
            writeln!(
                output,
                "{}\t{}\t{}\t{}\t{}\t{:.1}\t{:.1}\t{:.1}",
                api.display_name,
                api.counts.tp,
                api.counts.fp,
                api.counts.fn_,
                api.counts.tn,
                api.metrics.precision,
                api.metrics.recall,
                api.metrics.f1
            )?;
        }
        writeln!(
            output,
            "\nOverall: Precision={:.1}%, Recall={:.1}%, F1={:.1}%",
            approach.overall.precision, approach.overall.recall, approach.overall.f1
        )?;
        writeln!(
            output,
            "Totals: TP={}, FP={}, FN={}, TN={}",
            approach.totals.tp, approach.totals.fp, approach.totals.fn_, approach.totals.tn
        )?;
    }

    writeln!(output, "\n{RULE}")?;
    writeln!(output, "Summary Table")?;
    writeln!(output, "{RULE}")?;
    writeln!(
        output,
        "Method\tPrecision (%)\tRecall (%)\tF1-Score (%)\tTotal TP\tTotal FP\tTotal FN\tTotal TN"
    )?;
    for approach in &report.approaches {
        writeln!(
            output,
            "{}\t{:.1}\t{:.1}\t{:.1}\t{}\t{}\t{}\t{}",
            approach.label,
            approach.overall.precision,
            approach.overall.recall,
            approach.overall.f1,
            approach.totals.tp,
            approach.totals.fp,
            approach.totals.fn_,
            approach.totals.tn
        )?;
    }

    Ok(())
}
