use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use tracing::{error, info};

use crate::cli::CompareArgs;
use crate::commands::metrics::score_records;
use crate::extraction::load_field_mappings;
use crate::layout::{SUMMARY_FILE_NAME, SourceLayout, comparison_file_name};
use crate::model::{
    ApiAccuracy, Approach, ApproachScore, ComparisonDocument, ExactAccuracy,
    FieldComparisonRecord, OverallAccuracy, Source, SummaryDocument,
};
use crate::scoring::{NOT_AVAILABLE, UNMAPPABLE, derive, percentage, round_to};
use crate::util::{ensure_directory, now_utc_string, write_json_pretty};

pub fn run(args: CompareArgs) -> Result<()> {
    let config = args.workspace.load_config()?;
    let layout = SourceLayout::new(&args.workspace.base_dir, &config);
    let apis = config.selected_apis(&args.apis)?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| layout.comparison_dir());
    ensure_directory(&output_dir)?;

    info!(
        base_dir = %args.workspace.base_dir.display(),
        output_dir = %output_dir.display(),
        apis = apis.len(),
        "starting comparison"
    );

    let mut accuracy_by_api = Vec::with_capacity(apis.len());
    for api in &apis {
        let comparison = build_comparison(&layout, api);
        let path = output_dir.join(comparison_file_name(api));

        if let Err(err) = write_json_pretty(&path, &comparison) {
            error!(api = %api, error = %format!("{err:#}"), "failed to write comparison");
            continue;
        }

        info!(
            api = %api,
            fields = comparison.total_fields,
            path = %path.display(),
            "wrote comparison"
        );
        accuracy_by_api.push((api.clone(), comparison.accuracy_metrics));
    }

    let summary = build_summary(&accuracy_by_api);
    let summary_path = output_dir.join(SUMMARY_FILE_NAME);
    write_json_pretty(&summary_path, &summary)?;
    info!(path = %summary_path.display(), apis = summary.total_apis_analyzed, "wrote summary");

    let mut output = io::BufWriter::new(io::stdout().lock());
    write_accuracy_table(&mut output, &summary)?;
    output.flush()?;

    Ok(())
}

/// Extracts every source for `api` and lines them up per field name.
pub fn build_comparison(layout: &SourceLayout, api: &str) -> ComparisonDocument {
    let mut extracted = BTreeMap::new();
    let mut files_analyzed = BTreeMap::new();

    for source in Source::ALL {
        let path = layout.source_path(api, source);
        files_analyzed.insert(source.key().to_string(), file_name(&path));
        extracted.insert(source, load_field_mappings(&path));
    }

    let field_names = extracted
        .values()
        .flat_map(|fields| fields.keys())
        .collect::<BTreeSet<_>>();

    let records = field_names
        .into_iter()
        .map(|field_name| FieldComparisonRecord::assemble(field_name, &extracted))
        .collect::<Vec<_>>();

    ComparisonDocument {
        api_name: api.to_string(),
        total_fields: records.len(),
        files_analyzed,
        fields_comparison: records
            .iter()
            .map(|record| (record.field_name.clone(), record.to_sources()))
            .collect(),
        accuracy_metrics: exact_accuracy(&records),
        confusion_metrics: confusion_metrics(&records),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Exact-string accuracy. Pairs where either side is `"N/A"` are not
/// evaluated; any `"unmappable"` side is tallied separately.
pub fn exact_accuracy(records: &[FieldComparisonRecord]) -> BTreeMap<Approach, ExactAccuracy> {
    let mut metrics = Approach::ALL
        .into_iter()
        .map(|approach| (approach, ExactAccuracy::default()))
        .collect::<BTreeMap<_, _>>();

    for record in records {
        let expected = record.ground_truth.target_field.as_str();
        if expected == NOT_AVAILABLE {
            continue;
        }

        for (approach, counts) in metrics.iter_mut() {
            let actual = record.target_for(*approach);
            if actual == NOT_AVAILABLE {
                continue;
            } else if actual == UNMAPPABLE || expected == UNMAPPABLE {
                counts.unmappable += 1;
            } else if actual == expected {
                counts.correct += 1;
            } else {
                counts.incorrect += 1;
            }
        }
    }

    for counts in metrics.values_mut() {
        counts.total_evaluated = counts.correct + counts.incorrect + counts.unmappable;
        counts.accuracy = round_to(percentage(counts.correct, counts.total_evaluated), 2);
    }

    metrics
}

fn confusion_metrics(records: &[FieldComparisonRecord]) -> BTreeMap<Approach, ApproachScore> {
    Approach::ALL
        .into_iter()
        .map(|approach| {
            let counts = score_records(records, approach);
            let metrics = derive(counts).rounded(2);
            (approach, ApproachScore { counts, metrics })
        })
        .collect()
}

pub fn build_summary(
    accuracy_by_api: &[(String, BTreeMap<Approach, ExactAccuracy>)],
) -> SummaryDocument {
    let mut overall_metrics = Approach::ALL
        .into_iter()
        .map(|approach| (approach, OverallAccuracy::default()))
        .collect::<BTreeMap<_, _>>();
    let mut per_api_summary = BTreeMap::new();

    for (api, metrics) in accuracy_by_api {
        let mut api_summary = BTreeMap::new();

        for approach in Approach::ALL {
            let accuracy = metrics.get(&approach).copied().unwrap_or_default();
            api_summary.insert(
                approach,
                ApiAccuracy {
                    accuracy: accuracy.accuracy,
                    correct: accuracy.correct,
                    total: accuracy.total_evaluated,
                },
            );

            if let Some(overall) = overall_metrics.get_mut(&approach) {
                overall.total_correct += accuracy.correct;
                overall.total_incorrect += accuracy.incorrect;
                overall.total_unmappable += accuracy.unmappable;
            }
        }

        per_api_summary.insert(api.clone(), api_summary);
    }

    for totals in overall_metrics.values_mut() {
        totals.total_evaluated =
            totals.total_correct + totals.total_incorrect + totals.total_unmappable;
        totals.overall_accuracy =
            round_to(percentage(totals.total_correct, totals.total_evaluated), 2);
    }

    SummaryDocument {
        total_apis_analyzed: accuracy_by_api.len(),
        generated_at: now_utc_string(),
        overall_metrics,
        per_api_summary,
    }
}

fn write_accuracy_table<W: Write>(output: &mut W, summary: &SummaryDocument) -> Result<()> {
    writeln!(output, "=== Overall Accuracy Summary ===")?;
    for (approach, totals) in &summary.overall_metrics {
        writeln!(
            output,
            "{:20}: {:6.2}% ({}/{} correct)",
            approach.key(),
            totals.overall_accuracy,
            totals.total_correct,
            totals.total_evaluated
        )?;
    }
    Ok(())
}
