use serde::{Deserialize, Serialize};

use super::matcher::is_match;
use super::sentinel::{Role, Sentinel, sentinel_kind};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ConfusionLabel {
    #[serde(rename = "TP")]
    TruePositive,
    #[serde(rename = "FP")]
    FalsePositive,
    #[serde(rename = "FN")]
    FalseNegative,
    #[serde(rename = "TN")]
    TrueNegative,
}

/// Labels one (field, approach) pair against ground truth.
///
/// Returns `None` only when both sides are `"N/A"`; such pairs are excluded
/// from every count. A real but non-matching candidate is a false positive,
/// not a miss.
pub fn classify(ground_truth: &str, candidate: &str) -> Option<ConfusionLabel> {
    let not_available = Some(Sentinel::NotAvailable);
    if Sentinel::parse(ground_truth) == not_available && Sentinel::parse(candidate) == not_available
    {
        return None;
    }

    let expects_mapping = sentinel_kind(ground_truth, Role::GroundTruth).is_real();
    let offers_mapping = sentinel_kind(candidate, Role::Candidate).is_real();

    let label = match (expects_mapping, offers_mapping) {
        (false, false) => ConfusionLabel::TrueNegative,
        (false, true) => ConfusionLabel::FalsePositive,
        (true, false) => ConfusionLabel::FalseNegative,
        (true, true) if is_match(ground_truth, candidate) => ConfusionLabel::TruePositive,
        (true, true) => ConfusionLabel::FalsePositive,
    };

    Some(label)
}

#[cfg(test)]
mod tests {
    use super::{ConfusionLabel, classify};

    #[test]
    fn qualified_path_is_true_positive() {
        assert_eq!(
            classify(
                "leaveTypeCode.codeValue",
                "data.transform.workerLeave.leaveAbsence.leaveTypeCode.codeValue"
            ),
            Some(ConfusionLabel::TruePositive)
        );
    }

    #[test]
    fn both_not_available_is_skipped() {
        assert_eq!(classify("N/A", "N/A"), None);
    }

    #[test]
    fn unmappable_ground_truth_with_absent_candidate_is_true_negative() {
        assert_eq!(
            classify("unmappable", "N/A"),
            Some(ConfusionLabel::TrueNegative)
        );
    }

    #[test]
    fn missed_mapping_is_false_negative() {
        assert_eq!(
            classify("employee.id", "unmappable"),
            Some(ConfusionLabel::FalseNegative)
        );
        assert_eq!(
            classify("employee.id", "N/A"),
            Some(ConfusionLabel::FalseNegative)
        );
        assert_eq!(
            classify("employee.id", "(No Match)"),
            Some(ConfusionLabel::FalseNegative)
        );
    }

    #[test]
    fn invented_mapping_is_false_positive() {
        assert_eq!(
            classify("N/A", "employee.firstName"),
            Some(ConfusionLabel::FalsePositive)
        );
        assert_eq!(
            classify("derived", "employee.fullName"),
            Some(ConfusionLabel::FalsePositive)
        );
    }

    #[test]
    fn wrong_mapping_is_false_positive() {
        assert_eq!(
            classify("employee.firstName", "employee.lastName"),
            Some(ConfusionLabel::FalsePositive)
        );
    }

    #[test]
    fn every_no_mapping_ground_truth_agrees_with_every_no_mapping_candidate() {
        for ground_truth in ["N/A", "unmappable", "derived", "(No Match)"] {
            for candidate in ["N/A", "unmappable", "(No Match)"] {
                let label = classify(ground_truth, candidate);
                if ground_truth == "N/A" && candidate == "N/A" {
                    assert_eq!(label, None);
                } else {
                    assert_eq!(
                        label,
                        Some(ConfusionLabel::TrueNegative),
                        "{ground_truth} vs {candidate}"
                    );
                }
            }
        }
    }

    #[test]
    fn derived_candidate_counts_as_a_real_value() {
        assert_eq!(
            classify("unmappable", "derived"),
            Some(ConfusionLabel::FalsePositive)
        );
        assert_eq!(
            classify("employee.id", "derived"),
            Some(ConfusionLabel::FalsePositive)
        );
    }

    #[test]
    fn sentinel_spelling_is_case_sensitive() {
        // "(no match)" is not the ground-truth sentinel, so it asserts a mapping
        assert_eq!(
            classify("(no match)", "unmappable"),
            Some(ConfusionLabel::FalseNegative)
        );
    }
}
