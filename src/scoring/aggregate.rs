use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use super::classifier::ConfusionLabel;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    #[serde(rename = "TP")]
    pub tp: usize,
    #[serde(rename = "FP")]
    pub fp: usize,
    #[serde(rename = "FN")]
    pub fn_: usize,
    #[serde(rename = "TN")]
    pub tn: usize,
}

impl ConfusionCounts {
    pub fn record(&mut self, label: ConfusionLabel) {
        match label {
            ConfusionLabel::TruePositive => self.tp += 1,
            ConfusionLabel::FalsePositive => self.fp += 1,
            ConfusionLabel::FalseNegative => self.fn_ += 1,
            ConfusionLabel::TrueNegative => self.tn += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.fn_ + self.tn
    }
}

impl AddAssign for ConfusionCounts {
    fn add_assign(&mut self, other: Self) {
        self.tp += other.tp;
        self.fp += other.fp;
        self.fn_ += other.fn_;
        self.tn += other.tn;
    }
}

impl Add for ConfusionCounts {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl Sum for ConfusionCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl FromIterator<ConfusionLabel> for ConfusionCounts {
    fn from_iter<I: IntoIterator<Item = ConfusionLabel>>(iter: I) -> Self {
        let mut counts = Self::default();
        for label in iter {
            counts.record(label);
        }
        counts
    }
}

pub fn aggregate<I>(labels: I) -> ConfusionCounts
where
    I: IntoIterator<Item = ConfusionLabel>,
{
    labels.into_iter().collect()
}

/// Precision, recall and F1, all on a 0-100 scale.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl DerivedMetrics {
    pub fn rounded(self, places: i32) -> Self {
        Self {
            precision: round_to(self.precision, places),
            recall: round_to(self.recall, places),
            f1: round_to(self.f1, places),
        }
    }
}

/// F1 is taken over the percentage-scale precision and recall, which keeps it
/// on the same 0-100 scale as its inputs.
pub fn derive(counts: ConfusionCounts) -> DerivedMetrics {
    let precision = percentage(counts.tp, counts.tp + counts.fp);
    let recall = percentage(counts.tp, counts.tp + counts.fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    DerivedMetrics {
        precision,
        recall,
        f1,
    }
}

pub fn percentage(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}
