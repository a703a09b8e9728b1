mod aggregate;
mod classifier;
mod matcher;
mod sentinel;

pub use self::aggregate::{
    ConfusionCounts, DerivedMetrics, aggregate, derive, percentage, round_to,
};
pub use self::classifier::{ConfusionLabel, classify};
pub use self::sentinel::{NO_MATCH, NOT_AVAILABLE, UNMAPPABLE};
