//! Reserved target-field values that stand for "no real mapping".

pub const NOT_AVAILABLE: &str = "N/A";
pub const UNMAPPABLE: &str = "unmappable";
pub const DERIVED: &str = "derived";
pub const NO_MATCH: &str = "(No Match)";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Sentinel {
    /// The source never produced the field.
    NotAvailable,
    Unmappable,
    /// Computed from other fields; only meaningful on the ground-truth side.
    Derived,
    NoMatch,
}

impl Sentinel {
    pub const ALL: [Sentinel; 4] = [
        Sentinel::NotAvailable,
        Sentinel::Unmappable,
        Sentinel::Derived,
        Sentinel::NoMatch,
    ];

    /// Exact, case-sensitive literal lookup.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|sentinel| sentinel.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotAvailable => NOT_AVAILABLE,
            Self::Unmappable => UNMAPPABLE,
            Self::Derived => DERIVED,
            Self::NoMatch => NO_MATCH,
        }
    }
}

/// Which side of a comparison a target value comes from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Role {
    GroundTruth,
    Candidate,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SentinelKind {
    RealValue,
    NoMappingAsserted,
    Absent,
}

impl SentinelKind {
    pub fn is_real(self) -> bool {
        self == Self::RealValue
    }
}

/// Classifies a raw target value. `"derived"` asserts "no mapping" only when
/// ground truth says it; an approach emitting it is treated as a real value.
pub fn sentinel_kind(value: &str, role: Role) -> SentinelKind {
    match (Sentinel::parse(value), role) {
        (None, _) => SentinelKind::RealValue,
        (Some(Sentinel::NotAvailable), _) => SentinelKind::Absent,
        (Some(Sentinel::Derived), Role::Candidate) => SentinelKind::RealValue,
        (Some(_), _) => SentinelKind::NoMappingAsserted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_matches_exact_literals_only() {
        assert_eq!(Sentinel::parse("N/A"), Some(Sentinel::NotAvailable));
        assert_eq!(Sentinel::parse("(No Match)"), Some(Sentinel::NoMatch));
        assert_eq!(Sentinel::parse("n/a"), None);
        assert_eq!(Sentinel::parse("(no match)"), None);
        assert_eq!(Sentinel::parse(" unmappable"), None);
    }

    #[test]
    fn derived_is_role_dependent() {
        assert_eq!(
            sentinel_kind("derived", Role::GroundTruth),
            SentinelKind::NoMappingAsserted
        );
        assert_eq!(
            sentinel_kind("derived", Role::Candidate),
            SentinelKind::RealValue
        );
    }

    #[test]
    fn not_available_is_absent_on_both_sides() {
        assert_eq!(sentinel_kind("N/A", Role::GroundTruth), SentinelKind::Absent);
        assert_eq!(sentinel_kind("N/A", Role::Candidate), SentinelKind::Absent);
    }

    #[test]
    fn unknown_spellings_are_real_values() {
        assert_eq!(
            sentinel_kind("Unmappable", Role::Candidate),
            SentinelKind::RealValue
        );
        assert_eq!(
            sentinel_kind("worker.id", Role::GroundTruth),
            SentinelKind::RealValue
        );
    }
}
