use super::sentinel::{NO_MATCH, Sentinel, UNMAPPABLE};

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Relaxed comparison of a ground-truth target against a candidate target.
///
/// Containment is accepted in both directions so a fully qualified candidate
/// path (`data.transform.worker.leave.leaveTypeCode.codeValue`) matches a
/// ground truth that only names the trailing segment, and vice versa.
pub fn is_match(ground_truth: &str, candidate: &str) -> bool {
    if Sentinel::parse(ground_truth) == Some(Sentinel::NotAvailable)
        || Sentinel::parse(candidate) == Some(Sentinel::NotAvailable)
    {
        return false;
    }

    let expected = normalize(ground_truth);
    let actual = normalize(candidate);

    if expected == UNMAPPABLE || actual == UNMAPPABLE {
        return expected == actual;
    }

    if actual == NO_MATCH.to_lowercase() {
        return false;
    }

    expected == actual || actual.contains(&expected) || expected.contains(&actual)
}
