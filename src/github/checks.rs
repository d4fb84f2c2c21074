//! Check classification: many check conclusions in, one build status out.

use crate::model::{BuildStatus, CheckConclusion};

/// Reduce a pull request's checks to a single build status.
///
/// First match wins:
///
/// 1. no checks → `Unknown`
/// 2. any failure or error → `Failure`
/// 3. any pending or in-progress → `Pending`
/// 4. every check succeeded → `Success`
/// 5. anything else (neutral, skipped, cancelled mixed in) → `Unknown`
///
/// `Success` is only ever reported when every check succeeded.
pub fn classify(conclusions: &[CheckConclusion]) -> BuildStatus {
    if conclusions.is_empty() {
        BuildStatus::Unknown
    } else if conclusions.iter().any(|c| c.is_failure()) {
        BuildStatus::Failure
    } else if conclusions.iter().any(|c| c.is_pending()) {
        BuildStatus::Pending
    } else if conclusions.iter().all(|&c| c == CheckConclusion::Success) {
        BuildStatus::Success
    } else {
        BuildStatus::Unknown
    }
}
