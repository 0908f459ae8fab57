#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::{
    constants::GRADING_ERROR_INDICATOR, controller::SubmissionOutcome, model::Expected,
};

/// Decides whether a graded outcome matches what the test expected.
///
/// * A grading error passes only when `error` was expected.
/// * A per-box expectation needs the same number of labels, equal pairwise.
/// * A single expectation is compared with the overall label.
///
/// Matching is exact.
pub fn outcome_matches(expected: &Expected, outcome: &SubmissionOutcome) -> bool {
    if outcome.overall_label.contains(GRADING_ERROR_INDICATOR) {
        return expected.is_error();
    }

    match expected {
        Expected::PerBox(labels) => labels.as_slice() == outcome.per_response_labels.as_slice(),
        Expected::Overall(label) => label.as_str() == outcome.overall_label,
    }
}
