#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::{
    constants::{GRADING_ERROR_INDICATOR, STALE_ATTEMPT_SENTINEL},
    encode::EncodedField,
    error::CheckError,
};

/// What the grading endpoint returned for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraderReply {
    /// The platform's overall verdict or message (`success` in its reply).
    pub overall_label: String,
    /// Rendered problem markup (`contents` in its reply), if any.
    pub raw_markup:    Option<String>,
}

impl GraderReply {
    /// Creates a reply.
    pub fn new(overall_label: impl Into<String>, raw_markup: Option<String>) -> Self {
        Self {
            overall_label: overall_label.into(),
            raw_markup,
        }
    }

    /// Returns true when the attempt page went stale and attempts must be
    /// reset before grading resumes.
    pub fn is_stale(&self) -> bool {
        self.overall_label.contains(STALE_ATTEMPT_SENTINEL)
    }

    /// Returns true when the platform reported a grading error.
    pub fn signals_error(&self) -> bool {
        self.overall_label.contains(GRADING_ERROR_INDICATOR)
    }
}

/// The two operations the engine needs from a logged-in platform session.
///
/// Implementations own their session state; nothing here is global, so tests
/// can substitute a scripted client.
pub trait GraderClient {
    /// Submits encoded fields to the problem's grader.
    ///
    /// Transport failures must come back as [`CheckError::Transport`], never
    /// as a reply.
    fn submit(&mut self, problem_id: &str, fields: &[EncodedField])
    -> Result<GraderReply, CheckError>;

    /// Resets `username`'s attempts at `problem_id`. Returns whether the
    /// platform confirmed the reset.
    fn reset_attempts(&mut self, problem_id: &str, username: &str) -> Result<bool, CheckError>;

    /// The learner the session submits as.
    fn username(&self) -> &str;

    /// Where a human can look at the problem, for failure reports.
    fn problem_location(&self, problem_id: &str) -> String {
        problem_id.to_string()
    }
}
