#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt;

/// Why a status key could not be turned into a correctness label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFailure {
    /// None of the lookup strategies located an element for the key.
    StatusNotFound,
    /// An element was located but its class attribute is absent or blank.
    Unparsable,
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupFailure::StatusNotFound => write!(f, "failed to find status in content"),
            LookupFailure::Unparsable => write!(f, "failed to read correctness class"),
        }
    }
}

/// Errors raised while verifying a single answer box test.
#[derive(thiserror::Error, Debug)]
pub enum CheckError {
    /// The test declaration is malformed.
    #[error("Invalid test configuration: {0}")]
    Configuration(String),
    /// The returned markup does not match any known layout for a status key.
    #[error("{kind} for `{key}`, contents=\n```\n{markup}\n```")]
    MarkupExtraction {
        /// Which stage of the lookup failed.
        kind:   LookupFailure,
        /// The status key (or last alternate identifier) that was searched.
        key:    String,
        /// Serialized markup, kept for diagnosing layout drift.
        markup: String,
    },
    /// The platform refused or failed to reset student attempts.
    #[error("Failed to reset attempts for `{problem_id}` (user `{username}`): {reason}")]
    AttemptReset {
        /// Problem whose attempts were being reset.
        problem_id: String,
        /// Learner whose attempts were being reset.
        username:   String,
        /// Refusal or the error raised while resetting.
        reason:     String,
    },
    /// The request never produced a grading reply.
    #[error("Transport failure: {0:#}")]
    Transport(#[source] anyhow::Error),
}

impl CheckError {
    /// Shorthand for building a `Configuration` error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        CheckError::Configuration(msg.into())
    }

    /// Returns true when this is a markup error whose key could not be located
    /// at all, the only case worth reparsing with shifted offsets.
    pub fn is_status_not_found(&self) -> bool {
        matches!(
            self,
            CheckError::MarkupExtraction {
                kind: LookupFailure::StatusNotFound,
                ..
            }
        )
    }
}
