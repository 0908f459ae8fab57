//! # edxcut
//!
//! Unit tester for edX courses. Submits declared responses to a course's
//! problems through the LMS grading endpoint and checks that each one is
//! graded with the expected correctness.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Default coordinates for answer boxes
pub mod boxes;
/// Expected-versus-graded comparison
pub mod compare;
/// Site connection settings
pub mod config;
/// Constant values used throughout
pub mod constants;
/// The per-submission retry state machine
pub mod controller;
/// A logged-in edX LMS session
pub mod edx;
/// Submission payload and status key encoding
pub mod encode;
/// Error types
pub mod error;
/// Correctness extraction from returned markup
pub mod extract;
/// The grading endpoint interface
pub mod grader;
/// Tests, responses, and labels
pub mod model;
/// Runs suites and summarizes them
pub mod runner;
/// Scaffolds tests from a course export
pub mod scaffold;
/// YAML test declaration files
pub mod suite;

pub use config::SiteConfig;
pub use controller::{SubmissionOutcome, SubmissionRetryController, Unresolved, Verdict};
pub use edx::EdxClient;
pub use error::{CheckError, LookupFailure};
pub use grader::{GraderClient, GraderReply};
pub use model::{AnswerBoxTest, Coordinate, CorrectnessLabel, Expected, Response};
pub use runner::{FailureCause, RunReport, TestResult, TestRunSummary, TestSuiteRunner};
pub use suite::TestSuite;
