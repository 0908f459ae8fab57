#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::BTreeSet, fmt, io::Write};

use colored::Colorize;
use itertools::Itertools;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, object::Rows},
};
use tracing::{debug, error};

use crate::{
    compare::outcome_matches,
    controller::{SubmissionRetryController, Verdict},
    encode::IndexOffsets,
    error::CheckError,
    extract::CorrectnessExtractor,
    grader::GraderClient,
    model::{AnswerBoxTest, CorrectnessLabel},
};

/// Why a test failed without a usable verdict.
///
/// Kept apart from an ordinary mismatch so markup drift and infrastructure
/// trouble never read as a grading regression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The test declaration is malformed.
    Configuration(String),
    /// The markup matched no known layout.
    UnresolvedMarkup(String),
    /// Attempts could not be reset.
    AttemptReset(String),
    /// The grader never replied.
    Transport(String),
}

impl From<&CheckError> for FailureCause {
    fn from(err: &CheckError) -> Self {
        let msg = err.to_string();
        match err {
            CheckError::Configuration(_) => FailureCause::Configuration(msg),
            CheckError::MarkupExtraction { .. } => FailureCause::UnresolvedMarkup(msg),
            CheckError::AttemptReset { .. } => FailureCause::AttemptReset(msg),
            CheckError::Transport(_) => FailureCause::Transport(msg),
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Configuration(msg) => write!(f, "configuration error: {msg}"),
            FailureCause::UnresolvedMarkup(msg) => write!(f, "unresolved markup: {msg}"),
            FailureCause::AttemptReset(msg) => write!(f, "attempt reset failed: {msg}"),
            FailureCause::Transport(msg) => write!(f, "transport failure: {msg}"),
        }
    }
}

/// The result of running one test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult<'t> {
    /// Whether the graded outcome matched the expectation.
    ok:                  bool,
    /// Extracted labels, one per response; empty when none could be read.
    per_response_labels: Vec<CorrectnessLabel>,
    /// The platform's overall verdict, if a reply arrived.
    overall_label:       Option<String>,
    /// Set when the test failed without a usable verdict.
    failure:             Option<FailureCause>,
    /// The test that produced this result.
    test:                &'t AnswerBoxTest,
}

impl<'t> TestResult<'t> {
    /// Builds a result for a test that could not be graded.
    fn failed(test: &'t AnswerBoxTest, overall_label: Option<String>, cause: FailureCause) -> Self {
        Self {
            ok: false,
            per_response_labels: Vec::new(),
            overall_label,
            failure: Some(cause),
            test,
        }
    }

    /// Whether the graded outcome matched the expectation.
    pub fn ok(&self) -> bool {
        self.ok
    }

    /// Extracted labels, one per response.
    pub fn per_response_labels(&self) -> &[CorrectnessLabel] {
        &self.per_response_labels
    }

    /// The platform's overall verdict, if a reply arrived.
    pub fn overall_label(&self) -> Option<&str> {
        self.overall_label.as_deref()
    }

    /// Why the test failed without a usable verdict, if it did.
    pub fn failure(&self) -> Option<&FailureCause> {
        self.failure.as_ref()
    }

    /// The test that produced this result.
    pub fn test(&self) -> &'t AnswerBoxTest {
        self.test
    }

    /// Human-readable status line(s) for the `index`-th test (1-based).
    ///
    /// A passing test still gets a warning line when a box read as `unknown`.
    pub fn status_line(&self, index: usize) -> String {
        let name = self
            .test
            .name()
            .map(|name| format!(" [{name}]"))
            .unwrap_or_default();

        if self.ok {
            let ok_line = format!("Test {index}: {}{name}", "OK".green());
            if !self.per_response_labels.contains(&CorrectnessLabel::Unknown) {
                return ok_line;
            }
            return format!(
                "{ok_line}\n   --> {} unknown correctness in [{}]",
                "warning:".yellow(),
                self.per_response_labels.iter().join(", ")
            );
        }

        let mut lines = vec![
            format!("Test {index}: {}{name} {}", "Failure!".red().bold(), self.test),
            format!(
                "   --> got correctness_list=[{}], overall={}",
                self.per_response_labels.iter().join(", "),
                self.overall_label.as_deref().unwrap_or("<no reply>")
            ),
        ];
        if let Some(cause) = &self.failure {
            lines.push(format!("   --> {cause}"));
        }
        lines.join("\n")
    }
}

/// Counters over a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestRunSummary {
    /// Tests executed.
    n_tests_ran: usize,
    /// Tests whose outcome matched.
    n_passed:    usize,
    /// Tests that failed for any reason.
    n_failed:    usize,
    /// Distinct problem ids exercised.
    problems:    BTreeSet<String>,
}

/// Single-row view of a summary for table rendering.
#[derive(Tabled)]
struct SummaryRow {
    /// Tests executed.
    #[tabled(rename = "Tests")]
    tests:    usize,
    /// Distinct problems.
    #[tabled(rename = "Problems")]
    problems: usize,
    /// Tests passed.
    #[tabled(rename = "Passed")]
    passed:   usize,
    /// Tests failed.
    #[tabled(rename = "Failed")]
    failed:   usize,
}

impl TestRunSummary {
    /// Tests executed.
    pub fn n_tests_ran(&self) -> usize {
        self.n_tests_ran
    }

    /// Tests whose outcome matched.
    pub fn n_passed(&self) -> usize {
        self.n_passed
    }

    /// Tests that failed.
    pub fn n_failed(&self) -> usize {
        self.n_failed
    }

    /// Distinct problem ids exercised.
    pub fn n_problems(&self) -> usize {
        self.problems.len()
    }

    /// Returns true when no test failed.
    pub fn all_passed(&self) -> bool {
        self.n_failed == 0
    }

    /// Combines two summaries; problems shared by both are counted once.
    pub fn merge(&self, other: &TestRunSummary) -> TestRunSummary {
        TestRunSummary {
            n_tests_ran: self.n_tests_ran + other.n_tests_ran,
            n_passed:    self.n_passed + other.n_passed,
            n_failed:    self.n_failed + other.n_failed,
            problems:    self.problems.union(&other.problems).cloned().collect(),
        }
    }

    /// Renders the summary as a table.
    pub fn table(&self, title: &str) -> String {
        let row = SummaryRow {
            tests:    self.n_tests_ran,
            problems: self.n_problems(),
            passed:   self.n_passed,
            failed:   self.n_failed,
        };
        Table::new([row])
            .with(Panel::header(title))
            .with(Style::modern())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string()
    }
}

impl fmt::Display for TestRunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} total tests, on {} unique problems; {} passed, {} failed",
            self.n_tests_ran,
            self.n_problems(),
            self.n_passed,
            self.n_failed
        )
    }
}

/// Running counters, frozen into a [`TestRunSummary`] when the run ends.
#[derive(Default)]
struct Tally(TestRunSummary);

impl Tally {
    /// Folds one result into the counters.
    fn record(&mut self, result: &TestResult<'_>) {
        let summary = &mut self.0;
        summary.n_tests_ran += 1;
        if result.ok {
            summary.n_passed += 1;
        } else {
            summary.n_failed += 1;
        }
        summary
            .problems
            .insert(result.test.problem_id().to_string());
    }

    /// Ends the run.
    fn finish(self) -> TestRunSummary {
        self.0
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunReport<'t> {
    /// Final counters.
    pub summary: TestRunSummary,
    /// One result per test, in declaration order.
    pub results: Vec<TestResult<'t>>,
}

/// Runs answer box tests one after another against a grader.
pub struct TestSuiteRunner<'c, C: GraderClient> {
    /// The platform session.
    client:    &'c mut C,
    /// Markup reader handed to each submission.
    extractor: CorrectnessExtractor,
    /// Offsets used for the first parse of each submission.
    offsets:   IndexOffsets,
}

impl<'c, C: GraderClient> TestSuiteRunner<'c, C> {
    /// Creates a runner over a platform session.
    pub fn new(client: &'c mut C) -> Self {
        Self {
            client,
            extractor: CorrectnessExtractor::default(),
            offsets: IndexOffsets::default(),
        }
    }

    /// Replaces the markup extractor.
    pub fn with_extractor(mut self, extractor: CorrectnessExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replaces the platform offsets.
    pub fn with_offsets(mut self, offsets: IndexOffsets) -> Self {
        self.offsets = offsets;
        self
    }

    /// Runs one test. Every failure is folded into the result.
    pub fn run_test<'t>(&mut self, test: &'t AnswerBoxTest) -> TestResult<'t> {
        if let Err(err) = test.validate() {
            return TestResult::failed(test, None, FailureCause::from(&err));
        }

        let verdict = SubmissionRetryController::new(&mut *self.client)
            .with_extractor(self.extractor.clone())
            .with_offsets(self.offsets)
            .run(test);

        match verdict {
            Ok(Verdict::Done(outcome)) => {
                let ok = outcome_matches(test.expected(), &outcome);
                debug!(
                    problem = test.problem_id(),
                    labels = ?outcome.per_response_labels,
                    overall = %outcome.overall_label,
                    ok
                );
                TestResult {
                    ok,
                    per_response_labels: outcome.per_response_labels,
                    overall_label: Some(outcome.overall_label),
                    failure: None,
                    test,
                }
            }
            Ok(Verdict::Failed(unresolved)) => TestResult::failed(
                test,
                Some(unresolved.overall_label),
                FailureCause::UnresolvedMarkup(unresolved.reason),
            ),
            Err(err) => {
                error!(
                    problem = test.problem_id(),
                    at = %self.client.problem_location(test.problem_id()),
                    "{err}; skipping problem"
                );
                TestResult::failed(test, None, FailureCause::from(&err))
            }
        }
    }

    /// Runs every test in order, writing a status line per test to `out`.
    pub fn run<'t, W: Write>(
        &mut self,
        tests: &'t [AnswerBoxTest],
        out: &mut W,
    ) -> std::io::Result<RunReport<'t>> {
        let mut tally = Tally::default();
        let mut results = Vec::with_capacity(tests.len());

        for (index, test) in tests.iter().enumerate() {
            let result = self.run_test(test);
            tally.record(&result);
            writeln!(out, "{}", result.status_line(index + 1))?;
            out.flush()?;
            results.push(result);
        }

        Ok(RunReport {
            summary: tally.finish(),
            results,
        })
    }
}
