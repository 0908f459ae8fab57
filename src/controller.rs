#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use tracing::{debug, warn};

use crate::{
    constants::{MAX_OFFSET_REPARSES, MAX_RESET_CYCLES},
    encode::{IndexOffsets, ResponseEncoder, Role},
    error::CheckError,
    extract::{CorrectnessExtractor, parse_markup},
    grader::{GraderClient, GraderReply},
    model::{AnswerBoxTest, CorrectnessLabel},
};

/// The graded result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    /// The platform's overall verdict or message.
    pub overall_label:       String,
    /// One label per response; empty when the reply carried no markup.
    pub per_response_labels: Vec<CorrectnessLabel>,
}

/// A submission whose markup could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    /// The platform's overall verdict or message.
    pub overall_label: String,
    /// The last extraction error.
    pub reason:        String,
}

/// Terminal state of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Labels were extracted.
    Done(SubmissionOutcome),
    /// The markup matched no known layout, even after reparsing.
    Failed(Unresolved),
}

/// States of a single submission.
#[derive(Debug)]
enum State {
    /// About to submit.
    Init,
    /// A reply arrived.
    Submitted(GraderReply),
    /// The attempt went stale; attempts are being reset.
    Resetting,
    /// Ready to extract labels from this reply.
    Evaluated(GraderReply),
    /// Labels extracted.
    Done(SubmissionOutcome),
    /// Labels could not be extracted.
    Failed(Unresolved),
}

/// Submits a test's responses and reads back the platform's verdict,
/// recovering from stale attempts and shifted box numbering.
pub struct SubmissionRetryController<'c, C: GraderClient> {
    /// The platform session.
    client:           &'c mut C,
    /// Markup reader.
    extractor:        CorrectnessExtractor,
    /// Offsets used for the first parse.
    offsets:          IndexOffsets,
    /// Maximum number of attempt resets per submission.
    max_reset_cycles: usize,
}

impl<'c, C: GraderClient> SubmissionRetryController<'c, C> {
    /// Creates a controller with the default extractor, offsets, and bound.
    pub fn new(client: &'c mut C) -> Self {
        Self {
            client,
            extractor: CorrectnessExtractor::default(),
            offsets: IndexOffsets::default(),
            max_reset_cycles: MAX_RESET_CYCLES,
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

    /// Gives mutable access to the underlying client.
    pub fn client(&mut self) -> &mut C {
        self.client
    }

    /// Runs the submission state machine to a terminal state.
    ///
    /// Unreadable markup ends in [`Verdict::Failed`]. Configuration,
    /// transport, and attempt-reset failures are returned as errors; any
    /// failure while resetting, including a transport one, is an
    /// attempt-reset failure.
    pub fn run(&mut self, test: &AnswerBoxTest) -> Result<Verdict, CheckError> {
        let problem_id = test.problem_id();
        let coordinates = test.coordinates();
        let fields = ResponseEncoder::new(problem_id)
            .with_offsets(self.offsets)
            .encode(Role::Input, test.responses(), &coordinates)?;

        let mut resets = 0;
        let mut state = State::Init;
        loop {
            state = match state {
                State::Init => State::Submitted(self.client.submit(problem_id, &fields)?),
                State::Submitted(reply) if reply.is_stale() => {
                    if resets < self.max_reset_cycles {
                        State::Resetting
                    } else {
                        warn!(
                            problem = problem_id,
                            resets, "attempt still stale after resets, evaluating as is"
                        );
                        State::Evaluated(reply)
                    }
                }
                State::Submitted(reply) => State::Evaluated(reply),
                State::Resetting => {
                    resets += 1;
                    let username = self.client.username().to_string();
                    warn!(problem = problem_id, user = %username, resets, "stale attempt, resetting");
                    let reason = match self.client.reset_attempts(problem_id, &username) {
                        Ok(true) => None,
                        Ok(false) => Some("the platform refused the reset".to_string()),
                        Err(err) => Some(err.to_string()),
                    };
                    if let Some(reason) = reason {
                        return Err(CheckError::AttemptReset {
                            problem_id: problem_id.to_string(),
                            username,
                            reason,
                        });
                    }
                    State::Init
                }
                State::Evaluated(reply) => self.evaluate(test, reply)?,
                State::Done(outcome) => return Ok(Verdict::Done(outcome)),
                State::Failed(unresolved) => return Ok(Verdict::Failed(unresolved)),
            };
        }
    }

    /// Extracts labels from a reply, reparsing with a shifted x offset when
    /// status keys are missing.
    fn evaluate(&self, test: &AnswerBoxTest, reply: GraderReply) -> Result<State, CheckError> {
        let GraderReply {
            overall_label,
            raw_markup,
        } = reply;

        let Some(raw_markup) = raw_markup else {
            warn!(
                problem = test.problem_id(),
                overall = %overall_label,
                "reply carried no markup, empty correctness list"
            );
            return Ok(State::Done(SubmissionOutcome {
                overall_label,
                per_response_labels: Vec::new(),
            }));
        };

        let html = parse_markup(&raw_markup);
        let coordinates = test.coordinates();
        let mut offsets = self.offsets;
        let mut reparses = 0;

        loop {
            let encoder = ResponseEncoder::new(test.problem_id()).with_offsets(offsets);
            let keys = encoder.status_keys(test.responses(), &coordinates)?;
            debug!(problem = test.problem_id(), keys = ?keys.iter().map(|k| &k.key).collect::<Vec<_>>());

            let err = match self.extractor.extract(&html, &keys) {
                Ok(per_response_labels) => {
                    return Ok(State::Done(SubmissionOutcome {
                        overall_label,
                        per_response_labels,
                    }));
                }
                Err(err) => err,
            };

            let shifted = offsets.shifted_left();
            match shifted {
                Some(shifted) if err.is_status_not_found() && reparses < MAX_OFFSET_REPARSES => {
                    warn!(
                        problem = test.problem_id(),
                        "status not found in content, retrying with x index offset = {}",
                        shifted.x
                    );
                    offsets = shifted;
                    reparses += 1;
                }
                _ => {
                    warn!(problem = test.problem_id(), "{err}");
                    return Ok(State::Failed(Unresolved {
                        overall_label,
                        reason: err.to_string(),
                    }));
                }
            }
        }
    }
}
