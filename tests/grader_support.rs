#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    path::PathBuf,
};

use anyhow::anyhow;
use edxcut::{CheckError, GraderClient, GraderReply, encode::EncodedField};

pub fn markup_fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("markup")
        .join(name);
    std::fs::read_to_string(path).expect("read markup fixture")
}

pub fn fixture_path(dir: &str, name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(dir)
        .join(name)
}

/// A grader that replays canned replies per problem and records every call.
#[derive(Default)]
pub struct ScriptedGrader {
    replies:         HashMap<String, VecDeque<Result<GraderReply, String>>>,
    repeat:          HashMap<String, GraderReply>,
    reset_outcomes:  VecDeque<Result<bool, String>>,
    pub submissions: Vec<(String, Vec<EncodedField>)>,
    pub resets:      Vec<(String, String)>,
}

impl ScriptedGrader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for the next submission to `problem`.
    pub fn reply(mut self, problem: &str, overall: &str, markup: Option<String>) -> Self {
        self.replies
            .entry(problem.to_string())
            .or_default()
            .push_back(Ok(GraderReply::new(overall, markup)));
        self
    }

    /// Queues a transport failure for the next submission to `problem`.
    pub fn fail(mut self, problem: &str, msg: &str) -> Self {
        self.replies
            .entry(problem.to_string())
            .or_default()
            .push_back(Err(msg.to_string()));
        self
    }

    /// Replies with `overall` once the queue for `problem` is empty.
    pub fn always(mut self, problem: &str, overall: &str, markup: Option<String>) -> Self {
        self.repeat
            .insert(problem.to_string(), GraderReply::new(overall, markup));
        self
    }

    /// Queues the outcome of the next attempt reset; resets succeed otherwise.
    pub fn reset_outcome(mut self, ok: bool) -> Self {
        self.reset_outcomes.push_back(Ok(ok));
        self
    }

    /// Queues a transport failure for the next attempt reset.
    pub fn reset_fails(mut self, msg: &str) -> Self {
        self.reset_outcomes.push_back(Err(msg.to_string()));
        self
    }

    pub fn submissions_to(&self, problem: &str) -> usize {
        self.submissions
            .iter()
            .filter(|(p, _)| p == problem)
            .count()
    }
}

impl GraderClient for ScriptedGrader {
    fn submit(
        &mut self,
        problem_id: &str,
        fields: &[EncodedField],
    ) -> Result<GraderReply, CheckError> {
        self.submissions
            .push((problem_id.to_string(), fields.to_vec()));

        let queued = self
            .replies
            .get_mut(problem_id)
            .and_then(|queue| queue.pop_front());
        match queued {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(msg)) => Err(CheckError::Transport(anyhow!(msg))),
            None => self
                .repeat
                .get(problem_id)
                .cloned()
                .ok_or_else(|| CheckError::Transport(anyhow!("no reply scripted for {problem_id}"))),
        }
    }

    fn reset_attempts(&mut self, problem_id: &str, username: &str) -> Result<bool, CheckError> {
        self.resets
            .push((problem_id.to_string(), username.to_string()));
        match self.reset_outcomes.pop_front() {
            Some(Ok(ok)) => Ok(ok),
            Some(Err(msg)) => Err(CheckError::Transport(anyhow!(msg))),
            None => Ok(true),
        }
    }

    fn username(&self) -> &str {
        "staff@example.com"
    }
}
