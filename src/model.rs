#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt;

use bon::Builder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{boxes::box_coordinates, error::CheckError};

/// Position of a response among a problem's rendered answer boxes.
///
/// `x` selects the answer box and `y` the input within that box. Both count
/// from zero; platform offsets are applied by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct Coordinate {
    /// Answer box index.
    pub x: u32,
    /// Input index within the answer box.
    pub y: u32,
}

impl Coordinate {
    /// Creates a coordinate.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl From<(u32, u32)> for Coordinate {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

impl From<Coordinate> for (u32, u32) {
    fn from(c: Coordinate) -> Self {
        (c.x, c.y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A learner response for one answer box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    /// Free text, numeric, or single-choice value.
    Single(String),
    /// Every option selected in a multi-select box.
    Multiple(Vec<String>),
}

impl Response {
    /// Returns the submitted values in order.
    pub fn values(&self) -> &[String] {
        match self {
            Response::Single(value) => std::slice::from_ref(value),
            Response::Multiple(values) => values.as_slice(),
        }
    }

    /// Returns true for multi-select responses.
    pub fn is_multiple(&self) -> bool {
        matches!(self, Response::Multiple(_))
    }
}

impl From<&str> for Response {
    fn from(value: &str) -> Self {
        Response::Single(value.to_string())
    }
}

impl From<String> for Response {
    fn from(value: String) -> Self {
        Response::Single(value)
    }
}

impl From<Vec<&str>> for Response {
    fn from(values: Vec<&str>) -> Self {
        Response::Multiple(values.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for Response {
    fn from(values: Vec<String>) -> Self {
        Response::Multiple(values)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Single(value) => write!(f, "{value:?}"),
            Response::Multiple(values) => {
                write!(f, "[{}]", values.iter().map(|v| format!("{v:?}")).join(", "))
            }
        }
    }
}

/// How the platform graded one answer box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectnessLabel {
    /// Graded correct.
    Correct,
    /// Graded incorrect.
    Incorrect,
    /// The grader could not evaluate the response.
    Error,
    /// The markup carried a status that is none of the above.
    Unknown,
}

impl CorrectnessLabel {
    /// Returns the label as the platform spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectnessLabel::Correct => "correct",
            CorrectnessLabel::Incorrect => "incorrect",
            CorrectnessLabel::Error => "error",
            CorrectnessLabel::Unknown => "unknown",
        }
    }

    /// Parses an exact label name.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "correct" => Some(CorrectnessLabel::Correct),
            "incorrect" => Some(CorrectnessLabel::Incorrect),
            "error" => Some(CorrectnessLabel::Error),
            "unknown" => Some(CorrectnessLabel::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for CorrectnessLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome a test expects from the grader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expected {
    /// Compared against the platform's overall label. `Error` is the sentinel
    /// for "the grader should report an error".
    Overall(CorrectnessLabel),
    /// Compared box by box against the extracted labels.
    PerBox(Vec<CorrectnessLabel>),
}

impl Expected {
    /// Returns true when a grading error is the expected outcome.
    pub fn is_error(&self) -> bool {
        matches!(self, Expected::Overall(CorrectnessLabel::Error))
    }

    /// Expands the expectation to one label per response.
    pub fn as_per_box(&self, n_responses: usize) -> Vec<CorrectnessLabel> {
        match self {
            Expected::Overall(label) => vec![*label; n_responses],
            Expected::PerBox(labels) => labels.clone(),
        }
    }
}

impl From<CorrectnessLabel> for Expected {
    fn from(label: CorrectnessLabel) -> Self {
        Expected::Overall(label)
    }
}

impl From<Vec<CorrectnessLabel>> for Expected {
    fn from(labels: Vec<CorrectnessLabel>) -> Self {
        Expected::PerBox(labels)
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Overall(label) => write!(f, "{label}"),
            Expected::PerBox(labels) => write!(f, "[{}]", labels.iter().join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize)]
#[builder(on(String, into))]
/// A single verification case for the answer boxes of one problem.
pub struct AnswerBoxTest {
    /// The problem's url name.
    #[serde(rename = "url_name")]
    problem_id:  String,
    /// One response per answer box, in order.
    responses:   Vec<Response>,
    /// The expected grading outcome.
    #[builder(into)]
    expected:    Expected,
    /// Explicit coordinates, one per response.
    #[serde(skip_serializing_if = "Option::is_none")]
    box_indexes: Option<Vec<Coordinate>>,
    /// Display name used in reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    name:        Option<String>,
}

impl AnswerBoxTest {
    /// Returns the problem's url name.
    pub fn problem_id(&self) -> &str {
        &self.problem_id
    }

    /// Returns the responses in order.
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// Returns the expected outcome.
    pub fn expected(&self) -> &Expected {
        &self.expected
    }

    /// Returns the explicit coordinates, if any were declared.
    pub fn box_indexes(&self) -> Option<&[Coordinate]> {
        self.box_indexes.as_deref()
    }

    /// Returns the display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the display name when none was declared.
    pub(crate) fn name_if_missing(&mut self, name: impl Into<String>) {
        if self.name.is_none() {
            self.name = Some(name.into());
        }
    }

    /// Returns one coordinate per response.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        box_coordinates(self.responses.len(), self.box_indexes())
    }

    /// Checks the length invariants between responses, coordinates, and a
    /// per-box expectation.
    pub fn validate(&self) -> Result<(), CheckError> {
        if self.problem_id.trim().is_empty() {
            return Err(CheckError::configuration("test has no url_name"));
        }
        if let Expected::PerBox(labels) = &self.expected
            && labels.len() != self.responses.len()
        {
            return Err(CheckError::configuration(format!(
                "mismatched lengths responses={} ; expected={}",
                self.responses.len(),
                labels.len()
            )));
        }
        if let Some(indexes) = &self.box_indexes
            && indexes.len() != self.responses.len()
        {
            return Err(CheckError::configuration(format!(
                "mismatched lengths responses={} ; box_indexes={}",
                self.responses.len(),
                indexes.len()
            )));
        }
        Ok(())
    }

    /// Joins two tests of the same problem into one submission.
    ///
    /// The second test's boxes are shifted one position right.
    pub fn combine(&self, other: &AnswerBoxTest) -> Result<AnswerBoxTest, CheckError> {
        if self.problem_id != other.problem_id {
            return Err(CheckError::configuration(format!(
                "cannot combine tests of `{}` and `{}`",
                self.problem_id, other.problem_id
            )));
        }

        let responses = self
            .responses
            .iter()
            .chain(other.responses.iter())
            .cloned()
            .collect();
        let expected = self
            .expected
            .as_per_box(self.responses.len())
            .into_iter()
            .chain(other.expected.as_per_box(other.responses.len()))
            .collect::<Vec<_>>();
        let shifted = other
            .coordinates()
            .into_iter()
            .map(|c| {
                c.x.checked_add(1)
                    .map(|x| Coordinate::new(x, c.y))
                    .ok_or_else(|| {
                        CheckError::configuration(format!("cannot shift box index {c} right"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let box_indexes = self
            .coordinates()
            .into_iter()
            .chain(shifted)
            .collect::<Vec<_>>();
        let name = format!(
            "combination of {} and {}",
            self.name.as_deref().unwrap_or("None"),
            other.name.as_deref().unwrap_or("None")
        );

        Ok(AnswerBoxTest::builder()
            .problem_id(self.problem_id.clone())
            .responses(responses)
            .expected(expected)
            .box_indexes(box_indexes)
            .name(name)
            .build())
    }
}

impl fmt::Display for AnswerBoxTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "url_name={}, responses=[{}], expected={}",
            self.problem_id,
            self.responses.iter().join(", "),
            self.expected
        )
    }
}
