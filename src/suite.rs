#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::{info, warn};

use crate::{
    config::SiteConfig,
    model::{AnswerBoxTest, Coordinate, CorrectnessLabel, Expected, Response},
};

/// A test as written in a declaration file, before validation.
#[derive(Deserialize)]
struct RawTest {
    /// The problem's url name.
    url_name:    Option<String>,
    /// A scalar or a sequence of scalars/sequences.
    responses:   Option<Value>,
    /// A label or a sequence of labels.
    expected:    Option<Value>,
    /// Explicit `[x, y]` pairs.
    #[serde(default)]
    box_indexes: Vec<Coordinate>,
    /// Display name.
    name:        Option<String>,
}

/// A declaration document as written on disk.
#[derive(Deserialize)]
struct RawDocument {
    /// Site settings shared by every test in the file.
    #[serde(default)]
    config: SiteConfig,
    /// The tests.
    #[serde(default)]
    tests:  Vec<Value>,
}

/// Serialized form of a suite.
#[derive(Serialize)]
struct DocumentOut<'s> {
    /// Site settings.
    config: &'s SiteConfig,
    /// The tests.
    tests:  &'s [AnswerBoxTest],
}

/// Renders a YAML scalar as a response value.
fn scalar_to_string(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => bail!("expected a scalar response, found {other:?}"),
    }
}

/// Reads `responses`: one scalar, or a sequence of scalars and sequences.
fn parse_responses(value: Value) -> Result<Vec<Response>> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::Sequence(choices) => choices
                    .iter()
                    .map(scalar_to_string)
                    .collect::<Result<Vec<_>>>()
                    .map(Response::Multiple),
                scalar => scalar_to_string(scalar).map(Response::Single),
            })
            .collect(),
        scalar => Ok(vec![Response::Single(scalar_to_string(&scalar)?)]),
    }
}

/// Reads one label name.
fn parse_label(value: &Value) -> Result<CorrectnessLabel> {
    let text = value
        .as_str()
        .ok_or_else(|| anyhow!("expected a label string, found {value:?}"))?;
    CorrectnessLabel::parse(text).ok_or_else(|| {
        anyhow!("unknown label `{text}`, expected correct, incorrect, error, or unknown")
    })
}

/// Reads `expected`: one label, or a sequence of labels.
fn parse_expected(value: Value) -> Result<Expected> {
    match value {
        Value::Sequence(items) => Ok(Expected::PerBox(
            items.iter().map(parse_label).collect::<Result<_>>()?,
        )),
        scalar => Ok(Expected::Overall(parse_label(&scalar)?)),
    }
}

impl RawTest {
    /// Builds the `position`-th test (1-based) from its raw declaration.
    ///
    /// Only the shape is checked here. Length mismatches are left for the
    /// runner to report against this one test.
    fn into_test(self, position: usize) -> Result<AnswerBoxTest> {
        let url_name = self
            .url_name
            .ok_or_else(|| anyhow!("missing url_name from test {position}"))?;
        let responses = parse_responses(
            self.responses
                .ok_or_else(|| anyhow!("missing responses from test {position}"))?,
        )?;
        let expected = parse_expected(
            self.expected
                .ok_or_else(|| anyhow!("missing expected from test {position}"))?,
        )?;
        let box_indexes = (!self.box_indexes.is_empty()).then_some(self.box_indexes);

        let mut test = AnswerBoxTest::builder()
            .problem_id(url_name)
            .responses(responses)
            .expected(expected)
            .maybe_box_indexes(box_indexes)
            .maybe_name(self.name)
            .build();
        test.name_if_missing(position.to_string());
        if let Err(err) = test.validate() {
            warn!("test {position} will fail: {err}");
        }
        Ok(test)
    }
}

/// The answer box tests declared for a course, with their site settings.
#[derive(Debug, Clone, Default)]
pub struct TestSuite {
    /// Site settings from the file's `config:` section.
    config: SiteConfig,
    /// Tests in declaration order.
    tests:  Vec<AnswerBoxTest>,
}

impl TestSuite {
    /// Creates an empty suite.
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config,
            tests: Vec::new(),
        }
    }

    /// Parses a YAML declaration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            bail!("empty test declaration");
        }
        let raw: RawDocument =
            serde_yaml::from_str(yaml).context("Could not parse test declaration YAML")?;

        let tests = raw
            .tests
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let raw_test: RawTest = serde_yaml::from_value(value)
                    .with_context(|| format!("Malformed test {}", i + 1))?;
                raw_test
                    .into_test(i + 1)
                    .with_context(|| format!("Invalid test {}", i + 1))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config: raw.config,
            tests,
        })
    }

    /// Loads a YAML declaration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Expecting test declaration file {}", path.display()))?;
        let suite = Self::from_yaml_str(&yaml)
            .with_context(|| format!("Could not load tests from {}", path.display()))?;
        info!("Loaded {} answer box tests from {}", suite.len(), path.display());
        Ok(suite)
    }

    /// Renders the suite as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&DocumentOut {
            config: &self.config,
            tests:  &self.tests,
        })
        .context("Could not serialize tests")
    }

    /// Writes the suite as YAML to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_yaml()?)
            .with_context(|| format!("Could not write tests to {}", path.display()))
    }

    /// Appends a test.
    pub fn add_test(&mut self, test: AnswerBoxTest) {
        self.tests.push(test);
    }

    /// Appends several tests.
    pub fn add_tests(&mut self, tests: impl IntoIterator<Item = AnswerBoxTest>) {
        self.tests.extend(tests);
    }

    /// Site settings declared by the file.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Tests in declaration order.
    pub fn tests(&self) -> &[AnswerBoxTest] {
        &self.tests
    }

    /// Number of tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true when the suite has no tests.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}
