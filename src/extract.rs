#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Reads per-box correctness out of the markup the grading endpoint returns.
//!
//! The platform has encoded correctness in several layouts over the years, and
//! even the element ids moved (`input_...`, then `status_...`, then
//! `...-label`). Each layout gets one lookup strategy; strategies are tried in
//! order and the first element found wins. A later layout is supported by
//! appending a strategy.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use crate::{
    constants::{CLASS_NOISE, INPUT_PREFIX, STATUS_PREFIX},
    encode::StatusKey,
    error::{CheckError, LookupFailure},
    model::CorrectnessLabel,
};

/// Locates the status element for a key within parsed markup.
pub type LookupFn = for<'h> fn(&'h Html, &StatusKey<'_>) -> Option<ElementRef<'h>>;

/// A named lookup for one markup layout.
#[derive(Clone, Copy)]
pub struct LookupStrategy {
    /// Short description of the layout, used in logs.
    pub name:   &'static str,
    /// The lookup itself.
    pub lookup: LookupFn,
}

impl std::fmt::Debug for LookupStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupStrategy")
            .field("name", &self.name)
            .finish()
    }
}

/// Known layouts, oldest first.
pub const LOOKUP_STRATEGIES: &[LookupStrategy] = &[
    LookupStrategy {
        name:   "text input status div",
        lookup: status_div,
    },
    LookupStrategy {
        name:   "unanswered choice status span",
        lookup: status_span,
    },
    LookupStrategy {
        name:   "choice input label keyed by value",
        lookup: choice_label_for,
    },
    LookupStrategy {
        name:   "choice label id with value suffix",
        lookup: choice_label_id,
    },
];

/// Returns the first `tag` element whose `attr` equals `value`.
fn find_by_attr<'h>(html: &'h Html, tag: &str, attr: &str, value: &str) -> Option<ElementRef<'h>> {
    let selector = Selector::parse(tag).ok()?;
    html.select(&selector)
        .find(|el| el.value().attr(attr) == Some(value))
}

/// Strips the `status_` prefix, leaving `<problem>_<x>_<y>`.
fn key_suffix<'k>(status: &'k StatusKey<'_>) -> &'k str {
    status
        .key
        .strip_prefix(STATUS_PREFIX)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(&status.key)
}

/// `<div id="status_<problem>_<x>_<y>" class="correct">`, used by text and
/// numeric inputs.
fn status_div<'h>(html: &'h Html, status: &StatusKey<'_>) -> Option<ElementRef<'h>> {
    find_by_attr(html, "div", "id", &status.key)
}

/// `<span id="status_<problem>_<x>_<y>" class="status unanswered">`, used by
/// choice groups nobody answered.
fn status_span<'h>(html: &'h Html, status: &StatusKey<'_>) -> Option<ElementRef<'h>> {
    find_by_attr(html, "span", "id", &status.key)
}

/// `<label for="input_<problem>_<x>_<y>_choice_2" class="choicegroup_correct">`.
/// The id embeds the selected option rather than a position.
fn choice_label_for<'h>(html: &'h Html, status: &StatusKey<'_>) -> Option<ElementRef<'h>> {
    let suffix = key_suffix(status);
    status.response.values().iter().find_map(|value| {
        let id = format!("{INPUT_PREFIX}_{suffix}_{value}");
        find_by_attr(html, "label", "for", &id)
    })
}

/// `<label id="<problem>_<x>_<y>-choice_5-label" class="... choicegroup_correct">`.
fn choice_label_id<'h>(html: &'h Html, status: &StatusKey<'_>) -> Option<ElementRef<'h>> {
    let suffix = key_suffix(status);
    status.response.values().iter().find_map(|value| {
        let id = format!("{suffix}-{value}-label");
        find_by_attr(html, "label", "id", &id)
    })
}

/// Classifies a status element's class attribute.
///
/// Returns `None` when the attribute is blank. Of several classes, the last
/// one mentioning `correct` is used; layout noise such as `choicegroup_` and
/// `status` is stripped before matching.
pub fn label_from_class(class: &str) -> Option<CorrectnessLabel> {
    let class = class.trim();
    if class.is_empty() {
        return None;
    }

    let token = class
        .split_whitespace()
        .rev()
        .find(|token| token.contains("correct"))
        .unwrap_or(class);
    let label = CLASS_NOISE
        .iter()
        .fold(token.to_string(), |acc, noise| acc.replace(noise, ""));

    Some(CorrectnessLabel::parse(label.trim()).unwrap_or(CorrectnessLabel::Unknown))
}

/// Parses raw markup returned by the grader.
pub fn parse_markup(raw: &str) -> Html {
    Html::parse_document(raw)
}

/// Extracts one correctness label per status key.
#[derive(Debug, Clone)]
pub struct CorrectnessExtractor {
    /// Lookups tried in order for every key.
    strategies: Vec<LookupStrategy>,
}

impl Default for CorrectnessExtractor {
    fn default() -> Self {
        Self {
            strategies: LOOKUP_STRATEGIES.to_vec(),
        }
    }
}

impl CorrectnessExtractor {
    /// Creates an extractor that knows every built-in layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a lookup for a newer layout, tried after the existing ones.
    pub fn with_strategy(mut self, strategy: LookupStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Returns the strategies in the order they are tried.
    pub fn strategies(&self) -> &[LookupStrategy] {
        &self.strategies
    }

    /// Finds the status element for `status`.
    fn locate<'h>(&self, html: &'h Html, status: &StatusKey<'_>) -> Option<ElementRef<'h>> {
        self.strategies.iter().find_map(|strategy| {
            let found = (strategy.lookup)(html, status);
            trace!(key = %status.key, strategy = strategy.name, found = found.is_some());
            found
        })
    }

    /// Returns one label per key, in key order.
    ///
    /// Fails with `StatusNotFound` as soon as a key matches no layout, and
    /// with `Unparsable` when a located element has no usable class.
    pub fn extract(
        &self,
        html: &Html,
        keys: &[StatusKey<'_>],
    ) -> Result<Vec<CorrectnessLabel>, CheckError> {
        keys.iter()
            .map(|status| {
                let element =
                    self.locate(html, status)
                        .ok_or_else(|| CheckError::MarkupExtraction {
                            kind:   LookupFailure::StatusNotFound,
                            key:    status.key.clone(),
                            markup: html.html(),
                        })?;

                let label = element
                    .value()
                    .attr("class")
                    .and_then(label_from_class)
                    .ok_or_else(|| CheckError::MarkupExtraction {
                        kind:   LookupFailure::Unparsable,
                        key:    status.key.clone(),
                        markup: html.html(),
                    })?;

                debug!(key = %status.key, %label, "extracted correctness");
                Ok(label)
            })
            .collect()
    }
}
