#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use scraper::{Html, Selector};
use tracing::info;

use crate::model::{AnswerBoxTest, CorrectnessLabel, Expected, Response};

/// Builds a test per problem in a course export, submitting each textline's
/// declared `correct_answer` and expecting every box to grade correct.
///
/// Problems without such answers are skipped.
pub fn tests_from_xbundle(xml: &str) -> Vec<AnswerBoxTest> {
    let doc = Html::parse_document(xml);
    let (Ok(problems), Ok(textlines)) = (
        Selector::parse("problem"),
        Selector::parse("customresponse textline"),
    ) else {
        return Vec::new();
    };

    let tests: Vec<AnswerBoxTest> = doc
        .select(&problems)
        .filter_map(|problem| {
            let url_name = problem.value().attr("url_name")?;
            let responses: Vec<Response> = problem
                .select(&textlines)
                .filter_map(|line| line.value().attr("correct_answer"))
                .map(Response::from)
                .collect();
            if responses.is_empty() {
                return None;
            }
            let expected = Expected::PerBox(vec![CorrectnessLabel::Correct; responses.len()]);
            Some(
                AnswerBoxTest::builder()
                    .problem_id(url_name)
                    .responses(responses)
                    .expected(expected)
                    .build(),
            )
        })
        .collect();

    info!("{} tests added", tests.len());
    tests
}
