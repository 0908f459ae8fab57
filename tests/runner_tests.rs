mod grader_support;

use edxcut::{
    AnswerBoxTest, Coordinate, CorrectnessLabel, FailureCause, TestSuiteRunner,
    encode::IndexOffsets,
};
use grader_support::{ScriptedGrader, markup_fixture};

use CorrectnessLabel::*;

fn suite() -> Vec<AnswerBoxTest> {
    vec![
        AnswerBoxTest::builder()
            .problem_id("75f9562c77bc4858b61f907bb810d974")
            .responses(vec!["43.141".into(), "4500".into(), "5".into()])
            .expected(vec![Incorrect, Correct, Correct])
            .name("numeric boxes".to_string())
            .build(),
        AnswerBoxTest::builder()
            .problem_id("unreachable_problem")
            .responses(vec!["anything".into()])
            .expected(Correct)
            .name("offline".to_string())
            .build(),
        AnswerBoxTest::builder()
            .problem_id("0d759dee4f9d459c8956136dbde55f02")
            .responses(vec!["France".into()])
            .expected(Correct)
            .build(),
        AnswerBoxTest::builder()
            .problem_id("75f9562c77bc4858b61f907bb810d974")
            .responses(vec!["3.141".into(), "4500".into(), "5".into()])
            .expected(Correct)
            .name("overall only".to_string())
            .build(),
    ]
}

fn grader() -> ScriptedGrader {
    let numeric = markup_fixture("numeric_three_boxes.html");
    ScriptedGrader::new()
        .always("75f9562c77bc4858b61f907bb810d974", "incorrect", Some(numeric))
        .fail("unreachable_problem", "connection reset by peer")
        .always("0d759dee4f9d459c8956136dbde55f02", "correct", None)
}

#[test]
fn a_transport_failure_does_not_stop_the_run() {
    let tests = suite();
    let mut grader = grader();
    let mut out = Vec::new();

    let report = TestSuiteRunner::new(&mut grader)
        .run(&tests, &mut out)
        .expect("write to buffer");

    assert_eq!(report.results.len(), 4);
    assert!(report.results[0].ok());
    assert!(!report.results[1].ok());
    assert!(matches!(
        report.results[1].failure(),
        Some(FailureCause::Transport(_))
    ));
    assert!(report.results[1].overall_label().is_none());
    assert!(report.results[2].ok());
    assert!(!report.results[3].ok(), "overall label was incorrect");
    assert!(report.results[3].failure().is_none());

    let summary = &report.summary;
    assert_eq!(summary.n_tests_ran(), 4);
    assert_eq!(summary.n_passed(), 2);
    assert_eq!(summary.n_failed(), 2);
    assert_eq!(summary.n_problems(), 3);
    assert!(!summary.all_passed());
    assert_eq!(
        summary.to_string(),
        "4 total tests, on 3 unique problems; 2 passed, 2 failed"
    );

    // the unreachable problem was still tried once
    assert_eq!(grader.submissions_to("unreachable_problem"), 1);
    assert_eq!(grader.submissions.len(), 4);
}

#[test]
fn status_lines_are_written_in_order() {
    colored::control::set_override(false);

    let tests = suite();
    let mut grader = grader();
    let mut out = Vec::new();
    TestSuiteRunner::new(&mut grader)
        .run(&tests, &mut out)
        .expect("write to buffer");

    let text = String::from_utf8(out).expect("utf8 output");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Test 1: OK [numeric boxes]");
    assert!(lines[1].starts_with("Test 2: Failure! [offline] url_name=unreachable_problem"));
    assert_eq!(lines[2], "   --> got correctness_list=[], overall=<no reply>");
    assert!(lines[3].starts_with("   --> transport failure:"));
    assert!(lines[3].contains("connection reset by peer"));
    assert_eq!(lines[4], "Test 3: OK");
    assert!(lines[5].starts_with("Test 4: Failure! [overall only]"));
    assert_eq!(
        lines[6],
        "   --> got correctness_list=[incorrect, correct, correct], overall=incorrect"
    );
    assert_eq!(lines.len(), 7);
}

#[test]
fn invalid_tests_fail_without_a_submission() {
    let tests = vec![
        AnswerBoxTest::builder()
            .problem_id("p")
            .responses(vec!["a".into(), "b".into()])
            .expected(vec![Correct])
            .build(),
        AnswerBoxTest::builder()
            .problem_id("")
            .responses(vec!["a".into()])
            .expected(Correct)
            .build(),
    ];
    let mut grader = ScriptedGrader::new().always("p", "correct", None);
    let mut out = Vec::new();

    let report = TestSuiteRunner::new(&mut grader)
        .run(&tests, &mut out)
        .expect("write to buffer");

    assert_eq!(report.summary.n_failed(), 2);
    for result in &report.results {
        assert!(matches!(
            result.failure(),
            Some(FailureCause::Configuration(_))
        ));
    }
    assert!(grader.submissions.is_empty());
}

#[test]
fn unresolved_markup_is_reported_apart_from_mismatches() {
    let test = AnswerBoxTest::builder()
        .problem_id("Sample_ChemFormula_Problem")
        .responses(vec!["H2SO4".into()])
        .expected(Correct)
        .build();
    let mut grader = ScriptedGrader::new().reply(
        "Sample_ChemFormula_Problem",
        "correct",
        Some(markup_fixture("unrecognized.html")),
    );

    let result = TestSuiteRunner::new(&mut grader).run_test(&test);
    assert!(!result.ok());
    assert_eq!(result.overall_label(), Some("correct"));
    assert!(matches!(
        result.failure(),
        Some(FailureCause::UnresolvedMarkup(_))
    ));
}

#[test]
fn configured_offsets_reach_the_controller() {
    let test = AnswerBoxTest::builder()
        .problem_id("Sample_Algebraic_Problem")
        .responses(vec!["A*x^2 + sqrt(y)".into(), "A*x^2 - sqrt(y)".into()])
        .expected(vec![Correct, Incorrect])
        .build();
    let mut grader = ScriptedGrader::new().always(
        "Sample_Algebraic_Problem",
        "incorrect",
        Some(markup_fixture("one_based_boxes.html")),
    );

    let result = TestSuiteRunner::new(&mut grader)
        .with_offsets(IndexOffsets { x: 1, y: 1 })
        .run_test(&test);
    assert!(result.ok());
    assert_eq!(
        grader.submissions[0].1[0].key,
        "input_Sample_Algebraic_Problem_1_1"
    );
}

#[test]
fn summaries_merge_across_files() {
    let tests = suite();
    let mut out = Vec::new();

    let mut first_grader = grader();
    let first = TestSuiteRunner::new(&mut first_grader)
        .run(&tests[..2], &mut out)
        .expect("write to buffer")
        .summary;
    let mut second_grader = grader();
    let second = TestSuiteRunner::new(&mut second_grader)
        .run(&tests[2..], &mut out)
        .expect("write to buffer")
        .summary;

    let overall = first.merge(&second);
    assert_eq!(overall.n_tests_ran(), 4);
    assert_eq!(overall.n_passed(), 2);
    assert_eq!(overall.n_failed(), 2);
    // the numeric problem appears in both halves
    assert_eq!(overall.n_problems(), 3);

    let table = overall.table("Overall");
    assert!(table.contains("Overall"));
    assert!(table.contains("Passed"));
}

#[test]
fn out_of_range_box_index_fails_only_its_test() {
    let tests = vec![
        AnswerBoxTest::builder()
            .problem_id("p")
            .responses(vec!["a".into()])
            .expected(Correct)
            .box_indexes(vec![Coordinate::new(u32::MAX, 0)])
            .build(),
        AnswerBoxTest::builder()
            .problem_id("0d759dee4f9d459c8956136dbde55f02")
            .responses(vec!["France".into()])
            .expected(Correct)
            .build(),
    ];
    let mut grader = grader().always("p", "correct", None);
    let mut out = Vec::new();

    let report = TestSuiteRunner::new(&mut grader)
        .run(&tests, &mut out)
        .expect("write to buffer");

    assert!(matches!(
        report.results[0].failure(),
        Some(FailureCause::Configuration(_))
    ));
    assert!(report.results[1].ok());
    assert_eq!(report.summary.n_tests_ran(), 2);
    assert_eq!(grader.submissions_to("p"), 0);
    assert_eq!(grader.submissions_to("0d759dee4f9d459c8956136dbde55f02"), 1);
}

#[test]
fn passing_test_still_reports_unknown_boxes() {
    colored::control::set_override(false);

    let test = AnswerBoxTest::builder()
        .problem_id("Sample_MultipleChoice")
        .responses(vec!["choice_0".into(), "choice_5".into()])
        .expected(Correct)
        .name("choices".to_string())
        .build();
    let mut grader = ScriptedGrader::new().reply(
        "Sample_MultipleChoice",
        "correct",
        Some(markup_fixture("label_ids.html")),
    );

    let result = TestSuiteRunner::new(&mut grader).run_test(&test);
    assert!(result.ok());
    assert_eq!(result.per_response_labels(), &[Unknown, Correct]);
    assert_eq!(
        result.status_line(1),
        "Test 1: OK [choices]\n   --> warning: unknown correctness in [unknown, correct]"
    );
}
