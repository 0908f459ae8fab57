mod grader_support;

use edxcut::{
    AnswerBoxTest, CheckError, Coordinate, CorrectnessLabel, Expected, FailureCause, Response,
    SiteConfig, TestSuite, TestSuiteRunner, scaffold::tests_from_xbundle,
};
use grader_support::{ScriptedGrader, fixture_path};
use uuid::Uuid;

use CorrectnessLabel::*;

#[test]
fn loads_demo_course_declaration() {
    let suite = TestSuite::load(fixture_path("suites", "demo_course.yaml")).expect("load suite");

    let config = suite.config();
    assert_eq!(config.site_base_url.as_deref(), Some("http://192.168.33.10"));
    assert_eq!(config.username.as_deref(), Some("staff@example.com"));
    assert_eq!(
        config.course_id.as_deref(),
        Some("course-v1:edX+DemoX+Demo_Course")
    );
    assert!(config.password.is_none());

    assert_eq!(suite.len(), 3);
    let tests = suite.tests();

    assert_eq!(tests[0].problem_id(), "75f9562c77bc4858b61f907bb810d974");
    assert_eq!(tests[0].name(), Some("numeric boxes"));
    assert_eq!(
        tests[0].expected(),
        &Expected::PerBox(vec![Incorrect, Correct, Correct])
    );
    assert_eq!(
        tests[0].responses(),
        &[Response::from("43.141"), Response::from("4500"), Response::from("5")]
    );

    // a scalar response becomes a single box, and unnamed tests get their position
    assert_eq!(tests[1].responses(), &[Response::from("France")]);
    assert_eq!(tests[1].expected(), &Expected::Overall(Correct));
    assert_eq!(tests[1].name(), Some("2"));

    assert_eq!(tests[2].responses()[2], Response::from(vec!["choice_0", "choice_2"]));
    assert_eq!(
        tests[2].box_indexes(),
        Some(&[Coordinate::new(0, 0), Coordinate::new(1, 0), Coordinate::new(2, 0)][..])
    );
}

#[test]
fn mismatched_lengths_fail_only_their_own_test() {
    let suite = TestSuite::load(fixture_path("suites", "mismatched_lengths.yaml"))
        .expect("shape is valid");
    assert_eq!(suite.len(), 3);

    let tests = suite.tests();
    tests[0].validate().expect("first test is consistent");
    for test in &tests[1..] {
        let err = test.validate().expect_err("lengths differ");
        assert!(matches!(err, CheckError::Configuration(_)));
        assert!(err.to_string().contains("mismatched lengths"), "{err}");
    }

    let mut grader = ScriptedGrader::new()
        .always("0d759dee4f9d459c8956136dbde55f02", "correct", None)
        .always("a_problem", "correct", None);
    let mut out = Vec::new();
    let report = TestSuiteRunner::new(&mut grader)
        .run(tests, &mut out)
        .expect("write to buffer");

    assert!(report.results[0].ok());
    for result in &report.results[1..] {
        assert!(matches!(
            result.failure(),
            Some(FailureCause::Configuration(_))
        ));
    }
    assert_eq!(report.summary.n_passed(), 1);
    assert_eq!(report.summary.n_failed(), 2);
    assert_eq!(grader.submissions_to("a_problem"), 0);
}

#[test]
fn empty_and_incomplete_declarations_are_rejected() {
    assert!(TestSuite::from_yaml_str("   \n").is_err());

    let missing_expected = "tests:\n- url_name: p\n  responses: [a]\n";
    let msg = format!("{:#}", TestSuite::from_yaml_str(missing_expected).expect_err("no expected"));
    assert!(msg.contains("missing expected"), "{msg}");

    let bad_label = "tests:\n- url_name: p\n  responses: a\n  expected: maybe\n";
    let msg = format!("{:#}", TestSuite::from_yaml_str(bad_label).expect_err("bad label"));
    assert!(msg.contains("unknown label `maybe`"), "{msg}");
}

#[test]
fn numeric_scalars_become_strings() {
    let yaml = "tests:\n- url_name: p\n  responses: [4500, 3.5, true]\n  expected: correct\n";
    let suite = TestSuite::from_yaml_str(yaml).expect("parse");
    assert_eq!(
        suite.tests()[0].responses(),
        &[Response::from("4500"), Response::from("3.5"), Response::from("true")]
    );
}

#[test]
fn written_suite_loads_back() {
    let dir = std::env::temp_dir().join(format!("edxcut-suite-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join("tests.yaml");

    let mut suite = TestSuite::new(SiteConfig {
        site_base_url: Some("https://lms.example.org".into()),
        course_id: Some("course-v1:MITx+8.01x+2016_Spring".into()),
        ..SiteConfig::default()
    });
    suite.add_test(
        AnswerBoxTest::builder()
            .problem_id("kinematics_1")
            .responses(vec!["12.5".into(), "3".into()])
            .expected(vec![Correct, Correct])
            .name("kinematics".to_string())
            .build(),
    );
    suite.add_test(
        AnswerBoxTest::builder()
            .problem_id("choices")
            .responses(vec![Response::from(vec!["choice_0", "choice_2"])])
            .expected(Incorrect)
            .box_indexes(vec![Coordinate::new(1, 0)])
            .name("choices".to_string())
            .build(),
    );
    suite.write(&path).expect("write suite");

    let loaded = TestSuite::load(&path).expect("load written suite");
    assert_eq!(loaded.config(), suite.config());
    assert_eq!(loaded.tests(), suite.tests());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn combined_tests_shift_the_second_test_right() {
    let first = AnswerBoxTest::builder()
        .problem_id("p")
        .responses(vec!["a".into()])
        .expected(Correct)
        .name("A".to_string())
        .build();
    let second = AnswerBoxTest::builder()
        .problem_id("p")
        .responses(vec!["b".into(), "c".into()])
        .expected(vec![Incorrect, Correct])
        .name("B".to_string())
        .build();

    let combined = first.combine(&second).expect("same problem");
    assert_eq!(combined.name(), Some("combination of A and B"));
    assert_eq!(
        combined.responses(),
        &[Response::from("a"), Response::from("b"), Response::from("c")]
    );
    assert_eq!(
        combined.expected(),
        &Expected::PerBox(vec![Correct, Incorrect, Correct])
    );
    assert_eq!(
        combined.box_indexes(),
        Some(&[Coordinate::new(0, 0), Coordinate::new(1, 0), Coordinate::new(2, 0)][..])
    );
    combined.validate().expect("combined test is consistent");

    let other = AnswerBoxTest::builder()
        .problem_id("q")
        .responses(vec!["b".into()])
        .expected(Correct)
        .build();
    assert!(first.combine(&other).is_err());
}

#[test]
fn scaffolds_tests_from_course_export() {
    let xml = std::fs::read_to_string(fixture_path("xbundle", "small_course.xml"))
        .expect("read xbundle");
    let tests = tests_from_xbundle(&xml);

    assert_eq!(tests.len(), 2);
    assert_eq!(tests[0].problem_id(), "kinematics_1");
    assert_eq!(
        tests[0].responses(),
        &[Response::from("12.5"), Response::from("3")]
    );
    assert_eq!(
        tests[0].expected(),
        &Expected::PerBox(vec![Correct, Correct])
    );
    assert_eq!(tests[1].problem_id(), "formula_check");
    assert_eq!(tests[1].responses(), &[Response::from("m*a")]);

    let mut suite = TestSuite::new(SiteConfig::default());
    suite.add_tests(tests);
    let yaml = suite.to_yaml().expect("render");
    assert!(yaml.contains("url_name: kinematics_1"));
    let reloaded = TestSuite::from_yaml_str(&yaml).expect("scaffold parses back");
    assert_eq!(reloaded.len(), 2);
}
