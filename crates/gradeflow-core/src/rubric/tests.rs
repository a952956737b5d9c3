use super::*;
use crate::config::{CriterionConfig, DetectorConfig, RubricConfig};
use crate::error::GradeError;

fn contains(pattern: &str) -> Box<dyn Detector> {
    Box::new(PatternDetector::Contains(pattern.to_string()))
}

fn foo_bar_rubric() -> Rubric {
    Rubric::new(vec![
        Criterion::new("Foo", 60, contains("foo")),
        Criterion::new("Bar", 40, contains("bar")).with_feedback("Add a bar."),
    ])
    .unwrap()
}

#[test]
fn test_partial_match_scores_satisfied_weight() {
    let rubric = foo_bar_rubric();
    let result = rubric.score(0, "let foo = 1;");
    assert_eq!(
        result,
        ScoreResult {
            chunk_id: 0,
            score: 60,
            failed: vec!["Bar".to_string()],
        }
    );
}

#[test]
fn test_all_criteria_satisfied() {
    let rubric = foo_bar_rubric();
    let result = rubric.score(3, "foo and bar");
    assert_eq!(result.score, 100);
    assert!(result.is_perfect());
    assert_eq!(result.chunk_id, 3);
}

#[test]
fn test_failed_labels_follow_rubric_order() {
    let rubric = Rubric::new(vec![
        Criterion::new("Zeta", 10, contains("zeta")),
        Criterion::new("Alpha", 50, contains("alpha")),
        Criterion::new("Mid", 40, contains("mid")),
    ])
    .unwrap();

    let result = rubric.score(0, "only mid here");
    assert_eq!(result.score, 40);
    assert_eq!(result.failed, vec!["Zeta", "Alpha"]);
}

#[test]
fn test_nothing_matches_scores_zero() {
    let rubric = foo_bar_rubric();
    let result = rubric.score(0, "");
    assert_eq!(result.score, 0);
    assert_eq!(result.failed, vec!["Foo", "Bar"]);
}

#[test]
fn test_weights_must_sum_to_100() {
    let err = Rubric::new(vec![
        Criterion::new("Foo", 60, contains("foo")),
        Criterion::new("Bar", 30, contains("bar")),
    ])
    .unwrap_err();
    assert!(matches!(err, GradeError::Configuration { .. }));
    assert!(err.to_string().contains("got 90"));
}

#[test]
fn test_zero_weight_rejected() {
    let err = Rubric::new(vec![
        Criterion::new("Foo", 100, contains("foo")),
        Criterion::new("Bar", 0, contains("bar")),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("between 1 and 100"));
}

#[test]
fn test_duplicate_labels_rejected() {
    let err = Rubric::new(vec![
        Criterion::new("Foo", 50, contains("foo")),
        Criterion::new("Foo", 50, contains("bar")),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn test_empty_rubric_rejected() {
    assert!(Rubric::new(Vec::new()).is_err());
}

#[test]
fn test_feedback_falls_back_to_label() {
    let rubric = foo_bar_rubric();
    assert_eq!(rubric.feedback_for("Bar"), "Add a bar.");
    assert_eq!(rubric.feedback_for("Foo"), "Foo");
}

#[test]
fn test_default_rubric_scores_app_component() {
    let rubric = Rubric::from_config(&RubricConfig::default()).unwrap();
    let text = "import Header from './Header';\nimport Footer from './Footer';\n\
                function App() {\n  return <TodoList />;\n}\nexport default App;";
    let result = rubric.score(0, text);
    // Everything except PropTypes/helpers
    assert_eq!(result.score, 85);
    assert_eq!(result.failed, vec!["PropTypes and helpers"]);
    assert_eq!(
        rubric.feedback_for("PropTypes and helpers"),
        "PropTypes or helper functions missing."
    );
}

#[test]
fn test_header_without_footer_fails_all_of() {
    let rubric = Rubric::from_config(&RubricConfig::default()).unwrap();
    let result = rubric.score(0, "<Header />");
    assert!(result
        .failed
        .contains(&"Header/Footer implemented".to_string()));
}

#[test]
fn test_regex_detector() {
    let config = RubricConfig {
        criteria: vec![CriterionConfig {
            label: "Uses hooks".to_string(),
            weight: 100,
            feedback: None,
            detector: DetectorConfig::Regex(r"use(State|Effect)\(".to_string()),
        }],
    };
    let rubric = Rubric::from_config(&config).unwrap();
    assert_eq!(rubric.score(0, "const [a, b] = useState(0);").score, 100);
    assert_eq!(rubric.score(0, "const a = 0;").score, 0);
}

#[test]
fn test_invalid_regex_is_configuration_error() {
    let config = RubricConfig {
        criteria: vec![CriterionConfig {
            label: "Broken".to_string(),
            weight: 100,
            feedback: None,
            detector: DetectorConfig::Regex("(unclosed".to_string()),
        }],
    };
    let err = Rubric::from_config(&config).unwrap_err();
    assert!(matches!(err, GradeError::Configuration { .. }));
}

#[test]
fn test_custom_detector_plugs_in() {
    struct LineCount(usize);

    impl Detector for LineCount {
        fn matches(&self, text: &str) -> bool {
            text.lines().count() >= self.0
        }

        fn describe(&self) -> String {
            format!("at least {} lines", self.0)
        }
    }

    let rubric = Rubric::new(vec![Criterion::new("Long enough", 100, Box::new(LineCount(3)))])
        .unwrap();
    assert_eq!(rubric.score(0, "a\nb\nc").score, 100);
    assert_eq!(rubric.score(0, "a").failed, vec!["Long enough"]);
}
