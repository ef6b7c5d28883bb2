//! End-to-end tests of the org chart transform.
//!
//! These drive `process` through raw JSON the way the loader hands it over
//! and pin down the observable properties of the cleaned tree.

use rstest::rstest;

use orgtidy::domain::{
    are_similar, choose_canonical, clean, process, rejected_labels, OrgNode, Pipeline,
    PipelineOptions,
};
use orgtidy::util::testing;

fn chart(json: &str) -> OrgNode {
    OrgNode::from_json_str(json).expect("valid org chart")
}

fn fixture() -> OrgNode {
    chart(include_str!("resources/orgchart.json"))
}

#[test]
fn given_aiml_siblings_when_processing_then_grouped_under_acronym() {
    testing::init_test_setup();
    // Arrange
    let raw = chart(
        r#"{"AIML Infrastructure Teams":{}, "AIML Data Platform":{},
            "AIML Engineering Efficiency":{}, "AIML Search Infrastructure":{},
            "Design System":{}}"#,
    );

    // Act
    let result = process(&raw);

    // Assert
    assert_eq!(
        result.labels().collect::<Vec<_>>(),
        vec!["AIML", "Design System"]
    );
    let aiml = result.get("AIML").unwrap();
    assert_eq!(
        aiml.labels().collect::<Vec<_>>(),
        vec![
            "Infrastructure Teams",
            "Data Platform",
            "Engineering Efficiency",
            "Search Infrastructure"
        ]
    );
    assert!(result.get("Design System").unwrap().is_empty());
}

#[test]
fn given_role_suffix_variants_when_processing_then_single_engineering_key() {
    // Arrange
    let raw = chart(r#"{"Engineering Team":{}, "Engineering Group":{}, "Engineering Org":{}}"#);

    // Act
    let result = process(&raw);

    // Assert
    assert_eq!(result.len(), 1);
    assert!(result.contains("Engineering"));
}

#[test]
fn given_empty_chart_when_processing_then_empty_mapping() {
    let result = process(&chart("{}"));
    assert!(result.is_empty());
    assert_eq!(serde_json::to_string(&result).unwrap(), "{}");
}

#[rstest]
#[case(2, false)]
#[case(3, true)]
fn given_siblings_sharing_prefix_when_processing_then_group_needs_three(
    #[case] members: usize,
    #[case] grouped: bool,
) {
    // Arrange
    let names = ["Data Platform", "Data Science", "Data Quality"];
    let raw: OrgNode = names[..members]
        .iter()
        .map(|name| (*name, OrgNode::new()))
        .collect();

    // Act
    let result = process(&raw);

    // Assert
    assert_eq!(result.contains("Data"), grouped);
    if grouped {
        let data = result.get("Data").unwrap();
        assert_eq!(
            data.labels().collect::<Vec<_>>(),
            vec!["Platform", "Science", "Quality"]
        );
    } else {
        assert_eq!(result.len(), members);
    }
}

#[test]
fn given_mixed_chart_when_processing_then_every_stage_applies() {
    testing::init_test_setup();
    // Arrange
    let raw = fixture();

    // Act
    let result = process(&raw);

    // Assert
    assert_eq!(
        result.labels().collect::<Vec<_>>(),
        vec!["Engineering", "AIML", "Design System", "Finance"]
    );
    assert_eq!(
        result.get("Engineering").unwrap().labels().collect::<Vec<_>>(),
        vec!["Platform"]
    );
    let accounts = result.get("Finance").unwrap().get("Accounts").unwrap();
    assert_eq!(
        accounts.labels().collect::<Vec<_>>(),
        vec!["Payable", "Receivable", "Reporting"]
    );
    assert!(!result.contains("Lost"));
    assert_eq!(result.node_count(), 12);
}

/// Holds for charts whose group remainders are already clean labels; see
/// `given_lowercase_group_remainder_when_processing_again_then_title_cased`
/// for the shape where a second pass still changes the tree.
#[test]
fn given_processed_chart_when_processing_again_then_equivalent() {
    // Arrange
    let once = process(&fixture());

    // Act
    let twice = process(&once);

    // Assert
    assert!(twice.equivalent(&once), "{:?} vs {:?}", twice, once);
}

#[test]
fn given_lowercase_group_remainder_when_processing_again_then_title_cased() {
    // Arrange
    let raw = chart(r#"{"Front-end Web":{}, "Front-office":{}, "Front-desk Ops":{}}"#);

    // Act
    let once = process(&raw);
    let twice = process(&once);

    // Assert: the remainder after a separator-ending prefix is not re-cleaned
    let first: Vec<_> = once.get("Front-").unwrap().labels().collect();
    assert_eq!(first, vec!["end Web", "office", "desk Ops"]);
    let second: Vec<_> = twice.get("Front-").unwrap().labels().collect();
    assert_eq!(second, vec!["End Web", "Office", "Desk Ops"]);
}

#[test]
fn given_raw_chart_when_processing_then_input_is_untouched() {
    // Arrange
    let raw = fixture();
    let before = raw.clone();

    // Act
    let _ = process(&raw);

    // Assert
    assert_eq!(raw, before);
}

#[test]
fn given_fixture_when_collecting_rejects_then_only_noise_reported() {
    assert_eq!(rejected_labels(&fixture()), vec![")".to_string()]);
}

#[test]
fn given_reference_examples_when_checking_helpers_then_documented_results() {
    assert_eq!(clean("s"), None);
    assert_eq!(clean(")"), None);
    assert_eq!(clean("AI").as_deref(), Some("AI"));
    assert_eq!(clean("Engineering Team").as_deref(), Some("Engineering"));
    assert_eq!(
        clean("Technology Development Group (TDG),").as_deref(),
        Some("Technology Development")
    );
    assert!(are_similar(
        "3D Visual Merchandising",
        "3D/Visual Merchandising"
    ));
    assert!(!are_similar("GPU", "GPU Architecture Design Team"));
    assert_eq!(
        choose_canonical(&["Frontend", "Backend"]),
        choose_canonical(&["Backend", "Frontend"])
    );
}

#[test]
fn given_looser_options_when_processing_then_pairs_group() {
    // Arrange
    let pipeline = Pipeline::from(PipelineOptions {
        min_group_size: 2,
        ..PipelineOptions::default()
    });
    let raw = chart(r#"{"Cloud Compute":{}, "Cloud Storage":{}, "Legal":{}}"#);

    // Act
    let result = pipeline.process(&raw);

    // Assert
    assert_eq!(result.labels().collect::<Vec<_>>(), vec!["Cloud", "Legal"]);
}
