//! End-to-end matching scenarios over in-memory record batches.

use arrow::array::{Array, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use ccmatch::{AssignmentPolicy, MatchError, Matcher, MatchingConfig, MissingValuePolicy};
use std::collections::HashSet;
use std::sync::Arc;

fn group_batch(ids: &[&str], ages: &[f64], regions: &[Option<&str>]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("age", DataType::Float64, false),
        Field::new("region", DataType::Utf8, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(ids.to_vec())),
            Arc::new(Float64Array::from(ages.to_vec())),
            Arc::new(StringArray::from(regions.to_vec())),
        ],
    )
    .unwrap()
}

fn config() -> MatchingConfig {
    MatchingConfig::builder().covariates(["age"]).build()
}

#[test]
fn contested_control_goes_to_one_treated_only() {
    let treated = group_batch(&["t1", "t2"], &[5.0, 5.0], &[None, None]);
    let controls = group_batch(&["c1", "c2"], &[5.0, 100.0], &[None, None]);

    let result = Matcher::new(config())
        .perform_matching(&treated, &controls)
        .unwrap();

    assert_eq!(result.matched_count(), 2);

    let control_ids: HashSet<_> = result.pairs.iter().map(|p| p.control_id.as_str()).collect();
    assert_eq!(control_ids.len(), 2, "no control may be reused");

    let distances: Vec<f64> = result.pairs.iter().map(|p| p.distance).collect();
    assert!(distances.contains(&0.0));
    assert!(distances.contains(&95.0));
}

#[test]
fn empty_control_pool_is_reported_as_error() {
    let treated = group_batch(&["t1"], &[5.0], &[None]);
    let controls = group_batch(&[], &[], &[]);

    let err = Matcher::new(config())
        .perform_matching(&treated, &controls)
        .unwrap_err();
    assert!(matches!(err, MatchError::EmptyControlPool));
}

#[test]
fn exhausted_pool_reports_unmatched_rows_in_output() {
    let treated = group_batch(&["t1", "t2", "t3"], &[1.0, 2.0, 3.0], &[None, None, None]);
    let controls = group_batch(&["c1"], &[2.0], &[None]);

    let result = Matcher::new(config())
        .perform_matching(&treated, &controls)
        .unwrap();

    assert_eq!(result.matched_count(), 1);
    assert_eq!(result.unmatched_count(), 2);
    assert_eq!(result.output.num_rows(), 3);

    // Unmatched rows are present with a null matched side
    let matched_ids = result
        .output
        .column_by_name("id_matched")
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(matched_ids.null_count(), 2);
}

#[test]
fn greedy_is_deterministic_across_runs() {
    let run = |seed: Option<u64>| {
        let treated = group_batch(&["t1", "t2", "t3"], &[1.2, 2.1, 2.9], &[None, None, None]);
        let controls = group_batch(&["c1", "c2", "c3"], &[1.0, 2.0, 3.0], &[None, None, None]);
        let mut builder = MatchingConfig::builder().covariates(["age"]);
        if let Some(seed) = seed {
            builder = builder.random_seed(seed);
        }
        Matcher::new(builder.build())
            .perform_matching(&treated, &controls)
            .unwrap()
            .pairs
    };

    assert_eq!(run(None), run(None));
    assert_eq!(run(Some(99)), run(Some(99)));
}

#[test]
fn optimal_total_never_exceeds_greedy_total() {
    let treated = group_batch(
        &["t1", "t2", "t3", "t4"],
        &[10.0, 11.0, 30.0, 31.0],
        &[None, None, None, None],
    );
    let controls = group_batch(
        &["c1", "c2", "c3", "c4"],
        &[10.5, 29.5, 31.5, 12.0],
        &[None, None, None, None],
    );

    let greedy = Matcher::new(config())
        .perform_matching(&treated, &controls)
        .unwrap();
    let optimal_config = MatchingConfig::builder()
        .covariates(["age"])
        .policy(AssignmentPolicy::GlobalOptimal)
        .build();
    let optimal = Matcher::new(optimal_config)
        .perform_matching(&treated, &controls)
        .unwrap();

    assert_eq!(greedy.matched_count(), 4);
    assert_eq!(optimal.matched_count(), 4);
    assert!(optimal.total_distance() <= greedy.total_distance() + 1e-12);
}

#[test]
fn categorical_covariates_steer_the_match() {
    let treated = group_batch(&["t1"], &[50.0], &[Some("north")]);
    let controls = group_batch(
        &["c1", "c2"],
        &[50.0, 50.0],
        &[Some("south"), Some("north")],
    );
    let config = MatchingConfig::builder()
        .covariates(["age", "region"])
        .weight("region", 10.0)
        .build();

    let result = Matcher::new(config)
        .perform_matching(&treated, &controls)
        .unwrap();

    assert_eq!(result.pairs[0].control_id, "c2");
    assert_eq!(result.pairs[0].distance, 0.0);
}

#[test]
fn missing_cells_are_filled_and_counted() {
    let treated = group_batch(&["t1"], &[50.0], &[None]);
    let controls = group_batch(&["c1"], &[50.0], &[Some("north")]);
    let config = MatchingConfig::builder()
        .covariates(["age", "region"])
        .missing_value_policy(MissingValuePolicy::ZeroFill)
        .build();

    let result = Matcher::new(config)
        .perform_matching(&treated, &controls)
        .unwrap();

    assert_eq!(result.filled_cells, 1);
    assert_eq!(result.matched_count(), 1);
}

#[test]
fn missing_declared_covariate_is_schema_mismatch() {
    let treated = group_batch(&["t1"], &[50.0], &[None]);
    let controls = group_batch(&["c1"], &[50.0], &[None]);
    let config = MatchingConfig::builder().covariates(["height"]).build();

    let err = Matcher::new(config)
        .perform_matching(&treated, &controls)
        .unwrap_err();
    assert!(matches!(err, MatchError::SchemaMismatch(_)));
}

#[test]
fn combined_dataset_splits_and_matches() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("treatment", DataType::Int32, false),
        Field::new("age", DataType::Float64, false),
        Field::new("note", DataType::Utf8, true),
    ]));
    let dataset = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["t1", "c1", "t2", "c2"])),
            Arc::new(Int32Array::from(vec![1, 0, 1, 0])),
            Arc::new(Float64Array::from(vec![5.0, 5.5, 6.0, 6.5])),
            Arc::new(StringArray::from(vec![
                Some("kept"),
                Some("as"),
                None,
                Some("is"),
            ])),
        ],
    )
    .unwrap();

    let result = Matcher::new(config()).match_dataset(&dataset).unwrap();

    assert_eq!(result.matched_count(), 2);

    // Informational columns ride through on both sides
    assert!(result.output.column_by_name("note").is_some());
    assert!(result.output.column_by_name("note_matched").is_some());
    assert!(result.output.column_by_name("match_distance").is_some());
}
