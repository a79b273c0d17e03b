use tempfile::{TempDir, tempdir};

use super::*;
use crate::{Smoothing, write_index_atomic};

const F: usize = 16;

fn config() -> ValidationConfig {
    ValidationConfig {
        nfolds: 10,
        num_negatives: 20,
        alpha: 0.5,
        utility_r: None,
        seed: 42,
        window: DateWindow::all(),
        num_features: F,
        train: TrainConfig {
            smoothing: Smoothing::Pseudocount(0.1),
            min_count: 0,
            min_infogain: 0.0,
            prior_override: None,
        },
    }
}

/// 30 topic documents marked by feature 5, 30 background documents
/// marked by feature 9, everything sharing feature 1.
fn separable_fixture() -> (TempDir, FeatureIndex, Vec<DocId>, Vec<DocId>) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("features.idx");

    let positives: Vec<DocId> = (100..130).collect();
    let negatives: Vec<DocId> = (500..530).collect();

    write_index_atomic(&path, |writer| {
        for (i, &doc) in positives.iter().enumerate() {
            writer.append(doc, 20050101 + i as u32, &[1, 5])?;
        }
        for (i, &doc) in negatives.iter().enumerate() {
            writer.append(doc, 20050101 + i as u32, &[1, 9])?;
        }
        Ok(())
    })
    .unwrap();

    let index = FeatureIndex::open(&path).unwrap();
    (dir, index, positives, negatives)
}

#[test]
fn separable_classes_validate_to_a_full_auc() {
    let (_dir, index, positives, negatives) = separable_fixture();
    let validator = CrossValidator::new(&index, config());

    let report = validator
        .run(&positives, Some(&negatives), &CancelToken::new())
        .unwrap();

    assert_eq!(report.positives, 30);
    assert_eq!(report.negatives, 30);
    assert!(report.roc.area > 0.999, "auc was {}", report.roc.area);
    assert!(report.tuned.fscore > 0.999);
    assert!(report.tuned.recall > 0.999);
}

#[test]
fn matched_classes_validate_near_half_auc() {
    // Both classes carry the same single feature, so held-out scores are
    // identical and the curve is the diagonal.
    let dir = tempdir().unwrap();
    let path = dir.path().join("features.idx");
    write_index_atomic(&path, |writer| {
        for doc in 0u32..60 {
            writer.append(doc, 20050101, &[3])?;
        }
        Ok(())
    })
    .unwrap();
    let index = FeatureIndex::open(&path).unwrap();

    let positives: Vec<DocId> = (0..30).collect();
    let negatives: Vec<DocId> = (30..60).collect();
    let validator = CrossValidator::new(&index, config());

    let report = validator
        .run(&positives, Some(&negatives), &CancelToken::new())
        .unwrap();
    assert!((report.roc.area - 0.5).abs() < 0.05, "auc was {}", report.roc.area);
}

#[test]
fn too_few_positives_for_the_folds_is_empty_labelled() {
    let (_dir, index, _positives, negatives) = separable_fixture();
    let validator = CrossValidator::new(&index, config());

    let five: Vec<DocId> = (100..105).collect();
    let result = validator.run(&five, Some(&negatives), &CancelToken::new());
    assert!(matches!(result, Err(ScanError::EmptyLabelled(_))));
}

#[test]
fn degenerate_fold_count_is_an_argument_error() {
    let (_dir, index, positives, negatives) = separable_fixture();
    let mut cfg = config();
    cfg.nfolds = 1;
    let validator = CrossValidator::new(&index, cfg);

    let result = validator.run(&positives, Some(&negatives), &CancelToken::new());
    assert!(matches!(result, Err(ScanError::Argument(_))));
}

#[test]
fn identical_seeds_reproduce_the_report_exactly() {
    let (_dir, index, positives, negatives) = separable_fixture();

    let first = CrossValidator::new(&index, config())
        .run(&positives, Some(&negatives), &CancelToken::new())
        .unwrap();
    let second = CrossValidator::new(&index, config())
        .run(&positives, Some(&negatives), &CancelToken::new())
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn sampled_negatives_are_reproducible_and_exclude_positives() {
    let (_dir, index, positives, _negatives) = separable_fixture();

    let first = CrossValidator::new(&index, config())
        .run(&positives, None, &CancelToken::new())
        .unwrap();
    let second = CrossValidator::new(&index, config())
        .run(&positives, None, &CancelToken::new())
        .unwrap();

    assert_eq!(first, second);
    // The pool only holds the 30 background docs; the sample is capped
    // there and never touches the positives.
    assert_eq!(first.negatives, 20);
    assert!(first.roc.area > 0.999);
}

#[test]
fn supplied_negatives_overlapping_positives_are_dropped() {
    let (_dir, index, positives, mut negatives) = separable_fixture();
    negatives.extend_from_slice(&positives[..5]);

    let report = CrossValidator::new(&index, config())
        .run(&positives, Some(&negatives), &CancelToken::new())
        .unwrap();
    assert_eq!(report.positives, 30);
    assert_eq!(report.negatives, 30);
}

#[test]
fn cancellation_aborts_validation() {
    let (_dir, index, positives, negatives) = separable_fixture();
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = CrossValidator::new(&index, config()).run(&positives, Some(&negatives), &cancel);
    assert!(matches!(result, Err(ScanError::Cancelled)));
}
