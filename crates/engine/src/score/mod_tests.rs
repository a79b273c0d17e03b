use tempfile::{TempDir, tempdir};

use super::*;
use crate::{
    DocFilter, Smoothing, TrainConfig, count_features, train, write_index_atomic,
};

const F: usize = 64;

fn fixture() -> (TempDir, FeatureIndex) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("features.idx");
    write_index_atomic(&path, |writer| {
        writer.append(1, 20050101, &[7, 42])?;
        writer.append(2, 20050102, &[7])?;
        writer.append(3, 19990101, &[42])
    })
    .unwrap();
    let index = FeatureIndex::open(&path).unwrap();
    (dir, index)
}

fn fixture_scores() -> Vec<f32> {
    let mut scores = vec![0.0f32; F];
    scores[7] = 1.5;
    scores[42] = 2.5;
    scores
}

fn params<'a>(scores: &'a [f32]) -> ScanParams<'a> {
    ScanParams {
        scores,
        offset: 0.5,
        threshold: f32::NEG_INFINITY,
        limit: 10,
        window: DateWindow::all(),
        threads: 1,
    }
}

#[test]
fn ranks_documents_by_accumulated_score() {
    let (_dir, index) = fixture();
    let scores = fixture_scores();

    let outcome = scan_top_scores(&index, &params(&scores), &CancelToken::new()).unwrap();

    assert_eq!(outcome.records, 3);
    let ranked: Vec<(u32, f32)> = outcome.hits.iter().map(|h| (h.doc, h.score)).collect();
    assert_eq!(ranked, vec![(1, 4.5), (3, 3.0), (2, 2.0)]);
}

#[test]
fn out_of_window_documents_never_surface() {
    let (_dir, index) = fixture();
    let scores = fixture_scores();

    let mut p = params(&scores);
    p.window = DateWindow::new(20000101, 21000101).unwrap();
    let outcome = scan_top_scores(&index, &p, &CancelToken::new()).unwrap();

    // Doc 3 scores second-best but is dated outside the window.
    assert_eq!(outcome.records, 3);
    let ranked: Vec<u32> = outcome.hits.iter().map(|h| h.doc).collect();
    assert_eq!(ranked, vec![1, 2]);
}

#[test]
fn threshold_drops_low_scores_regardless_of_limit() {
    let (_dir, index) = fixture();
    let scores = fixture_scores();

    let mut p = params(&scores);
    p.threshold = 2.5;
    let outcome = scan_top_scores(&index, &p, &CancelToken::new()).unwrap();

    let ranked: Vec<u32> = outcome.hits.iter().map(|h| h.doc).collect();
    assert_eq!(ranked, vec![1, 3]);
}

#[test]
fn limit_keeps_only_the_best() {
    let (_dir, index) = fixture();
    let scores = fixture_scores();

    let mut p = params(&scores);
    p.limit = 1;
    let outcome = scan_top_scores(&index, &p, &CancelToken::new()).unwrap();
    assert_eq!(outcome.hits.len(), 1);
    assert_eq!(outcome.hits[0].doc, 1);
}

#[test]
fn tied_scores_resolve_to_the_smaller_pmid() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("features.idx");
    write_index_atomic(&path, |writer| {
        writer.append(20, 20050101, &[7])?;
        writer.append(10, 20050102, &[7])
    })
    .unwrap();
    let index = FeatureIndex::open(&path).unwrap();

    let scores = fixture_scores();
    let mut p = params(&scores);
    p.limit = 1;
    let outcome = scan_top_scores(&index, &p, &CancelToken::new()).unwrap();
    assert_eq!(outcome.hits[0].doc, 10);
}

#[test]
fn parallel_scan_matches_the_reference_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("features.idx");
    write_index_atomic(&path, |writer| {
        for i in 0u32..200 {
            let features = [i % 13, 13 + (i % 17), 30 + (i % 29)];
            let mut sorted: Vec<u32> = features.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            writer.append(1000 + i, 20000101 + (i % 9), &sorted)?;
        }
        Ok(())
    })
    .unwrap();
    let index = FeatureIndex::open(&path).unwrap();

    let scores: Vec<f32> = (0..F).map(|i| (i as f32 * 0.37).sin()).collect();
    let mut p = params(&scores);
    p.limit = 25;

    let serial = scan_top_scores(&index, &p, &CancelToken::new()).unwrap();
    for threads in [2, 3, 8] {
        p.threads = threads;
        let parallel = scan_top_scores(&index, &p, &CancelToken::new()).unwrap();
        assert_eq!(parallel.records, serial.records);
        let left: Vec<(u32, f32)> = serial.hits.iter().map(|h| (h.doc, h.score)).collect();
        let right: Vec<(u32, f32)> = parallel.hits.iter().map(|h| (h.doc, h.score)).collect();
        assert_eq!(left, right);
    }
}

#[test]
fn f32_accumulation_tracks_an_independent_f64_sum() {
    let scores: Vec<f32> = (0..F).map(|i| ((i as f64 * 0.61).cos() * 3.0) as f32).collect();
    let features: Vec<u32> = vec![0, 7, 13, 21, 42, 63];
    let offset = -1.25f32;

    let fast = score_features(&scores, offset, &features).unwrap();

    let mut exact = f64::from(offset);
    for &f in &features {
        exact += f64::from(scores[f as usize]);
    }
    let tolerance = 1e-4 * exact.abs().max(1.0);
    assert!((f64::from(fast) - exact).abs() <= tolerance);
}

#[test]
fn feature_outside_the_universe_is_malformed() {
    let scores = vec![0.0f32; 8];
    let result = score_features(&scores, 0.0, &[9]);
    assert!(matches!(result, Err(ScanError::Malformed(_))));
}

#[test]
fn cancellation_aborts_the_scan() {
    let (_dir, index) = fixture();
    let scores = fixture_scores();
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = scan_top_scores(&index, &params(&scores), &cancel);
    assert!(matches!(result, Err(ScanError::Cancelled)));
}

#[test]
fn trained_scores_retrieve_the_positive_example_first() {
    // Positive {1}, negative {2}; both of doc 1's features carry
    // positive evidence, so it must rank first.
    let (_dir, index) = fixture();
    let cancel = CancelToken::new();

    let pos_counts =
        count_features(&index, DocFilter::Include(&[1]), DateWindow::all(), F, &cancel).unwrap();
    let neg_counts =
        count_features(&index, DocFilter::Include(&[2]), DateWindow::all(), F, &cancel).unwrap();

    let cfg = TrainConfig {
        smoothing: Smoothing::Pseudocount(1.0),
        min_count: 0,
        ..TrainConfig::default()
    };
    let model = train(&pos_counts, &neg_counts, &cfg).unwrap();

    let p = ScanParams {
        scores: &model.scores,
        offset: model.offset(),
        threshold: f32::NEG_INFINITY,
        limit: 10,
        window: DateWindow::all(),
        threads: 1,
    };
    let outcome = scan_top_scores(&index, &p, &cancel).unwrap();

    assert_eq!(outcome.hits.len(), 3);
    assert_eq!(outcome.hits[0].doc, 1);
}
