//! Performance curves over pooled held-out scores.
//!
//! Everything is derived from one descending sweep of the scored list:
//! curve points are emitted per distinct score, so heavily tied score
//! distributions integrate correctly instead of reflecting tie order.

use serde::Serialize;

use crate::{Result, ScanError};

/// One held-out document with its true label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredLabel {
    pub score: f32,
    pub positive: bool,
}

const HIST_BINS: usize = 30;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RocCurve {
    pub fpr: Vec<f32>,
    pub tpr: Vec<f32>,
    /// Trapezoid area under the curve.
    pub area: f32,
    /// Hanley–McNeil standard error of the area.
    pub area_stderr: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrCurve {
    pub recall: Vec<f32>,
    pub precision: Vec<f32>,
    pub area: f32,
    /// Mean precision over the ranks where a positive is retrieved.
    pub average_precision: f32,
    /// Interpolated point where recall meets precision.
    pub breakeven: f32,
}

/// Fα against every candidate threshold, aligned index-wise.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FscoreCurve {
    pub thresholds: Vec<f32>,
    pub fscores: Vec<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Confusion {
    pub true_pos: u32,
    pub false_pos: u32,
    pub true_neg: u32,
    pub false_neg: u32,
}

/// The threshold that maximised Fα, with its operating point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TunedThreshold {
    pub threshold: f32,
    pub fscore: f32,
    pub precision: f32,
    pub recall: f32,
    pub utility: f32,
    pub confusion: Confusion,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Histogram {
    pub lo: f32,
    pub hi: f32,
    pub bins: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub positives: u32,
    pub negatives: u32,
    pub alpha: f32,
    pub roc: RocCurve,
    pub pr: PrCurve,
    pub fscore: FscoreCurve,
    pub tuned: TunedThreshold,
    pub pos_scores: Histogram,
    pub neg_scores: Histogram,
}

struct Tuned {
    threshold: f32,
    fscore: f64,
    precision: f64,
    recall: f64,
    tp: u32,
    fp: u32,
}

/// Derive every reported metric from the pooled `(score, label)` list.
///
/// `alpha` weights precision in the tuned Fα; `utility_r` defaults to
/// N/P when not supplied.
pub fn performance(
    mut scored: Vec<ScoredLabel>,
    alpha: f32,
    utility_r: Option<f32>,
) -> Result<PerformanceReport> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(ScanError::Argument(format!("alpha must lie in [0, 1], got {alpha}")));
    }

    let pos_total = scored.iter().filter(|s| s.positive).count() as u32;
    let neg_total = scored.len() as u32 - pos_total;
    if pos_total == 0 || neg_total == 0 {
        return Err(ScanError::EmptyLabelled(
            "performance needs scored documents from both classes".into(),
        ));
    }

    // Stable sort keeps fold order among exact ties, so reports are
    // reproducible run to run.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    let p = f64::from(pos_total);
    let n = f64::from(neg_total);

    let mut tp = 0u32;
    let mut fp = 0u32;

    let mut fpr = Vec::new();
    let mut tpr = Vec::new();
    let mut recall = Vec::new();
    let mut precision = Vec::new();
    let mut thresholds = Vec::new();
    let mut fscores = Vec::new();

    let mut auc = 0.0f64;
    let mut prev_fpr = 0.0f64;
    let mut prev_tpr = 0.0f64;

    let mut pr_area = 0.0f64;
    let mut prev_recall = 0.0f64;
    let mut prev_precision: Option<f64> = None;

    let mut ap_sum = 0.0f64;
    let mut best: Option<Tuned> = None;

    let total = scored.len();
    let mut idx = 0;
    while idx < total {
        let cut = scored[idx].score;

        // Consume the whole tie group at this score.
        let mut j = idx;
        while j < total && scored[j].score.total_cmp(&cut).is_eq() {
            if scored[j].positive {
                tp += 1;
                ap_sum += f64::from(tp) / (j as f64 + 1.0);
            } else {
                fp += 1;
            }
            j += 1;
        }
        idx = j;

        let point_fpr = f64::from(fp) / n;
        let point_tpr = f64::from(tp) / p;
        auc += (point_fpr - prev_fpr) * (point_tpr + prev_tpr) / 2.0;
        prev_fpr = point_fpr;
        prev_tpr = point_tpr;
        fpr.push(point_fpr as f32);
        tpr.push(point_tpr as f32);

        let point_precision = f64::from(tp) / f64::from(tp + fp);
        let point_recall = point_tpr;
        let anchor = prev_precision.unwrap_or(point_precision);
        pr_area += (point_recall - prev_recall) * (point_precision + anchor) / 2.0;
        prev_recall = point_recall;
        prev_precision = Some(point_precision);
        recall.push(point_recall as f32);
        precision.push(point_precision as f32);

        let fscore = f_alpha(point_precision, point_recall, f64::from(alpha));
        thresholds.push(cut);
        fscores.push(fscore as f32);

        // Strict improvement only, so equal-F ties keep the larger
        // threshold reached first.
        let improves = match &best {
            None => true,
            Some(b) => fscore > b.fscore,
        };
        if improves {
            best = Some(Tuned {
                threshold: cut,
                fscore,
                precision: point_precision,
                recall: point_recall,
                tp,
                fp,
            });
        }
    }

    let Some(best) = best else {
        return Err(ScanError::EmptyLabelled("no scored documents".into()));
    };

    let u_r = utility_r.map_or(n / p, f64::from);
    let utility = (u_r * f64::from(best.tp) - f64::from(best.fp)) / (u_r * p);

    let tuned = TunedThreshold {
        threshold: best.threshold,
        fscore: best.fscore as f32,
        precision: best.precision as f32,
        recall: best.recall as f32,
        utility: utility as f32,
        confusion: Confusion {
            true_pos: best.tp,
            false_pos: best.fp,
            true_neg: neg_total - best.fp,
            false_neg: pos_total - best.tp,
        },
    };

    let breakeven = breakeven_point(&recall, &precision);
    let (pos_scores, neg_scores) = histograms(&scored);

    Ok(PerformanceReport {
        positives: pos_total,
        negatives: neg_total,
        alpha,
        roc: RocCurve {
            fpr,
            tpr,
            area: auc as f32,
            area_stderr: hanley_mcneil(auc, p, n) as f32,
        },
        pr: PrCurve {
            recall,
            precision,
            area: pr_area as f32,
            average_precision: (ap_sum / p) as f32,
            breakeven,
        },
        fscore: FscoreCurve { thresholds, fscores },
        tuned,
        pos_scores,
        neg_scores,
    })
}

/// Fα = 1 / (α/precision + (1-α)/recall); zero when either input is zero.
fn f_alpha(precision: f64, recall: f64, alpha: f64) -> f64 {
    if precision <= 0.0 || recall <= 0.0 {
        return 0.0;
    }
    1.0 / (alpha / precision + (1.0 - alpha) / recall)
}

/// Standard error of a trapezoid AUC per Hanley & McNeil (1982).
fn hanley_mcneil(auc: f64, p: f64, n: f64) -> f64 {
    let q1 = auc / (2.0 - auc);
    let q2 = 2.0 * auc * auc / (1.0 + auc);
    let var = (auc * (1.0 - auc) + (p - 1.0) * (q1 - auc * auc) + (n - 1.0) * (q2 - auc * auc))
        / (p * n);
    var.max(0.0).sqrt()
}

/// Interpolated recall where the PR curve crosses recall = precision.
fn breakeven_point(recall: &[f32], precision: &[f32]) -> f32 {
    let mut prev: Option<(f64, f64)> = None;
    for (&r, &pr) in recall.iter().zip(precision) {
        let (r, pr) = (f64::from(r), f64::from(pr));
        if pr <= r {
            return match prev {
                Some((r0, p0)) => {
                    let denom = (r - r0) - (pr - p0);
                    if denom.abs() < 1e-12 {
                        ((r + pr) / 2.0) as f32
                    } else {
                        let t = (p0 - r0) / denom;
                        (r0 + t * (r - r0)) as f32
                    }
                }
                None => ((r + pr) / 2.0) as f32,
            };
        }
        prev = Some((r, pr));
    }
    match prev {
        Some((r, pr)) => ((r + pr) / 2.0) as f32,
        None => 0.0,
    }
}

fn histograms(scored: &[ScoredLabel]) -> (Histogram, Histogram) {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for s in scored {
        lo = lo.min(s.score);
        hi = hi.max(s.score);
    }

    let mut pos = Histogram { lo, hi, bins: vec![0; HIST_BINS] };
    let mut neg = Histogram { lo, hi, bins: vec![0; HIST_BINS] };
    let span = f64::from(hi) - f64::from(lo);

    for s in scored {
        let bin = if span <= 0.0 {
            0
        } else {
            ((f64::from(s.score) - f64::from(lo)) / span * HIST_BINS as f64) as usize
        }
        .min(HIST_BINS - 1);
        if s.positive {
            pos.bins[bin] += 1;
        } else {
            neg.bins[bin] += 1;
        }
    }
    (pos, neg)
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
