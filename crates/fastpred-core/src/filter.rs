// crates/fastpred-core/src/filter.rs

use std::collections::BTreeSet;

use crate::aggregate::{Aggregate, RawScore, ResultMapping};
use crate::config::{ScreenConfig, ThresholdPolicy};

/// Prunes finalized series by raw-score and mean z-score cut-offs.
///
/// Removal candidates are collected from both rules and the returned mapping
/// is rebuilt from the survivors; candidates missing from that mapping are
/// ignored.
#[derive(Clone, Debug)]
pub struct ThresholdFilter {
    /// Raw cut-off of each iteration, by position.
    thresholds: Vec<Option<f64>>,
    policy: ThresholdPolicy,
    zscore_threshold: f64,
    normalize: bool,
}

/// Filter output.
#[derive(Clone, Debug)]
pub struct Filtered {
    pub result: ResultMapping,
    /// Entries of the returned mapping removed by a threshold rule.
    pub removed: usize,
}

impl ThresholdFilter {
    pub fn new(thresholds: Vec<Option<f64>>, config: &ScreenConfig) -> Self {
        Self {
            thresholds,
            policy: config.threshold_policy,
            zscore_threshold: config.zscore_threshold,
            normalize: config.normalize,
        }
    }

    pub fn raw_rule_active(&self) -> bool {
        self.thresholds.iter().any(Option::is_some)
    }

    pub fn zscore_rule_active(&self) -> bool {
        self.normalize && self.zscore_threshold != 0.0
    }

    fn threshold_for(&self, iteration: usize) -> Option<f64> {
        let index = match self.policy {
            ThresholdPolicy::PerIteration => iteration,
            ThresholdPolicy::FirstOnly => 0,
        };
        self.thresholds.get(index).copied().flatten()
    }

    // NaN never compares below a threshold, so NaN scores survive.
    fn fails_raw(&self, series: &[RawScore]) -> bool {
        series
            .iter()
            .any(|r| matches!(self.threshold_for(r.iteration), Some(t) if r.score < t))
    }

    pub fn apply(&self, agg: Aggregate) -> Filtered {
        let mut remove: BTreeSet<String> = BTreeSet::new();

        if self.raw_rule_active() {
            remove.extend(
                agg.raw
                    .iter()
                    .filter(|(_, series)| self.fails_raw(series))
                    .map(|(id, _)| id.clone()),
            );
        }

        if self.zscore_rule_active() {
            if let Some(z) = &agg.zscores {
                remove.extend(
                    z.iter()
                        .filter(|(_, series)| {
                            series.last().is_some_and(|&mean| mean <= self.zscore_threshold)
                        })
                        .map(|(id, _)| id.clone()),
                );
            }
        }

        let source: Vec<(String, Vec<f64>)> = match agg.zscores {
            Some(z) if self.normalize => z.into_iter().collect(),
            _ => agg
                .raw
                .into_iter()
                .map(|(id, series)| (id, series.into_iter().map(|r| r.score).collect()))
                .collect(),
        };

        let total = source.len();
        let result: ResultMapping = source
            .into_iter()
            .filter(|(id, _)| !remove.contains(id))
            .collect();
        let removed = total - result.len();
        Filtered { result, removed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Aggregator, ScoreRow};

    fn fold(normalize: bool, iterations: &[&[(&str, f64)]]) -> Aggregate {
        let mut a = Aggregator::new(normalize);
        for it in iterations {
            let mut rows: Vec<ScoreRow> = it.iter().map(|(id, s)| ScoreRow::new(*id, *s)).collect();
            a.fold_iteration(&mut rows);
        }
        a.finalize()
    }

    #[test]
    fn no_rules_returns_everything() {
        let agg = fold(false, &[&[("A", 0.1), ("B", 0.9)]]);
        let out = ThresholdFilter::new(vec![None], &ScreenConfig::default()).apply(agg);
        assert_eq!(out.result.len(), 2);
        assert_eq!(out.removed, 0);
    }

    #[test]
    fn any_score_below_its_threshold_removes_the_id() {
        let agg = fold(false, &[&[("A", 0.7), ("B", 0.9)], &[("A", 0.5), ("B", 0.9)]]);
        let f = ThresholdFilter::new(vec![Some(0.6), Some(0.6)], &ScreenConfig::default());
        let out = f.apply(agg);
        assert!(!out.result.contains("A"));
        assert_eq!(out.result.get("B"), Some(&[0.9, 0.9][..]));
        assert_eq!(out.removed, 1);
    }

    #[test]
    fn equal_to_threshold_is_kept() {
        let agg = fold(false, &[&[("A", 0.6)]]);
        let out = ThresholdFilter::new(vec![Some(0.6)], &ScreenConfig::default()).apply(agg);
        assert!(out.result.contains("A"));
    }

    #[test]
    fn per_iteration_and_first_only_policies_differ() {
        let its: &[&[(&str, f64)]] = &[&[("A", 0.85)], &[("A", 0.65)]];
        let thresholds = vec![Some(0.8), Some(0.6)];

        let per = ThresholdFilter::new(thresholds.clone(), &ScreenConfig::default());
        assert!(per.apply(fold(false, its)).result.contains("A"));

        let cfg = ScreenConfig { threshold_policy: ThresholdPolicy::FirstOnly, ..ScreenConfig::default() };
        let first = ThresholdFilter::new(thresholds, &cfg);
        assert!(!first.apply(fold(false, its)).result.contains("A"));
    }

    #[test]
    fn nan_scores_pass_raw_thresholds() {
        let agg = fold(false, &[&[("A", f64::NAN)]]);
        let out = ThresholdFilter::new(vec![Some(0.6)], &ScreenConfig::default()).apply(agg);
        assert!(out.result.get("A").unwrap()[0].is_nan());
    }

    #[test]
    fn zscore_boundary_is_inclusive() {
        // A is the top z-score in both iterations; thresholding at its own mean
        // must remove it along with everything below.
        let agg = fold(true, &[&[("A", 0.6), ("B", 0.2), ("C", 0.4)], &[("A", 0.6), ("B", 0.2), ("C", 0.4)]]);
        let z = agg.zscores.as_ref().unwrap();
        let a_mean = *z["A"].last().unwrap();

        let cfg = ScreenConfig::normalized(a_mean);
        let out = ThresholdFilter::new(vec![None, None], &cfg).apply(agg);
        assert!(!out.result.contains("A"));
        assert!(!out.result.contains("B"));
        assert!(!out.result.contains("C"));
        assert_eq!(out.removed, 3);
    }

    #[test]
    fn zscore_rule_keeps_ids_above_threshold() {
        let agg = fold(true, &[&[("A", 0.6), ("B", 0.2), ("C", 0.4)]]);
        let out = ThresholdFilter::new(vec![None], &ScreenConfig::normalized(0.5)).apply(agg);
        assert_eq!(out.result.len(), 1);
        assert!(out.result.contains("A"));
        assert_eq!(out.result.get("A").unwrap().len(), 2);
    }

    #[test]
    fn raw_rule_prunes_normalized_output() {
        let agg = fold(true, &[&[("A", 0.6), ("B", 0.2), ("C", 0.4)]]);
        let out = ThresholdFilter::new(vec![Some(0.3)], &ScreenConfig::normalized(0.0)).apply(agg);
        assert!(out.result.contains("A"));
        assert!(!out.result.contains("B"));
        assert!(out.result.contains("C"));
    }

    #[test]
    fn raw_candidates_absent_from_zscore_mapping_are_ignored() {
        // B misses iteration 1, so it is already gone from the z-score mapping.
        let agg = fold(true, &[&[("A", 0.6), ("B", 0.1), ("C", 0.4)], &[("A", 0.6), ("C", 0.4)]]);
        let out = ThresholdFilter::new(vec![Some(0.3), Some(0.3)], &ScreenConfig::normalized(0.0)).apply(agg);
        assert_eq!(out.removed, 0);
        assert_eq!(out.result.len(), 2);
    }
}
