// crates/fastpred-core/src/aggregate.rs

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::stats::{Moments, RunningStats};

/// One scored (query, reference) pair of an iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreRow {
    pub reference_id: String,
    pub raw_score: f64,
    pub zscore: Option<f64>,
}

impl ScoreRow {
    pub fn new(reference_id: impl Into<String>, raw_score: f64) -> Self {
        Self { reference_id: reference_id.into(), raw_score, zscore: None }
    }
}

/// A raw Tanimoto score tagged with the iteration that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawScore {
    pub iteration: usize,
    pub score: f64,
}

/// Reference id -> ordered scores. Raw scores in raw mode; z-scores followed by
/// their mean in normalized mode.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultMapping(BTreeMap<String, Vec<f64>>);

impl ResultMapping {
    pub fn get(&self, id: &str) -> Option<&[f64]> {
        self.0.get(id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<f64>> {
        self.0
    }
}

impl FromIterator<(String, Vec<f64>)> for ResultMapping {
    fn from_iter<I: IntoIterator<Item = (String, Vec<f64>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// What one folded iteration looked like.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IterationSummary {
    pub iteration: usize,
    pub hits: u64,
    pub moments: Moments,
}

/// Folds per-iteration score rows into the raw and z-score series.
///
/// Raw series are gated on the first iteration: an id is tracked only if it
/// was hit in iteration 0, and later hits only extend ids already tracked.
/// Within iteration 0 a repeated id restarts its series.
#[derive(Debug)]
pub struct Aggregator {
    normalize: bool,
    iterations: usize,
    raw: BTreeMap<String, Vec<RawScore>>,
    zscores: BTreeMap<String, Vec<f64>>,
}

impl Aggregator {
    pub fn new(normalize: bool) -> Self {
        Self {
            normalize,
            iterations: 0,
            raw: BTreeMap::new(),
            zscores: BTreeMap::new(),
        }
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Fold every row scored in the current iteration. When normalizing, each
    /// row's `zscore` is filled in against the iteration's mean and stdev.
    pub fn fold_iteration(&mut self, rows: &mut [ScoreRow]) -> IterationSummary {
        let iteration = self.iterations;
        let stats: RunningStats = rows.iter().map(|r| r.raw_score).collect();

        for row in rows.iter() {
            let scored = RawScore { iteration, score: row.raw_score };
            if iteration == 0 {
                self.raw.insert(row.reference_id.clone(), vec![scored]);
            } else if let Some(series) = self.raw.get_mut(&row.reference_id) {
                series.push(scored);
            }
        }

        let moments = stats.moments();
        if self.normalize {
            for row in rows.iter_mut() {
                let z = moments.zscore(row.raw_score);
                row.zscore = Some(z);
                match self.zscores.entry(row.reference_id.clone()) {
                    Entry::Occupied(mut e) => e.get_mut().push(z),
                    Entry::Vacant(e) => {
                        e.insert(vec![z]);
                    }
                }
            }
        }

        debug!(
            iteration,
            hits = stats.count,
            mean = moments.mean,
            stdev = moments.stdev,
            "folded iteration"
        );

        self.iterations += 1;
        IterationSummary { iteration, hits: stats.count, moments }
    }

    /// Close the run. In normalized mode, ids whose z-score series does not
    /// cover every iteration are dropped; survivors get their mean appended.
    pub fn finalize(self) -> Aggregate {
        let iterations = self.iterations;
        let mut discarded = 0usize;
        let zscores = if self.normalize {
            let before = self.zscores.len();
            let kept: BTreeMap<String, Vec<f64>> = self
                .zscores
                .into_iter()
                .filter(|(_, series)| series.len() == iterations)
                .map(|(id, mut series)| {
                    let mean = series.iter().sum::<f64>() / series.len() as f64;
                    series.push(mean);
                    (id, series)
                })
                .collect();
            discarded = before - kept.len();
            Some(kept)
        } else {
            None
        };
        Aggregate { iterations, raw: self.raw, zscores, discarded }
    }
}

/// Finalized series, ready for threshold filtering.
#[derive(Clone, Debug)]
pub struct Aggregate {
    pub iterations: usize,
    pub raw: BTreeMap<String, Vec<RawScore>>,
    /// `Some` only in normalized mode: `[z_1..z_n, mean]` per surviving id.
    pub zscores: Option<BTreeMap<String, Vec<f64>>>,
    /// Ids dropped at finalization for missing an iteration.
    pub discarded: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(items: &[(&str, f64)]) -> Vec<ScoreRow> {
        items.iter().map(|(id, s)| ScoreRow::new(*id, *s)).collect()
    }

    fn raw_scores(agg: &Aggregate, id: &str) -> Option<Vec<f64>> {
        agg.raw.get(id).map(|s| s.iter().map(|r| r.score).collect())
    }

    #[test]
    fn raw_series_are_gated_on_first_iteration() {
        let mut a = Aggregator::new(false);
        a.fold_iteration(&mut rows(&[("A", 0.9), ("B", 0.4)]));
        a.fold_iteration(&mut rows(&[("A", 0.8), ("C", 1.0)]));
        a.fold_iteration(&mut rows(&[("B", 0.3), ("C", 0.7)]));
        let agg = a.finalize();

        assert_eq!(agg.iterations, 3);
        assert_eq!(raw_scores(&agg, "A"), Some(vec![0.9, 0.8]));
        assert_eq!(raw_scores(&agg, "B"), Some(vec![0.4, 0.3]));
        assert_eq!(raw_scores(&agg, "C"), None);
        assert!(agg.zscores.is_none());
        assert_eq!(agg.raw["B"][1].iteration, 2);
    }

    #[test]
    fn repeated_id_in_first_iteration_keeps_latest() {
        let mut a = Aggregator::new(false);
        a.fold_iteration(&mut rows(&[("A", 0.9), ("A", 0.2)]));
        a.fold_iteration(&mut rows(&[("A", 0.5), ("A", 0.6)]));
        let agg = a.finalize();
        assert_eq!(raw_scores(&agg, "A"), Some(vec![0.2, 0.5, 0.6]));
    }

    #[test]
    fn zscores_are_filled_in_and_averaged() {
        let mut a = Aggregator::new(true);
        let mut first = rows(&[("A", 0.6), ("B", 0.2), ("C", 0.4)]);
        let s = a.fold_iteration(&mut first);
        assert_eq!(s.hits, 3);
        assert!((first[0].zscore.unwrap() - 1.0).abs() < 1e-9);
        assert!((first[1].zscore.unwrap() + 1.0).abs() < 1e-9);

        a.fold_iteration(&mut rows(&[("A", 0.2), ("B", 0.6), ("C", 0.4)]));
        let agg = a.finalize();
        let z = agg.zscores.unwrap();
        let za = &z["A"];
        assert_eq!(za.len(), 3);
        assert!((za[0] - 1.0).abs() < 1e-9);
        assert!((za[1] + 1.0).abs() < 1e-9);
        assert!(za[2].abs() < 1e-9);
    }

    #[test]
    fn partial_series_are_discarded() {
        let mut a = Aggregator::new(true);
        a.fold_iteration(&mut rows(&[("A", 0.6), ("B", 0.2), ("C", 0.4)]));
        a.fold_iteration(&mut rows(&[("A", 0.2), ("C", 0.6)]));
        let agg = a.finalize();
        let z = agg.zscores.unwrap();
        assert!(z.contains_key("A"));
        assert!(z.contains_key("C"));
        assert!(!z.contains_key("B"));
        assert_eq!(agg.discarded, 1);
    }

    #[test]
    fn single_hit_iteration_propagates_nan() {
        let mut a = Aggregator::new(true);
        a.fold_iteration(&mut rows(&[("M1", 0.5)]));
        let z = a.finalize().zscores.unwrap();
        assert_eq!(z["M1"].len(), 2);
        assert!(z["M1"].iter().all(|v| v.is_nan()));
    }
}
