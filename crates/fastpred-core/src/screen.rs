// crates/fastpred-core/src/screen.rs

use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::aggregate::{Aggregator, ResultMapping, ScoreRow};
use crate::config::ScreenConfig;
use crate::error::{Result, ScreenError};
use crate::filter::ThresholdFilter;
use crate::reader::FingerprintReader;
use crate::record::MoleculeRecord;
use crate::scanner::CollectionScanner;
use crate::similarity::QueryBits;
use crate::transport::open_query;

/// The reference collection and raw cut-off paired with one query record,
/// by position in the query stream.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryTask {
    pub reference: Vec<u8>,
    pub threshold: Option<f64>,
}

impl QueryTask {
    pub fn new(reference: Vec<u8>, threshold: Option<f64>) -> Self {
        Self { reference, threshold }
    }

    /// Bundle parallel reference / threshold lists. An empty threshold list
    /// disables the raw rule; otherwise both lists must be the same length.
    pub fn pair(references: Vec<Vec<u8>>, thresholds: &[f64]) -> Result<Vec<QueryTask>> {
        if !thresholds.is_empty() && thresholds.len() != references.len() {
            return Err(ScreenError::Argument(format!(
                "{} thresholds given for {} reference collections",
                thresholds.len(),
                references.len()
            )));
        }
        Ok(references
            .into_iter()
            .enumerate()
            .map(|(i, reference)| QueryTask::new(reference, thresholds.get(i).copied()))
            .collect())
    }
}

/// Outcome of one screening call.
#[derive(Clone, Debug)]
pub struct Screening {
    pub result: ResultMapping,
    /// Query records consumed.
    pub iterations: usize,
    /// Ids dropped at finalization for missing an iteration (normalized mode).
    pub discarded: usize,
    /// Ids removed by threshold rules.
    pub removed: usize,
}

/// Score `query` against every record of `reference`.
pub fn score_iteration(query: &MoleculeRecord, reference: &[u8]) -> Result<Vec<ScoreRow>> {
    let bits = QueryBits::new(query.fingerprint.as_bytes());
    CollectionScanner::checked(reference, query.fingerprint.byte_len())?
        .map(|rec| rec.map(|r| ScoreRow::new(r.id, bits.score(r.fingerprint))))
        .collect()
}

/// Open the query file at `path` and screen it. The file is closed when this
/// returns, whatever the outcome.
pub fn screen_path(path: &Path, tasks: &[QueryTask], config: &ScreenConfig) -> Result<Screening> {
    let stream = open_query(path)?;
    screen_reader(stream, tasks, config)
}

/// Run the whole pipeline over a query stream: score each record against its
/// paired collection, fold, finalize and filter.
pub fn screen_reader<R: Read>(
    mut reader: FingerprintReader<R>,
    tasks: &[QueryTask],
    config: &ScreenConfig,
) -> Result<Screening> {
    let mut agg = Aggregator::new(config.normalize);

    while let Some(query) = reader.read_next()? {
        let i = agg.iterations();
        let task = tasks.get(i).ok_or_else(|| {
            ScreenError::Argument(format!(
                "query record #{i} ({}) has no paired reference collection ({} given)",
                query.id,
                tasks.len()
            ))
        })?;
        let mut rows = score_iteration(&query, &task.reference)?;
        debug!(iteration = i, query = %query.id, bits = query.fingerprint.bits(), "scored query record");
        agg.fold_iteration(&mut rows);
    }
    drop(reader);

    let iterations = agg.iterations();
    if iterations < tasks.len() {
        warn!(
            iterations,
            collections = tasks.len(),
            "query stream ended before all reference collections were used"
        );
    }

    let thresholds = tasks.iter().map(|t| t.threshold).collect();
    let filter = ThresholdFilter::new(thresholds, config);

    let aggregate = agg.finalize();
    let discarded = aggregate.discarded;
    let filtered = filter.apply(aggregate);

    info!(
        iterations,
        normalize = config.normalize,
        returned = filtered.result.len(),
        discarded,
        removed = filtered.removed,
        "screening done"
    );

    Ok(Screening { result: filtered.result, iterations, discarded, removed: filtered.removed })
}

/// Screen with parallel reference / threshold lists instead of tasks.
pub fn screen_parallel_lists(
    query_path: &Path,
    references: Vec<Vec<u8>>,
    thresholds: &[f64],
    zscore_threshold: f64,
    normalize: bool,
) -> Result<ResultMapping> {
    let tasks = QueryTask::pair(references, thresholds)?;
    let config = ScreenConfig { zscore_threshold, normalize, ..ScreenConfig::default() };
    Ok(screen_path(query_path, &tasks, &config)?.result)
}
