// crates/fastpred-core/src/targets.rs

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::aggregate::ResultMapping;
use crate::error::{Result, ScreenError};

/// Reference id -> biological targets it is annotated with (`.tlt` file).
#[derive(Clone, Debug, Default)]
pub struct TargetTable {
    map: HashMap<String, Vec<String>>,
}

impl TargetTable {
    /// One line per reference: `<reference id> <target> <target> ...`,
    /// whitespace separated. Repeated lines for an id merge; duplicate
    /// targets collapse.
    pub fn parse(text: &str) -> Self {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for line in text.lines() {
            let mut fields = line.split_whitespace();
            let Some(id) = fields.next() else { continue };
            let targets = map.entry(id.to_string()).or_default();
            for t in fields {
                if !targets.iter().any(|x| x == t) {
                    targets.push(t.to_string());
                }
            }
        }
        Self { map }
    }

    pub fn targets_of(&self, reference_id: &str) -> &[String] {
        self.map.get(reference_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Column of a target information table holding the target id.
pub const INFO_KEY_COLUMN: &str = "CHEMBL";

/// Columns kept when an information table is loaded in brief mode.
pub const INFO_BRIEF_COLUMNS: [&str; 2] = ["Uniprot", "CHEMBL"];

/// Target id -> descriptive rows (UniProt accession, name, organism, ...).
///
/// Tab separated with a header line; one target may span several rows. In
/// brief mode only [`INFO_BRIEF_COLUMNS`] are kept.
#[derive(Clone, Debug, Default)]
pub struct InfoTable {
    columns: Vec<String>,
    rows: HashMap<String, Vec<Vec<String>>>,
}

impl InfoTable {
    pub fn parse(text: &str, brief: bool) -> Result<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let Some(header) = lines.next() else {
            return Ok(Self::default());
        };
        let header: Vec<&str> = header.split('\t').map(str::trim).collect();
        let key = header
            .iter()
            .position(|c| *c == INFO_KEY_COLUMN)
            .ok_or_else(|| {
                ScreenError::Argument(format!(
                    "target info table has no {INFO_KEY_COLUMN} column"
                ))
            })?;
        let keep: Vec<usize> = (0..header.len())
            .filter(|&i| !brief || INFO_BRIEF_COLUMNS.contains(&header[i]))
            .collect();

        let mut rows: HashMap<String, Vec<Vec<String>>> = HashMap::new();
        for line in lines {
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            let Some(&target) = fields.get(key).filter(|t| !t.is_empty()) else {
                continue;
            };
            let row = keep
                .iter()
                .map(|&i| fields.get(i).copied().unwrap_or_default().to_string())
                .collect();
            rows.entry(target.to_string()).or_default().push(row);
        }

        let columns = keep.iter().map(|&i| header[i].to_string()).collect();
        Ok(Self { columns, rows })
    }

    /// Names of the kept columns, in file order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows describing `target_id`, each aligned with [`InfoTable::columns`].
    pub fn rows_for(&self, target_id: &str) -> &[Vec<String>] {
        self.rows.get(target_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct targets described.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TargetHit {
    pub target_id: String,
    pub reference_id: String,
    pub score: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RankPolicy {
    /// Keep the single highest-scoring reference per target.
    #[default]
    BestPerTarget,
    /// Keep every reference hit per target.
    AllPerTarget,
}

/// Turn a result mapping into target hits sorted by descending score.
///
/// The score of a reference is the last value of its series: the mean
/// z-score in normalized mode, the latest raw score otherwise. Without a
/// table each reference id stands for itself. `max_targets == 0` keeps all.
pub fn rank_targets(
    result: &ResultMapping,
    table: Option<&TargetTable>,
    policy: RankPolicy,
    max_targets: usize,
) -> Vec<TargetHit> {
    let mut hits: Vec<TargetHit> = Vec::new();
    let mut best: HashMap<String, usize> = HashMap::new();

    for (reference_id, series) in result.iter() {
        let Some(&score) = series.last() else { continue };
        let own = [reference_id.to_string()];
        let targets: &[String] = match table {
            Some(t) => t.targets_of(reference_id),
            None => &own,
        };
        for target_id in targets {
            let hit = TargetHit {
                target_id: target_id.clone(),
                reference_id: reference_id.to_string(),
                score,
            };
            match policy {
                RankPolicy::AllPerTarget => hits.push(hit),
                RankPolicy::BestPerTarget => match best.get(target_id) {
                    Some(&i) => {
                        if outranks(score, hits[i].score) {
                            hits[i] = hit;
                        }
                    }
                    None => {
                        best.insert(target_id.clone(), hits.len());
                        hits.push(hit);
                    }
                },
            }
        }
    }

    hits.sort_by(|a, b| {
        by_score_desc(a.score, b.score)
            .then_with(|| a.target_id.cmp(&b.target_id))
            .then_with(|| a.reference_id.cmp(&b.reference_id))
    });
    if max_targets > 0 {
        hits.truncate(max_targets);
    }
    hits
}

// NaN ranks below every number.
fn outranks(candidate: f64, current: f64) -> bool {
    match (candidate.is_nan(), current.is_nan()) {
        (false, true) => true,
        (true, _) => false,
        (false, false) => candidate > current,
    }
}

fn by_score_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}
