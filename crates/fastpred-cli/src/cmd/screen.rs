// crates/fastpred-cli/src/cmd/screen.rs

use std::path::Path;

use anyhow::Context;
use clap::{Args, ValueEnum};
use fastpred_core::config::{DEFAULT_MAX_TARGETS, DEFAULT_ZSCORE_THRESHOLD};
use fastpred_core::targets::{rank_targets, InfoTable, RankPolicy, TargetTable};
use fastpred_core::{digest, screen_path, FingerprintKind, QueryTask, ScreenConfig, ThresholdPolicy};
use tracing::info;

use crate::io::files;
use crate::io::report::{Format, ReportWriter};

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum Policy {
    /// Each raw score is checked against the threshold of its own collection.
    PerIteration,
    /// Every raw score is checked against the first threshold (legacy output parity).
    FirstOnly,
}

impl From<Policy> for ThresholdPolicy {
    fn from(p: Policy) -> Self {
        match p {
            Policy::PerIteration => ThresholdPolicy::PerIteration,
            Policy::FirstOnly => ThresholdPolicy::FirstOnly,
        }
    }
}

#[derive(Args)]
pub struct ScreenArgs {
    /// Query stream(s) (.qbfp, optionally zstd-compressed), one molecule each
    #[arg(long, required = true)]
    pub query: Vec<String>,

    /// Reference collection (.bfp). Repeat; record i of a query pairs with the i-th --ref.
    #[arg(long = "ref", conflicts_with = "db")]
    pub refs: Vec<String>,

    /// Raw Tanimoto threshold per collection, same order as --ref / --fp.
    /// Omit entirely to disable raw filtering (with --ref) or use kind defaults (with --db).
    #[arg(long = "tc")]
    pub thresholds: Vec<f64>,

    /// Collection path prefix; collections are read from PREFIX_KIND.bfp
    #[arg(long)]
    pub db: Option<String>,

    /// Fingerprint kinds to screen with --db (default: ECFP4)
    #[arg(long = "fp", requires = "db")]
    pub kinds: Vec<FingerprintKind>,

    /// Mean z-score threshold (normalized mode; 0 disables)
    #[arg(long, default_value_t = DEFAULT_ZSCORE_THRESHOLD)]
    pub zscore: f64,

    /// Normalize scores into per-molecule z-scores across collections (consensus).
    /// On by default with --db and more than one --fp.
    #[arg(long, default_value_t = false)]
    pub normalize: bool,

    /// Keep raw Tanimoto series even when several --fp kinds are screened
    #[arg(long, default_value_t = false, conflicts_with = "normalize")]
    pub raw: bool,

    /// How raw scores are matched to thresholds
    #[arg(long, value_enum, default_value_t = Policy::PerIteration)]
    pub policy: Policy,

    /// Target lookup table (.tlt): `<reference id> <target>...` per line
    #[arg(long)]
    pub targets: Option<String>,

    /// Target information table (tab separated, header line, CHEMBL column
    /// holding the target id); its columns are appended to each reported hit
    #[arg(long)]
    pub info: Option<String>,

    /// Only report the Uniprot and CHEMBL columns of --info
    #[arg(long, default_value_t = false, requires = "info")]
    pub no_info: bool,

    /// Maximum number of targets reported per molecule (0 = all)
    #[arg(long, default_value_t = DEFAULT_MAX_TARGETS)]
    pub max_targets: usize,

    /// Report every reference per target instead of the best one
    #[arg(long, default_value_t = false)]
    pub all_per_target: bool,

    #[arg(long, value_enum, default_value_t = Format::Txt)]
    pub format: Format,

    /// Report path (default: stdout)
    #[arg(long)]
    pub out: Option<String>,
}

/// Collections to screen against, with their raw thresholds.
struct CollectionPlan {
    paths: Vec<String>,
    thresholds: Vec<f64>,
    /// Several fingerprint kinds of one database: scores are only comparable
    /// after normalization.
    consensus: bool,
}

impl CollectionPlan {
    fn normalize(&self, args: &ScreenArgs) -> bool {
        args.normalize || (self.consensus && !args.raw)
    }
}

fn collection_plan(args: &ScreenArgs) -> anyhow::Result<CollectionPlan> {
    match args.db.as_deref() {
        Some(prefix) => {
            let kinds = if args.kinds.is_empty() {
                vec![FingerprintKind::Ecfp4]
            } else {
                args.kinds.clone()
            };
            let paths = kinds.iter().map(|k| format!("{prefix}_{k}.bfp")).collect();
            let thresholds = if args.thresholds.is_empty() {
                kinds.iter().map(|k| k.default_threshold()).collect()
            } else {
                args.thresholds.clone()
            };
            Ok(CollectionPlan { paths, thresholds, consensus: kinds.len() > 1 })
        }
        None => {
            if args.refs.is_empty() {
                anyhow::bail!("either --ref or --db is required");
            }
            Ok(CollectionPlan {
                paths: args.refs.clone(),
                thresholds: args.thresholds.clone(),
                consensus: false,
            })
        }
    }
}

pub fn run(args: ScreenArgs) -> anyhow::Result<()> {
    let plan = collection_plan(&args)?;

    let mut references = Vec::with_capacity(plan.paths.len());
    for p in &plan.paths {
        let bytes = files::load_collection(p)?;
        info!(
            collection = %p,
            bytes = bytes.len(),
            collection_id = %digest::collection_id(&bytes),
            "loaded reference collection"
        );
        references.push(bytes);
    }
    let tasks = QueryTask::pair(references, &plan.thresholds)?;

    let config = ScreenConfig {
        zscore_threshold: args.zscore,
        normalize: plan.normalize(&args),
        threshold_policy: args.policy.into(),
    };

    let table = match args.targets.as_deref() {
        Some(p) => Some(TargetTable::parse(&files::read_text(p)?)),
        None => None,
    };
    let rank_policy = if args.all_per_target {
        RankPolicy::AllPerTarget
    } else {
        RankPolicy::BestPerTarget
    };

    let info = match args.info.as_deref() {
        Some(p) => Some(
            InfoTable::parse(&files::read_text(p)?, args.no_info)
                .with_context(|| format!("parse target info {p}"))?,
        ),
        None => None,
    };

    let mut report = ReportWriter::open(args.out.as_deref(), args.format, info)?;
    let mut total_hits = 0usize;
    for q in &args.query {
        let screening = screen_path(Path::new(q), &tasks, &config)
            .with_context(|| format!("screen {q}"))?;
        let hits = rank_targets(&screening.result, table.as_ref(), rank_policy, args.max_targets);
        total_hits += hits.len();
        report.write_molecule(&files::query_name(q), &screening, &hits)?;
    }
    report.finish()?;

    eprintln!(
        "screen ok: queries={} collections={} normalize={} zscore={} policy={:?} hits={}",
        args.query.len(),
        plan.paths.len(),
        config.normalize,
        config.zscore_threshold,
        config.threshold_policy,
        total_hits
    );
    Ok(())
}
