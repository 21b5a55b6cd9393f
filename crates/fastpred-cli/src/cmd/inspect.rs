// crates/fastpred-cli/src/cmd/inspect.rs

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use clap::Args;
use fastpred_core::scanner::{check_layout, CollectionScanner};
use fastpred_core::similarity::popcount_slice;
use fastpred_core::{digest, transport, FingerprintKind};

use crate::io::files;

#[derive(Args)]
pub struct InspectArgs {
    /// Query stream (.qbfp) to list
    #[arg(long, conflicts_with = "collection")]
    pub query: Option<String>,

    /// Reference collection (.bfp) to summarize
    #[arg(long = "ref")]
    pub collection: Option<String>,

    /// Fingerprint family of the collection (sets the payload length)
    #[arg(long, conflicts_with = "bits")]
    pub kind: Option<FingerprintKind>,

    /// Explicit collection fingerprint bit length
    #[arg(long)]
    pub bits: Option<u32>,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    match (args.query.as_deref(), args.collection.as_deref()) {
        (Some(q), _) => inspect_query(q),
        (None, Some(c)) => {
            let bits = match (args.kind, args.bits) {
                (Some(k), _) => k.bits(),
                (None, Some(b)) => b,
                (None, None) => anyhow::bail!("--ref needs --kind or --bits"),
            };
            inspect_collection(c, bits)
        }
        (None, None) => anyhow::bail!("one of --query or --ref is required"),
    }
}

fn inspect_query(path: &str) -> anyhow::Result<()> {
    let reader = transport::open_query(Path::new(path)).with_context(|| format!("open {path}"))?;

    println!("--- inspect query ---");
    println!("file       = {path}");
    let mut n = 0usize;
    for rec in reader {
        let rec = rec.with_context(|| format!("read {path}"))?;
        println!(
            "record[{n}]  id={} bits={} bytes={} popcount={}",
            rec.id,
            rec.fingerprint.bits(),
            rec.fingerprint.byte_len(),
            rec.fingerprint.popcount()
        );
        n += 1;
    }
    println!("records    = {n}");
    Ok(())
}

fn inspect_collection(path: &str, bits: u32) -> anyhow::Result<()> {
    if bits % 8 != 0 {
        anyhow::bail!("bit length must be a multiple of 8, got {bits}");
    }
    let fp_len = (bits / 8) as usize;
    let bytes = files::load_collection(path)?;
    let count = check_layout(&bytes, fp_len).with_context(|| format!("layout of {path}"))?;

    let mut seen: HashSet<&str> = HashSet::with_capacity(count);
    let mut duplicates = 0usize;
    let mut min_pc = u64::MAX;
    let mut max_pc = 0u64;
    let mut sum_pc = 0u64;
    let mut empty = 0usize;
    let mut first: Option<&str> = None;
    let mut last: Option<&str> = None;

    for rec in CollectionScanner::new(&bytes, fp_len) {
        let rec = rec.with_context(|| format!("scan {path}"))?;
        if !seen.insert(rec.id) {
            duplicates += 1;
        }
        let pc = popcount_slice(rec.fingerprint);
        min_pc = min_pc.min(pc);
        max_pc = max_pc.max(pc);
        sum_pc += pc;
        if pc == 0 {
            empty += 1;
        }
        first.get_or_insert(rec.id);
        last = Some(rec.id);
    }
    if count == 0 {
        min_pc = 0;
    }
    let mean_pc = if count == 0 { 0.0 } else { sum_pc as f64 / count as f64 };

    println!("--- inspect collection ---");
    println!("file           = {path}");
    println!("bytes          = {}", bytes.len());
    println!("bits           = {bits}");
    println!("records        = {count}");
    println!("duplicate_ids  = {duplicates}");
    println!("first_id       = {}", first.unwrap_or("-"));
    println!("last_id        = {}", last.unwrap_or("-"));
    println!("popcount       = min={min_pc} max={max_pc} mean={mean_pc:.3}");
    println!("empty_fps      = {empty}");
    println!("collection_id  = {}", digest::collection_id(&bytes));
    println!("crc32          = {:08x}", digest::crc32(&bytes));

    if empty > 0 {
        println!("WARN: {empty} all-zero fingerprints; they score NaN against an all-zero query");
    }
    Ok(())
}
