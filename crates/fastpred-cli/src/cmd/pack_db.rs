// crates/fastpred-cli/src/cmd/pack_db.rs

use std::path::Path;

use anyhow::Context;
use clap::Args;
use fastpred_core::{digest, fpf, FingerprintKind};

use crate::io::files;

#[derive(Args)]
pub struct PackDbArgs {
    /// Input .fpf fingerprint file
    #[arg(long)]
    pub input: String,

    /// Fingerprint family (sets the bit length)
    #[arg(long, conflicts_with = "bits")]
    pub kind: Option<FingerprintKind>,

    /// Explicit fingerprint bit length (multiple of 8)
    #[arg(long)]
    pub bits: Option<u32>,

    /// Output .bfp path
    #[arg(long)]
    pub out: String,

    /// Optional: write the reference ids, one per line, in collection order
    #[arg(long)]
    pub ids: Option<String>,

    /// Optional: zstd-compress the collection at this level
    #[arg(long)]
    pub zstd_level: Option<i32>,
}

pub fn run(args: PackDbArgs) -> anyhow::Result<()> {
    let bits = match (args.kind, args.bits) {
        (Some(k), _) => k.bits(),
        (None, Some(b)) => b,
        (None, None) => anyhow::bail!("one of --kind or --bits is required"),
    };

    let text = files::read_text(&args.input)?;
    let packed = fpf::pack_collection(&text, bits)
        .with_context(|| format!("pack collection {}", args.input))?;

    files::write_bytes(Path::new(&args.out), &packed.bytes, args.zstd_level)?;

    if let Some(ids_path) = args.ids.as_deref() {
        let mut s = packed.ids.join("\n");
        s.push('\n');
        std::fs::write(ids_path, s).with_context(|| format!("write ids {ids_path}"))?;
    }

    eprintln!(
        "pack-db ok: records={} bits={} bytes={} out={} collection_id={} crc32={:08x}",
        packed.ids.len(),
        bits,
        packed.bytes.len(),
        args.out,
        digest::collection_id(&packed.bytes),
        digest::crc32(&packed.bytes)
    );
    Ok(())
}
