// crates/fastpred-cli/src/cmd/pack_query.rs

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Args;
use fastpred_core::fpf;
use fastpred_core::FingerprintKind;

use crate::io::files;

/// `KIND=PATH` (or `BITS=PATH`) naming an .fpf file and its fingerprint size.
#[derive(Clone, Debug)]
pub struct FpfInput {
    pub label: String,
    pub bits: u32,
    pub path: String,
}

impl FromStr for FpfInput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (label, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected KIND=PATH, got {s:?}"))?;
        let bits = match label.parse::<u32>() {
            Ok(bits) => bits,
            Err(_) => label.parse::<FingerprintKind>().map_err(|e| e.to_string())?.bits(),
        };
        Ok(Self { label: label.to_string(), bits, path: path.to_string() })
    }
}

#[derive(Args)]
pub struct PackQueryArgs {
    /// Fingerprint file as KIND=PATH (e.g. ECFP4=out/mols_ECFP4.fpf) or BITS=PATH.
    /// Repeat in the same order as the reference collections used to screen.
    #[arg(long = "input", required = true)]
    pub inputs: Vec<FpfInput>,

    /// Directory receiving one <molecule>.qbfp per molecule
    #[arg(long)]
    pub out_dir: String,
}

pub fn run(args: PackQueryArgs) -> anyhow::Result<()> {
    let mut texts = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        texts.push((input.bits, files::read_text(&input.path)?));
    }
    let borrowed: Vec<(u32, &str)> = texts.iter().map(|(b, t)| (*b, t.as_str())).collect();
    let pack = fpf::pack_queries(&borrowed).context("pack query fingerprints")?;

    let out_dir = PathBuf::from(&args.out_dir);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create out dir {}", out_dir.display()))?;

    for q in &pack.queries {
        let path = out_dir.join(format!("{}.qbfp", q.id));
        files::write_bytes(&path, &q.stream, None)?;
    }

    for id in &pack.incomplete {
        eprintln!("WARN: {id} is missing from at least one input; no query stream written");
    }

    let kinds: Vec<&str> = args.inputs.iter().map(|i| i.label.as_str()).collect();
    eprintln!(
        "pack-query ok: molecules={} incomplete={} kinds={} out_dir={}",
        pack.queries.len(),
        pack.incomplete.len(),
        kinds.join(","),
        args.out_dir
    );
    Ok(())
}
