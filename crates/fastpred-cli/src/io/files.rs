// crates/fastpred-cli/src/io/files.rs

use std::path::Path;

use anyhow::Context;
use fastpred_core::transport;

/// Load a reference collection (.bfp, optionally zstd-compressed).
pub fn load_collection(path: &str) -> anyhow::Result<Vec<u8>> {
    transport::load_collection(Path::new(path)).with_context(|| format!("load collection {path}"))
}

pub fn read_text(path: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {path}"))
}

/// Write `bytes` to `path`, zstd-compressing them first when a level is given.
pub fn write_bytes(path: &Path, bytes: &[u8], zstd_level: Option<i32>) -> anyhow::Result<()> {
    let out = match zstd_level {
        Some(level) => zstd::stream::encode_all(bytes, level)
            .with_context(|| format!("zstd compress {}", path.display()))?,
        None => bytes.to_vec(),
    };
    std::fs::write(path, out).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Molecule name of a query stream file: its name without `.zst` / `.qbfp`.
pub fn query_name(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let name = name.strip_suffix(".zst").unwrap_or(&name);
    name.strip_suffix(".qbfp").unwrap_or(name).to_string()
}
