// crates/fastpred-core/src/fpf.rs

use std::collections::HashMap;

use tracing::warn;

use crate::error::{Result, ScreenError};
use crate::record::{write_query_record, write_reference_record, Fingerprint, MoleculeRecord};

/// Parse a text fingerprint file: `#` header lines, then one
/// `<molecule id> <hex fingerprint>` per line.
pub fn parse_fpf(text: &str, bits: u32) -> Result<Vec<MoleculeRecord>> {
    let mut out = Vec::new();
    let mut in_header = true;
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if in_header && line.starts_with('#') {
            continue;
        }
        in_header = false;

        let mut fields = line.split_whitespace();
        let (Some(id), Some(hex), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(ScreenError::Argument(format!(
                "line {}: expected `<id> <hex>`, got {line:?}",
                n + 1
            )));
        };
        let fp = Fingerprint::from_hex(hex, bits)
            .map_err(|e| ScreenError::Argument(format!("line {} ({id}): {e}", n + 1)))?;
        out.push(MoleculeRecord::new(id, fp));
    }
    Ok(out)
}

/// One molecule's query stream, ready to be written as a `.qbfp` file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedQuery {
    pub id: String,
    pub stream: Vec<u8>,
}

/// Result of [`pack_queries`].
#[derive(Clone, Debug, Default)]
pub struct QueryPack {
    pub queries: Vec<PackedQuery>,
    /// Molecules missing from at least one input; they get no stream.
    pub incomplete: Vec<String>,
}

/// Build per-molecule query streams from several fingerprint files.
///
/// Each input is `(bit length, fpf text)`. A molecule's stream holds one
/// record per input, in input order, so record *i* pairs with reference
/// collection *i* when screened. Molecules are emitted in first-seen order.
pub fn pack_queries(inputs: &[(u32, &str)]) -> Result<QueryPack> {
    let mut order: Vec<String> = Vec::new();
    let mut per_molecule: HashMap<String, Vec<Option<Fingerprint>>> = HashMap::new();

    for (slot, (bits, text)) in inputs.iter().enumerate() {
        for rec in parse_fpf(text, *bits)? {
            let fps = per_molecule.entry(rec.id.clone()).or_insert_with(|| {
                order.push(rec.id.clone());
                vec![None; inputs.len()]
            });
            if fps[slot].is_some() {
                return Err(ScreenError::Argument(format!(
                    "molecule {} appears twice in input #{slot}",
                    rec.id
                )));
            }
            fps[slot] = Some(rec.fingerprint);
        }
    }

    let mut pack = QueryPack::default();
    for id in order {
        let fps = per_molecule.remove(&id).unwrap_or_default();
        if fps.iter().any(Option::is_none) {
            warn!(molecule = %id, "molecule missing from some fingerprint inputs; skipped");
            pack.incomplete.push(id);
            continue;
        }
        let mut stream = Vec::new();
        for fp in fps.iter().flatten() {
            write_query_record(&mut stream, &id, fp)?;
        }
        pack.queries.push(PackedQuery { id, stream });
    }
    Ok(pack)
}

/// A reference collection buffer and its ids in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedCollection {
    pub bytes: Vec<u8>,
    pub ids: Vec<String>,
}

pub fn pack_collection(text: &str, bits: u32) -> Result<PackedCollection> {
    let records = parse_fpf(text, bits)?;
    let mut bytes = Vec::with_capacity(records.len() * (1 + 16 + (bits / 8) as usize));
    let mut ids = Vec::with_capacity(records.len());
    for rec in records {
        write_reference_record(&mut bytes, &rec.id, &rec.fingerprint)?;
        ids.push(rec.id);
    }
    Ok(PackedCollection { bytes, ids })
}
