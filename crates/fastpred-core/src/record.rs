// crates/fastpred-core/src/record.rs

use std::io::Write;

use crate::config::MAX_ID_LEN;
use crate::error::{Result, ScreenError};

/// Byte-packed bit array. Bits are stored MSB-first as they appear on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fingerprint {
    bits: u32,
    bytes: Vec<u8>,
}

impl Fingerprint {
    /// Wrap a payload; the bit length is taken as `8 * bytes.len()`.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let bits = u32::try_from(bytes.len())
            .ok()
            .and_then(|n| n.checked_mul(8))
            .ok_or_else(|| {
                ScreenError::RecordFormat(format!("fingerprint too long: {} bytes", bytes.len()))
            })?;
        Ok(Self { bits, bytes })
    }

    /// Payload with an explicit declared bit length (query records). Only
    /// `bits / 8` whole bytes are carried; trailing bits are dropped.
    pub(crate) fn with_declared_bits(bits: u32, bytes: Vec<u8>) -> Self {
        debug_assert_eq!(bytes.len(), (bits / 8) as usize);
        Self { bits, bytes }
    }

    /// Decode a hexadecimal payload whose decoded size must be `bits / 8`.
    pub fn from_hex(hex: &str, bits: u32) -> Result<Self> {
        if bits % 8 != 0 {
            return Err(ScreenError::Argument(format!(
                "bit length must be a multiple of 8, got {bits}"
            )));
        }
        let bytes = decode_hex(hex.trim())?;
        if bytes.len() != (bits / 8) as usize {
            return Err(ScreenError::Argument(format!(
                "hex fingerprint holds {} bytes, expected {} ({} bits)",
                bytes.len(),
                bits / 8,
                bits
            )));
        }
        Ok(Self { bits, bytes })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn popcount(&self) -> u64 {
        crate::similarity::popcount_slice(&self.bytes)
    }
}

/// One molecule as stored in a query stream or a reference collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoleculeRecord {
    pub id: String,
    pub fingerprint: Fingerprint,
}

impl MoleculeRecord {
    pub fn new(id: impl Into<String>, fingerprint: Fingerprint) -> Self {
        Self { id: id.into(), fingerprint }
    }
}

/// Query layout: `id_len:u8 | id | bit_len:u32 BE | payload[bit_len / 8]`.
pub fn write_query_record<W: Write>(w: &mut W, id: &str, fp: &Fingerprint) -> Result<()> {
    let id_len = checked_id_len(id)?;
    check_whole_bytes(fp)?;
    w.write_all(&[id_len])?;
    w.write_all(id.as_bytes())?;
    w.write_all(&fp.bits.to_be_bytes())?;
    w.write_all(&fp.bytes)?;
    Ok(())
}

/// Reference layout: `id_len:u8 | id | payload`. The payload size is not
/// stored; readers must be told it by the paired query record.
pub fn write_reference_record<W: Write>(w: &mut W, id: &str, fp: &Fingerprint) -> Result<()> {
    let id_len = checked_id_len(id)?;
    check_whole_bytes(fp)?;
    w.write_all(&[id_len])?;
    w.write_all(id.as_bytes())?;
    w.write_all(&fp.bytes)?;
    Ok(())
}

/// Decode an id field. Ids are expected to be ASCII; anything that is not
/// valid UTF-8 is rejected rather than silently replaced.
pub(crate) fn decode_id(raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw)
        .map_err(|e| ScreenError::RecordFormat(format!("molecule id is not valid utf-8: {e}")))
}

pub(crate) fn check_id_len(len: u8) -> Result<()> {
    if len as usize > MAX_ID_LEN {
        return Err(ScreenError::RecordFormat(format!(
            "id length {len} exceeds {MAX_ID_LEN}"
        )));
    }
    Ok(())
}

fn checked_id_len(id: &str) -> Result<u8> {
    if id.len() > MAX_ID_LEN {
        return Err(ScreenError::Argument(format!(
            "molecule id is {} bytes, max {MAX_ID_LEN}: {id}",
            id.len()
        )));
    }
    Ok(id.len() as u8)
}

fn check_whole_bytes(fp: &Fingerprint) -> Result<()> {
    if fp.bits % 8 != 0 || fp.bytes.len() != (fp.bits / 8) as usize {
        return Err(ScreenError::Argument(format!(
            "fingerprint of {} bits cannot be written as whole bytes",
            fp.bits
        )));
    }
    Ok(())
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    let raw = s.as_bytes();
    if raw.len() % 2 != 0 {
        return Err(ScreenError::Argument(format!("odd-length hex string ({} chars)", raw.len())));
    }
    let mut out = Vec::with_capacity(raw.len() / 2);
    for pair in raw.chunks_exact(2) {
        let hi = nibble(pair[0])?;
        let lo = nibble(pair[1])?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

fn nibble(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(ScreenError::Argument(format!("invalid hex digit {:?}", c as char))),
    }
}
