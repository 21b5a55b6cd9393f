// crates/fastpred-core/src/reader.rs

use std::io::{ErrorKind, Read};

use crate::config::FP_LENGTH_SIZE;
use crate::error::{Result, ScreenError};
use crate::record::{check_id_len, decode_id, Fingerprint, MoleculeRecord};

/// Sequential reader over a query stream.
///
/// Layout per record:
/// id_len:u8
/// id[id_len]
/// bit_len:u32      (big-endian)
/// payload[bit_len / 8]
///
/// The reader owns its source; dropping it releases the stream on every
/// path, including after an error.
pub struct FingerprintReader<R> {
    src: R,
    records: usize,
    failed: bool,
}

impl<R: Read> FingerprintReader<R> {
    pub fn new(src: R) -> Self {
        Self { src, records: 0, failed: false }
    }

    /// Number of records successfully read so far.
    pub fn records_read(&self) -> usize {
        self.records
    }

    /// Next record, or `None` at a clean end of stream (end exactly on a
    /// record boundary).
    pub fn read_next(&mut self) -> Result<Option<MoleculeRecord>> {
        let mut len = [0u8; 1];
        if !self.read_first_byte(&mut len)? {
            return Ok(None);
        }
        check_id_len(len[0])?;

        let index = self.records;
        let id = self.read_field(len[0] as usize, index, "id")?;
        let id = decode_id(id)?;

        let raw_bits = self.read_field(FP_LENGTH_SIZE, index, "bit length")?;
        let bits = u32::from_be_bytes([raw_bits[0], raw_bits[1], raw_bits[2], raw_bits[3]]);

        let payload = self.read_field((bits / 8) as usize, index, "fingerprint")?;

        self.records += 1;
        Ok(Some(MoleculeRecord::new(id, Fingerprint::with_declared_bits(bits, payload))))
    }

    fn read_first_byte(&mut self, buf: &mut [u8; 1]) -> Result<bool> {
        loop {
            match self.src.read(buf) {
                Ok(0) => return Ok(false),
                Ok(_) => return Ok(true),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    // Reads through `take` so a corrupt length never pre-allocates more than
    // the stream actually holds.
    fn read_field(&mut self, n: usize, index: usize, what: &str) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        (&mut self.src).take(n as u64).read_to_end(&mut out)?;
        if out.len() != n {
            return Err(ScreenError::TruncatedRecord(format!(
                "query record #{index}: {what} needs {n} bytes, stream holds {}",
                out.len()
            )));
        }
        Ok(out)
    }
}

impl<R: Read> Iterator for FingerprintReader<R> {
    type Item = Result<MoleculeRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_next() {
            Ok(rec) => rec.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
