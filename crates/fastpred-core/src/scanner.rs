// crates/fastpred-core/src/scanner.rs

use crate::error::{Result, ScreenError};
use crate::record::{check_id_len, Fingerprint, MoleculeRecord};

/// Borrowed view of one reference record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefRecord<'a> {
    pub id: &'a str,
    pub fingerprint: &'a [u8],
}

impl RefRecord<'_> {
    pub fn to_record(&self) -> Result<MoleculeRecord> {
        Ok(MoleculeRecord::new(self.id, Fingerprint::from_bytes(self.fingerprint.to_vec())?))
    }
}

/// Forward-only walk over an in-memory reference collection.
///
/// Layout per record:
/// id_len:u8
/// id[id_len]
/// payload[fp_len]
///
/// `fp_len` is NOT stored in the collection. It comes from the query record
/// the collection is paired with; scanning with any other length silently
/// misparses, so screening goes through [`CollectionScanner::checked`].
pub struct CollectionScanner<'a> {
    buf: &'a [u8],
    cursor: usize,
    fp_len: usize,
    index: usize,
    failed: bool,
}

impl<'a> CollectionScanner<'a> {
    /// Unchecked scanner; a short tail surfaces as `TruncatedRecord` when reached.
    pub fn new(buf: &'a [u8], fp_len: usize) -> Self {
        Self { buf, cursor: 0, fp_len, index: 0, failed: false }
    }

    /// Verify the whole buffer decomposes into records of `fp_len` payload
    /// bytes before handing out any of them.
    pub fn checked(buf: &'a [u8], fp_len: usize) -> Result<Self> {
        check_layout(buf, fp_len)?;
        Ok(Self::new(buf, fp_len))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn read_record(&mut self) -> Result<RefRecord<'a>> {
        let buf = self.buf;
        let start = self.cursor;
        let id_len = buf[start];
        check_id_len(id_len)?;
        let id_start = start + 1;
        let fp_start = id_start + id_len as usize;
        let end = fp_start + self.fp_len;
        if end > buf.len() {
            return Err(ScreenError::TruncatedRecord(format!(
                "reference record #{} at offset {start}: needs {} bytes, buffer holds {}",
                self.index,
                end - start,
                buf.len() - start
            )));
        }
        let id = std::str::from_utf8(&buf[id_start..fp_start]).map_err(|e| {
            ScreenError::RecordFormat(format!(
                "reference record #{} at offset {start}: id is not valid utf-8: {e}",
                self.index
            ))
        })?;
        self.cursor = end;
        self.index += 1;
        Ok(RefRecord { id, fingerprint: &buf[fp_start..end] })
    }
}

impl<'a> Iterator for CollectionScanner<'a> {
    type Item = Result<RefRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor >= self.buf.len() {
            return None;
        }
        let rec = self.read_record();
        if rec.is_err() {
            self.failed = true;
        }
        Some(rec)
    }
}

/// Walk the id-length prefixes of `buf` and confirm the last record ends
/// exactly at the end of the buffer. Returns the record count.
pub fn check_layout(buf: &[u8], fp_len: usize) -> Result<usize> {
    let mut cursor = 0usize;
    let mut count = 0usize;
    while cursor < buf.len() {
        let id_len = buf[cursor];
        if id_len as usize > crate::config::MAX_ID_LEN {
            return Err(ScreenError::LayoutMismatch(format!(
                "record #{count} at offset {cursor} declares id length {id_len}; \
                 payload length {fp_len} does not fit this collection"
            )));
        }
        let next = cursor + 1 + id_len as usize + fp_len;
        if next > buf.len() {
            return Err(ScreenError::LayoutMismatch(format!(
                "record #{count} at offset {cursor} overruns the {}-byte collection by {} bytes \
                 with a {fp_len}-byte payload",
                buf.len(),
                next - buf.len()
            )));
        }
        cursor = next;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::write_reference_record;

    fn collection(records: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (id, bytes) in records {
            let fp = Fingerprint::from_bytes(bytes.to_vec()).unwrap();
            write_reference_record(&mut out, id, &fp).unwrap();
        }
        out
    }

    #[test]
    fn scans_all_records() {
        let buf = collection(&[("M1", &[0xC0]), ("M22", &[0x01])]);
        let recs: Vec<_> = CollectionScanner::checked(&buf, 1)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            recs,
            vec![
                RefRecord { id: "M1", fingerprint: &[0xC0] },
                RefRecord { id: "M22", fingerprint: &[0x01] },
            ]
        );
    }

    #[test]
    fn empty_collection_yields_nothing() {
        assert_eq!(check_layout(&[], 128).unwrap(), 0);
        assert_eq!(CollectionScanner::new(&[], 128).count(), 0);
    }

    #[test]
    fn wrong_payload_length_fails_fast() {
        let buf = collection(&[("M1", &[0xC0, 0x00]), ("M2", &[0x01, 0x02])]);
        assert_eq!(check_layout(&buf, 2).unwrap(), 2);
        let err = CollectionScanner::checked(&buf, 3).err().unwrap();
        assert!(matches!(err, ScreenError::LayoutMismatch(_)), "{err:?}");
    }

    #[test]
    fn unchecked_scan_reports_truncation_at_the_tail() {
        let mut buf = collection(&[("M1", &[0xC0]), ("M2", &[0x01])]);
        buf.pop();
        let items: Vec<_> = CollectionScanner::new(&buf, 1).collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(ScreenError::TruncatedRecord(_))));
    }

    #[test]
    fn ref_record_converts_to_owned() {
        let buf = collection(&[("M1", &[0xC0])]);
        let rec = CollectionScanner::new(&buf, 1).next().unwrap().unwrap();
        let owned = rec.to_record().unwrap();
        assert_eq!(owned.id, "M1");
        assert_eq!(owned.fingerprint.bits(), 8);
    }
}
