// crates/fastpred-core/src/transport.rs

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{Result, ScreenError};
use crate::reader::FingerprintReader;

/// Frame magic of a zstd stream.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

pub fn is_zstd(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[..4] == ZSTD_MAGIC
}

/// Query stream opened from disk, decompressed on the fly when the file is a
/// zstd frame.
pub type QueryStream = FingerprintReader<Box<dyn Read>>;

pub fn open_query(path: &Path) -> Result<QueryStream> {
    let file = File::open(path).map_err(|e| ScreenError::file_open(path, e))?;
    let mut buffered = BufReader::new(file);
    let head = buffered.fill_buf()?;
    let src: Box<dyn Read> = if is_zstd(head) {
        Box::new(zstd::stream::read::Decoder::with_buffer(buffered)?)
    } else {
        Box::new(buffered)
    };
    Ok(FingerprintReader::new(src))
}

/// Load a whole reference collection into memory.
pub fn load_collection(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| ScreenError::file_open(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    if is_zstd(&bytes) {
        return Ok(zstd::stream::decode_all(bytes.as_slice())?);
    }
    Ok(bytes)
}
