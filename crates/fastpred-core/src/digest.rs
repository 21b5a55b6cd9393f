//! Provenance digests printed next to screening results, so a report can be
//! tied to the exact reference collection bytes it was computed from.

/// Quick integrity check of a packed collection (IEEE CRC32).
pub fn crc32(collection: &[u8]) -> u32 {
    crc32fast::hash(collection)
}

/// Stable identifier of a reference collection: hex of the leading 16 bytes
/// of its BLAKE3 digest.
pub fn collection_id(collection: &[u8]) -> String {
    let digest = blake3::hash(collection);
    hex(&digest.as_bytes()[..16])
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut s = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        s.push(HEX[(b >> 4) as usize] as char);
        s.push(HEX[(b & 0x0F) as usize] as char);
    }
    s
}
