use crate::error::PakFsError;
use flate2::read::{DeflateDecoder, GzDecoder};
use std::io::Read;

/// Inflates a raw DEFLATE stream (no zlib or gzip framing).
///
/// `expected_len` is the logical size recorded in the archive directory; a
/// stream that inflates to any other length is rejected.
pub fn inflate(raw: &[u8], expected_len: usize) -> Result<Vec<u8>, PakFsError> {
    let mut decoder = DeflateDecoder::new(raw);
    let mut out = Vec::with_capacity(expected_len);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| PakFsError::Codec(format!("deflate: {e}")))?;
    check_len(out, expected_len, "deflate")
}

/// Inflates a GZIP-framed stream. The frame's trailing CRC is verified by the
/// decoder itself.
pub fn gunzip(raw: &[u8], expected_len: usize) -> Result<Vec<u8>, PakFsError> {
    let mut decoder = GzDecoder::new(raw);
    let mut out = Vec::with_capacity(expected_len);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| PakFsError::Codec(format!("gzip: {e}")))?;
    check_len(out, expected_len, "gzip")
}

fn check_len(out: Vec<u8>, expected_len: usize, codec: &str) -> Result<Vec<u8>, PakFsError> {
    if out.len() != expected_len {
        return Err(PakFsError::SizeMismatch(format!(
            "{codec} produced {} bytes, directory records {expected_len}",
            out.len()
        )));
    }
    Ok(out)
}
