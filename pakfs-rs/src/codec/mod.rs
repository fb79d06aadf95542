//! Decompression codecs and the per-entry dispatch used by the package
//! engine.

pub mod compression_method;
pub mod explode;
pub mod inflate;
pub mod lzrw1;

pub use compression_method::CompressionMethod;

use crate::error::PakFsError;

/// Transforms an entry's stored bytes into its logical contents.
///
/// [`CompressionMethod::None`] short-circuits and returns `raw` untouched.
/// An unrecognized method reports [`PakFsError::Unsupported`], aborting only
/// the load of that one entry.
pub fn decompress(
    method: CompressionMethod,
    raw: Vec<u8>,
    expected_len: usize,
) -> Result<Vec<u8>, PakFsError> {
    match method {
        CompressionMethod::None => Ok(raw),
        CompressionMethod::Deflate => inflate::inflate(&raw, expected_len),
        CompressionMethod::Gzip => inflate::gunzip(&raw, expected_len),
        CompressionMethod::Implode => {
            let out = explode::explode(&raw, expected_len)
                .map_err(|e| PakFsError::Codec(format!("implode: {e}")))?;
            if out.len() != expected_len {
                return Err(PakFsError::SizeMismatch(format!(
                    "implode produced {} bytes, directory records {expected_len}",
                    out.len()
                )));
            }
            Ok(out)
        }
        CompressionMethod::Lzrw1 => lzrw1::decompress(&raw, expected_len),
        CompressionMethod::Unknown(tag) => Err(PakFsError::Unsupported(format!(
            "unknown compression tag {tag:#04x}"
        ))),
    }
}
