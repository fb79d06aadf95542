/// Represents the compression method applied to a package entry.
///
/// This enum describes how the stored bytes of an entry must be transformed
/// to recover its logical contents. Format parsers assign the variant while
/// building the directory table; the package engine dispatches on it when an
/// entry is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Plain raw data, stored as-is.
    None,
    /// Raw DEFLATE stream, no zlib or gzip framing.
    Deflate,
    /// GZIP-framed DEFLATE stream, with header and trailing CRC.
    Gzip,
    /// PKWARE Data Compression Library "implode" stream.
    Implode,
    /// LZRW1 stream.
    Lzrw1,
    /// Unknown or unsupported method, stores the raw on-disk tag.
    Unknown(u8),
}

impl CompressionMethod {
    /// Whether fetching an entry with this method invokes a codec at all.
    pub fn is_compressed(self) -> bool {
        !matches!(self, CompressionMethod::None)
    }
}
