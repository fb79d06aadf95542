use crate::codec::CompressionMethod;

/// One entry in a package's directory table.
///
/// Every format parser reduces its on-disk directory to a table of these, so
/// the package engine can fetch and decompress entries without knowing which
/// format produced them. Names use `/` separators and are relative to the
/// package root.
#[derive(Debug, Clone)]
pub struct PackageEntry {
    /// Entry name, relative to the package root.
    pub name: String,
    /// Byte offset of the stored data within the archive.
    pub offset: u64,
    /// Logical size after decompression.
    pub file_size: u64,
    /// Stored (possibly compressed) size on disk.
    pub compressed_size: u64,
    /// The codec needed to recover the logical contents.
    pub compression: CompressionMethod,
}

impl PackageEntry {
    /// Creates an entry stored without compression.
    pub fn uncompressed(name: String, offset: u64, size: u64) -> Self {
        PackageEntry {
            name,
            offset,
            file_size: size,
            compressed_size: size,
            compression: CompressionMethod::None,
        }
    }

    /// The number of bytes the entry occupies in the archive.
    pub fn stored_len(&self) -> u64 {
        if self.compression.is_compressed() {
            self.compressed_size
        } else {
            self.file_size
        }
    }
}
