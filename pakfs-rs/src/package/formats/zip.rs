//! ZIP archives, including the PK3/PK4 conventions layered on them.
//!
//! The central directory is located through the end-of-central-directory
//! record scanned back from the file tail. Store and deflate methods are
//! supported; encrypted entries are pruned at parse time. Local headers are
//! skipped lazily, at fetch time, and every load is verified against the
//! directory's CRC-32.

use crate::codec::{self, CompressionMethod};
use crate::error::PakFsError;
use crate::ext::io_ext::{ReadStringExt, SeekExt};
use crate::file_handle::FileHandle;
use crate::package::loader_registry::FormatLoader;
use crate::package::package::{EntryLoader, Package};
use crate::package::package_entry::PackageEntry;
use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use tracing::warn;

const EOCD_SIGNATURE: u32 = 0x06054B50;
const CENTRAL_SIGNATURE: u32 = 0x02014B50;
const LOCAL_SIGNATURE: u32 = 0x04034B50;
/// EOCD fixed part plus the maximum comment length.
const EOCD_SEARCH_SPAN: u64 = 22 + 0xFFFF;

const METHOD_STORE: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

bitflags! {
    /// General-purpose bit flags from a ZIP entry header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ZipFlags: u16 {
        const ENCRYPTED = 1 << 0;
        const DATA_DESCRIPTOR = 1 << 3;
        const UTF8_NAMES = 1 << 11;
    }
}

pub fn loader() -> FormatLoader {
    FormatLoader {
        name: "zip",
        extensions: &["zip", "pk3", "pk4"],
        load_path: Some(load),
        parse: Some(parse),
    }
}

/// Skips the entry's local header, reads the stored bytes, inflates them if
/// needed, and checks the result against the central directory's CRC.
struct ZipEntryLoader {
    crcs: Vec<u32>,
}

impl EntryLoader for ZipEntryLoader {
    fn load(&self, package: &Package, index: usize) -> Result<Vec<u8>, PakFsError> {
        let entry = package.entry_at(index)?;
        let mut file = File::open(package.path()).map_err(|e| {
            PakFsError::Read(format!("failed to reopen {}: {e}", package.path().display()))
        })?;

        file.seek(SeekFrom::Start(entry.offset))?;
        let signature = file.read_u32::<LittleEndian>()?;
        if signature != LOCAL_SIGNATURE {
            return Err(PakFsError::TypeMismatch(format!(
                "bad local header for {} at {:#x}",
                entry.name, entry.offset
            )));
        }
        // Version, flags, method, mtime, crc and sizes repeat the central
        // directory (or are zero under the data-descriptor flag); the
        // central values are authoritative.
        file.skip(22)?;
        let name_len = u64::from(file.read_u16::<LittleEndian>()?);
        let extra_len = u64::from(file.read_u16::<LittleEndian>()?);
        file.skip(name_len + extra_len)?;

        let raw = file.read_vec(entry.stored_len() as usize)?;
        let bytes = codec::decompress(entry.compression, raw, entry.file_size as usize)?;

        let crc = crc32fast::hash(&bytes);
        if crc != self.crcs[index] {
            return Err(PakFsError::Codec(format!(
                "crc mismatch for {}: computed {crc:#010x}, directory records {:#010x}",
                entry.name, self.crcs[index]
            )));
        }
        Ok(bytes)
    }
}

pub fn load(path: &Path) -> Result<Package, PakFsError> {
    let mut file = FileHandle::open_local(path, false)?;
    parse(&mut file)
}

pub fn parse(file: &mut FileHandle) -> Result<Package, PakFsError> {
    let size = file.size()?;
    let (cd_offset, total_entries) = find_central_directory(file, size)?;

    file.seek(SeekFrom::Start(cd_offset))?;
    let mut entries = Vec::with_capacity(usize::from(total_entries));
    let mut crcs = Vec::with_capacity(usize::from(total_entries));

    for _ in 0..total_entries {
        let signature = file.read_u32::<LittleEndian>()?;
        if signature != CENTRAL_SIGNATURE {
            return Err(PakFsError::TypeMismatch(format!(
                "bad central directory record at {:#x}",
                file.offset() - 4
            )));
        }
        let _version_made = file.read_u16::<LittleEndian>()?;
        let _version_needed = file.read_u16::<LittleEndian>()?;
        let flags = ZipFlags::from_bits_retain(file.read_u16::<LittleEndian>()?);
        let method = file.read_u16::<LittleEndian>()?;
        let _mod_time = file.read_u16::<LittleEndian>()?;
        let _mod_date = file.read_u16::<LittleEndian>()?;
        let crc = file.read_u32::<LittleEndian>()?;
        let compressed_size = u64::from(file.read_u32::<LittleEndian>()?);
        let file_size = u64::from(file.read_u32::<LittleEndian>()?);
        let name_len = usize::from(file.read_u16::<LittleEndian>()?);
        let extra_len = u64::from(file.read_u16::<LittleEndian>()?);
        let comment_len = u64::from(file.read_u16::<LittleEndian>()?);
        let _disk_start = file.read_u16::<LittleEndian>()?;
        let _internal_attrs = file.read_u16::<LittleEndian>()?;
        let _external_attrs = file.read_u32::<LittleEndian>()?;
        let local_offset = u64::from(file.read_u32::<LittleEndian>()?);

        let name = {
            let raw = file.read_vec(name_len)?;
            String::from_utf8_lossy(&raw).into_owned()
        };
        file.skip(extra_len + comment_len)?;

        // Directory placeholders carry no data.
        if name.ends_with('/') {
            continue;
        }
        if flags.contains(ZipFlags::ENCRYPTED) {
            warn!(entry = %name, "pruning encrypted zip entry");
            continue;
        }
        let compression = match method {
            METHOD_STORE => CompressionMethod::None,
            METHOD_DEFLATE => CompressionMethod::Deflate,
            other => CompressionMethod::Unknown(other as u8),
        };

        entries.push(PackageEntry {
            name,
            offset: local_offset,
            file_size,
            compressed_size,
            compression,
        });
        crcs.push(crc);
    }

    Ok(Package::with_loader(
        file.path().to_path_buf(),
        entries,
        Box::new(ZipEntryLoader { crcs }),
    ))
}

/// Locates the end-of-central-directory record by scanning backwards from
/// the file tail, and returns the central directory's offset and entry
/// count.
fn find_central_directory(file: &mut FileHandle, size: u64) -> Result<(u64, u16), PakFsError> {
    let span = size.min(EOCD_SEARCH_SPAN);
    let start = size - span;
    file.seek(SeekFrom::Start(start))?;
    let tail = file.read_vec(span as usize)?;

    let needle = EOCD_SIGNATURE.to_le_bytes();
    let found = tail
        .windows(4)
        .rposition(|window| window == needle)
        .ok_or_else(|| {
            PakFsError::TypeMismatch(format!("not a zip archive: {}", file.path().display()))
        })?;

    file.seek(SeekFrom::Start(start + found as u64 + 4))?;
    let _disk_number = file.read_u16::<LittleEndian>()?;
    let _cd_disk = file.read_u16::<LittleEndian>()?;
    let _disk_entries = file.read_u16::<LittleEndian>()?;
    let total_entries = file.read_u16::<LittleEndian>()?;
    let _cd_size = file.read_u32::<LittleEndian>()?;
    let cd_offset = u64::from(file.read_u32::<LittleEndian>()?);
    Ok((cd_offset, total_entries))
}
