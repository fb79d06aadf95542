//! Sentient `VSR` chunked archives.
//!
//! A fixed 32-byte header (magic `1RSV`), a `CRID` directory chunk of
//! 40-byte records (offset, length, eight reserved words), a 12-byte unused
//! chunk, and a `TRTS` string-table chunk. The string table opens with an
//! offset table, but the offsets are never consulted: names are read as
//! consecutive null-terminated strings of at most 256 bytes, one per
//! directory record, which is crude but matches the data. All fields
//! little-endian.

use crate::error::PakFsError;
use crate::ext::io_ext::{ReadStringExt, SeekExt};
use crate::file_handle::FileHandle;
use crate::package::loader_registry::FormatLoader;
use crate::package::package::Package;
use crate::package::package_entry::PackageEntry;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

const HEADER_LEN: u64 = 32;
const UNUSED_CHUNK_LEN: u64 = 12;
const MAX_NAME_LEN: usize = 256;

pub fn loader() -> FormatLoader {
    FormatLoader {
        name: "vsr",
        extensions: &["vsr"],
        load_path: Some(load),
        parse: Some(parse),
    }
}

pub fn load(path: &Path) -> Result<Package, PakFsError> {
    let mut file = FileHandle::open_local(path, false)?;
    parse(&mut file)
}

pub fn parse(file: &mut FileHandle) -> Result<Package, PakFsError> {
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if &magic != b"1RSV" {
        return Err(PakFsError::TypeMismatch(format!(
            "not a VSR archive: {}",
            file.path().display()
        )));
    }
    file.seek(SeekFrom::Start(HEADER_LEN))?;

    let mut chunk_magic = [0u8; 4];
    file.read_exact(&mut chunk_magic)?;
    if &chunk_magic != b"CRID" {
        return Err(PakFsError::TypeMismatch(format!(
            "missing VSR directory chunk in {}",
            file.path().display()
        )));
    }
    let count = file.read_u32::<LittleEndian>()?;
    if u64::from(count) * 40 > file.size()? {
        return Err(PakFsError::TypeMismatch(format!(
            "VSR directory spans past the end of {}",
            file.path().display()
        )));
    }

    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let offset = u64::from(file.read_u32::<LittleEndian>()?);
        let length = u64::from(file.read_u32::<LittleEndian>()?);
        file.skip(32)?;
        records.push((offset, length));
    }

    file.skip(UNUSED_CHUNK_LEN)?;

    file.read_exact(&mut chunk_magic)?;
    if &chunk_magic != b"TRTS" {
        return Err(PakFsError::TypeMismatch(format!(
            "missing VSR string table in {}",
            file.path().display()
        )));
    }
    let _table_len = file.read_u32::<LittleEndian>()?;
    // The leading offset table is never used; names are read back to back.
    file.skip(u64::from(count) * 4)?;

    let mut entries = Vec::with_capacity(records.len());
    for (offset, length) in records {
        let name = file.read_cstring(MAX_NAME_LEN)?;
        entries.push(PackageEntry::uncompressed(name, offset, length));
    }

    Ok(Package::new(file.path().to_path_buf(), entries))
}
