//! Quake `PACK` archives: a 12-byte header pointing at a directory of
//! 64-byte records, each a 56-byte name plus offset and length. No
//! compression; all fields little-endian.

use crate::error::PakFsError;
use crate::ext::io_ext::ReadStringExt;
use crate::file_handle::FileHandle;
use crate::package::loader_registry::FormatLoader;
use crate::package::package::Package;
use crate::package::package_entry::PackageEntry;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Seek, SeekFrom};
use std::path::Path;

const RECORD_LEN: u64 = 64;

pub fn loader() -> FormatLoader {
    FormatLoader {
        name: "pak",
        extensions: &["pak"],
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
    std::io::Read::read_exact(file, &mut magic)?;
    if &magic != b"PACK" {
        return Err(PakFsError::TypeMismatch(format!(
            "not a PACK archive: {}",
            file.path().display()
        )));
    }

    let dir_offset = u64::from(file.read_u32::<LittleEndian>()?);
    let dir_length = u64::from(file.read_u32::<LittleEndian>()?);
    if dir_length % RECORD_LEN != 0 {
        return Err(PakFsError::TypeMismatch(format!(
            "PACK directory length {dir_length} is not a multiple of {RECORD_LEN}"
        )));
    }
    if dir_offset + dir_length > file.size()? {
        return Err(PakFsError::TypeMismatch(format!(
            "PACK directory spans past the end of {}",
            file.path().display()
        )));
    }

    file.seek(SeekFrom::Start(dir_offset))?;
    let count = dir_length / RECORD_LEN;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = file.read_fixed_string(56)?;
        let offset = file.read_u32::<LittleEndian>()?;
        let length = file.read_u32::<LittleEndian>()?;
        entries.push(PackageEntry::uncompressed(
            name,
            u64::from(offset),
            u64::from(length),
        ));
    }

    Ok(Package::new(file.path().to_path_buf(), entries))
}
