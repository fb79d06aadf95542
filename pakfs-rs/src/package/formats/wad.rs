//! WAD archive directories: Doom `IWAD`/`PWAD` and Quake/Half-Life
//! `WAD2`/`WAD3`.
//!
//! Doom directories are 16-byte records with 8-byte names; WAD2/WAD3 use
//! 32-byte records with 16-byte names and a per-entry compression byte that
//! shipped data never sets. All fields are little-endian.

use crate::codec::CompressionMethod;
use crate::error::PakFsError;
use crate::ext::io_ext::ReadStringExt;
use crate::file_handle::FileHandle;
use crate::package::loader_registry::FormatLoader;
use crate::package::package::Package;
use crate::package::package_entry::PackageEntry;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Seek, SeekFrom};
use std::path::Path;
use tracing::warn;

pub fn loader() -> FormatLoader {
    FormatLoader {
        name: "wad",
        extensions: &["wad"],
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

    let wide_names = match &magic {
        b"IWAD" | b"PWAD" => false,
        b"WAD2" | b"WAD3" => true,
        _ => {
            return Err(PakFsError::TypeMismatch(format!(
                "not a WAD archive: {}",
                file.path().display()
            )))
        }
    };

    let count = file.read_u32::<LittleEndian>()?;
    let dir_offset = file.read_u32::<LittleEndian>()?;
    let record_len: u64 = if wide_names { 32 } else { 16 };
    let total = file.size()?;
    if u64::from(dir_offset) + u64::from(count) * record_len > total {
        return Err(PakFsError::TypeMismatch(format!(
            "WAD directory spans past the end of {}",
            file.path().display()
        )));
    }

    file.seek(SeekFrom::Start(u64::from(dir_offset)))?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if wide_names {
            let offset = file.read_u32::<LittleEndian>()?;
            let disk_size = file.read_u32::<LittleEndian>()?;
            let size = file.read_u32::<LittleEndian>()?;
            let _lump_type = file.read_u8()?;
            let compression = file.read_u8()?;
            let _pad = file.read_u16::<LittleEndian>()?;
            let name = file.read_fixed_string(16)?;
            let mut entry = PackageEntry::uncompressed(name, u64::from(offset), u64::from(size));
            entry.compressed_size = u64::from(disk_size);
            if compression != 0 {
                // No shipped WAD2/WAD3 data compresses lumps; an entry that
                // does fails at load rather than poisoning the whole package.
                warn!(entry = %entry.name, tag = compression, "unsupported WAD lump compression");
                entry.compression = CompressionMethod::Unknown(compression);
            }
            entries.push(entry);
        } else {
            let offset = file.read_u32::<LittleEndian>()?;
            let size = file.read_u32::<LittleEndian>()?;
            let name = file.read_fixed_string(8)?;
            entries.push(PackageEntry::uncompressed(
                name,
                u64::from(offset),
                u64::from(size),
            ));
        }
    }

    Ok(Package::new(file.path().to_path_buf(), entries))
}
