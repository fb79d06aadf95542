//! Angel `DAT` archives.
//!
//! A 16-byte header whose magic selects the string-table treatment: `DAVE`
//! names are plain, `Dave` names are byte-obfuscated and unrecoverable, so
//! decimal entry indices stand in. The table of contents starts at the next
//! 2048-byte boundary as `{name_offset, offset, size, compressed_size}`
//! quads, with the string table at the next 2048-byte boundary after it.
//! An entry whose compressed size differs from its logical size is
//! gzip-compressed. All fields little-endian.

use crate::codec::CompressionMethod;
use crate::error::PakFsError;
use crate::ext::io_ext::{ReadStringExt, SeekExt};
use crate::file_handle::FileHandle;
use crate::package::loader_registry::FormatLoader;
use crate::package::package::Package;
use crate::package::package_entry::PackageEntry;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// The TOC and string table are padded out to this boundary.
const SECTION_ALIGN: u64 = 2048;

pub fn loader() -> FormatLoader {
    FormatLoader {
        name: "dave",
        extensions: &["dat"],
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
    let obfuscated_names = match &magic {
        b"DAVE" => false,
        b"Dave" => true,
        _ => {
            return Err(PakFsError::TypeMismatch(format!(
                "not a DAVE archive: {}",
                file.path().display()
            )))
        }
    };

    let count = u64::from(file.read_u32::<LittleEndian>()?);
    let names_len = u64::from(file.read_u32::<LittleEndian>()?);
    let _reserved = file.read_u32::<LittleEndian>()?;

    let toc_offset = SECTION_ALIGN;
    if toc_offset + count * 16 > file.size()? {
        return Err(PakFsError::TypeMismatch(format!(
            "DAVE directory spans past the end of {}",
            file.path().display()
        )));
    }

    file.seek(SeekFrom::Start(toc_offset))?;
    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_offset = u64::from(file.read_u32::<LittleEndian>()?);
        let offset = u64::from(file.read_u32::<LittleEndian>()?);
        let size = u64::from(file.read_u32::<LittleEndian>()?);
        let compressed_size = u64::from(file.read_u32::<LittleEndian>()?);
        records.push((name_offset, offset, size, compressed_size));
    }

    let names_offset = file.align_to(SECTION_ALIGN)?;
    if names_offset + names_len > file.size()? {
        return Err(PakFsError::TypeMismatch(format!(
            "DAVE string table spans past the end of {}",
            file.path().display()
        )));
    }

    let mut entries = Vec::with_capacity(records.len());
    for (index, (name_offset, offset, size, compressed_size)) in records.into_iter().enumerate() {
        let name = if obfuscated_names {
            index.to_string()
        } else {
            if name_offset >= names_len {
                return Err(PakFsError::TypeMismatch(format!(
                    "DAVE name offset {name_offset} outside the {names_len}-byte string table"
                )));
            }
            file.seek(SeekFrom::Start(names_offset + name_offset))?;
            file.read_cstring((names_len - name_offset) as usize)?
        };
        let compression = if compressed_size != size {
            CompressionMethod::Gzip
        } else {
            CompressionMethod::None
        };
        entries.push(PackageEntry {
            name,
            offset,
            file_size: size,
            compressed_size,
            compression,
        });
    }

    Ok(Package::new(file.path().to_path_buf(), entries))
}
