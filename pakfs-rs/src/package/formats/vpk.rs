//! Valve VPK directory archives, versions 1 and 2.
//!
//! The `_dir.vpk` file holds a three-level tree of null-terminated strings
//! (extension, directory, file name) with a fixed record per file. Entry
//! data lives either after the tree in the directory file itself
//! (`archive_index == 0x7FFF`) or in numbered sibling part files
//! (`foo_dir.vpk` -> `foo_042.vpk`), optionally preceded by preload bytes
//! stored inline in the tree. All fields are little-endian.

use crate::error::PakFsError;
use crate::ext::io_ext::ReadStringExt;
use crate::file_handle::FileHandle;
use crate::package::loader_registry::FormatLoader;
use crate::package::package::{read_stored_bytes, EntryLoader, Package};
use crate::package::package_entry::PackageEntry;
use byteorder::{LittleEndian, ReadBytesExt};
use glob::glob;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const VPK_SIGNATURE: u32 = 0x55AA1234;
/// Marks entry data stored in the directory file after the tree.
const DIR_FILE_INDEX: u16 = 0x7FFF;
const ENTRY_TERMINATOR: u16 = 0xFFFF;

pub fn loader() -> FormatLoader {
    FormatLoader {
        name: "vpk",
        extensions: &["vpk"],
        load_path: Some(load),
        parse: None,
    }
}

/// Where one entry's non-preload data lives.
struct VpkSpan {
    archive_index: u16,
    data_offset: u64,
    data_len: u64,
}

/// Fetches VPK entry data from the directory file or a part file, prepending
/// any preload bytes and verifying the directory's CRC.
struct VpkEntryLoader {
    parts: HashMap<u16, PathBuf>,
    spans: Vec<VpkSpan>,
    preloads: Vec<Vec<u8>>,
    crcs: Vec<u32>,
}

impl EntryLoader for VpkEntryLoader {
    fn load(&self, package: &Package, index: usize) -> Result<Vec<u8>, PakFsError> {
        let entry = package.entry_at(index)?;
        let span = &self.spans[index];
        let mut bytes = self.preloads[index].clone();

        if span.data_len > 0 {
            let source = if span.archive_index == DIR_FILE_INDEX {
                package.path()
            } else {
                self.parts.get(&span.archive_index).ok_or_else(|| {
                    PakFsError::NotFound(format!(
                        "part file {} for entry {}",
                        span.archive_index, entry.name
                    ))
                })?
            };
            bytes.extend(read_stored_bytes(source, span.data_offset, span.data_len)?);
        }

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

    let signature = file.read_u32::<LittleEndian>()?;
    if signature != VPK_SIGNATURE {
        return Err(PakFsError::TypeMismatch(format!(
            "not a VPK directory: {}",
            path.display()
        )));
    }
    let version = file.read_u32::<LittleEndian>()?;
    let tree_size = u64::from(file.read_u32::<LittleEndian>()?);
    let header_size: u64 = match version {
        1 => 12,
        2 => {
            let _file_data_size = file.read_u32::<LittleEndian>()?;
            let _archive_md5_size = file.read_u32::<LittleEndian>()?;
            let _other_md5_size = file.read_u32::<LittleEndian>()?;
            let _signature_size = file.read_u32::<LittleEndian>()?;
            28
        }
        other => {
            return Err(PakFsError::Unsupported(format!(
                "VPK version {other} in {}",
                path.display()
            )))
        }
    };
    let data_base = header_size + tree_size;

    let mut entries = Vec::new();
    let mut spans = Vec::new();
    let mut preloads = Vec::new();
    let mut crcs = Vec::new();

    loop {
        let extension = file.read_cstring(256)?;
        if extension.is_empty() {
            break;
        }
        loop {
            let directory = file.read_cstring(1024)?;
            if directory.is_empty() {
                break;
            }
            loop {
                let name = file.read_cstring(256)?;
                if name.is_empty() {
                    break;
                }

                let crc = file.read_u32::<LittleEndian>()?;
                let preload_len = file.read_u16::<LittleEndian>()?;
                let archive_index = file.read_u16::<LittleEndian>()?;
                let entry_offset = u64::from(file.read_u32::<LittleEndian>()?);
                let entry_length = u64::from(file.read_u32::<LittleEndian>()?);
                let terminator = file.read_u16::<LittleEndian>()?;
                if terminator != ENTRY_TERMINATOR {
                    return Err(PakFsError::TypeMismatch(format!(
                        "VPK entry terminator {terminator:#06x} at offset {}",
                        file.offset()
                    )));
                }
                let preload = file.read_vec(usize::from(preload_len))?;

                // The root directory is stored as a single space.
                let full_name = if directory.trim().is_empty() {
                    format!("{name}.{extension}")
                } else {
                    format!("{directory}/{name}.{extension}")
                };

                let data_offset = if archive_index == DIR_FILE_INDEX {
                    data_base + entry_offset
                } else {
                    entry_offset
                };
                entries.push(PackageEntry::uncompressed(
                    full_name,
                    data_offset,
                    u64::from(preload_len) + entry_length,
                ));
                spans.push(VpkSpan {
                    archive_index,
                    data_offset,
                    data_len: entry_length,
                });
                preloads.push(preload);
                crcs.push(crc);
            }
        }
    }

    let loader = VpkEntryLoader {
        parts: discover_parts(path)?,
        spans,
        preloads,
        crcs,
    };
    Ok(Package::with_loader(
        path.to_path_buf(),
        entries,
        Box::new(loader),
    ))
}

/// Finds numbered sibling part files for a `<prefix>_dir.vpk` path.
fn discover_parts(dir_path: &Path) -> Result<HashMap<u16, PathBuf>, PakFsError> {
    let mut parts = HashMap::new();
    let Some(stem) = dir_path.file_stem().and_then(|s| s.to_str()) else {
        return Ok(parts);
    };
    let Some(prefix) = stem.strip_suffix("_dir") else {
        return Ok(parts);
    };
    let parent = dir_path.parent().unwrap_or_else(|| Path::new("."));
    let pattern = format!("{}/{prefix}_[0-9][0-9][0-9].vpk", parent.display());

    for found in glob(&pattern).map_err(|e| PakFsError::InvalidParameter(format!("{e}")))? {
        let part = found.map_err(|e| PakFsError::Read(format!("{e}")))?;
        if let Some(index) = part
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.rsplit('_').next())
            .and_then(|n| n.parse::<u16>().ok())
        {
            parts.insert(index, part);
        }
    }
    Ok(parts)
}
