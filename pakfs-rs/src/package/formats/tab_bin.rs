//! SFA TAB/BIN archive pairs.
//!
//! The `.tab` file is a flat array of big-endian `{start, end}` offset pairs
//! into the sibling `.bin` data file, one pair per entry. Entries have no
//! stored names; the pair index, printed in decimal, stands in. Pairs whose
//! `end` precedes `start` or overruns the `.bin` are pruned.

use crate::error::PakFsError;
use crate::file_handle::FileHandle;
use crate::package::loader_registry::FormatLoader;
use crate::package::package::{read_stored_bytes, EntryLoader, Package};
use crate::package::package_entry::PackageEntry;
use byteorder::{BigEndian, ReadBytesExt};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn loader() -> FormatLoader {
    FormatLoader {
        name: "tab/bin",
        extensions: &["tab"],
        load_path: Some(load),
        parse: None,
    }
}

/// Entry data lives in the `.bin` sibling, not the `.tab` the package was
/// opened from.
struct TabBinEntryLoader {
    bin_path: PathBuf,
}

impl EntryLoader for TabBinEntryLoader {
    fn load(&self, package: &Package, index: usize) -> Result<Vec<u8>, PakFsError> {
        let entry = package.entry_at(index)?;
        read_stored_bytes(&self.bin_path, entry.offset, entry.file_size)
    }
}

pub fn load(path: &Path) -> Result<Package, PakFsError> {
    let bin_path = path.with_extension("bin");
    let bin_len = fs::metadata(&bin_path)
        .map_err(|_| {
            PakFsError::NotFound(format!(
                "data file {} for table {}",
                bin_path.display(),
                path.display()
            ))
        })?
        .len();

    let mut file = FileHandle::open_local(path, true)?;
    let pair_count = file.size()? / 8;

    let mut entries = Vec::with_capacity(pair_count as usize);
    for index in 0..pair_count {
        let start = u64::from(file.read_u32::<BigEndian>()?);
        let end = u64::from(file.read_u32::<BigEndian>()?);
        if end < start || end > bin_len {
            warn!(index, start, end, "pruning invalid tab pair");
            continue;
        }
        entries.push(PackageEntry::uncompressed(
            index.to_string(),
            start,
            end - start,
        ));
    }

    Ok(Package::with_loader(
        path.to_path_buf(),
        entries,
        Box::new(TabBinEntryLoader { bin_path }),
    ))
}
