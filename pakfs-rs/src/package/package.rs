use crate::codec;
use crate::error::PakFsError;
use crate::file_handle::FileHandle;
use crate::package::extract_report::ExtractReport;
use crate::package::package_entry::PackageEntry;
use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Materializes the bytes of one package entry.
///
/// The default loader covers any format whose data lives at
/// `(offset, stored_len)` inside the archive itself; formats whose data lives
/// elsewhere (sibling data files, numbered part files) or that need extra
/// per-entry state (checksums, preload bytes) install their own loader when
/// constructing the package.
pub trait EntryLoader: Send + Sync {
    /// Loads and decompresses the entry at `index` in `package`'s table.
    fn load(&self, package: &Package, index: usize) -> Result<Vec<u8>, PakFsError>;
}

/// The generic loader: seek to the entry's offset inside the archive, read
/// its stored bytes, and dispatch through the codec layer.
pub struct DefaultEntryLoader;

impl EntryLoader for DefaultEntryLoader {
    fn load(&self, package: &Package, index: usize) -> Result<Vec<u8>, PakFsError> {
        let entry = package.entry_at(index)?;
        let raw = read_stored_bytes(package.path(), entry.offset, entry.stored_len())?;
        codec::decompress(entry.compression, raw, entry.file_size as usize)
    }
}

/// Reads `len` bytes at `offset` from `archive`, verifying the range lies
/// within the file. The handle is opened and closed around this single read;
/// none is cached across fetches.
pub fn read_stored_bytes(archive: &Path, offset: u64, len: u64) -> Result<Vec<u8>, PakFsError> {
    let mut file = File::open(archive)
        .map_err(|e| PakFsError::Read(format!("failed to reopen {}: {e}", archive.display())))?;
    let archive_len = file.metadata()?.len();
    if offset + len > archive_len {
        return Err(PakFsError::SizeMismatch(format!(
            "range {offset}+{len} spans past the end of {} ({archive_len} bytes)",
            archive.display()
        )));
    }
    file.seek(SeekFrom::Start(offset))?;
    let mut raw = vec![0u8; len as usize];
    file.read_exact(&mut raw)
        .map_err(|e| PakFsError::Read(format!("short read in {}: {e}", archive.display())))?;
    Ok(raw)
}

/// Represents a parsed archive container.
///
/// A `Package` holds the uniform directory table a format parser produced
/// from an archive on disk, and fetches entries on demand: each fetch reopens
/// the backing file, reads the stored bytes, and decompresses them if the
/// entry carries a codec tag. The table is populated entirely during open;
/// after that the package is read-only.
///
/// # Usage
///
/// ```no_run
/// use pakfs_rs::package::LoaderRegistry;
///
/// let registry = LoaderRegistry::with_standard_formats();
/// let package = registry.load_package("data/pak0.pak".as_ref()).unwrap();
/// for entry in package.entries() {
///     println!("{} ({} bytes)", entry.name, entry.file_size);
/// }
/// let file = package.open_entry("maps/e1m1.bsp").unwrap();
/// ```
pub struct Package {
    /// Path to the archive file on disk.
    path: PathBuf,
    /// The parsed directory table.
    entries: Vec<PackageEntry>,
    /// Strategy for materializing entry bytes.
    loader: Box<dyn EntryLoader>,
}

impl Package {
    /// Creates a package served by the generic entry loader.
    pub fn new(path: PathBuf, entries: Vec<PackageEntry>) -> Self {
        Package {
            path,
            entries,
            loader: Box::new(DefaultEntryLoader),
        }
    }

    /// Creates a package with a format-specific entry loader.
    pub fn with_loader(
        path: PathBuf,
        entries: Vec<PackageEntry>,
        loader: Box<dyn EntryLoader>,
    ) -> Self {
        Package {
            path,
            entries,
            loader,
        }
    }

    /// Path to the archive file this package was parsed from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed directory table.
    pub fn entries(&self) -> &[PackageEntry] {
        &self.entries
    }

    /// Number of entries in the table.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Bounds-checked access to one table entry.
    pub fn entry_at(&self, index: usize) -> Result<&PackageEntry, PakFsError> {
        self.entries.get(index).ok_or_else(|| {
            PakFsError::InvalidParameter(format!(
                "entry index {index} out of range (table size {})",
                self.entries.len()
            ))
        })
    }

    /// Finds an entry by exact name match, scanning the table linearly.
    pub fn find_entry(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Loads the entry at `index` into a memory-backed [`FileHandle`].
    pub fn open_entry_at(&self, index: usize) -> Result<FileHandle, PakFsError> {
        let name = self.entry_at(index)?.name.clone();
        let bytes = self.loader.load(self, index)?;
        Ok(FileHandle::from_memory(name, bytes, None))
    }

    /// Loads the named entry; fails with [`PakFsError::NotFound`] on a miss.
    pub fn open_entry(&self, name: &str) -> Result<FileHandle, PakFsError> {
        let index = self.find_entry(name).ok_or_else(|| {
            PakFsError::NotFound(format!(
                "entry {name} in package {}",
                self.path.display()
            ))
        })?;
        self.open_entry_at(index)
    }

    /// Extracts every entry under `dest`, recreating the relative directory
    /// structure stored in entry names.
    ///
    /// A failing entry is logged and skipped; the batch always runs to the
    /// end and the report carries the per-entry failures.
    pub fn extract_to(&self, dest: &Path) -> Result<ExtractReport, PakFsError> {
        fs::create_dir_all(dest)
            .map_err(|e| PakFsError::Write(format!("failed to create {}: {e}", dest.display())))?;

        let mut report = ExtractReport::default();
        for index in 0..self.entries.len() {
            let name = self.entries[index].name.clone();
            match self.extract_one(index, &name, dest) {
                Ok(()) => report.extracted += 1,
                Err(e) => {
                    warn!(entry = %name, error = %e, "skipping entry during extraction");
                    report.failures.push((name, e));
                }
            }
        }
        Ok(report)
    }

    fn extract_one(&self, index: usize, name: &str, dest: &Path) -> Result<(), PakFsError> {
        if name.split('/').any(|part| part == "..") {
            return Err(PakFsError::InvalidParameter(format!(
                "entry name {name} escapes the destination"
            )));
        }
        let bytes = self.loader.load(self, index)?;
        let target = dest.join(name);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PakFsError::Write(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&target, bytes)
            .map_err(|e| PakFsError::Write(format!("failed to write {}: {e}", target.display())))
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .finish()
    }
}
