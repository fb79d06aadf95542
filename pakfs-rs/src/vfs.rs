use crate::error::PakFsError;
use crate::file_handle::FileHandle;
use crate::mount::{Mount, MountId, MountKind};
use crate::package::LoaderRegistry;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path prefix that bypasses the mount chain and resolves directly against
/// the real filesystem. Recognized by every resolution entry point.
pub const LOCAL_PREFIX: &str = "local://";

/// A virtual filesystem: one path namespace over an ordered chain of
/// mounted locations.
///
/// Each mount is either a plain directory (a path prefix) or a loaded
/// package. Lookups probe mounts in insertion order and the first mount that
/// satisfies a request wins; there is no merging or override across mounts.
/// With no mounts at all, every operation degrades to direct local-disk
/// access.
///
/// A `Vfs` is an ordinary owned value: construct as many independent
/// instances as needed, each with its own mounts and format registry.
/// Mutation (mounting, unmounting, registering formats) takes `&mut self`;
/// lookups take `&self`. Callers that share an instance across threads wrap
/// it in a lock.
///
/// # Usage
///
/// ```no_run
/// use pakfs_rs::vfs::Vfs;
///
/// let mut vfs = Vfs::new();
/// vfs.mount_location("patch").unwrap();      // checked first
/// vfs.mount_location("game.pak").unwrap();   // fallback
/// let file = vfs.open("maps/e1m1.bsp", true).unwrap();
/// ```
#[derive(Debug)]
pub struct Vfs {
    /// The ordered mount chain; earlier entries take resolution priority.
    mounts: Vec<Mount>,
    /// Package format loaders used by [`Vfs::mount_location`].
    registry: LoaderRegistry,
    next_id: u64,
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vfs {
    /// Creates a context with every built-in package format registered.
    pub fn new() -> Self {
        Self::with_registry(LoaderRegistry::with_standard_formats())
    }

    /// Creates a context with a caller-assembled format registry.
    pub fn with_registry(registry: LoaderRegistry) -> Self {
        Vfs {
            mounts: Vec::new(),
            registry,
            next_id: 0,
        }
    }

    /// The format registry, for registering additional loaders.
    pub fn registry_mut(&mut self) -> &mut LoaderRegistry {
        &mut self.registry
    }

    /// The current mount chain, in resolution order.
    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    /// Mounts a location at the end of the chain.
    ///
    /// An existing local directory becomes a directory mount; any other
    /// existing file is handed to the package loaders. New mounts append at
    /// the tail, so locations mounted earlier keep resolution priority. A
    /// `local://` prefix on `location` is accepted and stripped: mounting
    /// always addresses the real filesystem.
    pub fn mount_location<P: AsRef<Path>>(&mut self, location: P) -> Result<MountId, PakFsError> {
        let location = strip_local_path(location.as_ref());

        let kind = if location.is_dir() {
            MountKind::Directory(location)
        } else if location.is_file() {
            let package = self.registry.load_package(&location)?;
            MountKind::Package(package)
        } else {
            return Err(PakFsError::NotFound(format!(
                "mount location {}",
                location.display()
            )));
        };

        let id = MountId(self.next_id);
        self.next_id += 1;
        debug!(id = id.0, "mounted location");
        self.mounts.push(Mount { id, kind });
        Ok(id)
    }

    /// Removes one mount, dropping any package it owns.
    pub fn clear_mount(&mut self, id: MountId) -> Result<(), PakFsError> {
        let position = self
            .mounts
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| PakFsError::InvalidParameter(format!("unknown mount id {}", id.0)))?;
        self.mounts.remove(position);
        Ok(())
    }

    /// Removes every mount.
    pub fn clear_mounts(&mut self) {
        self.mounts.clear();
    }

    /// Opens a file through the mount chain.
    ///
    /// The first mount containing `path` wins: a directory mount yields a
    /// local open (honoring `cache`), a package mount yields a memory-backed
    /// handle. With an empty chain, or a `local://` prefix, the path opens
    /// directly from disk. A miss is [`PakFsError::NotFound`].
    pub fn open(&self, path: &str, cache: bool) -> Result<FileHandle, PakFsError> {
        if let Some(real) = path.strip_prefix(LOCAL_PREFIX) {
            return FileHandle::open_local(real, cache);
        }
        if self.mounts.is_empty() {
            return FileHandle::open_local(path, cache);
        }

        let logical = normalize(path);
        for mount in &self.mounts {
            match &mount.kind {
                MountKind::Directory(root) => {
                    let candidate = root.join(&logical);
                    if candidate.is_file() {
                        return FileHandle::open_local(candidate, cache);
                    }
                }
                MountKind::Package(package) => {
                    if let Some(index) = package.find_entry(&logical) {
                        return package.open_entry_at(index);
                    }
                }
            }
        }
        Err(PakFsError::NotFound(path.to_string()))
    }

    /// Whether `path` resolves to a file in any mount (or on disk, for an
    /// empty chain or a `local://` path).
    pub fn file_exists(&self, path: &str) -> bool {
        if let Some(real) = path.strip_prefix(LOCAL_PREFIX) {
            return Path::new(real).is_file();
        }
        if self.mounts.is_empty() {
            return Path::new(path).is_file();
        }

        let logical = normalize(path);
        self.mounts.iter().any(|mount| match &mount.kind {
            MountKind::Directory(root) => root.join(&logical).is_file(),
            MountKind::Package(package) => package.find_entry(&logical).is_some(),
        })
    }

    /// Whether `path` resolves to a directory in any mount. For package
    /// mounts, a directory exists when any entry lives under it.
    pub fn path_exists(&self, path: &str) -> bool {
        if let Some(real) = path.strip_prefix(LOCAL_PREFIX) {
            return Path::new(real).is_dir();
        }
        if self.mounts.is_empty() {
            return Path::new(path).is_dir();
        }

        let logical = normalize(path);
        self.mounts.iter().any(|mount| match &mount.kind {
            MountKind::Directory(root) => root.join(&logical).is_dir(),
            MountKind::Package(package) => {
                if logical.is_empty() {
                    package.entry_count() > 0
                } else {
                    let prefix = format!("{logical}/");
                    package.entries().iter().any(|e| e.name.starts_with(&prefix))
                }
            }
        })
    }

    /// Scans the union of every mount's view of `dir`, invoking `callback`
    /// once per logical file.
    ///
    /// Paths passed to the callback are relative to the namespace root and
    /// include the `dir` prefix. Duplicates across mounts are suppressed:
    /// the first mount that reports a relative path wins, matching
    /// single-file resolution order. `extension` (without the dot) filters
    /// candidates; `recursive` descends into subdirectories. Package mounts
    /// participate through their entry tables. Unreadable or missing
    /// directories are skipped silently.
    pub fn scan_directory(
        &self,
        dir: &str,
        extension: Option<&str>,
        recursive: bool,
        callback: &mut dyn FnMut(&str),
    ) {
        let mut seen = HashSet::new();

        if let Some(real) = dir.strip_prefix(LOCAL_PREFIX) {
            scan_directory_tree(
                Path::new(real),
                "",
                extension,
                recursive,
                &mut seen,
                callback,
            );
            return;
        }
        if self.mounts.is_empty() {
            scan_directory_tree(
                Path::new(dir),
                &normalize(dir),
                extension,
                recursive,
                &mut seen,
                callback,
            );
            return;
        }

        let logical = normalize(dir);
        for mount in &self.mounts {
            match &mount.kind {
                MountKind::Directory(root) => {
                    scan_directory_tree(
                        &root.join(&logical),
                        &logical,
                        extension,
                        recursive,
                        &mut seen,
                        callback,
                    );
                }
                MountKind::Package(package) => {
                    scan_package(package, &logical, extension, recursive, &mut seen, callback);
                }
            }
        }
    }
}

/// Normalizes a logical path: forward slashes, no leading separator.
fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Strips the `local://` prefix from a mount path, when present.
fn strip_local_path(path: &Path) -> PathBuf {
    match path.to_str().and_then(|s| s.strip_prefix(LOCAL_PREFIX)) {
        Some(real) => PathBuf::from(real),
        None => path.to_path_buf(),
    }
}

fn extension_matches(name: &str, extension: Option<&str>) -> bool {
    match extension {
        None => true,
        Some(ext) => Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext)),
    }
}

/// Joins a scan prefix and a file name into a namespace-relative path.
fn join_logical(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

fn scan_directory_tree(
    base: &Path,
    prefix: &str,
    extension: Option<&str>,
    recursive: bool,
    seen: &mut HashSet<String>,
    callback: &mut dyn FnMut(&str),
) {
    let Ok(reader) = fs::read_dir(base) else {
        return;
    };
    for dir_entry in reader.flatten() {
        let path = dir_entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_dir() {
            if recursive {
                let sub_prefix = join_logical(prefix, name);
                scan_directory_tree(&path, &sub_prefix, extension, recursive, seen, callback);
            }
            continue;
        }
        if !extension_matches(name, extension) {
            continue;
        }
        let logical = join_logical(prefix, name);
        if seen.insert(logical.clone()) {
            callback(&logical);
        }
    }
}

fn scan_package(
    package: &crate::package::Package,
    dir: &str,
    extension: Option<&str>,
    recursive: bool,
    seen: &mut HashSet<String>,
    callback: &mut dyn FnMut(&str),
) {
    let prefix = if dir.is_empty() {
        String::new()
    } else {
        format!("{dir}/")
    };
    for entry in package.entries() {
        let Some(rest) = entry.name.strip_prefix(&prefix) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        if !recursive && rest.contains('/') {
            continue;
        }
        if !extension_matches(rest, extension) {
            continue;
        }
        if seen.insert(entry.name.clone()) {
            callback(&entry.name);
        }
    }
}
