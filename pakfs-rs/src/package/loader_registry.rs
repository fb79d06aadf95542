use crate::error::PakFsError;
use crate::file_handle::FileHandle;
use crate::package::formats;
use crate::package::package::Package;
use std::io::Seek;
use std::path::Path;
use tracing::debug;

/// Loads a package when the format owns the whole open-and-parse sequence
/// (companion files, part discovery).
pub type LoadPathFn = fn(&Path) -> Result<Package, PakFsError>;

/// Parses a package from an already-open handle, sniffing the contents. The
/// handle's cursor is rewound before every attempt.
pub type ParseFn = fn(&mut FileHandle) -> Result<Package, PakFsError>;

/// One registered package format.
///
/// The two optional callbacks reflect the two generations of loaders: the
/// older ones take possession of file opening and are selected by path
/// extension; the newer ones are handed an open handle and recognize the
/// format from its contents, so extension-less archives still load.
#[derive(Debug)]
pub struct FormatLoader {
    /// Short format name used in trace events.
    pub name: &'static str,
    /// Path extensions claimed by the whole-file loader (lowercase, no dot).
    pub extensions: &'static [&'static str],
    /// Whole-file loader, if the format provides one.
    pub load_path: Option<LoadPathFn>,
    /// Content-sniffing parser, if the format provides one.
    pub parse: Option<ParseFn>,
}

/// The ordered table of package format loaders.
///
/// Registration is append-only; earlier registrations are tried first. Each
/// [`Vfs`](crate::vfs::Vfs) owns its own registry, so independent instances
/// can carry different format sets.
#[derive(Debug, Default)]
pub struct LoaderRegistry {
    loaders: Vec<FormatLoader>,
}

impl LoaderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        LoaderRegistry {
            loaders: Vec::new(),
        }
    }

    /// Creates a registry seeded with every built-in format.
    pub fn with_standard_formats() -> Self {
        let mut registry = Self::new();
        registry.register(formats::wad::loader());
        registry.register(formats::pak::loader());
        registry.register(formats::vpk::loader());
        registry.register(formats::zip::loader());
        registry.register(formats::tab_bin::loader());
        registry.register(formats::dave::loader());
        registry.register(formats::vsr::loader());
        registry
    }

    /// Appends a format to the table.
    pub fn register(&mut self, loader: FormatLoader) {
        self.loaders.push(loader);
    }

    /// Number of registered formats.
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Opens `path` as a package, trying registered formats in order.
    ///
    /// Extension-keyed whole-file loaders run first (for an extension-less
    /// path, only loaders that declare no extensions). If none claims the
    /// file, it is opened once and every content-sniffing parser runs in
    /// registration order, rewinding between failed attempts. A loader
    /// failure is never fatal here; only exhausting every candidate reports
    /// [`PakFsError::Unsupported`].
    pub fn load_package(&self, path: &Path) -> Result<Package, PakFsError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        for loader in &self.loaders {
            let Some(load_path) = loader.load_path else {
                continue;
            };
            let claimed = match &extension {
                Some(ext) => loader.extensions.iter().any(|e| e == ext),
                None => loader.extensions.is_empty(),
            };
            if !claimed {
                continue;
            }
            match load_path(path) {
                Ok(package) => return Ok(package),
                Err(e) => {
                    debug!(format = loader.name, error = %e, "whole-file loader declined");
                }
            }
        }

        let mut file = FileHandle::open_local(path, false)?;
        for loader in &self.loaders {
            let Some(parse) = loader.parse else {
                continue;
            };
            file.rewind()?;
            match parse(&mut file) {
                Ok(package) => return Ok(package),
                Err(e) => {
                    debug!(format = loader.name, error = %e, "parser declined");
                }
            }
        }

        Err(PakFsError::Unsupported(format!(
            "no package loader claimed {}",
            path.display()
        )))
    }
}
