//! # pakfs-rs
//!
//! `pakfs-rs` is a pure Rust virtual filesystem and package archive reader
//! for legacy game data formats. It unifies local disk access and archive
//! contents behind one file-handle abstraction, resolved through an ordered
//! mount chain.
//!
//! ## Features
//! - Mount directories and archives into one path namespace with
//!   first-match resolution
//! - Read WAD, PACK, VPK, ZIP/PK3/PK4, TAB/BIN, DAVE, and VSR archives
//!   through a uniform directory table
//! - Lazy per-entry decompression: DEFLATE, GZIP, PKWARE implode, LZRW1
//! - One `Read + Seek` handle type whether bytes come from disk or from an
//!   archive
//!
//! ## Usage
//! Add to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! pakfs-rs = "0.2"
//! ```
//!
//! ### Example: mounting and reading
//! ```no_run
//! use pakfs_rs::vfs::Vfs;
//! use std::io::Read;
//!
//! let mut vfs = Vfs::new();
//! // Earlier mounts win when both contain a path.
//! vfs.mount_location("patches").unwrap();
//! vfs.mount_location("game.pak").unwrap();
//!
//! let mut file = vfs.open("maps/start.bsp", true).unwrap();
//! let mut contents = Vec::new();
//! file.read_to_end(&mut contents).unwrap();
//! ```
//!
//! ### Example: working with one package
//! ```no_run
//! use pakfs_rs::package::LoaderRegistry;
//!
//! let registry = LoaderRegistry::with_standard_formats();
//! let package = registry.load_package("data/textures.vpk".as_ref()).unwrap();
//! let report = package.extract_to("out".as_ref()).unwrap();
//! println!("extracted {} entries", report.extracted);
//! ```

pub mod codec;
pub mod error;
pub mod ext;
pub mod file_handle;
pub mod mount;
pub mod package;
pub mod vfs;

pub use codec::CompressionMethod;
pub use error::PakFsError;
pub use file_handle::FileHandle;
pub use mount::{Mount, MountId, MountKind};
pub use package::{ExtractReport, LoaderRegistry, Package, PackageEntry};
pub use vfs::Vfs;
