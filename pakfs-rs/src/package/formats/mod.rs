//! Built-in package format parsers.
//!
//! Each parser reduces one archive format's on-disk directory to the uniform
//! [`PackageEntry`](crate::package::PackageEntry) table and registers itself
//! through [`LoaderRegistry::with_standard_formats`](crate::package::LoaderRegistry::with_standard_formats).

pub mod dave;
pub mod pak;
pub mod tab_bin;
pub mod vpk;
pub mod vsr;
pub mod wad;
pub mod zip;
