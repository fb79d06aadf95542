//! The package engine: uniform archive directory tables, lazy per-entry
//! decompression, and the registry of format parsers that produce them.

pub mod extract_report;
pub mod formats;
pub mod loader_registry;
#[allow(clippy::module_inception)]
pub mod package;
pub mod package_entry;

pub use extract_report::ExtractReport;
pub use loader_registry::{FormatLoader, LoaderRegistry};
pub use package::{DefaultEntryLoader, EntryLoader, Package};
pub use package_entry::PackageEntry;
