use crate::error::PakFsError;

/// The outcome of a bulk extraction.
///
/// Bulk operations are partial-failure tolerant: a bad entry is recorded and
/// skipped rather than aborting the batch, so the report carries both the
/// success count and the per-entry failures.
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Number of entries written successfully.
    pub extracted: usize,
    /// Entries that failed, with the error each one produced.
    pub failures: Vec<(String, PakFsError)>,
}

impl ExtractReport {
    /// Whether every entry was extracted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
