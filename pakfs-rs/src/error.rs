/// Represents all possible errors that can occur in the pakfs library.
///
/// This enum is used throughout the crate to provide detailed error information for
/// operations that may fail, such as file access, archive parsing, and decompression.
#[derive(Debug)]
pub enum PakFsError {
    /// A file, package entry, or mount location could not be found.
    NotFound(String),
    /// A file could not be opened or read.
    Read(String),
    /// A file or directory could not be created or written.
    Write(String),
    /// A file's magic number or version did not match the expected format.
    TypeMismatch(String),
    /// A size recorded in an archive directory disagrees with the data on disk.
    SizeMismatch(String),
    /// A caller-supplied argument was out of range or otherwise invalid.
    InvalidParameter(String),
    /// The requested format, compression method, or operation is not supported.
    Unsupported(String),
    /// A decompression codec rejected its input.
    Codec(String),
    /// Represents an error that occurs during I/O operations.
    Io(std::io::Error),
}

/// Provides a user-friendly string representation for each error variant in `PakFsError`.
impl std::fmt::Display for PakFsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PakFsError::NotFound(name) => write!(f, "Not found: {name}"),
            PakFsError::Read(err) => write!(f, "Read failed: {err}"),
            PakFsError::Write(err) => write!(f, "Write failed: {err}"),
            PakFsError::TypeMismatch(err) => write!(f, "Type mismatch: {err}"),
            PakFsError::SizeMismatch(err) => write!(f, "Size mismatch: {err}"),
            PakFsError::InvalidParameter(err) => write!(f, "Invalid parameter: {err}"),
            PakFsError::Unsupported(err) => write!(f, "Unsupported: {err}"),
            PakFsError::Codec(err) => write!(f, "Decompression failed: {err}"),
            PakFsError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

/// Implements the standard error trait for `PakFsError`, allowing it to be used with
/// error chaining and other error handling utilities.
impl std::error::Error for PakFsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PakFsError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Allows automatic conversion from `std::io::Error` to `PakFsError`.
impl From<std::io::Error> for PakFsError {
    fn from(error: std::io::Error) -> Self {
        PakFsError::Io(error)
    }
}
