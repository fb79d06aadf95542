use crate::error::PakFsError;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// The backing store behind a [`FileHandle`].
///
/// Exactly one variant is active for the lifetime of a handle: either an owned
/// in-memory buffer, or a live OS file handle whose reads and seeks are
/// forwarded to the operating system.
enum FileBacking {
    /// An owned buffer; the cursor tracks the read position.
    Memory(Cursor<Vec<u8>>),
    /// A live OS handle plus the tracked read position.
    Stream { file: File, position: u64 },
}

/// A handle representing an open readable file, regardless of backing store.
///
/// `FileHandle` is the uniform result type of every open operation in this
/// crate: opening a file on disk, extracting an entry from a package, or
/// resolving a path through a [`Vfs`](crate::vfs::Vfs) mount chain. Callers
/// read it through the standard [`Read`] and [`Seek`] traits (so
/// `byteorder::ReadBytesExt` works directly on it), with identical semantics
/// in both backing modes.
///
/// # Usage
///
/// ```no_run
/// use pakfs_rs::file_handle::FileHandle;
/// use byteorder::{LittleEndian, ReadBytesExt};
///
/// let mut file = FileHandle::open_local("data/level.bin", true).unwrap();
/// let magic = file.read_u32::<LittleEndian>().unwrap();
/// ```
///
/// Seeks are validated: any target outside `[0, size]` is rejected with an
/// error and the cursor is left unchanged. Reads past the end return a short
/// count rather than failing.
pub struct FileHandle {
    /// The logical path this handle was opened under.
    path: PathBuf,
    /// The active backing store.
    backing: FileBacking,
    /// Modification time of the source, when known.
    mtime: Option<SystemTime>,
}

impl FileHandle {
    /// Opens a file on the local filesystem.
    ///
    /// With `cache` set, the entire file is read into an owned buffer up front
    /// and the OS handle is closed; otherwise the handle stays live and every
    /// read and seek is forwarded to the operating system.
    pub fn open_local<P: AsRef<Path>>(path: P, cache: bool) -> Result<Self, PakFsError> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|e| PakFsError::Read(format!("failed to open {}: {e}", path.display())))?;
        let metadata = file
            .metadata()
            .map_err(|e| PakFsError::Read(format!("failed to stat {}: {e}", path.display())))?;
        let mtime = metadata.modified().ok();

        let backing = if cache {
            let mut buffer = Vec::with_capacity(metadata.len() as usize);
            file.read_to_end(&mut buffer)
                .map_err(|e| PakFsError::Read(format!("failed to read {}: {e}", path.display())))?;
            if (buffer.len() as u64) < metadata.len() {
                return Err(PakFsError::Read(format!(
                    "short read caching {}: got {} of {} bytes",
                    path.display(),
                    buffer.len(),
                    metadata.len()
                )));
            }
            FileBacking::Memory(Cursor::new(buffer))
        } else {
            FileBacking::Stream { file, position: 0 }
        };

        Ok(FileHandle {
            path: path.to_path_buf(),
            backing,
            mtime,
        })
    }

    /// Wraps an owned buffer in a handle, as produced by package extraction.
    pub fn from_memory<P: AsRef<Path>>(
        path: P,
        bytes: Vec<u8>,
        mtime: Option<SystemTime>,
    ) -> Self {
        FileHandle {
            path: path.as_ref().to_path_buf(),
            backing: FileBacking::Memory(Cursor::new(bytes)),
            mtime,
        }
    }

    /// Returns the logical path this handle was opened under.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the source's modification time, if known.
    pub fn mtime(&self) -> Option<SystemTime> {
        self.mtime
    }

    /// Returns the total size of the file in bytes.
    ///
    /// In stream mode this re-stats the underlying disk file rather than
    /// trusting a cached value, so external truncation or growth during the
    /// session is observed.
    pub fn size(&self) -> io::Result<u64> {
        match &self.backing {
            FileBacking::Memory(cursor) => Ok(cursor.get_ref().len() as u64),
            FileBacking::Stream { file, .. } => Ok(file.metadata()?.len()),
        }
    }

    /// Returns the current cursor position.
    pub fn offset(&self) -> u64 {
        match &self.backing {
            FileBacking::Memory(cursor) => cursor.position(),
            FileBacking::Stream { position, .. } => *position,
        }
    }

    /// Returns the underlying buffer in memory mode, `None` in stream mode.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.backing {
            FileBacking::Memory(cursor) => Some(cursor.get_ref()),
            FileBacking::Stream { .. } => None,
        }
    }

    /// Reads a line of up to `max - 1` bytes, stopping after a `\n`.
    ///
    /// The terminator is consumed but not included in the result. Returns
    /// `Ok(None)` when the cursor is already at the end of the data.
    pub fn read_line_string(&mut self, max: usize) -> io::Result<Option<String>> {
        let mut bytes = Vec::new();
        let mut one = [0u8; 1];
        while bytes.len() + 1 < max {
            if self.read(&mut one)? == 0 {
                break;
            }
            if one[0] == b'\n' {
                return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()));
            }
            bytes.push(one[0]);
        }
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Closes the handle, releasing the buffer or the OS handle.
    ///
    /// Consuming `self` makes a double close unrepresentable; dropping the
    /// handle has the same effect.
    pub fn close(self) {}
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.backing {
            FileBacking::Memory(_) => "memory",
            FileBacking::Stream { .. } => "stream",
        };
        f.debug_struct("FileHandle")
            .field("path", &self.path)
            .field("mode", &mode)
            .field("offset", &self.offset())
            .finish()
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.backing {
            // Cursor short-reads at the end of the buffer.
            FileBacking::Memory(cursor) => cursor.read(buf),
            FileBacking::Stream { file, position } => {
                let n = file.read(buf)?;
                *position += n as u64;
                Ok(n)
            }
        }
    }
}

impl Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let size = self.size()?;
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.offset()) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(size) + i128::from(delta),
        };
        if target < 0 || target > i128::from(size) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("seek target {target} outside [0, {size}]"),
            ));
        }
        let target = target as u64;
        match &mut self.backing {
            FileBacking::Memory(cursor) => cursor.set_position(target),
            FileBacking::Stream { file, position } => {
                file.seek(SeekFrom::Start(target))?;
                *position = target;
            }
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_handle(bytes: &[u8]) -> FileHandle {
        FileHandle::from_memory("test.bin", bytes.to_vec(), None)
    }

    #[test]
    fn memory_read_truncates_at_end() {
        let mut file = memory_handle(b"abcdef");
        let mut buf = [0u8; 16];
        assert_eq!(file.read(&mut buf).unwrap(), 6);
        assert_eq!(&buf[..6], b"abcdef");
        assert_eq!(file.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn seek_rejects_out_of_range_without_moving() {
        let mut file = memory_handle(b"abcdef");
        file.seek(SeekFrom::Start(3)).unwrap();
        assert!(file.seek(SeekFrom::Start(7)).is_err());
        assert!(file.seek(SeekFrom::Current(-4)).is_err());
        assert_eq!(file.offset(), 3);
        assert_eq!(file.seek(SeekFrom::End(-2)).unwrap(), 4);
    }

    #[test]
    fn read_line_string_splits_on_newline() {
        let mut file = memory_handle(b"first\nsecond");
        assert_eq!(file.read_line_string(64).unwrap().unwrap(), "first");
        assert_eq!(file.read_line_string(64).unwrap().unwrap(), "second");
        assert!(file.read_line_string(64).unwrap().is_none());
    }

    #[test]
    fn rewind_resets_cursor() {
        let mut file = memory_handle(b"abcdef");
        file.seek(SeekFrom::Start(5)).unwrap();
        file.rewind().unwrap();
        assert_eq!(file.offset(), 0);
    }
}
