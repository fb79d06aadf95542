use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;

/// A trait that reads the string encodings found in archive directories.
pub trait ReadStringExt: Read {
    /// Reads a fixed-size name field, trimming at the first NUL byte.
    fn read_fixed_string(&mut self, len: usize) -> io::Result<String>;

    /// Reads a NUL-terminated string byte-by-byte, up to `max` bytes including
    /// the terminator.
    fn read_cstring(&mut self, max: usize) -> io::Result<String>;

    /// Reads exactly `len` bytes into a freshly allocated buffer.
    fn read_vec(&mut self, len: usize) -> io::Result<Vec<u8>>;
}

impl<T> ReadStringExt for T
where
    T: Read,
{
    fn read_fixed_string(&mut self, len: usize) -> io::Result<String> {
        let buf = self.read_vec(len)?;
        let end = buf.iter().position(|b| *b == 0).unwrap_or(len);
        Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
    }

    fn read_cstring(&mut self, max: usize) -> io::Result<String> {
        let mut bytes = Vec::new();
        let mut one = [0u8; 1];
        while bytes.len() < max {
            if self.read(&mut one)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "unterminated string",
                ));
            }
            if one[0] == 0 {
                return Ok(String::from_utf8_lossy(&bytes).into_owned());
            }
            bytes.push(one[0]);
        }
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "string exceeds maximum length",
        ))
    }

    fn read_vec(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// Utility methods for working with seekable streams.
pub trait SeekExt: Seek {
    /// Skips over the given number of bytes from the current position.
    fn skip(&mut self, size: u64) -> io::Result<u64>;

    /// Advances to the next multiple of `boundary`, or stays put if already
    /// aligned. `boundary` must be non-zero.
    fn align_to(&mut self, boundary: u64) -> io::Result<u64>;
}

impl<T> SeekExt for T
where
    T: Seek,
{
    fn skip(&mut self, size: u64) -> io::Result<u64> {
        let size = i64::try_from(size)
            .map_err(|_| io::Error::from(io::ErrorKind::InvalidData))?;
        self.seek(SeekFrom::Current(size))
    }

    fn align_to(&mut self, boundary: u64) -> io::Result<u64> {
        let pos = self.stream_position()?;
        let rem = pos % boundary;
        if rem == 0 {
            return Ok(pos);
        }
        self.seek(SeekFrom::Start(pos + (boundary - rem)))
    }
}
