use pakfs_rs::file_handle::FileHandle;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use pretty_assertions::assert_eq;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use tempfile::TempDir;

#[test]
fn cached_and_streamed_reads_are_identical() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.bin");
    let contents: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
    fs::write(&path, &contents).unwrap();

    for cache in [true, false] {
        let mut file = FileHandle::open_local(&path, cache).unwrap();
        assert_eq!(file.size().unwrap(), 1000);

        let mut all = Vec::new();
        file.read_to_end(&mut all).unwrap();
        assert_eq!(all, contents);

        file.seek(SeekFrom::Start(10)).unwrap();
        let mut four = [0u8; 4];
        file.read_exact(&mut four).unwrap();
        assert_eq!(four, [10, 11, 12, 13]);
        assert_eq!(file.offset(), 14);
    }
}

#[test]
fn typed_reads_normalize_endianness() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ints.bin");
    fs::write(&path, [0x12, 0x34, 0x56, 0x78]).unwrap();

    let mut file = FileHandle::open_local(&path, true).unwrap();
    assert_eq!(file.read_u32::<LittleEndian>().unwrap(), 0x78563412);
    file.rewind().unwrap();
    assert_eq!(file.read_u32::<BigEndian>().unwrap(), 0x12345678);
}

#[test]
fn stream_size_observes_external_growth() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("growing.bin");
    fs::write(&path, b"1234").unwrap();

    let file = FileHandle::open_local(&path, false).unwrap();
    assert_eq!(file.size().unwrap(), 4);

    let mut writer = OpenOptions::new().append(true).open(&path).unwrap();
    writer.write_all(b"5678").unwrap();
    writer.flush().unwrap();
    drop(writer);

    assert_eq!(file.size().unwrap(), 8);
}

#[test]
fn cached_size_is_fixed_at_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fixed.bin");
    fs::write(&path, b"1234").unwrap();

    let file = FileHandle::open_local(&path, true).unwrap();
    fs::write(&path, b"12345678").unwrap();
    assert_eq!(file.size().unwrap(), 4);
}

#[test]
fn stream_seek_rejects_out_of_range() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.bin");
    fs::write(&path, b"abcdef").unwrap();

    let mut file = FileHandle::open_local(&path, false).unwrap();
    file.seek(SeekFrom::Start(2)).unwrap();
    assert!(file.seek(SeekFrom::Start(7)).is_err());
    assert!(file.seek(SeekFrom::End(1)).is_err());
    assert_eq!(file.offset(), 2);

    let mut rest = Vec::new();
    file.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"cdef");
}

#[test]
fn open_missing_file_reports_read_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.bin");
    assert!(matches!(
        FileHandle::open_local(&missing, true),
        Err(pakfs_rs::PakFsError::Read(_))
    ));
}

#[test]
fn mtime_is_reported_for_local_opens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stamped.bin");
    fs::write(&path, b"x").unwrap();

    let file = FileHandle::open_local(&path, true).unwrap();
    assert!(file.mtime().is_some());

    let synthetic = FileHandle::from_memory("from/package", vec![1, 2], None);
    assert!(synthetic.mtime().is_none());
}

#[test]
fn close_consumes_the_handle() {
    let file = FileHandle::from_memory("x", vec![1, 2, 3], None);
    file.close();
    // A second close cannot be expressed; the handle is gone.
}
