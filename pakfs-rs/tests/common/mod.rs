//! Fixture builders shared by the integration tests. Archives are written
//! byte-by-byte so the tests depend only on the documented formats.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Writes a Quake PACK archive.
pub fn write_pak(path: &Path, entries: &[(&str, &[u8])]) {
    let mut data = vec![0u8; 12];

    let mut records = Vec::new();
    for (name, bytes) in entries {
        let offset = data.len() as u32;
        data.extend_from_slice(bytes);
        records.push((*name, offset, bytes.len() as u32));
    }

    let dir_offset = data.len() as u32;
    for (name, offset, length) in &records {
        let mut name_buf = [0u8; 56];
        let name_bytes = name.as_bytes();
        name_buf[..name_bytes.len()].copy_from_slice(name_bytes);
        data.extend_from_slice(&name_buf);
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&length.to_le_bytes());
    }

    data[0..4].copy_from_slice(b"PACK");
    data[4..8].copy_from_slice(&dir_offset.to_le_bytes());
    data[8..12].copy_from_slice(&((records.len() * 64) as u32).to_le_bytes());

    fs::write(path, data).unwrap();
}

/// Writes a Doom PWAD archive.
pub fn write_wad(path: &Path, entries: &[(&str, &[u8])]) {
    let mut data = vec![0u8; 12];

    let mut records = Vec::new();
    for (name, bytes) in entries {
        let offset = data.len() as u32;
        data.extend_from_slice(bytes);
        records.push((*name, offset, bytes.len() as u32));
    }

    let dir_offset = data.len() as u32;
    for (name, offset, length) in &records {
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&length.to_le_bytes());
        let mut name_buf = [0u8; 8];
        let name_bytes = name.as_bytes();
        name_buf[..name_bytes.len()].copy_from_slice(name_bytes);
        data.extend_from_slice(&name_buf);
    }

    data[0..4].copy_from_slice(b"PWAD");
    data[4..8].copy_from_slice(&(records.len() as u32).to_le_bytes());
    data[8..12].copy_from_slice(&dir_offset.to_le_bytes());

    fs::write(path, data).unwrap();
}

/// Writes a ZIP archive; entries are deflated when `compress` is set.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])], compress: bool) {
    let mut data = Vec::new();
    let mut central = Vec::new();
    let method: u16 = if compress { 8 } else { 0 };

    for (name, bytes) in entries {
        let stored = if compress {
            deflate(bytes)
        } else {
            bytes.to_vec()
        };
        let crc = crc32fast::hash(bytes);
        let local_offset = data.len() as u32;

        data.extend_from_slice(&0x04034B50u32.to_le_bytes());
        data.extend_from_slice(&20u16.to_le_bytes()); // version needed
        data.extend_from_slice(&0u16.to_le_bytes()); // flags
        data.extend_from_slice(&method.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes()); // mod time
        data.extend_from_slice(&0u16.to_le_bytes()); // mod date
        data.extend_from_slice(&crc.to_le_bytes());
        data.extend_from_slice(&(stored.len() as u32).to_le_bytes());
        data.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        data.extend_from_slice(&(name.len() as u16).to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes()); // extra len
        data.extend_from_slice(name.as_bytes());
        data.extend_from_slice(&stored);

        central.extend_from_slice(&0x02014B50u32.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes()); // version made by
        central.extend_from_slice(&20u16.to_le_bytes()); // version needed
        central.extend_from_slice(&0u16.to_le_bytes()); // flags
        central.extend_from_slice(&method.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes()); // mod time
        central.extend_from_slice(&0u16.to_le_bytes()); // mod date
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&(stored.len() as u32).to_le_bytes());
        central.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes()); // extra len
        central.extend_from_slice(&0u16.to_le_bytes()); // comment len
        central.extend_from_slice(&0u16.to_le_bytes()); // disk start
        central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        central.extend_from_slice(&local_offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let cd_offset = data.len() as u32;
    data.extend_from_slice(&central);
    data.extend_from_slice(&0x06054B50u32.to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes()); // disk number
    data.extend_from_slice(&0u16.to_le_bytes()); // central dir disk
    data.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    data.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    data.extend_from_slice(&(central.len() as u32).to_le_bytes());
    data.extend_from_slice(&cd_offset.to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes()); // comment len

    fs::write(path, data).unwrap();
}

/// Writes a TAB/BIN pair from explicit big-endian offset pairs.
pub fn write_tab_bin(tab_path: &Path, pairs: &[(u32, u32)], bin: &[u8]) {
    let mut tab = Vec::new();
    for (start, end) in pairs {
        tab.extend_from_slice(&start.to_be_bytes());
        tab.extend_from_slice(&end.to_be_bytes());
    }
    fs::write(tab_path, tab).unwrap();
    fs::write(tab_path.with_extension("bin"), bin).unwrap();
}

/// Writes a DAVE archive. Entries marked `compress` are gzip-wrapped. With
/// `obfuscated` the lowercase magic is used and names are garbage on disk.
pub fn write_dave(path: &Path, entries: &[(&str, &[u8], bool)], obfuscated: bool) {
    let mut names = Vec::new();
    let mut name_offsets = Vec::new();
    for (name, _, _) in entries {
        name_offsets.push(names.len() as u32);
        if obfuscated {
            names.extend(name.bytes().map(|b| b ^ 0x5A));
        } else {
            names.extend_from_slice(name.as_bytes());
        }
        names.push(0);
    }

    let toc_offset = 2048usize;
    let toc_len = entries.len() * 16;
    let names_offset = (toc_offset + toc_len).next_multiple_of(2048);
    let data_offset = (names_offset + names.len()).next_multiple_of(2048);

    let mut stored = Vec::new();
    let mut records = Vec::new();
    for ((_, bytes, compress), name_offset) in entries.iter().zip(&name_offsets) {
        let body = if *compress {
            gzip(bytes)
        } else {
            bytes.to_vec()
        };
        records.push((
            *name_offset,
            (data_offset + stored.len()) as u32,
            bytes.len() as u32,
            body.len() as u32,
        ));
        stored.extend_from_slice(&body);
    }

    let mut data = Vec::new();
    data.extend_from_slice(if obfuscated { b"Dave" } else { b"DAVE" });
    data.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    data.extend_from_slice(&(names.len() as u32).to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.resize(toc_offset, 0);
    for (name_offset, offset, size, compressed_size) in &records {
        data.extend_from_slice(&name_offset.to_le_bytes());
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&size.to_le_bytes());
        data.extend_from_slice(&compressed_size.to_le_bytes());
    }
    data.resize(names_offset, 0);
    data.extend_from_slice(&names);
    data.resize(data_offset, 0);
    data.extend_from_slice(&stored);

    fs::write(path, data).unwrap();
}

/// Writes a VSR archive.
pub fn write_vsr(path: &Path, entries: &[(&str, &[u8])]) {
    let mut names = Vec::new();
    for (name, _) in entries {
        names.extend_from_slice(name.as_bytes());
        names.push(0);
    }

    // header + CRID header + records + unused chunk + TRTS header +
    // unused offset table + names, then entry data.
    let directory_len = 32 + 8 + entries.len() * 40 + 12 + 8 + entries.len() * 4 + names.len();

    let mut stored = Vec::new();
    let mut records = Vec::new();
    for (_, bytes) in entries {
        records.push(((directory_len + stored.len()) as u32, bytes.len() as u32));
        stored.extend_from_slice(bytes);
    }

    let mut data = Vec::new();
    data.extend_from_slice(b"1RSV");
    data.resize(32, 0);
    data.extend_from_slice(b"CRID");
    data.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for (offset, length) in &records {
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&length.to_le_bytes());
        data.extend_from_slice(&[0u8; 32]);
    }
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(b"TRTS");
    data.extend_from_slice(&((entries.len() * 4 + names.len()) as u32).to_le_bytes());
    data.extend_from_slice(&vec![0u8; entries.len() * 4]);
    data.extend_from_slice(&names);
    debug_assert_eq!(data.len(), directory_len);
    data.extend_from_slice(&stored);

    fs::write(path, data).unwrap();
}

/// Writes a single-part VPK v1 directory file with all data resident after
/// the tree. Entry names must be `dir/name.ext` or `name.ext`.
pub fn write_vpk(path: &Path, entries: &[(&str, &[u8])]) {
    use std::collections::BTreeMap;

    // ext -> dir -> (name, data)
    let mut tree: BTreeMap<String, BTreeMap<String, Vec<(String, &[u8])>>> = BTreeMap::new();
    for (full, bytes) in entries {
        let (dir, rest) = match full.rfind('/') {
            Some(i) => (&full[..i], &full[i + 1..]),
            None => (" ", *full),
        };
        let (name, ext) = rest.rsplit_once('.').unwrap();
        tree.entry(ext.to_string())
            .or_default()
            .entry(dir.to_string())
            .or_default()
            .push((name.to_string(), bytes));
    }

    let mut tree_bytes = Vec::new();
    let mut stored = Vec::new();
    for (ext, dirs) in &tree {
        tree_bytes.extend_from_slice(ext.as_bytes());
        tree_bytes.push(0);
        for (dir, files) in dirs {
            tree_bytes.extend_from_slice(dir.as_bytes());
            tree_bytes.push(0);
            for (name, bytes) in files {
                tree_bytes.extend_from_slice(name.as_bytes());
                tree_bytes.push(0);
                tree_bytes.extend_from_slice(&crc32fast::hash(bytes).to_le_bytes());
                tree_bytes.extend_from_slice(&0u16.to_le_bytes()); // preload
                tree_bytes.extend_from_slice(&0x7FFFu16.to_le_bytes()); // dir file
                tree_bytes.extend_from_slice(&(stored.len() as u32).to_le_bytes());
                tree_bytes.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                tree_bytes.extend_from_slice(&0xFFFFu16.to_le_bytes());
                stored.extend_from_slice(bytes);
            }
            tree_bytes.push(0); // end of names
        }
        tree_bytes.push(0); // end of dirs
    }
    tree_bytes.push(0); // end of extensions

    let mut data = Vec::new();
    data.extend_from_slice(&0x55AA1234u32.to_le_bytes());
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&(tree_bytes.len() as u32).to_le_bytes());
    data.extend_from_slice(&tree_bytes);
    data.extend_from_slice(&stored);

    fs::write(path, data).unwrap();
}
