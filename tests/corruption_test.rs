//! Corruption detection
//!
//! A damaged blob or record must surface as an error from the handle, never
//! as silently wrong bytes.

use std::io::{self, Read};
use vault_rs::{ArchiveWriter, AssetIndex, AssetRecord, CompressionLevel, EmbeddedFs, VaultError};

/// Helper: encode a couple of files into memory
fn create_test_archive() -> (AssetIndex, Vec<u8>) {
    let mut writer = ArchiveWriter::new(Vec::new(), CompressionLevel::BEST);
    writer.add_file("/test.txt", b"Hello, World!", 1).unwrap();
    let data: Vec<u8> = (0..8192u32).map(|i| (i % 7) as u8 + b'a').collect();
    writer.add_file("/data.bin", &data, 2).unwrap();
    let encoded = writer.finalize().unwrap();
    (encoded.index, encoded.sink)
}

fn read_all(fs: EmbeddedFs<'_>, path: &str) -> io::Result<Vec<u8>> {
    let mut handle = fs.open(path).map_err(io::Error::from)?;
    let mut out = Vec::new();
    handle.read_to_end(&mut out)?;
    Ok(out)
}

fn with_record(index: &AssetIndex, path: &str, edit: impl Fn(&mut AssetRecord)) -> AssetIndex {
    let records = index
        .records()
        .iter()
        .cloned()
        .map(|mut record| {
            if record.virtual_path() == path {
                edit(&mut record);
            }
            record
        })
        .collect::<Vec<_>>();
    AssetIndex::new(records).unwrap()
}

#[test]
fn test_flipped_payload_byte_is_detected() {
    let (index, blob) = create_test_archive();
    let record = index.get("/data.bin").unwrap().clone();

    for offset in [record.offset + 2, record.offset + record.length / 2] {
        let mut damaged = blob.clone();
        damaged[offset as usize] ^= 0x55;
        let result = read_all(EmbeddedFs::new(&index, &damaged), "/data.bin");
        assert!(result.is_err(), "corruption at {} went unnoticed", offset);
    }

    // The neighbouring record is untouched
    let mut damaged = blob.clone();
    damaged[(record.offset + 2) as usize] ^= 0x55;
    let neighbour = read_all(EmbeddedFs::new(&index, &damaged), "/test.txt").unwrap();
    assert_eq!(neighbour, b"Hello, World!");
}

#[test]
fn test_truncated_blob() {
    let (index, blob) = create_test_archive();
    let truncated = &blob[..blob.len() - 10];
    let err = EmbeddedFs::new(&index, truncated).open("/data.bin").err().unwrap();
    assert!(matches!(err, VaultError::Corrupted(_)));
}

#[test]
fn test_wrong_crc_in_record() {
    let (index, blob) = create_test_archive();
    let index = with_record(&index, "/test.txt", |r| r.crc32 = r.crc32.wrapping_add(1));

    let err = read_all(EmbeddedFs::new(&index, &blob), "/test.txt").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    assert!(matches!(
        VaultError::from_io(err),
        VaultError::CrcMismatch { .. }
    ));
}

#[test]
fn test_record_size_disagrees_with_payload() {
    let (index, blob) = create_test_archive();

    let shorter = with_record(&index, "/test.txt", |r| r.size -= 1);
    let err = read_all(EmbeddedFs::new(&shorter, &blob), "/test.txt").unwrap_err();
    assert!(matches!(
        VaultError::from_io(err),
        VaultError::SizeMismatch { .. }
    ));

    let longer = with_record(&index, "/test.txt", |r| r.size += 5);
    let err = read_all(EmbeddedFs::new(&longer, &blob), "/test.txt").unwrap_err();
    assert!(matches!(
        VaultError::from_io(err),
        VaultError::SizeMismatch { .. }
    ));
}

#[test]
fn test_garbage_payload() {
    let garbage = vec![0xFFu8; 64];
    let record = AssetRecord::from_static("junk.bin", "/", 100, 0, 64, 0, 0);
    let index = AssetIndex::new(vec![record]).unwrap();
    assert!(read_all(EmbeddedFs::new(&index, &garbage), "/junk.bin").is_err());
}
