//! Multi-reader tests
//!
//! The index and blob are shared read-only; every handle owns its decoder, so
//! threads can open and seek the same records independently.

use std::io::{Read, Seek, SeekFrom};
use std::thread;
use vault_rs::{ArchiveWriter, AssetIndex, CompressionLevel, EmbeddedFs, Lazy};

fn file_data(i: usize) -> Vec<u8> {
    format!("file {} says hello\n", i).repeat(200 + i).into_bytes()
}

static ARCHIVE: Lazy<(AssetIndex, Vec<u8>)> = Lazy::new(|| {
    let mut writer = ArchiveWriter::new(Vec::new(), CompressionLevel::BEST);
    for dir in 1..=5 {
        for file in 1..=10 {
            let i = dir * 10 + file;
            let path = format!("/dir{}/file{}.txt", dir, file);
            writer.add_file(&path, &file_data(i), i as u64).unwrap();
        }
    }
    let encoded = writer.finalize().unwrap();
    (encoded.index, encoded.sink)
});

fn loader() -> EmbeddedFs<'static> {
    EmbeddedFs::new(&ARCHIVE.0, &ARCHIVE.1)
}

#[test]
fn test_concurrent_readers_share_one_archive() {
    let handles: Vec<_> = (0..16)
        .map(|thread_id| {
            thread::spawn(move || {
                let fs = loader();
                for dir in 1..=5 {
                    for file in 1..=10 {
                        let i = dir * 10 + file;
                        let path = format!("/dir{}/file{}.txt", dir, file);
                        let mut handle = fs.open(&path).unwrap();
                        let mut data = Vec::new();
                        handle.read_to_end(&mut data).unwrap();
                        assert_eq!(data, file_data(i), "thread {}", thread_id);
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn test_handles_on_same_record_are_independent() {
    let fs = loader();
    let expected = file_data(37);
    let mut a = fs.open("/dir3/file7.txt").unwrap();
    let mut b = fs.open("/dir3/file7.txt").unwrap();

    let mut buf_a = [0u8; 64];
    let mut buf_b = [0u8; 64];
    a.seek(SeekFrom::Start(1000)).unwrap();
    b.read_exact(&mut buf_b).unwrap();
    a.read_exact(&mut buf_a).unwrap();

    assert_eq!(&buf_a[..], &expected[1000..1064]);
    assert_eq!(&buf_b[..], &expected[..64]);
}

#[test]
fn test_concurrent_directory_listing() {
    let handles: Vec<_> = (0..8)
        .map(|_| {
            thread::spawn(|| {
                let fs = loader();
                for _ in 0..50 {
                    let mut root = fs.open("/").unwrap();
                    assert_eq!(root.readdir(-1).unwrap().len(), 5);
                    let mut dir = fs.open("/dir4").unwrap();
                    let entries = dir.readdir(-1).unwrap();
                    assert_eq!(entries.len(), 10);
                    assert_eq!(entries[0].name(), "file1.txt");
                    assert_eq!(entries[1].name(), "file10.txt");
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
