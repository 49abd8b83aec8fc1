use crate::archive::format::{
    normalize_path, split_path, unix_seconds, AssetIndex, AssetRecord, CompressionLevel, ROOT,
};
use crate::error::{Result, VaultError};
use crate::walker::FileItem;
use flate2::write::ZlibEncoder;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::io::Write;
use tracing::debug;

/// Output of a finished encode pass
pub struct EncodedArchive<W> {
    /// The sink the blob was written to
    pub sink: W,
    pub index: AssetIndex,
    /// Hex SHA-256 of the raw blob bytes
    pub digest: String,
}

/// Archive encoder
///
/// Compresses every file independently with zlib and appends the payload to
/// `sink`, so the blob is a tight concatenation of payloads in the order the
/// files were added.
pub struct ArchiveWriter<W: Write> {
    sink: W,
    records: Vec<AssetRecord>,
    seen: HashSet<String>,
    current_offset: u64,
    level: CompressionLevel,
    hasher: Sha256,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(sink: W, level: CompressionLevel) -> Self {
        Self {
            sink,
            records: Vec::new(),
            seen: HashSet::new(),
            current_offset: 0,
            level,
            hasher: Sha256::new(),
        }
    }

    /// Add a file under `virtual_path`
    pub fn add_file(
        &mut self,
        virtual_path: &str,
        data: &[u8],
        mod_time: u64,
    ) -> Result<&AssetRecord> {
        // Reject the root and any path already stored
        let normalized = normalize_path(virtual_path);
        if normalized == ROOT {
            return Err(VaultError::InvalidPath(format!(
                "'{}' does not name a file",
                virtual_path
            )));
        }
        if !self.seen.insert(normalized.clone()) {
            return Err(VaultError::PathCollision(normalized));
        }

        // Compress, then append the payload right after the previous one
        let payload = self.compress(data)?;
        self.sink.write_all(&payload)?;
        self.hasher.update(&payload);

        // Record where the payload landed
        let (dir, name) = split_path(&normalized);
        let record = AssetRecord {
            name: name.to_string().into(),
            path: dir.to_string().into(),
            size: data.len() as u64,
            offset: self.current_offset,
            length: payload.len() as u64,
            mod_time,
            crc32: crc32fast::hash(data),
        };
        self.current_offset += record.length;

        debug!(
            path = %normalized,
            size = record.size,
            offset = record.offset,
            length = record.length,
            "added file"
        );
        self.records.push(record);
        Ok(&self.records[self.records.len() - 1])
    }

    /// Read a walked file from disk and add it
    pub fn add_item(&mut self, item: &FileItem) -> Result<&AssetRecord> {
        debug!(path = %item.absolute_path.display(), "processing file");
        let data = std::fs::read(&item.absolute_path)?;
        self.add_file(&item.virtual_path, &data, unix_seconds(&item.metadata))
    }

    /// Blob bytes written so far
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    pub fn entry_count(&self) -> usize {
        self.records.len()
    }

    /// Flush the sink and build the index
    pub fn finalize(mut self) -> Result<EncodedArchive<W>> {
        self.sink.flush()?;
        let index = AssetIndex::new(self.records)?;
        Ok(EncodedArchive {
            sink: self.sink,
            index,
            digest: hex::encode(self.hasher.finalize()),
        })
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let buffer = Vec::with_capacity(data.len() / 2 + 16);
        let mut encoder = ZlibEncoder::new(buffer, self.level.to_flate2());
        encoder.write_all(data).map_err(|e| {
            VaultError::CompressionFailed(format!("zlib compression failed: {}", e))
        })?;
        encoder
            .finish()
            .map_err(|e| VaultError::CompressionFailed(format!("zlib compression failed: {}", e)))
    }
}
