use crate::archive::AssetRecord;
use crate::error::{Result, VaultError};
use crate::vfs::{seek_target, FileInfo};
use flate2::bufread::ZlibDecoder;
use std::io::{self, Read, Seek, SeekFrom};
use tracing::trace;

/// Scratch size used when discarding decoded bytes during a seek
const DISCARD_CHUNK: usize = 8192;

/// Seekable reader over one embedded file
///
/// Decompression is forward-only. A forward seek decodes and discards up to
/// the target; a backward seek restarts the decoder at the beginning of the
/// record's payload and discards up to the target, so its cost grows with
/// the target offset rather than with the seek distance.
///
/// Each handle owns its decoder: independent handles over the same record
/// are fine, a single handle needs external serialization to be shared.
pub struct FileHandle<'a> {
    record: &'a AssetRecord,
    path: String,
    payload: &'a [u8],
    decoder: ZlibDecoder<&'a [u8]>,
    /// Decompressed bytes produced by `decoder` so far
    decoded: u64,
    /// Logical read position reported to callers
    position: u64,
    crc: crc32fast::Hasher,
    verified: bool,
}

impl<'a> FileHandle<'a> {
    pub(crate) fn new(record: &'a AssetRecord, blob: &'a [u8]) -> Result<Self> {
        let payload = usize::try_from(record.offset)
            .ok()
            .zip(usize::try_from(record.end()).ok())
            .and_then(|(start, end)| blob.get(start..end))
            .ok_or_else(|| {
                VaultError::Corrupted(format!(
                    "{}: payload {}..{} outside blob of {} bytes",
                    record.virtual_path(),
                    record.offset,
                    record.end(),
                    blob.len()
                ))
            })?;

        Ok(Self {
            record,
            path: record.virtual_path(),
            payload,
            decoder: ZlibDecoder::new(payload),
            decoded: 0,
            position: 0,
            crc: crc32fast::Hasher::new(),
            verified: false,
        })
    }

    pub fn stat(&self) -> FileInfo {
        FileInfo::from_record(self.record)
    }

    /// Registered virtual path
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn record(&self) -> &AssetRecord {
        self.record
    }

    /// Current logical position
    pub fn position(&self) -> u64 {
        self.position
    }

    fn restart(&mut self) {
        trace!(path = %self.path, from = self.decoded, "restarting decoder");
        self.decoder = ZlibDecoder::new(self.payload);
        self.decoded = 0;
        self.crc = crc32fast::Hasher::new();
        self.verified = false;
    }

    /// Pull decoded bytes into `buf`, keeping the running CRC up to date
    fn decode(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.decoder.read(buf)?;
        // Stream ended before `size` bytes were produced
        if n == 0 && !buf.is_empty() {
            return Err(self.size_mismatch(self.decoded).into());
        }
        self.crc.update(&buf[..n]);
        self.decoded += n as u64;
        if self.decoded >= self.record.size {
            self.verify()?;
        }
        Ok(n)
    }

    /// Check the stream ends exactly at `size` and the content matches its CRC
    fn verify(&mut self) -> io::Result<()> {
        if self.verified {
            return Ok(());
        }
        // Any byte past `size` means the record understates the payload
        let mut extra = [0u8; 1];
        if self.decoder.read(&mut extra)? != 0 {
            return Err(self.size_mismatch(self.decoded + 1).into());
        }
        if self.decoded != self.record.size {
            return Err(self.size_mismatch(self.decoded).into());
        }
        let actual = self.crc.clone().finalize();
        if actual != self.record.crc32 {
            return Err(VaultError::CrcMismatch {
                path: self.path.clone(),
                expected: self.record.crc32,
                actual,
            }
            .into());
        }
        self.verified = true;
        Ok(())
    }

    fn size_mismatch(&self, actual: u64) -> VaultError {
        VaultError::SizeMismatch {
            path: self.path.clone(),
            expected: self.record.size,
            actual,
        }
    }

    /// Bring the decoder to `min(target, size)`
    fn sync_to(&mut self, target: u64) -> io::Result<()> {
        let target = target.min(self.record.size);
        // Backward: decode again from the start of the payload
        if target < self.decoded {
            self.restart();
        }
        let mut scratch = [0u8; DISCARD_CHUNK];
        while self.decoded < target {
            let want = (target - self.decoded).min(DISCARD_CHUNK as u64) as usize;
            self.decode(&mut scratch[..want])?;
        }
        if self.record.size == 0 {
            self.verify()?;
        }
        Ok(())
    }
}

impl Read for FileHandle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.sync_to(self.position)?;
        if self.position >= self.record.size {
            return Ok(0);
        }

        let want = (self.record.size - self.position).min(buf.len() as u64) as usize;
        let n = self.decode(&mut buf[..want])?;
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for FileHandle<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = seek_target(pos, self.position, self.record.size).ok_or(
            VaultError::InvalidOffset {
                position: self.position,
            },
        )?;
        self.sync_to(target)?;
        self.position = target;
        Ok(target)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}
