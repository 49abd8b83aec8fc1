//! Read-only virtual filesystem over an archive or a source directory
//!
//! Both loaders share one lookup contract, [`AssetLoader::open`], and return
//! a [`Handle`]: a seekable file, or a directory that can be listed.
//! File handles implement `Read + Seek`; directory handles only list.
//! The `Handle` enum forwards byte I/O to its file variants and rejects it
//! for directories with [`VaultError::IsDirectory`].

mod debug;
mod dir;
mod embedded;
mod file;

pub use debug::{DebugFs, DiskFile};
pub use dir::DirHandle;
pub use embedded::EmbeddedFs;
pub use file::FileHandle;

use crate::archive::AssetRecord;
use crate::error::{Result, VaultError};
use serde::Serialize;
use std::io::{self, Read, Seek, SeekFrom};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Metadata of a file or synthesized directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    name: String,
    path: String,
    size: u64,
    mod_time: u64,
    is_dir: bool,
}

impl FileInfo {
    pub(crate) fn file(
        name: impl Into<String>,
        path: impl Into<String>,
        size: u64,
        mod_time: u64,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size,
            mod_time,
            is_dir: false,
        }
    }

    pub(crate) fn dir(
        name: impl Into<String>,
        path: impl Into<String>,
        size: u64,
        mod_time: u64,
    ) -> Self {
        Self {
            is_dir: true,
            ..Self::file(name, path, size, mod_time)
        }
    }

    pub(crate) fn from_record(record: &AssetRecord) -> Self {
        Self::file(
            record.name.to_string(),
            record.virtual_path(),
            record.size,
            record.mod_time,
        )
    }

    /// Base name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered virtual path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decompressed size; for directories the sum over all nested files
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Modification time in seconds since the Unix epoch
    pub fn mod_time(&self) -> u64 {
        self.mod_time
    }

    pub fn modified(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.mod_time)
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }
}

/// Lookup contract shared by the release and debug loaders
pub trait AssetLoader {
    /// Open a file or directory by virtual path
    fn open(&self, name: &str) -> Result<Handle<'_>>;
}

/// An open file or directory
pub enum Handle<'a> {
    /// File decoded from an embedded blob
    File(FileHandle<'a>),
    /// File read straight from disk (debug mode)
    Disk(DiskFile),
    Dir(DirHandle),
}

impl<'a> Handle<'a> {
    pub fn stat(&self) -> FileInfo {
        match self {
            Handle::File(file) => file.stat(),
            Handle::Disk(file) => file.stat(),
            Handle::Dir(dir) => dir.stat(),
        }
    }

    /// Registered virtual path
    pub fn path(&self) -> &str {
        match self {
            Handle::File(file) => file.path(),
            Handle::Disk(file) => file.path(),
            Handle::Dir(dir) => dir.path(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Handle::Dir(_))
    }

    /// List up to `count` entries (all remaining when `count <= 0`)
    pub fn readdir(&mut self, count: isize) -> Result<Vec<FileInfo>> {
        match self {
            Handle::Dir(dir) => dir.readdir(count),
            other => Err(VaultError::NotDirectory(other.path().to_string())),
        }
    }

    /// Read the remaining content into a vector
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        // A directory's size covers its whole subtree; reject before reserving
        if let Handle::Dir(dir) = self {
            return Err(VaultError::IsDirectory(dir.path().to_string()));
        }
        let mut data = Vec::with_capacity(self.stat().size() as usize);
        self.read_to_end(&mut data).map_err(VaultError::from_io)?;
        Ok(data)
    }
}

impl Read for Handle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Handle::File(file) => file.read(buf),
            Handle::Disk(file) => file.read(buf),
            Handle::Dir(dir) => Err(VaultError::IsDirectory(dir.path().to_string()).into()),
        }
    }
}

impl Seek for Handle<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Handle::File(file) => file.seek(pos),
            Handle::Disk(file) => file.seek(pos),
            Handle::Dir(dir) => Err(VaultError::IsDirectory(dir.path().to_string()).into()),
        }
    }
}

/// Resolve a seek request against the current position and file size
///
/// `None` when the target would be negative (or overflow).
pub(crate) fn seek_target(pos: SeekFrom, current: u64, size: u64) -> Option<u64> {
    match pos {
        SeekFrom::Start(offset) => Some(offset),
        SeekFrom::Current(delta) => current.checked_add_signed(delta),
        SeekFrom::End(delta) => size.checked_add_signed(delta),
    }
}
