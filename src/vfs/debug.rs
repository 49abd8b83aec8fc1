use crate::archive::{base_name, join_path, normalize_path, unix_seconds};
use crate::error::{Result, VaultError};
use crate::vfs::{seek_target, AssetLoader, DirHandle, FileInfo, Handle};
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{trace, warn};
use walkdir::WalkDir;

/// Debug-mode loader reading live from a source directory
///
/// Every `open` stats the disk afresh, so edits under `base` show up without
/// regenerating anything. Paths are normalized before they are joined to
/// `base`, which keeps `..` segments from climbing out of it.
#[derive(Debug, Clone)]
pub struct DebugFs {
    base: PathBuf,
}

impl DebugFs {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn open(&self, name: &str) -> Result<Handle<'static>> {
        let path = normalize_path(name);
        let disk_path = self.disk_path(&path);
        let not_found = |e: io::Error| {
            trace!(path = %path, error = %e, "debug lookup failed");
            VaultError::NotFound(path.clone())
        };

        let metadata = fs::metadata(&disk_path).map_err(not_found)?;
        if metadata.is_dir() {
            return list_dir(&disk_path, &path).map(Handle::Dir);
        }

        let file = File::open(&disk_path).map_err(not_found)?;
        let mod_time = unix_seconds(&metadata);
        let info = FileInfo::file(base_name(&path), path.as_str(), metadata.len(), mod_time);
        Ok(Handle::Disk(DiskFile { file, info }))
    }

    fn disk_path(&self, virtual_path: &str) -> PathBuf {
        virtual_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.base.clone(), |acc, segment| acc.join(segment))
    }
}

impl AssetLoader for DebugFs {
    fn open(&self, name: &str) -> Result<Handle<'_>> {
        DebugFs::open(self, name)
    }
}

/// Size and newest modification time of every file below `dir`
fn tree_totals(dir: &Path) -> (u64, u64) {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .fold((0, 0), |(size, mod_time), metadata| {
            (size + metadata.len(), mod_time.max(unix_seconds(&metadata)))
        })
}

fn list_dir(disk_path: &Path, virtual_path: &str) -> Result<DirHandle> {
    let read_dir = fs::read_dir(disk_path).map_err(|e| {
        trace!(path = %virtual_path, error = %e, "debug listing failed");
        VaultError::NotFound(virtual_path.to_string())
    })?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %virtual_path, error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let child = join_path(virtual_path, &name);

        // Follows symlinks; a dangling link has no metadata and is left out
        let metadata = match fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %child, error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if metadata.is_dir() {
            let (size, mod_time) = tree_totals(&entry.path());
            entries.push(FileInfo::dir(name, child, size, mod_time));
        } else {
            let mod_time = unix_seconds(&metadata);
            entries.push(FileInfo::file(name, child, metadata.len(), mod_time));
        }
    }

    let (size, mod_time) = tree_totals(disk_path);
    let info = FileInfo::dir(base_name(virtual_path), virtual_path, size, mod_time);
    Ok(DirHandle::from_entries(info, entries))
}

/// File opened from disk in debug mode
///
/// Size, name and modification time come from the stat taken at open time.
#[derive(Debug)]
pub struct DiskFile {
    file: File,
    info: FileInfo,
}

impl DiskFile {
    pub fn stat(&self) -> FileInfo {
        self.info.clone()
    }

    pub fn path(&self) -> &str {
        self.info.path()
    }
}

impl Read for DiskFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for DiskFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let current = self.file.stream_position()?;
        match seek_target(pos, current, self.info.size()) {
            Some(target) => self.file.seek(SeekFrom::Start(target)),
            None => Err(VaultError::InvalidOffset { position: current }.into()),
        }
    }
}
