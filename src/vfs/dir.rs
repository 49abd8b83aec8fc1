use crate::archive::{base_name, child_segment, join_path, AssetRecord};
use crate::error::{Result, VaultError};
use crate::vfs::FileInfo;
use std::collections::{BTreeMap, VecDeque};

/// Open directory: its own metadata plus a cursor over its children
///
/// Children are listed directories first, then files, each group ordered by
/// name bytes.
#[derive(Debug, Clone)]
pub struct DirHandle {
    info: FileInfo,
    remaining: VecDeque<FileInfo>,
}

impl DirHandle {
    pub(crate) fn from_entries(info: FileInfo, mut entries: Vec<FileInfo>) -> Self {
        entries.sort_by(|a, b| {
            b.is_dir()
                .cmp(&a.is_dir())
                .then_with(|| a.name().as_bytes().cmp(b.name().as_bytes()))
        });
        Self {
            info,
            remaining: entries.into(),
        }
    }

    /// Return up to `count` more entries
    ///
    /// With `count <= 0` everything left is returned, which may be empty.
    /// With `count > 0` an exhausted listing is [`VaultError::EndOfListing`].
    pub fn readdir(&mut self, count: isize) -> Result<Vec<FileInfo>> {
        if count <= 0 {
            return Ok(self.remaining.drain(..).collect());
        }
        if self.remaining.is_empty() {
            return Err(VaultError::EndOfListing);
        }
        let take = (count as usize).min(self.remaining.len());
        Ok(self.remaining.drain(..take).collect())
    }

    pub fn stat(&self) -> FileInfo {
        self.info.clone()
    }

    pub fn path(&self) -> &str {
        self.info.path()
    }

    /// Entries not yet returned by [`readdir`](Self::readdir)
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

#[derive(Default)]
struct Totals {
    size: u64,
    mod_time: u64,
}

impl Totals {
    fn add(&mut self, record: &AssetRecord) {
        self.size += record.size;
        self.mod_time = self.mod_time.max(record.mod_time);
    }
}

/// Build a listing of `dir` from the records below it
///
/// `None` when no record lives in `dir` or any of its descendants.
pub(crate) fn synthesize(dir: &str, records: &[AssetRecord]) -> Option<DirHandle> {
    let mut own = Totals::default();
    let mut files = Vec::new();
    let mut subdirs: BTreeMap<&str, Totals> = BTreeMap::new();
    let mut found = false;

    for record in records {
        if record.path == dir {
            files.push(FileInfo::from_record(record));
        } else if let Some(segment) = child_segment(&record.path, dir) {
            subdirs.entry(segment).or_default().add(record);
        } else {
            continue;
        }
        found = true;
        own.add(record);
    }

    if !found {
        return None;
    }

    let mut entries = files;
    entries.extend(subdirs.into_iter().map(|(name, totals)| {
        FileInfo::dir(name, join_path(dir, name), totals.size, totals.mod_time)
    }));
    let info = FileInfo::dir(base_name(dir), dir, own.size, own.mod_time);
    Some(DirHandle::from_entries(info, entries))
}
