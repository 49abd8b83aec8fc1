use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::Metadata;
use std::time::UNIX_EPOCH;

/// Virtual path of the archive root
pub const ROOT: &str = "/";

/// Compression level applied to every file payload (zlib, 0..=9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    /// Payloads are stored in uncompressed deflate blocks
    pub const NONE: Self = Self(0);
    pub const FAST: Self = Self(1);
    pub const BEST: Self = Self(9);

    pub fn new(level: u32) -> Result<Self> {
        if level > 9 {
            return Err(VaultError::Config(format!(
                "Invalid compression level: {} (expected 0-9)",
                level
            )));
        }
        Ok(Self(level))
    }

    /// Best compression when `compress` is set, stored blocks otherwise
    pub fn from_flag(compress: bool) -> Self {
        if compress {
            Self::BEST
        } else {
            Self::NONE
        }
    }

    pub fn level(self) -> u32 {
        self.0
    }

    pub(crate) fn to_flate2(self) -> flate2::Compression {
        flate2::Compression::new(self.0)
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::BEST
    }
}

impl TryFrom<u32> for CompressionLevel {
    type Error = VaultError;

    fn try_from(level: u32) -> Result<Self> {
        Self::new(level)
    }
}

impl From<CompressionLevel> for u32 {
    fn from(level: CompressionLevel) -> u32 {
        level.0
    }
}

/// Index entry for one embedded file
///
/// `offset`/`length` address the compressed payload inside the shared blob,
/// `size` is the decompressed length. Strings are `Cow` so generated code can
/// declare the whole table as a `static`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub name: Cow<'static, str>,
    pub path: Cow<'static, str>,
    pub size: u64,
    pub offset: u64,
    pub length: u64,
    pub mod_time: u64,
    pub crc32: u32,
}

impl AssetRecord {
    /// Constructor used by generated release units
    pub const fn from_static(
        name: &'static str,
        path: &'static str,
        size: u64,
        offset: u64,
        length: u64,
        mod_time: u64,
        crc32: u32,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            path: Cow::Borrowed(path),
            size,
            offset,
            length,
            mod_time,
            crc32,
        }
    }

    /// Full virtual path (`path` + `/` + `name`)
    pub fn virtual_path(&self) -> String {
        join_path(&self.path, &self.name)
    }

    /// End of this record's payload within the blob
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Immutable lookup table from virtual path to record, in encode order
#[derive(Debug, Clone, Default)]
pub struct AssetIndex {
    records: Vec<AssetRecord>,
    lookup: HashMap<String, usize>,
}

impl AssetIndex {
    /// Build an index, rejecting duplicate virtual paths
    pub fn new(records: Vec<AssetRecord>) -> Result<Self> {
        let mut lookup = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            if record.name.is_empty() {
                return Err(VaultError::InvalidPath(format!(
                    "Record without a file name under '{}'",
                    record.path
                )));
            }
            let key = record.virtual_path();
            if lookup.insert(key.clone(), idx).is_some() {
                return Err(VaultError::PathCollision(key));
            }
        }
        Ok(Self { records, lookup })
    }

    /// Build an index from a record table that was validated when it was generated
    pub fn from_static(records: &'static [AssetRecord]) -> Self {
        let lookup = records
            .iter()
            .enumerate()
            .map(|(idx, record)| (record.virtual_path(), idx))
            .collect();
        Self {
            records: records.to_vec(),
            lookup,
        }
    }

    /// Look up a record by its normalized virtual path
    pub fn get(&self, virtual_path: &str) -> Option<&AssetRecord> {
        self.lookup.get(virtual_path).map(|&idx| &self.records[idx])
    }

    pub fn contains(&self, virtual_path: &str) -> bool {
        self.lookup.contains_key(virtual_path)
    }

    /// True if any record lives in `dir` or below it
    pub fn contains_dir(&self, dir: &str) -> bool {
        self.records.iter().any(|r| is_within(&r.path, dir))
    }

    /// Records in encode order
    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of blob bytes the records address
    pub fn blob_len(&self) -> u64 {
        self.records.iter().map(AssetRecord::end).max().unwrap_or(0)
    }
}

/// Normalize a lookup path: forward slashes, single leading slash, no
/// trailing slash (except root), empty and `.` segments dropped, `..` never
/// climbing above root.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return ROOT.to_string();
    }
    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in segments {
        normalized.push('/');
        normalized.push_str(segment);
    }
    normalized
}

/// Split a normalized virtual path into `(directory, name)`
pub fn split_path(virtual_path: &str) -> (&str, &str) {
    match virtual_path.rfind('/') {
        Some(0) | None => (ROOT, virtual_path.trim_start_matches('/')),
        Some(idx) => (&virtual_path[..idx], &virtual_path[idx + 1..]),
    }
}

/// Join a directory path and a child name
pub fn join_path(dir: &str, name: &str) -> String {
    if dir == ROOT {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Segment-aware containment: `/data` contains `/data` and `/data/json`,
/// but not `/data2`.
pub fn is_within(path: &str, dir: &str) -> bool {
    if dir == ROOT {
        return path.starts_with('/');
    }
    match path.strip_prefix(dir) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// First path segment of `path` below `dir`, if `path` is a strict descendant
pub fn child_segment<'p>(path: &'p str, dir: &str) -> Option<&'p str> {
    let rest = if dir == ROOT {
        path.strip_prefix('/')?
    } else {
        path.strip_prefix(dir)?.strip_prefix('/')?
    };
    rest.split('/').next().filter(|segment| !segment.is_empty())
}

/// Last segment of a normalized path (`/` for root)
pub fn base_name(virtual_path: &str) -> &str {
    match split_path(virtual_path) {
        (_, "") => ROOT,
        (_, name) => name,
    }
}

/// Modification time in whole seconds since the Unix epoch (0 if unavailable)
pub fn unix_seconds(metadata: &Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
