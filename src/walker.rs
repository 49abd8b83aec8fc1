//! Source tree traversal and include/exclude filtering

use crate::error::{Result, VaultError};
use regex::Regex;
use serde::Deserialize;
use std::fs::{self, Metadata};
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{sync_channel, Receiver};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Capacity of the walker → encoder handoff queue
pub const WALK_QUEUE_CAPACITY: usize = 10;

/// Traversal options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Descend into subdirectories
    pub recurse: bool,
    /// Unanchored regular expressions; when non-empty a path must match one
    pub include: Vec<String>,
    /// Unanchored regular expressions; a matching path is skipped
    pub exclude: Vec<String>,
    /// Apply the filter to directories as well, pruning rejected subtrees
    pub filter_dirs: bool,
}

/// Ordered list of compiled patterns
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compile `patterns`; a pattern that fails to compile is logged and left out
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern.as_ref()) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!(pattern = pattern.as_ref(), error = %e, "ignoring invalid pattern");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.patterns.iter().any(|regex| regex.is_match(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

/// Include/exclude policy evaluated against virtual paths
#[derive(Debug, Clone, Default)]
pub struct Filter {
    include: PatternSet,
    exclude: PatternSet,
    has_include: bool,
}

impl Filter {
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Self {
        Self {
            include: PatternSet::new(include),
            exclude: PatternSet::new(exclude),
            // A configured include list stays restrictive even if none of its
            // patterns compiled.
            has_include: !include.is_empty(),
        }
    }

    pub fn accepts(&self, virtual_path: &str) -> bool {
        if self.has_include && !self.include.is_match(virtual_path) {
            return false;
        }
        !self.exclude.is_match(virtual_path)
    }
}

/// One file produced by the walker
#[derive(Debug, Clone)]
pub struct FileItem {
    /// Normalized path inside the archive (`/dir/file`)
    pub virtual_path: String,
    pub absolute_path: PathBuf,
    pub metadata: Metadata,
}

/// Lazy depth-first traversal yielding the files that pass the filter
///
/// Entries of each directory are visited in file-name order so repeated
/// walks over an unchanged tree produce the same sequence.
pub struct Walker {
    root: PathBuf,
    entries: walkdir::IntoIter,
    filter: Filter,
    filter_dirs: bool,
    recurse: bool,
}

impl Walker {
    pub fn new<P: AsRef<Path>>(root: P, config: &WalkConfig) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let metadata = fs::metadata(&root)
            .map_err(|e| VaultError::MissingSource(format!("{}: {}", root.display(), e)))?;
        if !metadata.is_dir() {
            return Err(VaultError::MissingSource(format!(
                "{}: not a directory",
                root.display()
            )));
        }

        let mut walk = WalkDir::new(&root).follow_links(true).sort_by_file_name();
        if !config.recurse {
            walk = walk.max_depth(1);
        }

        Ok(Self {
            root,
            entries: walk.into_iter(),
            filter: Filter::new(&config.include, &config.exclude),
            filter_dirs: config.filter_dirs,
            recurse: config.recurse,
        })
    }

    /// Move the walk onto its own thread, feeding a bounded queue
    ///
    /// The first error is forwarded and ends the walk. If the receiver is
    /// dropped the thread stops at its next send.
    pub fn spawn(self) -> Result<(Receiver<Result<FileItem>>, JoinHandle<()>)> {
        let (tx, rx) = sync_channel(WALK_QUEUE_CAPACITY);
        let handle = thread::Builder::new()
            .name("vault-walker".to_string())
            .spawn(move || {
                for item in self {
                    let failed = item.is_err();
                    if tx.send(item).is_err() || failed {
                        return;
                    }
                }
            })?;
        Ok((rx, handle))
    }

    fn virtual_path(&self, path: &Path) -> Result<String> {
        let relative = path.strip_prefix(&self.root).map_err(|_| {
            VaultError::InvalidPath(format!("{} is outside the source root", path.display()))
        })?;

        let mut virtual_path = String::new();
        for component in relative.components() {
            if let Component::Normal(part) = component {
                let part = part.to_str().ok_or_else(|| {
                    VaultError::InvalidPath(format!("Invalid UTF-8 in path: {}", path.display()))
                })?;
                virtual_path.push('/');
                virtual_path.push_str(part);
            }
        }
        Ok(virtual_path)
    }
}

impl Iterator for Walker {
    type Item = Result<FileItem>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };

            // The root itself is never yielded
            if entry.depth() == 0 {
                continue;
            }

            let virtual_path = match self.virtual_path(entry.path()) {
                Ok(path) => path,
                Err(e) => return Some(Err(e)),
            };

            // Directories only steer the walk; a rejected one is pruned whole
            if entry.file_type().is_dir() {
                if !self.recurse {
                    debug!(path = %virtual_path, "skipping directory");
                } else if self.filter_dirs && !self.filter.accepts(&virtual_path) {
                    debug!(path = %virtual_path, "pruning directory");
                    self.entries.skip_current_dir();
                }
                continue;
            }

            if !self.filter.accepts(&virtual_path) {
                debug!(path = %virtual_path, "skipping file");
                continue;
            }

            return Some(match entry.metadata() {
                Ok(metadata) => Ok(FileItem {
                    virtual_path,
                    absolute_path: entry.into_path(),
                    metadata,
                }),
                Err(e) => Err(e.into()),
            });
        }
    }
}
