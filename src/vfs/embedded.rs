use crate::archive::{normalize_path, AssetIndex};
use crate::error::{Result, VaultError};
use crate::vfs::dir::synthesize;
use crate::vfs::{AssetLoader, FileHandle, Handle};
use tracing::trace;

/// Release-mode loader: files are decoded from a blob held in memory
///
/// The loader only borrows its index and blob, so it is `Copy` and can be
/// handed out freely; every `open` creates an independent handle.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedFs<'a> {
    index: &'a AssetIndex,
    blob: &'a [u8],
}

impl<'a> EmbeddedFs<'a> {
    pub fn new(index: &'a AssetIndex, blob: &'a [u8]) -> Self {
        Self { index, blob }
    }

    /// Open a file, or synthesize a directory listing for `name`
    ///
    /// Lookup is by normalized path: an exact record match wins, otherwise a
    /// path that has records below it opens as a directory.
    pub fn open(self, name: &str) -> Result<Handle<'a>> {
        let path = normalize_path(name);
        if let Some(record) = self.index.get(&path) {
            trace!(path = %path, "opening embedded file");
            return FileHandle::new(record, self.blob).map(Handle::File);
        }
        match synthesize(&path, self.index.records()) {
            Some(dir) => {
                trace!(path = %path, "opening embedded directory");
                Ok(Handle::Dir(dir))
            }
            None => Err(VaultError::NotFound(path)),
        }
    }

    pub fn index(&self) -> &'a AssetIndex {
        self.index
    }

    pub fn blob(&self) -> &'a [u8] {
        self.blob
    }
}

impl AssetLoader for EmbeddedFs<'_> {
    fn open(&self, name: &str) -> Result<Handle<'_>> {
        EmbeddedFs::open(*self, name)
    }
}
