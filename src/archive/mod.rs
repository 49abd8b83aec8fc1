mod format;
pub mod literal;
mod writer;

pub use format::{
    base_name, child_segment, is_within, join_path, normalize_path, split_path, unix_seconds,
    AssetIndex, AssetRecord, CompressionLevel, ROOT,
};
pub use literal::{BlobEncoding, LiteralWriter};
pub use writer::{ArchiveWriter, EncodedArchive};

use crate::error::{Result, VaultError};
use crate::vfs::EmbeddedFs;
use crate::walker::{WalkConfig, Walker};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Walk `root` and feed every accepted file through `writer`
///
/// The walker runs on its own thread behind a bounded queue; files are
/// compressed one at a time on the calling thread in the order they arrive.
/// The first walk or encode error aborts the whole pass.
pub fn encode_tree<W: Write>(
    root: &Path,
    config: &WalkConfig,
    mut writer: ArchiveWriter<W>,
) -> Result<EncodedArchive<W>> {
    let walker = Walker::new(root, config)?;
    let (rx, handle) = walker.spawn()?;

    let mut outcome = Ok(());
    for item in rx.iter() {
        if let Err(e) = item.and_then(|item| writer.add_item(&item).map(|_| ())) {
            outcome = Err(e);
            break;
        }
    }
    // Unblocks the walker if it is waiting on a full queue
    drop(rx);
    handle
        .join()
        .map_err(|_| VaultError::Internal("walker thread panicked".to_string()))?;
    outcome?;

    writer.finalize()
}

/// In-memory archive: blob and index owned together
#[derive(Debug, Clone)]
pub struct Archive {
    index: AssetIndex,
    blob: Vec<u8>,
    digest: String,
}

impl Archive {
    /// Walk and encode a source tree into memory
    pub fn build<P: AsRef<Path>>(
        root: P,
        config: &WalkConfig,
        level: CompressionLevel,
    ) -> Result<Self> {
        let root = root.as_ref();
        info!(root = %root.display(), "building archive");
        let encoded = encode_tree(root, config, ArchiveWriter::new(Vec::new(), level))?;
        info!(
            files = encoded.index.len(),
            blob_bytes = encoded.sink.len(),
            "archive built"
        );
        Ok(Self::from(encoded))
    }

    /// Borrow the archive as a read-only filesystem
    pub fn fs(&self) -> EmbeddedFs<'_> {
        EmbeddedFs::new(&self.index, &self.blob)
    }

    pub fn index(&self) -> &AssetIndex {
        &self.index
    }

    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    /// Hex SHA-256 of the blob
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl From<EncodedArchive<Vec<u8>>> for Archive {
    fn from(encoded: EncodedArchive<Vec<u8>>) -> Self {
        Self {
            index: encoded.index,
            blob: encoded.sink,
            digest: encoded.digest,
        }
    }
}
