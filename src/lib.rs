//! vault-rs: embed a directory of assets into a Rust program
//!
//! At build time a source tree is walked, every file is compressed on its
//! own and the payloads are concatenated into one blob with a byte-offset
//! index. At run time the blob is served through a read-only virtual
//! filesystem with seekable file handles and synthesized directory listings.
//! During development a debug loader serves the same paths straight from
//! disk.
//!
//! # Example
//!
//! ```no_run
//! use std::io::Read;
//! use vault_rs::{Archive, AssetLoader, CompressionLevel, WalkConfig};
//!
//! let config = WalkConfig { recurse: true, ..WalkConfig::default() };
//! let archive = Archive::build("assets", &config, CompressionLevel::BEST)?;
//!
//! let fs = archive.fs();
//! let mut file = fs.open("/css/site.css")?;
//! let mut css = String::new();
//! file.read_to_string(&mut css)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Generated code goes through [`generator::Generator`]; see the
//! `vault-cli` binary. The generated units pick their loader with the
//! `vault_debug` cfg flag, which consuming crates declare in `Cargo.toml`:
//!
//! ```toml
//! [lints.rust]
//! unexpected_cfgs = { level = "warn", check-cfg = ['cfg(vault_debug)'] }
//! ```

pub mod archive;
pub mod error;
pub mod generator;
pub mod vfs;
pub mod walker;

pub use archive::{
    encode_tree, normalize_path, Archive, ArchiveWriter, AssetIndex, AssetRecord, BlobEncoding,
    CompressionLevel, EncodedArchive,
};
pub use error::{Result, VaultError};
pub use generator::{GenerationSummary, Generator, GeneratorConfig, VaultManifest};
pub use vfs::{AssetLoader, DebugFs, DirHandle, DiskFile, EmbeddedFs, FileHandle, FileInfo, Handle};
pub use walker::{Filter, WalkConfig, Walker};

/// Lazy cell used by generated release units for their index
pub use once_cell::sync::Lazy;
