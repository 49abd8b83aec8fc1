use std::io;
use thiserror::Error;

/// Result type for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Unified error type for all vault operations
#[derive(Debug, Error)]
pub enum VaultError {
    // Configuration errors
    #[error("'{0}' is an invalid {1} name: try to set a valid {1} name manually")]
    InvalidIdentifier(String, &'static str),

    #[error("Source directory not found: {0}")]
    MissingSource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Build errors
    #[error("Failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Duplicate virtual path in archive: {0}")]
    PathCollision(String),

    #[error("Path error: {0}")]
    InvalidPath(String),

    // Lookup errors
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Seek: invalid offset")]
    InvalidOffset { position: u64 },

    #[error("Is a directory: {0}")]
    IsDirectory(String),

    #[error("Not a directory: {0}")]
    NotDirectory(String),

    #[error("End of directory listing")]
    EndOfListing,

    // Integrity errors
    #[error("CRC mismatch for {path}: expected {expected:08x}, got {actual:08x}")]
    CrcMismatch {
        path: String,
        expected: u32,
        actual: u32,
    },

    #[error("Size mismatch for {path}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("Invalid blob literal: {0}")]
    InvalidLiteral(String),

    #[error("Corrupted archive: {0}")]
    Corrupted(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<toml::de::Error> for VaultError {
    fn from(err: toml::de::Error) -> Self {
        VaultError::Config(err.to_string())
    }
}

impl From<VaultError> for io::Error {
    fn from(err: VaultError) -> io::Error {
        let kind = match &err {
            VaultError::Io(inner) => inner.kind(),
            VaultError::NotFound(_) => io::ErrorKind::NotFound,
            VaultError::InvalidOffset { .. }
            | VaultError::IsDirectory(_)
            | VaultError::NotDirectory(_) => io::ErrorKind::InvalidInput,
            VaultError::CrcMismatch { .. }
            | VaultError::SizeMismatch { .. }
            | VaultError::InvalidLiteral(_)
            | VaultError::Corrupted(_) => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

impl VaultError {
    /// Borrow the `VaultError` carried inside an `io::Error` produced by a handle
    pub fn wrapped(err: &io::Error) -> Option<&VaultError> {
        err.get_ref().and_then(|inner| inner.downcast_ref::<VaultError>())
    }

    /// Unwrap an `io::Error` back into the `VaultError` it carries, if any
    pub fn from_io(err: io::Error) -> VaultError {
        if !err.get_ref().is_some_and(|inner| inner.is::<VaultError>()) {
            return VaultError::Io(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<VaultError>()) {
            Some(Ok(inner)) => *inner,
            _ => VaultError::Internal("wrapped error lost while unwrapping".to_string()),
        }
    }

    /// True for the recoverable lookup-miss case
    pub fn is_not_found(&self) -> bool {
        matches!(self, VaultError::NotFound(_))
    }
}
