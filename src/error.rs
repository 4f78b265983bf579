use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, TarError>;

/// Unified error type for pack and unpack operations
#[derive(Debug, Error)]
pub enum TarError {
    // Header errors
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Checksum mismatch: expected {expected:o}, got {actual:o}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Failed to parse {field} field: {value:?}")]
    FieldParse { field: &'static str, value: String },

    #[error("Value {value} does not fit the {field} field")]
    FieldOverflow { field: &'static str, value: u64 },

    #[error("Unsupported entry type: {0}")]
    UnsupportedEntry(String),

    // Traversal errors
    #[error("Path too long: {path} ({len} bytes, max {max})")]
    PathTooLong { path: String, len: usize, max: usize },

    #[error("Cannot stat {path}: {source}")]
    Stat {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Directory traversal failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("{path} changed size while being archived: expected {expected} bytes, found {actual}")]
    SizeChanged {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("Path error: {0}")]
    PathError(String),

    // Extraction errors
    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Target already exists: {0}")]
    TargetExists(String),

    // Archive-level errors
    #[error("Archive already exists: {}", .0.display())]
    ArchiveExists(PathBuf),

    #[error("Archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("Created archive is empty")]
    EmptyArchive,

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for TarError {
    fn from(err: toml::de::Error) -> Self {
        TarError::Config(err.to_string())
    }
}

impl From<nix::Error> for TarError {
    fn from(err: nix::Error) -> Self {
        TarError::Io(io::Error::from(err))
    }
}
