//! Error types for filemap-core

use filemap_fs::NormalizedPath;

use crate::driver::{Capability, DriverError};
use crate::record::RecordId;

/// Result type for filemap-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in filemap-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The format driver lacks a capability the loader requires.
    /// Raised before any file is opened.
    #[error("Format driver `{driver}` has not implemented `{capability}`")]
    Schema {
        driver: String,
        capability: Capability,
    },

    /// The driver could not enumerate its target files
    #[error("Format driver `{driver}` failed to list target files: {source}")]
    Enumerate {
        driver: String,
        #[source]
        source: DriverError,
    },

    /// Reading or parsing one target file failed
    #[error("Failed to load {path}: {source}")]
    Load {
        path: NormalizedPath,
        #[source]
        source: LoadFailure,
    },

    /// Serializing or writing one dirty file failed
    #[error("Failed to flush {path}: {source}")]
    Flush {
        path: NormalizedPath,
        #[source]
        source: FlushFailure,
    },

    #[error("Unknown property `{property}`")]
    UnknownProperty { property: String },

    #[error("Property `{property}` identifies the record and cannot be changed")]
    ImmutableProperty { property: String },

    #[error("Invalid ensure value {value}, expected \"present\" or \"absent\"")]
    InvalidEnsure { value: serde_json::Value },

    /// A write reached a record that stands in for an unmatched resource
    #[error("Record `{name}` does not exist yet and must be created first")]
    PendingRecord { name: String },

    #[error("No record with id {id}")]
    UnknownRecord { id: RecordId },

    /// Filesystem or configuration error from filemap-fs
    #[error(transparent)]
    Fs(#[from] filemap_fs::Error),
}

impl Error {
    /// Whether this error came out of loading (enumerating, reading or
    /// parsing) as opposed to flushing or API misuse.
    pub fn is_load_error(&self) -> bool {
        matches!(self, Self::Enumerate { .. } | Self::Load { .. })
    }

    /// The file this error refers to, if any.
    pub fn path(&self) -> Option<&NormalizedPath> {
        match self {
            Self::Load { path, .. } | Self::Flush { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Why loading a single file failed
#[derive(Debug, thiserror::Error)]
pub enum LoadFailure {
    #[error("read failed: {0}")]
    Read(#[source] filemap_fs::Error),

    #[error("parse failed: {0}")]
    Parse(#[source] DriverError),

    #[error("record {index} has no string `name`")]
    MissingName { index: usize },

    #[error("record `{name}` has invalid ensure value {value}")]
    InvalidEnsure {
        name: String,
        value: serde_json::Value,
    },
}

/// Why flushing a single file failed
#[derive(Debug, thiserror::Error)]
pub enum FlushFailure {
    #[error("serialize failed: {0}")]
    Serialize(#[source] DriverError),

    #[error("write failed: {0}")]
    Write(#[source] filemap_fs::Error),
}
