//! Format driver capability set
//!
//! A driver knows one file format: which files back a resource kind, how to
//! turn a file's content into raw records, how to render records back, and
//! which file a newly created record belongs to. The engine never looks
//! inside the content itself.

use std::fmt;

use filemap_fs::NormalizedPath;

use crate::record::{PropertyMap, Record};

/// Result type for driver callbacks
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// One parsed record, keyed by property name.
///
/// Must carry a string `name`; an `ensure` entry, if present, must be
/// `"present"` or `"absent"`.
pub type RawRecord = PropertyMap;

/// Optional driver operations the engine checks for before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// [`FormatDriver::target_files`]
    TargetFiles,
    /// [`FormatDriver::parse_file`]
    ParseFile,
    /// [`FormatDriver::serialize`]
    Serialize,
}

impl Capability {
    /// Capabilities that must be present before anything is loaded.
    pub const REQUIRED_FOR_LOAD: [Capability; 2] = [Capability::TargetFiles, Capability::ParseFile];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TargetFiles => "target_files",
            Self::ParseFile => "parse_file",
            Self::Serialize => "serialize",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by driver callbacks
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("capability `{capability}` is not implemented")]
    Unsupported { capability: Capability },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("{message}")]
    Serialize { message: String },

    #[error("{message}")]
    Invalid { message: String },
}

impl DriverError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn serialize(message: impl Into<String>) -> Self {
        Self::Serialize {
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Handler for one flat-file format.
///
/// Drivers implement the capabilities they support and declare them in
/// [`capabilities`](FormatDriver::capabilities). Undeclared operations keep
/// their default body, which reports [`DriverError::Unsupported`].
pub trait FormatDriver: Send + Sync {
    /// Provider name, stamped on every record this driver loads.
    fn name(&self) -> &str;

    /// Capabilities this driver implements.
    fn capabilities(&self) -> &[Capability] {
        &[
            Capability::TargetFiles,
            Capability::ParseFile,
            Capability::Serialize,
        ]
    }

    /// Check whether a capability is declared.
    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Files backing this resource kind, in load order.
    fn target_files(&self) -> DriverResult<Vec<NormalizedPath>> {
        Err(DriverError::Unsupported {
            capability: Capability::TargetFiles,
        })
    }

    /// Parse one file's content into zero or more raw records, in file order.
    ///
    /// A file that does not exist is passed in as empty content.
    fn parse_file(&self, path: &NormalizedPath, content: &str) -> DriverResult<Vec<RawRecord>> {
        let _ = (path, content);
        Err(DriverError::Unsupported {
            capability: Capability::ParseFile,
        })
    }

    /// Render every record attributed to `path` back to file content.
    ///
    /// `records` includes destroyed records; drivers are expected to leave
    /// out any record whose [`Record::exists`] is false.
    fn serialize(&self, path: &NormalizedPath, records: &[&Record]) -> DriverResult<String> {
        let _ = (path, records);
        Err(DriverError::Unsupported {
            capability: Capability::Serialize,
        })
    }

    /// The file a newly created record with these properties belongs to.
    fn select_file(&self, properties: &PropertyMap) -> NormalizedPath;
}
