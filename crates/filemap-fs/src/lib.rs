//! File primitives for the filemap record engine
//!
//! Provides normalized paths, atomic locked writes, tolerant reads,
//! content checksums and a format-agnostic configuration store.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use path::NormalizedPath;
