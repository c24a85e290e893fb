//! Flat-file record synchronization engine
//!
//! Reconciles desired resources against records stored in one or more
//! backing flat files. A [`FormatDriver`] supplies the file format; the
//! engine supplies loading, name matching, per-file dirty tracking and
//! minimal write-back.
//!
//! A run goes through a [`Session`]:
//!
//! ```text
//! prefetch ─► load_all ─► (create | set | destroy)* ─► flush
//! ```
//!
//! Every mutation marks the owning file dirty; `flush` rewrites dirty
//! files only, so a run that changes nothing performs zero writes.

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod record;
pub mod registry;
pub mod resource;
pub mod schema;
pub mod session;

mod flush;
mod loader;
mod matcher;

pub use config::SessionConfig;
pub use driver::{Capability, DriverError, DriverResult, FormatDriver, RawRecord};
pub use error::{Error, FlushFailure, LoadFailure, Result};
pub use flush::FlushReport;
pub use record::{Ensure, PropertyMap, Record, RecordId};
pub use registry::{FileEntry, FileRegistry};
pub use resource::{DesiredResource, Resource};
pub use schema::{Accessor, AccessorTable, Schema};
pub use session::{RecordMut, Session};
