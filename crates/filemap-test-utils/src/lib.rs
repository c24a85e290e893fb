//! Shared test utilities for the filemap workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixture`]: [`FixtureDir`] temporary directory with file helpers
//! - [`line_driver`]: [`LineDriver`], a scripted format driver with
//!   failure injection and call counters

pub mod fixture;
pub mod line_driver;

pub use fixture::FixtureDir;
pub use line_driver::{DriverProbe, LineDriver};
