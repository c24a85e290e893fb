//! Reference format drivers
//!
//! - [`HostsDriver`]: hosts(5) files, one host entry per line
//! - [`TomlTableDriver`]: one top-level TOML table per record

mod hosts;
mod targets;
mod toml_table;

pub use hosts::HostsDriver;
pub use toml_table::TomlTableDriver;
