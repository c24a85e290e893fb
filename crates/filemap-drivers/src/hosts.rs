//! hosts(5) driver
//!
//! ```text
//! 127.0.0.1	localhost
//! 10.0.0.1	web.internal	web www	# frontend
//! ```
//!
//! Lines are `ip canonical [aliases...] [# comment]`. Whole-line comments
//! and blank lines are not records and do not survive a rewrite.

use std::sync::LazyLock;

use filemap_core::{
    Capability, DriverError, DriverResult, FormatDriver, PropertyMap, RawRecord, Record,
};
use filemap_fs::NormalizedPath;
use regex::Regex;
use serde_json::Value;

use crate::targets::{TARGET, select_target};

/// Splits a host line into its fields and an optional trailing comment
static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<fields>[^#]*?)\s*(?:#\s*(?P<comment>.*?))?\s*$").unwrap()
});

const SYSTEM_HOSTS: &str = "/etc/hosts";

const CAPABILITIES: [Capability; 3] = [
    Capability::TargetFiles,
    Capability::ParseFile,
    Capability::Serialize,
];

/// Driver for host entries in one or more hosts files.
#[derive(Debug, Clone)]
pub struct HostsDriver {
    targets: Vec<NormalizedPath>,
}

impl HostsDriver {
    pub fn new(targets: impl IntoIterator<Item = NormalizedPath>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
        }
    }

    /// Driver over `/etc/hosts`.
    pub fn system() -> Self {
        Self::new([NormalizedPath::new(SYSTEM_HOSTS)])
    }

    fn parse_line(
        path: &NormalizedPath,
        line_number: usize,
        line: &str,
    ) -> DriverResult<Option<RawRecord>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let caps = LINE_PATTERN
            .captures(line)
            .ok_or_else(|| DriverError::parse(line_number, "unreadable host line"))?;
        let mut fields = caps["fields"].split_whitespace();
        let (Some(ip), Some(canonical)) = (fields.next(), fields.next()) else {
            return Err(DriverError::parse(
                line_number,
                format!("expected `ip hostname`, got `{trimmed}`"),
            ));
        };
        let aliases: Vec<Value> = fields.map(|alias| Value::String(alias.into())).collect();

        let mut record = PropertyMap::new();
        record.insert("name".into(), Value::String(canonical.into()));
        record.insert("ip".into(), Value::String(ip.into()));
        if !aliases.is_empty() {
            record.insert("host_aliases".into(), Value::Array(aliases));
        }
        if let Some(comment) = caps.name("comment").map(|m| m.as_str()) {
            if !comment.is_empty() {
                record.insert("comment".into(), Value::String(comment.into()));
            }
        }
        record.insert(TARGET.into(), Value::String(path.as_str().into()));
        record.insert("ensure".into(), Value::String("present".into()));
        Ok(Some(record))
    }

    fn render_record(record: &Record) -> DriverResult<String> {
        let ip = record.get_str("ip").ok_or_else(|| {
            DriverError::serialize(format!("host `{}` has no ip", record.name()))
        })?;

        let mut line = format!("{ip}\t{}", record.name());

        let aliases = match record.get("host_aliases") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().ok_or_else(|| {
                        DriverError::serialize(format!(
                            "host `{}` has a non-string alias: {item}",
                            record.name()
                        ))
                    })
                })
                .collect::<DriverResult<Vec<_>>>()?
                .join(" "),
            Some(Value::String(s)) => s.split_whitespace().collect::<Vec<_>>().join(" "),
            None | Some(Value::Null) => String::new(),
            Some(other) => {
                return Err(DriverError::serialize(format!(
                    "host `{}` has invalid aliases: {other}",
                    record.name()
                )));
            }
        };
        if !aliases.is_empty() {
            line.push('\t');
            line.push_str(&aliases);
        }

        if let Some(comment) = record.get_str("comment").filter(|c| !c.is_empty()) {
            line.push_str("\t# ");
            line.push_str(comment);
        }

        line.push('\n');
        Ok(line)
    }
}

impl FormatDriver for HostsDriver {
    fn name(&self) -> &str {
        "hosts"
    }

    fn capabilities(&self) -> &[Capability] {
        &CAPABILITIES
    }

    fn target_files(&self) -> DriverResult<Vec<NormalizedPath>> {
        Ok(self.targets.clone())
    }

    fn parse_file(&self, path: &NormalizedPath, content: &str) -> DriverResult<Vec<RawRecord>> {
        let mut records = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if let Some(record) = Self::parse_line(path, i + 1, line)? {
                records.push(record);
            }
        }
        tracing::debug!(path = %path, hosts = records.len(), "Parsed hosts file");
        Ok(records)
    }

    fn serialize(&self, _path: &NormalizedPath, records: &[&Record]) -> DriverResult<String> {
        records
            .iter()
            .filter(|record| record.exists())
            .map(|record| Self::render_record(record))
            .collect()
    }

    fn select_file(&self, properties: &PropertyMap) -> NormalizedPath {
        select_target(&self.targets, properties, SYSTEM_HOSTS)
    }
}
