//! [`LineDriver`]: a minimal `name key=value ...` format for engine tests.
//!
//! ```text
//! # comments and blank lines are skipped
//! web ip=10.0.0.1 port=80
//! db ip=10.0.0.2
//! ```
//!
//! Every parsed record is `ensure=present`. Serialization writes existing
//! records only, keys in sorted order, one record per line.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use filemap_core::{
    Capability, DriverError, DriverResult, FormatDriver, PropertyMap, RawRecord, Record,
};
use filemap_fs::NormalizedPath;
use serde_json::Value;

/// Keys the engine manages that never appear in a line.
const RESERVED: [&str; 3] = ["name", "ensure", "target"];

/// Call counters shared between a test and the driver it moved into a
/// session.
#[derive(Debug, Clone, Default)]
pub struct DriverProbe {
    target_calls: Arc<AtomicUsize>,
    parse_calls: Arc<AtomicUsize>,
    serialize_calls: Arc<AtomicUsize>,
}

impl DriverProbe {
    pub fn target_calls(&self) -> usize {
        self.target_calls.load(Ordering::SeqCst)
    }

    pub fn parse_calls(&self) -> usize {
        self.parse_calls.load(Ordering::SeqCst)
    }

    pub fn serialize_calls(&self) -> usize {
        self.serialize_calls.load(Ordering::SeqCst)
    }
}

/// Scripted format driver with configurable capabilities and failures.
#[derive(Debug, Clone)]
pub struct LineDriver {
    targets: Vec<NormalizedPath>,
    capabilities: Vec<Capability>,
    failing_parse: Vec<NormalizedPath>,
    failing_serialize: Vec<NormalizedPath>,
    probe: DriverProbe,
}

impl LineDriver {
    pub fn new(targets: impl IntoIterator<Item = NormalizedPath>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            capabilities: vec![
                Capability::TargetFiles,
                Capability::ParseFile,
                Capability::Serialize,
            ],
            failing_parse: Vec::new(),
            failing_serialize: Vec::new(),
            probe: DriverProbe::default(),
        }
    }

    /// Drop a capability from the declared set.
    pub fn without(mut self, capability: Capability) -> Self {
        self.capabilities.retain(|c| *c != capability);
        self
    }

    /// Make `parse_file` fail for `path`.
    pub fn fail_parse(mut self, path: NormalizedPath) -> Self {
        self.failing_parse.push(path);
        self
    }

    /// Make `serialize` fail for `path`.
    pub fn fail_serialize(mut self, path: NormalizedPath) -> Self {
        self.failing_serialize.push(path);
        self
    }

    pub fn probe(&self) -> DriverProbe {
        self.probe.clone()
    }

    fn require(&self, capability: Capability) -> DriverResult<()> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(DriverError::Unsupported { capability })
        }
    }

    fn parse_line(line_number: usize, line: &str) -> DriverResult<Option<RawRecord>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let mut tokens = trimmed.split_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(None);
        };

        let mut record = PropertyMap::new();
        record.insert("name".into(), Value::String(name.into()));
        record.insert("ensure".into(), Value::String("present".into()));

        for token in tokens {
            let (key, value) = token.split_once('=').ok_or_else(|| {
                DriverError::parse(line_number, format!("expected key=value, got `{token}`"))
            })?;
            record.insert(key.into(), Value::String(value.into()));
        }

        Ok(Some(record))
    }

    /// Render records the way `serialize` does.
    pub fn render(records: &[&Record]) -> String {
        let mut out = String::new();
        for record in records.iter().filter(|r| r.exists()) {
            out.push_str(record.name());
            for (key, value) in record.properties() {
                if RESERVED.contains(&key.as_str()) {
                    continue;
                }
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out.push_str(&format!(" {key}={value}"));
            }
            out.push('\n');
        }
        out
    }
}

impl FormatDriver for LineDriver {
    fn name(&self) -> &str {
        "line"
    }

    fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    fn target_files(&self) -> DriverResult<Vec<NormalizedPath>> {
        self.probe.target_calls.fetch_add(1, Ordering::SeqCst);
        self.require(Capability::TargetFiles)?;
        Ok(self.targets.clone())
    }

    fn parse_file(&self, path: &NormalizedPath, content: &str) -> DriverResult<Vec<RawRecord>> {
        self.probe.parse_calls.fetch_add(1, Ordering::SeqCst);
        self.require(Capability::ParseFile)?;
        if self.failing_parse.contains(path) {
            return Err(DriverError::parse(0, "injected parse failure"));
        }

        let mut records = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if let Some(record) = Self::parse_line(i + 1, line)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn serialize(&self, path: &NormalizedPath, records: &[&Record]) -> DriverResult<String> {
        self.probe.serialize_calls.fetch_add(1, Ordering::SeqCst);
        self.require(Capability::Serialize)?;
        if self.failing_serialize.contains(path) {
            return Err(DriverError::serialize("injected serialize failure"));
        }
        Ok(Self::render(records))
    }

    fn select_file(&self, properties: &PropertyMap) -> NormalizedPath {
        properties
            .get("target")
            .and_then(Value::as_str)
            .map(NormalizedPath::new)
            .or_else(|| self.targets.first().cloned())
            .unwrap_or_else(|| NormalizedPath::new("records"))
    }
}
