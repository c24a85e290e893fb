//! In-memory records

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use filemap_fs::NormalizedPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property name → value
pub type PropertyMap = BTreeMap<String, Value>;

/// The identity property every record carries.
pub const NAME: &str = "name";

/// The `ensure` pseudo-property.
pub const ENSURE: &str = "ensure";

/// Index of a record within its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub(crate) usize);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a record should exist in its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    Present,
    Absent,
}

impl Ensure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }

    /// Interpret a property value, accepting only the two known strings.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(|s| s.parse().ok())
    }
}

impl FromStr for Ensure {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Ensure> for Value {
    fn from(ensure: Ensure) -> Self {
        Value::String(ensure.as_str().to_string())
    }
}

/// One loaded or created record.
///
/// Records are owned by a [`Session`](crate::Session); mutation goes through
/// [`RecordMut`](crate::RecordMut) so that the owning file is marked dirty.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    name: String,
    provider: String,
    file: NormalizedPath,
    properties: PropertyMap,
    /// Requested values of the desired resource this record stands in for,
    /// until `create` materializes it.
    requested: Option<PropertyMap>,
}

impl Record {
    pub(crate) fn loaded(
        name: String,
        provider: &str,
        file: NormalizedPath,
        properties: PropertyMap,
    ) -> Self {
        Self {
            name,
            provider: provider.to_string(),
            file,
            properties,
            requested: None,
        }
    }

    pub(crate) fn pending(
        name: String,
        provider: &str,
        file: NormalizedPath,
        requested: PropertyMap,
    ) -> Self {
        Self {
            name,
            provider: provider.to_string(),
            file,
            properties: PropertyMap::new(),
            requested: Some(requested),
        }
    }

    /// The namevar.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the driver that owns this record.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The file this record is attributed to.
    pub fn file(&self) -> &NormalizedPath {
        &self.file
    }

    /// Property value, falling back to the pending desired resource's
    /// requested value.
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property).or_else(|| {
            self.requested
                .as_ref()
                .and_then(|requested| requested.get(property))
        })
    }

    /// Property value with no fallback.
    pub fn property(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    /// Convenience for string-valued properties.
    pub fn get_str(&self, property: &str) -> Option<&str> {
        self.get(property).and_then(Value::as_str)
    }

    /// All materialized properties, including `name` and `ensure`.
    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn ensure(&self) -> Option<Ensure> {
        self.properties.get(ENSURE).and_then(Ensure::from_value)
    }

    /// True iff `ensure` is set and is `present`.
    pub fn exists(&self) -> bool {
        self.ensure() == Some(Ensure::Present)
    }

    /// Whether this record still waits for `create`.
    pub fn is_pending(&self) -> bool {
        self.requested.is_some()
    }

    pub(crate) fn insert(&mut self, property: &str, value: Value) {
        self.properties.insert(property.to_string(), value);
    }

    pub(crate) fn take_requested(&mut self) -> Option<PropertyMap> {
        self.requested.take()
    }

    pub(crate) fn set_file(&mut self, file: NormalizedPath) {
        self.file = file;
    }
}
