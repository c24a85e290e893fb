//! Resource schema and the accessor table derived from it

use std::collections::HashMap;

use filemap_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};

use crate::record::{ENSURE, NAME};
use crate::{Error, Result};

/// Property and parameter names of a resource kind.
///
/// Loadable from TOML, JSON or YAML:
///
/// ```toml
/// properties = ["ip", "host_aliases", "comment"]
/// parameters = ["target"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
}

impl Schema {
    pub fn new<P, Q>(properties: P, parameters: Q) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        Q: IntoIterator,
        Q::Item: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(Into::into).collect(),
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a schema file; format is chosen by extension.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        Ok(ConfigStore::new().load(path)?)
    }

    /// Every attribute name: `name`, `ensure`, then properties and
    /// parameters in declaration order with duplicates dropped.
    pub fn attributes(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        let all = [NAME, ENSURE]
            .into_iter()
            .chain(self.properties.iter().map(String::as_str))
            .chain(self.parameters.iter().map(String::as_str));
        for attribute in all {
            if !seen.contains(&attribute) {
                seen.push(attribute);
            }
        }
        seen
    }
}

/// Accessor generated for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    pub name: String,
    /// `false` only for the identity attribute.
    pub settable: bool,
}

/// Lookup table of accessors, built once per session from a [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct AccessorTable {
    accessors: Vec<Accessor>,
    index: HashMap<String, usize>,
}

impl AccessorTable {
    pub fn from_schema(schema: &Schema) -> Self {
        let accessors: Vec<Accessor> = schema
            .attributes()
            .into_iter()
            .map(|name| Accessor {
                name: name.to_string(),
                settable: name != NAME,
            })
            .collect();

        let index = accessors
            .iter()
            .enumerate()
            .map(|(i, accessor)| (accessor.name.clone(), i))
            .collect();

        Self { accessors, index }
    }

    pub fn get(&self, property: &str) -> Option<&Accessor> {
        self.index.get(property).map(|&i| &self.accessors[i])
    }

    /// Accessor for reading `property`.
    pub fn reader(&self, property: &str) -> Result<&Accessor> {
        self.get(property).ok_or_else(|| Error::UnknownProperty {
            property: property.to_string(),
        })
    }

    /// Accessor for writing `property`; the identity attribute is refused.
    pub fn writer(&self, property: &str) -> Result<&Accessor> {
        let accessor = self.reader(property)?;
        if !accessor.settable {
            return Err(Error::ImmutableProperty {
                property: property.to_string(),
            });
        }
        Ok(accessor)
    }

    /// Attribute names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.accessors.iter().map(|accessor| accessor.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}
