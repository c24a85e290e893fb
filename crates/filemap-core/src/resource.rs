//! Desired resources supplied by the orchestration layer

use serde_json::Value;

use crate::record::{PropertyMap, RecordId};

/// A resource the caller wants to exist (or not) in the backing files.
///
/// The engine reads it and writes only the provider binding slot.
pub trait DesiredResource {
    /// The namevar used to match loaded records.
    fn name(&self) -> &str;

    /// Explicitly requested value of `property`, if any.
    fn should(&self, property: &str) -> Option<&Value>;

    /// Record this resource is bound to.
    fn provider(&self) -> Option<RecordId>;

    fn set_provider(&mut self, record: RecordId);
}

/// Plain desired resource: a name, requested values and a binding slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resource {
    name: String,
    should: PropertyMap,
    provider: Option<RecordId>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            should: PropertyMap::new(),
            provider: None,
        }
    }

    /// Request a value for `property`.
    pub fn with(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.should.insert(property.into(), value.into());
        self
    }
}

impl DesiredResource for Resource {
    fn name(&self) -> &str {
        &self.name
    }

    fn should(&self, property: &str) -> Option<&Value> {
        self.should.get(property)
    }

    fn provider(&self) -> Option<RecordId> {
        self.provider
    }

    fn set_provider(&mut self, record: RecordId) {
        self.provider = Some(record);
    }
}
