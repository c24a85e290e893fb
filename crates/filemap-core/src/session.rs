//! One run of the engine for one resource kind
//!
//! A [`Session`] owns everything a run mutates: the file registry, the
//! record arena and the sticky failed flag. Records are addressed by
//! [`RecordId`] and mutated through [`RecordMut`], which routes every write
//! to the owning file's dirty flag.

use serde_json::Value;

use crate::config::SessionConfig;
use crate::driver::FormatDriver;
use crate::flush::FlushReport;
use crate::record::{ENSURE, Ensure, NAME, PropertyMap, Record, RecordId};
use crate::registry::FileRegistry;
use crate::resource::DesiredResource;
use crate::schema::{AccessorTable, Schema};
use crate::{Error, Result};

/// Engine state for one run.
pub struct Session {
    pub(crate) driver: Box<dyn FormatDriver>,
    pub(crate) accessors: AccessorTable,
    pub(crate) config: SessionConfig,
    pub(crate) registry: FileRegistry,
    pub(crate) records: Vec<Record>,
    pub(crate) failed: bool,
}

impl Session {
    /// Create a session with default configuration.
    pub fn new(driver: impl FormatDriver + 'static, schema: &Schema) -> Self {
        Self::with_config(driver, schema, SessionConfig::default())
    }

    pub fn with_config(
        driver: impl FormatDriver + 'static,
        schema: &Schema,
        config: SessionConfig,
    ) -> Self {
        Self {
            driver: Box::new(driver),
            accessors: AccessorTable::from_schema(schema),
            config,
            registry: FileRegistry::new(),
            records: Vec::new(),
            failed: false,
        }
    }

    /// True once any load in this session has failed. Never reset.
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn driver(&self) -> &dyn FormatDriver {
        self.driver.as_ref()
    }

    pub fn accessors(&self) -> &AccessorTable {
        &self.accessors
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    /// All records in arena order (loaded first, then created).
    pub fn records(&self) -> impl Iterator<Item = (RecordId, &Record)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| (RecordId(i), record))
    }

    pub fn record(&self, id: RecordId) -> Result<&Record> {
        self.records.get(id.0).ok_or(Error::UnknownRecord { id })
    }

    /// Mutable handle for one record.
    pub fn record_mut(&mut self, id: RecordId) -> Result<RecordMut<'_>> {
        self.record(id)?;
        Ok(RecordMut { session: self, id })
    }

    /// Read a schema property of a record.
    pub fn get(&self, id: RecordId, property: &str) -> Result<Option<&Value>> {
        self.accessors.reader(property)?;
        Ok(self.record(id)?.get(property))
    }

    /// Stand-in record for a desired resource that matched nothing.
    ///
    /// Its getters answer with the resource's requested values. It is not
    /// serialized and dirties nothing until [`create`](Self::create)
    /// materializes it. The resource is bound to the new record.
    pub fn pending<R>(&mut self, desired: &mut R) -> RecordId
    where
        R: DesiredResource + ?Sized,
    {
        let requested = self.requested_values(desired);
        let file = self.driver.select_file(&requested);
        let record = Record::pending(
            desired.name().to_string(),
            self.driver.name(),
            file,
            requested,
        );
        let id = self.push(record);
        desired.set_provider(id);
        id
    }

    /// Create a record from a desired resource and dirty its file.
    ///
    /// If the resource is already bound to a record (pending or loaded),
    /// that record is populated; otherwise a new one is allocated. Only
    /// explicitly requested values are copied. The record is made present
    /// unless the resource requests an `ensure` of its own.
    ///
    /// A binding whose record now carries another name (left over from an
    /// earlier load) is rejected with [`Error::UnknownRecord`].
    pub fn create<R>(&mut self, desired: &R) -> Result<RecordId>
    where
        R: DesiredResource + ?Sized,
    {
        let mut requested = self.requested_values(desired);
        match requested.get(ENSURE) {
            Some(value) if Ensure::from_value(value).is_none() => {
                return Err(Error::InvalidEnsure {
                    value: value.clone(),
                });
            }
            Some(_) => {}
            None => {
                requested.insert(ENSURE.to_string(), Ensure::Present.into());
            }
        }

        let id = match desired.provider() {
            Some(id) => {
                if self.record(id)?.name() != desired.name() {
                    return Err(Error::UnknownRecord { id });
                }
                id
            }
            None => {
                let file = self.driver.select_file(&requested);
                let record = Record::pending(
                    desired.name().to_string(),
                    self.driver.name(),
                    file,
                    PropertyMap::new(),
                );
                self.push(record)
            }
        };

        let record = &mut self.records[id.0];
        let was_pending = record.take_requested().is_some();
        for (property, value) in requested {
            record.insert(&property, value);
        }
        if was_pending {
            let file = self.driver.select_file(record.properties());
            record.set_file(file);
        }

        let file = record.file().clone();
        tracing::debug!(name = desired.name(), file = %file, "Created record");
        self.registry.mark_dirty(&file);
        Ok(id)
    }

    /// Explicit values for every schema attribute, with `name` set.
    fn requested_values<R>(&self, desired: &R) -> PropertyMap
    where
        R: DesiredResource + ?Sized,
    {
        let mut requested: PropertyMap = self
            .accessors
            .names()
            .filter(|&property| property != NAME)
            .filter_map(|property| {
                desired
                    .should(property)
                    .map(|value| (property.to_string(), value.clone()))
            })
            .collect();
        requested.insert(NAME.to_string(), Value::String(desired.name().to_string()));
        requested
    }

    pub(crate) fn push(&mut self, record: Record) -> RecordId {
        self.records.push(record);
        RecordId(self.records.len() - 1)
    }

    fn set_property(&mut self, id: RecordId, property: &str, value: Value) -> Result<()> {
        self.accessors.writer(property)?;
        if property == ENSURE && Ensure::from_value(&value).is_none() {
            return Err(Error::InvalidEnsure { value });
        }

        let record = self
            .records
            .get_mut(id.0)
            .ok_or(Error::UnknownRecord { id })?;
        if record.is_pending() {
            return Err(Error::PendingRecord {
                name: record.name().to_string(),
            });
        }
        record.insert(property, value);
        let file = record.file().clone();
        self.registry.mark_dirty(&file);
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("driver", &self.driver.name())
            .field("records", &self.records.len())
            .field("files", &self.registry.len())
            .field("failed", &self.failed)
            .finish()
    }
}

/// Mutable access to one record.
///
/// Every setter marks the record's whole file dirty, whichever property
/// changed. A pending record refuses writes until it is created.
pub struct RecordMut<'s> {
    session: &'s mut Session,
    id: RecordId,
}

impl RecordMut<'_> {
    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn record(&self) -> &Record {
        &self.session.records[self.id.0]
    }

    pub fn get(&self, property: &str) -> Result<Option<&Value>> {
        self.session.get(self.id, property)
    }

    pub fn set(&mut self, property: &str, value: impl Into<Value>) -> Result<()> {
        self.session.set_property(self.id, property, value.into())
    }

    pub fn exists(&self) -> bool {
        self.record().exists()
    }

    /// Mark the record absent. It stays in memory; the driver leaves it
    /// out when the file is serialized.
    pub fn destroy(&mut self) -> Result<()> {
        self.session
            .set_property(self.id, ENSURE, Ensure::Absent.into())?;
        tracing::debug!(name = self.record().name(), "Destroyed record");
        Ok(())
    }

    /// Flush the whole session; flushing works per file, not per record.
    pub fn flush(self) -> Result<FlushReport> {
        self.session.flush()
    }
}
