//! Instance loading: read every target file through the driver

use filemap_fs::{NormalizedPath, checksum, io};
use serde_json::Value;

use crate::driver::{Capability, RawRecord};
use crate::error::LoadFailure;
use crate::record::{ENSURE, Ensure, NAME, Record, RecordId};
use crate::session::Session;
use crate::{Error, Result};

impl Session {
    /// Check that the driver can enumerate and parse files.
    pub fn validate_driver(&self) -> Result<()> {
        for capability in Capability::REQUIRED_FOR_LOAD {
            if !self.driver.supports(capability) {
                return Err(Error::Schema {
                    driver: self.driver.name().to_string(),
                    capability,
                });
            }
        }
        Ok(())
    }

    /// Load every record from the driver's target files.
    ///
    /// Replaces the session's records: files are visited in target order
    /// and records keep their in-file order. A driver missing a required
    /// capability fails before any file is touched. The first read or
    /// parse failure aborts the load and discards everything loaded so
    /// far. Either way the sticky failed flag is set.
    pub fn load_all(&mut self) -> Result<Vec<RecordId>> {
        self.records.clear();
        self.registry.reset();

        match self.validate_driver().and_then(|()| self.load_targets()) {
            Ok(ids) => {
                tracing::info!(
                    driver = self.driver.name(),
                    records = ids.len(),
                    files = self.registry.len(),
                    "Loaded records"
                );
                Ok(ids)
            }
            Err(e) => {
                tracing::warn!(driver = self.driver.name(), error = %e, "Load failed");
                self.failed = true;
                self.records.clear();
                Err(e)
            }
        }
    }

    fn load_targets(&mut self) -> Result<Vec<RecordId>> {
        let targets = self
            .driver
            .target_files()
            .map_err(|source| Error::Enumerate {
                driver: self.driver.name().to_string(),
                source,
            })?;

        for path in &targets {
            self.registry.register(path, None);
        }

        let mut ids = Vec::new();
        for path in &targets {
            let records = self
                .load_file(path)
                .map_err(|source| Error::Load {
                    path: path.clone(),
                    source,
                })?;
            for record in records {
                ids.push(self.push(record));
            }
        }
        Ok(ids)
    }

    /// Read and parse one file. A missing file reads as empty content.
    fn load_file(&mut self, path: &NormalizedPath) -> std::result::Result<Vec<Record>, LoadFailure> {
        let content = io::read_text_optional(path).map_err(LoadFailure::Read)?;
        let checksum = content.as_deref().map(checksum::compute_content_checksum);
        let content = content.unwrap_or_default();
        tracing::debug!(path = %path, bytes = content.len(), "Read file");

        self.registry.register(path, checksum);

        let raw = self
            .driver
            .parse_file(path, &content)
            .map_err(LoadFailure::Parse)?;

        raw.into_iter()
            .enumerate()
            .map(|(index, properties)| self.instantiate(path, index, properties))
            .collect()
    }

    fn instantiate(
        &self,
        path: &NormalizedPath,
        index: usize,
        properties: RawRecord,
    ) -> std::result::Result<Record, LoadFailure> {
        let name = match properties.get(NAME) {
            Some(Value::String(name)) => name.clone(),
            _ => return Err(LoadFailure::MissingName { index }),
        };

        if let Some(value) = properties.get(ENSURE) {
            if Ensure::from_value(value).is_none() {
                return Err(LoadFailure::InvalidEnsure {
                    name,
                    value: value.clone(),
                });
            }
        }

        Ok(Record::loaded(
            name,
            self.driver.name(),
            path.clone(),
            properties,
        ))
    }
}
