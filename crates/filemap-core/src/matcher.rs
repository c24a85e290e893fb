//! Matching desired resources to loaded records (prefetch)

use std::collections::HashMap;

use crate::record::RecordId;
use crate::resource::DesiredResource;
use crate::session::Session;
use crate::Result;

impl Session {
    /// Load all records and bind each desired resource to the record with
    /// the same name.
    ///
    /// When several loaded records share a name the last one wins.
    /// Resources with no match stay unbound; the caller treats them as
    /// absent, to be created.
    pub fn prefetch<R>(&mut self, resources: &mut HashMap<String, R>) -> Result<()>
    where
        R: DesiredResource,
    {
        let loaded = self.load_all()?;
        let index = self.name_index(loaded);

        let mut matched = 0;
        for (name, resource) in resources.iter_mut() {
            if let Some(&id) = index.get(name.as_str()) {
                resource.set_provider(id);
                matched += 1;
            }
        }

        tracing::debug!(
            desired = resources.len(),
            matched,
            "Matched desired resources"
        );
        Ok(())
    }

    /// Name → record, later records overwriting earlier ones.
    pub(crate) fn name_index(&self, ids: Vec<RecordId>) -> HashMap<String, RecordId> {
        let mut index = HashMap::with_capacity(ids.len());
        for id in ids {
            let record = &self.records[id.0];
            if let Some(shadowed) = index.insert(record.name().to_string(), id) {
                tracing::debug!(
                    name = record.name(),
                    kept = %id,
                    shadowed = %shadowed,
                    "Duplicate record name"
                );
            }
        }
        index
    }
}
