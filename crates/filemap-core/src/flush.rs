//! Writing dirty files back

use filemap_fs::{NormalizedPath, checksum, io};
use serde::Serialize;

use crate::driver::{Capability, DriverError};
use crate::error::FlushFailure;
use crate::record::Record;
use crate::session::Session;
use crate::{Error, Result};

/// Outcome of a flush.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    /// Files rewritten on disk.
    pub written: Vec<NormalizedPath>,
    /// Dirty files whose serialized content matched what was on disk.
    pub unchanged: Vec<NormalizedPath>,
    /// Files a dry run would have written.
    pub would_write: Vec<NormalizedPath>,
}

impl FlushReport {
    /// Nothing was (or would have been) written.
    pub fn is_noop(&self) -> bool {
        self.written.is_empty() && self.would_write.is_empty()
    }
}

impl Session {
    /// Rewrite every dirty file; clean files are not even serialized.
    ///
    /// Each dirty file gets all materialized records attributed to it,
    /// destroyed ones included. A driver that does not declare
    /// [`Capability::Serialize`] is never asked to serialize. Stops at the first failing file: files
    /// flushed before it stay flushed and the failing file stays dirty.
    pub fn flush(&mut self) -> Result<FlushReport> {
        let mut report = FlushReport::default();

        for path in self.registry.dirty_paths() {
            if !self.driver.supports(Capability::Serialize) {
                return Err(Error::Flush {
                    path,
                    source: FlushFailure::Serialize(DriverError::Unsupported {
                        capability: Capability::Serialize,
                    }),
                });
            }

            let content = {
                let records: Vec<&Record> = self
                    .records
                    .iter()
                    .filter(|record| !record.is_pending() && record.file() == &path)
                    .collect();
                self.driver
                    .serialize(&path, &records)
                    .map_err(|source| Error::Flush {
                        path: path.clone(),
                        source: FlushFailure::Serialize(source),
                    })?
            };

            if self.config.dry_run {
                tracing::info!(path = %path, "[dry-run] Would write file");
                report.would_write.push(path);
                continue;
            }

            let new_checksum = checksum::compute_content_checksum(&content);
            let unchanged = self
                .registry
                .get(&path)
                .and_then(|entry| entry.checksum())
                .is_some_and(|previous| previous == new_checksum);

            if unchanged {
                tracing::debug!(path = %path, "Content unchanged, skipping write");
                report.unchanged.push(path.clone());
            } else {
                io::write_atomic(&path, content.as_bytes(), self.config.robustness()).map_err(
                    |source| Error::Flush {
                        path: path.clone(),
                        source: FlushFailure::Write(source),
                    },
                )?;
                report.written.push(path.clone());
            }

            self.registry.mark_clean(&path, Some(new_checksum));
        }

        tracing::info!(
            written = report.written.len(),
            unchanged = report.unchanged.len(),
            would_write = report.would_write.len(),
            "Flushed"
        );
        Ok(report)
    }
}
