//! Per-file state: dirty flags and load-time checksums
//!
//! The registry is the only mutable per-file state in the engine. Entries
//! are created lazily and never dropped during a run.

use std::collections::BTreeMap;

use filemap_fs::NormalizedPath;

/// State of one backing file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileEntry {
    dirty: bool,
    /// Checksum of the content last read or written, `None` if the file
    /// did not exist.
    checksum: Option<String>,
}

impl FileEntry {
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }
}

/// Mapping of file path to [`FileEntry`].
#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    files: BTreeMap<NormalizedPath, FileEntry>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `path`, created clean on first reference.
    pub fn get_or_create(&mut self, path: &NormalizedPath) -> &mut FileEntry {
        self.files.entry(path.clone()).or_default()
    }

    pub fn get(&self, path: &NormalizedPath) -> Option<&FileEntry> {
        self.files.get(path)
    }

    /// Bind `path` as a freshly read file: clean, with the given checksum.
    pub fn register(&mut self, path: &NormalizedPath, checksum: Option<String>) {
        let entry = self.get_or_create(path);
        entry.dirty = false;
        entry.checksum = checksum;
    }

    pub fn mark_dirty(&mut self, path: &NormalizedPath) {
        let entry = self.get_or_create(path);
        if !entry.dirty {
            tracing::trace!(path = %path, "Marked file dirty");
            entry.dirty = true;
        }
    }

    /// Record a completed flush of `path`.
    pub fn mark_clean(&mut self, path: &NormalizedPath, checksum: Option<String>) {
        let entry = self.get_or_create(path);
        entry.dirty = false;
        entry.checksum = checksum;
    }

    /// Clear every dirty flag; used when the records are reloaded.
    pub fn reset(&mut self) {
        for entry in self.files.values_mut() {
            entry.dirty = false;
        }
    }

    /// Unknown paths are clean.
    pub fn is_dirty(&self, path: &NormalizedPath) -> bool {
        self.files.get(path).is_some_and(FileEntry::is_dirty)
    }

    /// Registered paths in sorted order.
    pub fn paths(&self) -> Vec<NormalizedPath> {
        self.files.keys().cloned().collect()
    }

    /// Dirty paths in sorted order.
    pub fn dirty_paths(&self) -> Vec<NormalizedPath> {
        self.files
            .iter()
            .filter(|(_, entry)| entry.dirty)
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
