//! [`FixtureDir`] builder for backing-file test scenarios.

use std::fs;
use std::time::SystemTime;

use filemap_fs::NormalizedPath;
use tempfile::TempDir;

/// A temporary directory holding backing files, with helpers for setup
/// and assertion.
///
/// # Example
///
/// ```rust,no_run
/// use filemap_test_utils::FixtureDir;
///
/// let dir = FixtureDir::new();
/// dir.write("hosts", "web a=1\n");
/// dir.assert_file_contains("hosts", "web");
/// ```
pub struct FixtureDir {
    temp_dir: TempDir,
}

impl Default for FixtureDir {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureDir {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Normalized path of `name` inside the directory.
    pub fn path(&self, name: &str) -> NormalizedPath {
        NormalizedPath::new(self.temp_dir.path().join(name))
    }

    /// Write `content` to `name`, creating parent directories.
    pub fn write(&self, name: &str, content: &str) -> NormalizedPath {
        let path = self.path(name);
        let native = path.to_native();
        if let Some(parent) = native.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&native, content).unwrap();
        path
    }

    /// Create a directory where a file is expected, so reads of it fail.
    pub fn block(&self, name: &str) -> NormalizedPath {
        let path = self.path(name);
        fs::create_dir_all(path.to_native()).unwrap();
        path
    }

    /// Read `name` back as text.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, name: &str) -> String {
        let path = self.path(name);
        fs::read_to_string(path.to_native())
            .unwrap_or_else(|_| panic!("Could not read file: {path}"))
    }

    /// Modification time of `name`.
    pub fn modified(&self, name: &str) -> SystemTime {
        fs::metadata(self.path(name).to_native())
            .and_then(|m| m.modified())
            .unwrap()
    }

    /// Assert that `name` exists.
    pub fn assert_file_exists(&self, name: &str) {
        let path = self.path(name);
        assert!(path.exists(), "Expected file to exist: {path}");
    }

    /// Assert that `name` does **not** exist.
    pub fn assert_file_not_exists(&self, name: &str) {
        let path = self.path(name);
        assert!(!path.exists(), "Expected file NOT to exist: {path}");
    }

    /// Assert that `name` contains `content`.
    pub fn assert_file_contains(&self, name: &str, content: &str) {
        let file_content = self.read(name);
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            name,
            content,
            file_content
        );
    }
}
