use filemap_core::{Schema, Session};
use filemap_fs::NormalizedPath;
use filemap_test_utils::LineDriver;

pub fn schema() -> Schema {
    Schema::new(["ensure", "ip", "port", "comment"], ["target"])
}

pub fn session_over(targets: &[NormalizedPath]) -> Session {
    Session::new(LineDriver::new(targets.iter().cloned()), &schema())
}
