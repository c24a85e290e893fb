use filemap_core::PropertyMap;
use filemap_fs::NormalizedPath;
use serde_json::Value;

/// Property naming the file a record belongs to.
pub(crate) const TARGET: &str = "target";

/// File for a new record: its `target` property, else the first
/// configured target, else `fallback`.
pub(crate) fn select_target(
    targets: &[NormalizedPath],
    properties: &PropertyMap,
    fallback: &str,
) -> NormalizedPath {
    properties
        .get(TARGET)
        .and_then(Value::as_str)
        .map(NormalizedPath::new)
        .or_else(|| targets.first().cloned())
        .unwrap_or_else(|| NormalizedPath::new(fallback))
}
