//! TOML driver: one top-level table per record
//!
//! ```toml
//! [web]
//! ip = "10.0.0.1"
//! ports = [80, 443]
//! ```
//!
//! The table key is the record name. Values map onto JSON values; dates
//! become strings and nulls are dropped on the way back.

use filemap_core::{
    Capability, DriverError, DriverResult, FormatDriver, PropertyMap, RawRecord, Record,
};
use filemap_fs::NormalizedPath;
use serde_json::{Map, Number, Value};
use toml_edit::{Array, DocumentMut, InlineTable, Item, Table};

use crate::targets::{TARGET, select_target};

const FALLBACK_FILE: &str = "records.toml";

/// Keys owned by the engine, never written into a table.
const RESERVED: [&str; 3] = ["name", "ensure", "target"];

const CAPABILITIES: [Capability; 3] = [
    Capability::TargetFiles,
    Capability::ParseFile,
    Capability::Serialize,
];

/// Driver for records stored as TOML tables.
#[derive(Debug, Clone)]
pub struct TomlTableDriver {
    targets: Vec<NormalizedPath>,
}

impl TomlTableDriver {
    pub fn new(targets: impl IntoIterator<Item = NormalizedPath>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
        }
    }
}

impl FormatDriver for TomlTableDriver {
    fn name(&self) -> &str {
        "toml_table"
    }

    fn capabilities(&self) -> &[Capability] {
        &CAPABILITIES
    }

    fn target_files(&self) -> DriverResult<Vec<NormalizedPath>> {
        Ok(self.targets.clone())
    }

    fn parse_file(&self, path: &NormalizedPath, content: &str) -> DriverResult<Vec<RawRecord>> {
        let doc: DocumentMut = content.parse().map_err(|e: toml_edit::TomlError| {
            let line = e
                .span()
                .map(|span| line_of(content, span.start))
                .unwrap_or(0);
            DriverError::parse(line, e.message().to_string())
        })?;

        let mut records = Vec::new();
        for (name, item) in doc.iter() {
            let Item::Table(table) = item else {
                return Err(DriverError::invalid(format!(
                    "top-level key `{name}` is not a table"
                )));
            };

            let mut record: PropertyMap = table
                .iter()
                .map(|(key, item)| (key.to_string(), item_to_json(item)))
                .collect();
            record
                .entry("ensure".into())
                .or_insert_with(|| Value::String("present".into()));
            record.insert("name".into(), Value::String(name.into()));
            record.insert(TARGET.into(), Value::String(path.as_str().into()));
            records.push(record);
        }
        Ok(records)
    }

    fn serialize(&self, _path: &NormalizedPath, records: &[&Record]) -> DriverResult<String> {
        let mut doc = DocumentMut::new();
        for record in records.iter().filter(|record| record.exists()) {
            let mut table = Table::new();
            for (key, value) in record.properties() {
                if RESERVED.contains(&key.as_str()) {
                    continue;
                }
                if let Some(value) = json_to_toml(value) {
                    table.insert(key.as_str(), toml_edit::value(value));
                }
            }
            doc.insert(record.name(), Item::Table(table));
        }
        Ok(doc.to_string())
    }

    fn select_file(&self, properties: &PropertyMap) -> NormalizedPath {
        select_target(&self.targets, properties, FALLBACK_FILE)
    }
}

/// 1-based line number of a byte offset.
fn line_of(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content.as_bytes()[..offset]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

fn table_to_json(table: &Table) -> Value {
    Value::Object(
        table
            .iter()
            .map(|(k, v)| (k.to_string(), item_to_json(v)))
            .collect(),
    )
}

fn item_to_json(item: &Item) -> Value {
    match item {
        Item::Value(v) => value_to_json(v),
        Item::Table(t) => table_to_json(t),
        Item::ArrayOfTables(arr) => Value::Array(arr.iter().map(table_to_json).collect()),
        Item::None => Value::Null,
    }
}

fn value_to_json(v: &toml_edit::Value) -> Value {
    match v {
        toml_edit::Value::String(s) => Value::String(s.value().to_string()),
        toml_edit::Value::Integer(i) => Value::Number((*i.value()).into()),
        toml_edit::Value::Float(f) => Number::from_f64(*f.value())
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml_edit::Value::Boolean(b) => Value::Bool(*b.value()),
        toml_edit::Value::Datetime(d) => Value::String(d.value().to_string()),
        toml_edit::Value::Array(arr) => Value::Array(arr.iter().map(value_to_json).collect()),
        toml_edit::Value::InlineTable(t) => Value::Object(
            t.iter()
                .map(|(k, v)| (k.to_string(), value_to_json(v)))
                .collect::<Map<_, _>>(),
        ),
    }
}

fn json_to_toml(value: &Value) -> Option<toml_edit::Value> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some((*b).into()),
        Value::Number(n) => n
            .as_i64()
            .map(toml_edit::Value::from)
            .or_else(|| n.as_f64().map(toml_edit::Value::from)),
        Value::String(s) => Some(s.as_str().into()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(json_to_toml)
                .collect::<Array>()
                .into(),
        ),
        Value::Object(map) => {
            let mut table = InlineTable::new();
            for (key, value) in map {
                if let Some(value) = json_to_toml(value) {
                    table.insert(key.as_str(), value);
                }
            }
            Some(table.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(content: &str) -> DriverResult<Vec<RawRecord>> {
        TomlTableDriver::new(Vec::<NormalizedPath>::new())
            .parse_file(&NormalizedPath::new("/srv/users.toml"), content)
    }

    #[test]
    fn tables_become_records_in_document_order() {
        let records =
            parse("[web]\nip = \"10.0.0.1\"\nport = 80\n\n[db]\nip = \"10.0.0.2\"\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], json!("web"));
        assert_eq!(records[0]["port"], json!(80));
        assert_eq!(records[0]["ensure"], json!("present"));
        assert_eq!(records[0]["target"], json!("/srv/users.toml"));
        assert_eq!(records[1]["name"], json!("db"));
    }

    #[test]
    fn nested_values_convert() {
        let records = parse("[web]\nports = [80, 443]\nlimits = { cpu = 1.5 }\n").unwrap();
        assert_eq!(records[0]["ports"], json!([80, 443]));
        assert_eq!(records[0]["limits"], json!({ "cpu": 1.5 }));
    }

    #[test]
    fn explicit_ensure_is_kept() {
        let records = parse("[web]\nensure = \"absent\"\n").unwrap();
        assert_eq!(records[0]["ensure"], json!("absent"));
    }

    #[test]
    fn top_level_value_is_rejected() {
        let err = parse("version = 1\n").unwrap_err();
        assert!(matches!(err, DriverError::Invalid { .. }));
    }

    #[test]
    fn syntax_error_reports_line() {
        let err = parse("[web]\nip = \"10.0.0.1\"\nport = = 80\n").unwrap_err();
        assert!(matches!(err, DriverError::Parse { line: 3, .. }));
    }

    #[test]
    fn line_of_counts_newlines() {
        assert_eq!(line_of("a\nb\nc", 0), 1);
        assert_eq!(line_of("a\nb\nc", 2), 2);
        assert_eq!(line_of("a\nb\nc", 99), 3);
    }

    #[test]
    fn json_conversion_drops_nulls() {
        assert!(json_to_toml(&Value::Null).is_none());
        let array = json_to_toml(&json!([1, null, "x"])).unwrap();
        assert_eq!(array.as_array().map(|a| a.len()), Some(2));
    }
}
