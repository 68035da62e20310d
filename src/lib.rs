//! Seqmeta Tools
//!
//! Metadata aggregation and validation for sequencing data delivery.
//!
//! This library provides shared functionality for:
//! - Parsing archival catalog (imeta) exports into per-file metadata records
//! - Deterministic, collision-resistant fastq naming prefixes
//! - Per-sample cross-record consistency checks
//! - Merging all records into a single delimited table

pub mod catalog;
pub mod channels;
pub mod grouping;
pub mod naming;
pub mod table;
pub mod validation;

use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Sentinel value for fields absent from a record.
pub const NA_VALUE: &str = "NaN";

/// One sequenced file's metadata as an ordered field -> value mapping.
///
/// Field order is preserved as parsed; the first record's field set defines
/// the output column set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaRecord {
    #[serde(flatten)]
    fields: IndexMap<String, String>,
}

impl MetaRecord {
    pub fn new() -> Self {
        Self { fields: IndexMap::new() }
    }

    /// Build a record from a parsed JSON object, coercing scalar values to
    /// strings. Null values resolve to the `NaN` sentinel.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        let object = match value {
            serde_json::Value::Object(map) => map,
            other => return Err(anyhow!("expected a JSON object, got {other}")),
        };
        let mut record = Self::new();
        for (name, value) in object {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => NA_VALUE.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(anyhow!("field '{name}' holds a non-scalar value: {other}"));
                }
            };
            record.fields.insert(name, text);
        }
        Ok(record)
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field value, or the `NaN` sentinel when the field is absent.
    pub fn get_or_na(&self, name: &str) -> &str {
        self.get(name).unwrap_or(NA_VALUE)
    }

    /// Field value the engine cannot proceed without. Absence is a caller
    /// error, not a data-quality warning.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| anyhow!("required field '{name}' is missing from a metadata record"))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Names of the columns the engine reads, so the same engine works across
/// catalog schema variants.
#[derive(Debug, Clone)]
pub struct ColumnConfig {
    pub sample: String,
    pub cram: String,
    pub prefix: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            sample: "sample".to_string(),
            cram: "cram_path".to_string(),
            prefix: "fastq_prefix".to_string(),
        }
    }
}

/// Switches for the optional validation rules.
///
/// The duplicated-prefix and library-type consistency checks always run;
/// the rules here are the extended set.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleFlags {
    pub readcounts: bool,
    pub readlengths: bool,
    pub renamed: bool,
}

impl RuleFlags {
    /// Enable the full extended rule set.
    pub fn extended() -> Self {
        Self { readcounts: true, readlengths: true, renamed: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_from_json_coerces_scalars() {
        let record = MetaRecord::from_json_value(json!({
            "sample": "S1",
            "total_reads": 100,
            "is_paired_read": true,
            "md5": null,
        }))
        .unwrap();
        assert_eq!(record.get("sample"), Some("S1"));
        assert_eq!(record.get("total_reads"), Some("100"));
        assert_eq!(record.get("is_paired_read"), Some("true"));
        assert_eq!(record.get("md5"), Some(NA_VALUE));
    }

    #[test]
    fn test_record_rejects_nested_values() {
        let result = MetaRecord::from_json_value(json!({"sample": {"nested": 1}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_field_defaults_to_na() {
        let record = MetaRecord::new();
        assert_eq!(record.get_or_na("library_type"), NA_VALUE);
        assert!(record.require("library_type").is_err());
    }

    #[test]
    fn test_field_order_is_preserved() {
        let mut record = MetaRecord::new();
        record.insert("zeta", "1");
        record.insert("alpha", "2");
        let names: Vec<&str> = record.field_names().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
