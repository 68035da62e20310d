//! Reading metadata records from the archival catalog
//!
//! Records arrive either as one JSON object per sequenced file, as a single
//! JSON array of such objects, or as the raw text output of an `imeta`
//! catalog query (`attribute:`/`value:` line pairs, with the CRAM path on
//! the first line).

use crate::MetaRecord;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Columns kept when exporting a parsed catalog record to JSON.
pub const EXPORT_COLUMNS: &[&str] = &[
    "sample",
    "cram_path",
    "fastq_prefix",
    "sample_supplier_name",
    "library_type",
    "total_reads_irods",
    "md5",
    "is_paired_read",
];

/// Load every file in `dir` as one JSON metadata record.
///
/// Directory entries are sorted by name so the record sequence does not
/// depend on filesystem enumeration order.
pub fn load_metadata_dir(dir: &Path) -> Result<Vec<MetaRecord>> {
    let mut records = Vec::new();
    for path in list_files(dir)? {
        records.push(load_metadata_file(&path)?);
    }
    Ok(records)
}

/// Load one JSON object file as a record.
pub fn load_metadata_file(path: &Path) -> Result<MetaRecord> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read metadata file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse JSON in {}", path.display()))?;
    MetaRecord::from_json_value(value)
        .with_context(|| format!("invalid metadata record in {}", path.display()))
}

/// Load a combined metadata file holding a JSON array of records.
pub fn load_combined_file(path: &Path) -> Result<Vec<MetaRecord>> {
    if !path.exists() {
        bail!("file {} not found", path.display());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read metadata file {}", path.display()))?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse JSON array in {}", path.display()))?;
    values
        .into_iter()
        .map(MetaRecord::from_json_value)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("invalid metadata record in {}", path.display()))
}

/// Parse every file in `dir` as one imeta query export.
pub fn load_imeta_dir(dir: &Path) -> Result<Vec<MetaRecord>> {
    let mut records = Vec::new();
    for path in list_files(dir)? {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read imeta export {}", path.display()))?;
        records.push(
            parse_imeta_export(&text)
                .with_context(|| format!("failed to parse imeta export {}", path.display()))?,
        );
    }
    Ok(records)
}

/// Parse one imeta query export into a record.
///
/// The first line names the queried CRAM object; the rest is a sequence of
/// `attribute: <name>` / `value: <text>` line pairs.
pub fn parse_imeta_export(text: &str) -> Result<MetaRecord> {
    let (first_line, body) = text.split_once('\n').unwrap_or((text, ""));
    let cram_path = first_line
        .trim_end_matches([':', '\r'])
        .rsplit(' ')
        .next()
        .unwrap_or_default();
    if cram_path.is_empty() {
        bail!("imeta export does not start with a CRAM path line");
    }

    let pattern = Regex::new(r"attribute: ([\w:]+)\r?\nvalue: (.+)")?;
    let mut record = MetaRecord::new();
    for capture in pattern.captures_iter(body) {
        record.insert(&capture[1], capture[2].trim_end_matches('\r'));
    }
    record.insert("cram_path", cram_path);
    Ok(record)
}

/// Derive `run_id`, `lane` and `tag_index` from the CRAM file name, which
/// follows the `{run_id}_{lane}#{tag}.cram` catalog convention. Fields
/// already present on the record are left alone; the file name only has to
/// be parseable when a field is actually missing.
pub fn derive_naming_fields(record: &mut MetaRecord) -> Result<()> {
    if record.get("run_id").is_some()
        && record.get("lane").is_some()
        && record.get("tag_index").is_some()
    {
        return Ok(());
    }
    let cram_path = record.require("cram_path")?;
    let basename = Path::new(cram_path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    let Some((run_lane, tag)) = basename.split_once('#') else {
        bail!("cannot derive run/lane/tag from CRAM name '{basename}'");
    };
    let (run_id, lane) = run_lane.rsplit_once('_').unwrap_or((run_lane, "1"));
    if tag.is_empty() || run_id.is_empty() {
        bail!("cannot derive run/lane/tag from CRAM name '{basename}'");
    }
    let (run_id, lane, tag) = (run_id.to_string(), lane.to_string(), tag.to_string());
    if record.get("run_id").is_none() {
        record.insert("run_id", run_id);
    }
    if record.get("lane").is_none() {
        record.insert("lane", lane);
    }
    if record.get("tag_index").is_none() {
        record.insert("tag_index", tag);
    }
    Ok(())
}

/// Keep only the named columns of a record, in the given order. Missing
/// columns resolve to the `NaN` sentinel so every export has the same shape.
pub fn filter_columns(record: &MetaRecord, columns: &[&str]) -> MetaRecord {
    let mut filtered = MetaRecord::new();
    for column in columns {
        filtered.insert(column, record.get_or_na(column));
    }
    filtered
}

/// Write one record as a JSON object file.
pub fn write_json(record: &MetaRecord, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(record)?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("input directory {} not found", dir.display());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const IMETA_EXPORT: &str = "\
/seq/49xxx/49xxx_3#5.cram:
attribute: sample
value: sampleA
attribute: library_type
value: Chromium single cell 3' v3
attribute: total_reads
value: 426335174
attribute: md5
value: d41d8cd98f00b204e9800998ecf8427e
";

    #[test]
    fn test_parse_imeta_export() {
        let record = parse_imeta_export(IMETA_EXPORT).unwrap();
        assert_eq!(record.get("cram_path"), Some("/seq/49xxx/49xxx_3#5.cram"));
        assert_eq!(record.get("sample"), Some("sampleA"));
        assert_eq!(record.get("library_type"), Some("Chromium single cell 3' v3"));
        assert_eq!(record.get("total_reads"), Some("426335174"));
    }

    #[test]
    fn test_parse_imeta_empty_input_fails() {
        assert!(parse_imeta_export("").is_err());
    }

    #[test]
    fn test_load_metadata_dir_sorted_by_filename() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.json"), r#"{"sample": "B"}"#).unwrap();
        fs::write(dir.path().join("a.json"), r#"{"sample": "A"}"#).unwrap();
        let records = load_metadata_dir(dir.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("sample"), Some("A"));
        assert_eq!(records[1].get("sample"), Some("B"));
    }

    #[test]
    fn test_load_metadata_dir_missing_is_fatal() {
        let err = load_metadata_dir(Path::new("/no/such/dir")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_combined_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("combined.json");
        fs::write(&path, r#"[{"sample": "A", "total_reads": 10}, {"sample": "B"}]"#)
            .unwrap();
        let records = load_combined_file(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("total_reads"), Some("10"));
    }

    #[test]
    fn test_derive_naming_fields_from_cram_name() {
        let mut record = MetaRecord::new();
        record.insert("cram_path", "/seq/49xxx/49xxx_3#5.cram");
        derive_naming_fields(&mut record).unwrap();
        assert_eq!(record.get("run_id"), Some("49xxx"));
        assert_eq!(record.get("lane"), Some("3"));
        assert_eq!(record.get("tag_index"), Some("5"));
    }

    #[test]
    fn test_derive_naming_fields_keeps_existing_values() {
        let mut record = MetaRecord::new();
        record.insert("cram_path", "/seq/49xxx/49xxx_3#5.cram");
        record.insert("lane", "7");
        derive_naming_fields(&mut record).unwrap();
        assert_eq!(record.get("lane"), Some("7"));
    }

    #[test]
    fn test_derive_naming_fields_rejects_unparseable_names() {
        let mut record = MetaRecord::new();
        record.insert("cram_path", "/seq/49xxx/notacram.cram");
        assert!(derive_naming_fields(&mut record).is_err());
    }

    #[test]
    fn test_explicit_naming_fields_skip_cram_name_parsing() {
        // records may carry the naming fields directly; the file name does
        // not have to follow the {run}_{lane}#{tag} convention then
        let mut record = MetaRecord::new();
        record.insert("cram_path", "/archive/merged-export.cram");
        record.insert("run_id", "49xxx");
        record.insert("lane", "3");
        record.insert("tag_index", "5");
        derive_naming_fields(&mut record).unwrap();
        assert_eq!(record.get("run_id"), Some("49xxx"));
        assert_eq!(record.get("lane"), Some("3"));
        assert_eq!(record.get("tag_index"), Some("5"));
    }

    #[test]
    fn test_partially_missing_fields_still_need_a_parseable_name() {
        let mut record = MetaRecord::new();
        record.insert("cram_path", "/archive/merged-export.cram");
        record.insert("run_id", "49xxx");
        record.insert("lane", "3");
        // tag_index absent, so the unparseable name is fatal
        assert!(derive_naming_fields(&mut record).is_err());
    }

    #[test]
    fn test_filter_columns_fills_missing_with_nan() {
        let mut record = MetaRecord::new();
        record.insert("sample", "A");
        let filtered = filter_columns(&record, &["sample", "md5"]);
        assert_eq!(filtered.get("sample"), Some("A"));
        assert_eq!(filtered.get("md5"), Some("NaN"));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("record.json");
        let mut record = MetaRecord::new();
        record.insert("sample", "A");
        record.insert("total_reads", "10");
        write_json(&record, &path).unwrap();
        let loaded = load_metadata_file(&path).unwrap();
        assert_eq!(loaded, record);
    }
}
