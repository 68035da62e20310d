//! Grouping records by sample
//!
//! Validation rules operate on one sample's records at a time. Groups are
//! keyed by the configured sample column and iterate in first-occurrence
//! order so warning blocks come out in a stable order.

use crate::MetaRecord;
use indexmap::IndexMap;

/// Partition records into per-sample groups, preserving record order within
/// each group. Records without a sample value group under the `NaN` sentinel.
pub fn group_by_sample<'a>(
    records: &'a [MetaRecord],
    sample_column: &str,
) -> IndexMap<String, Vec<&'a MetaRecord>> {
    let mut groups: IndexMap<String, Vec<&MetaRecord>> = IndexMap::new();
    for record in records {
        groups
            .entry(record.get_or_na(sample_column).to_string())
            .or_default()
            .push(record);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sample: &str, cram: &str) -> MetaRecord {
        let mut r = MetaRecord::new();
        r.insert("sample", sample);
        r.insert("cram_path", cram);
        r
    }

    #[test]
    fn test_groups_keep_first_occurrence_order() {
        let records = vec![
            record("B", "b1"),
            record("A", "a1"),
            record("B", "b2"),
        ];
        let groups = group_by_sample(&records, "sample");
        let keys: Vec<&String> = groups.keys().collect();
        assert_eq!(keys, vec!["B", "A"]);
        assert_eq!(groups["B"].len(), 2);
        assert_eq!(groups["B"][1].get("cram_path"), Some("b2"));
    }

    #[test]
    fn test_every_record_lands_in_exactly_one_group() {
        let records = vec![record("A", "a1"), record("B", "b1"), record("A", "a2")];
        let groups = group_by_sample(&records, "sample");
        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, records.len());
    }

    #[test]
    fn test_missing_sample_groups_under_sentinel() {
        let mut no_sample = MetaRecord::new();
        no_sample.insert("cram_path", "x");
        let records = vec![no_sample];
        let groups = group_by_sample(&records, "sample");
        assert!(groups.contains_key("NaN"));
    }
}
