//! Cross-record consistency checks
//!
//! A fixed, domain-specific battery of checks run per sample group. Rules
//! never fail the run: metadata anomalies are advisory, so each rule only
//! contributes warning messages. The engine is a pure function of
//! (records, config) -> report; callers flush the report to the log sink.

use crate::{channels, grouping, ColumnConfig, MetaRecord, RuleFlags};
use indexmap::IndexMap;
use std::fmt;

/// Identifier of the rule that produced a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleId {
    DuplicatedPrefix,
    SingleValueColumn(&'static str),
    ReadcountMismatch,
    AssayRenamed,
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleId::DuplicatedPrefix => write!(f, "duplicated-prefix"),
            RuleId::SingleValueColumn(col) => write!(f, "single-value-column({col})"),
            RuleId::ReadcountMismatch => write!(f, "readcount-mismatch"),
            RuleId::AssayRenamed => write!(f, "assay-renamed"),
        }
    }
}

/// One advisory message scoped to a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub rule: RuleId,
    pub message: String,
}

/// All warnings collected for one sample, flushed as one block.
#[derive(Debug, Clone)]
pub struct SampleWarnings {
    pub sample: String,
    pub warnings: Vec<Warning>,
}

/// Outcome of one validation run. Samples with no warnings do not appear.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub samples: Vec<SampleWarnings>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn total_warnings(&self) -> usize {
        self.samples.iter().map(|s| s.warnings.len()).sum()
    }

    /// Flush the report to the log sink: one info-level header per sample,
    /// then its messages at warn level. Blocks never interleave.
    pub fn emit_to_log(&self) {
        for block in &self.samples {
            log::info!("validation warnings for sample {}:", block.sample);
            for warning in &block.warnings {
                log::warn!("[{}] {}", warning.rule, warning.message);
            }
        }
    }
}

/// Run the selected rules over every sample group.
///
/// The duplicated-prefix and library-type checks always run; the rest are
/// gated by `flags`. Rules are independent: disabling one never changes
/// whether another fires.
pub fn validate(
    records: &[MetaRecord],
    columns: &ColumnConfig,
    flags: RuleFlags,
) -> ValidationReport {
    // Prefix duplication is a property of the whole input set, computed once
    // before the per-sample split. When no record carries the prefix column
    // the rule has nothing to compare and stays silent, instead of colliding
    // every record on the NaN sentinel.
    let duplicated = if records.iter().any(|r| r.get(&columns.prefix).is_some()) {
        duplicated_values(records, &columns.prefix)
    } else {
        Vec::new()
    };

    let mut report = ValidationReport::default();
    for (sample, group) in grouping::group_by_sample(records, &columns.sample) {
        let mut warnings = Vec::new();

        if let Some(w) = check_duplicated_prefix(&group, &columns.prefix, &duplicated) {
            warnings.push(w);
        }
        if let Some(w) = check_single_value(&group, "library_type") {
            warnings.push(w);
        }
        if flags.readlengths {
            for col in ["r1len", "r2len"] {
                if let Some(w) = check_single_value(&group, col) {
                    warnings.push(w);
                }
            }
        }
        if flags.readcounts {
            if let Some(w) = check_readcounts(&group, &columns.cram) {
                warnings.push(w);
            }
        }
        if flags.renamed {
            if let Some(w) = check_renamed(&group, &columns.cram) {
                warnings.push(w);
            }
        }

        if !warnings.is_empty() {
            report.samples.push(SampleWarnings { sample, warnings });
        }
    }
    report
}

/// Values of `column` appearing more than once across the whole record set,
/// in first-occurrence order.
fn duplicated_values(records: &[MetaRecord], column: &str) -> Vec<String> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for record in records {
        *counts.entry(record.get_or_na(column)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(value, _)| value.to_string())
        .collect()
}

fn check_duplicated_prefix(
    group: &[&MetaRecord],
    prefix_column: &str,
    duplicated: &[String],
) -> Option<Warning> {
    let mut offenders: Vec<&str> = Vec::new();
    for record in group {
        let value = record.get_or_na(prefix_column);
        if duplicated.iter().any(|d| d == value) && !offenders.contains(&value) {
            offenders.push(value);
        }
    }
    if offenders.is_empty() {
        return None;
    }
    Some(Warning {
        rule: RuleId::DuplicatedPrefix,
        message: format!(
            "duplicated values found in column '{prefix_column}': {}",
            offenders.join(", ")
        ),
    })
}

fn check_single_value(group: &[&MetaRecord], column: &'static str) -> Option<Warning> {
    let mut distinct: Vec<&str> = Vec::new();
    for record in group {
        let value = record.get_or_na(column);
        if !distinct.contains(&value) {
            distinct.push(value);
        }
    }
    if distinct.len() <= 1 {
        return None;
    }
    Some(Warning {
        rule: RuleId::SingleValueColumn(column),
        message: format!(
            "multiple values found in column '{column}': {}",
            distinct.join(",")
        ),
    })
}

fn check_readcounts(group: &[&MetaRecord], cram_column: &str) -> Option<Warning> {
    let offenders: Vec<&str> = group
        .iter()
        .filter(|r| r.get_or_na("total_reads") != r.get_or_na("num_reads_processed"))
        .map(|r| r.get_or_na(cram_column))
        .collect();
    if offenders.is_empty() {
        return None;
    }
    Some(Warning {
        rule: RuleId::ReadcountMismatch,
        message: format!(
            "total_reads does not match num_reads_processed for cram files: {}",
            offenders.join(", ")
        ),
    })
}

fn check_renamed(group: &[&MetaRecord], cram_column: &str) -> Option<Warning> {
    let offenders: Vec<&str> = group
        .iter()
        .filter(|r| channels::requires_renaming(r))
        .map(|r| r.get_or_na(cram_column))
        .collect();
    if offenders.is_empty() {
        return None;
    }
    Some(Warning {
        rule: RuleId::AssayRenamed,
        message: format!(
            "read channels will be renamed (I2->R2, R2->R3) for ATAC cram files: {}",
            offenders.join(", ")
        ),
    })
}
