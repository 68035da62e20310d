//! Merged metadata table output
//!
//! The annotated record sequence is stable-sorted by sample name and written
//! as one delimited table. The first record's field order defines the header
//! and column order; every record is assumed to share that field set.

use crate::{ColumnConfig, MetaRecord};
use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;

/// Stable sort by sample name, tie-broken by the naming prefix. The prefix
/// is unique and deterministic, so the final row order does not depend on
/// input enumeration order.
pub fn sort_by_sample(records: &mut [MetaRecord], columns: &ColumnConfig) {
    records.sort_by(|a, b| {
        a.get_or_na(&columns.sample)
            .cmp(b.get_or_na(&columns.sample))
            .then_with(|| a.get_or_na(&columns.prefix).cmp(b.get_or_na(&columns.prefix)))
    });
}

/// Parse a single-character output delimiter, e.g. "," or "\t".
pub fn delimiter_from_str(sep: &str) -> Result<u8> {
    let unescaped = match sep {
        "\\t" => "\t",
        other => other,
    };
    match unescaped.as_bytes() {
        [byte] => Ok(*byte),
        _ => bail!("separator must be a single character, got '{sep}'"),
    }
}

/// Write the record sequence as a delimited table file.
pub fn write_table(records: &[MetaRecord], path: &Path, delimiter: u8) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    write_table_to(records, file, delimiter)
        .with_context(|| format!("failed to write table {}", path.display()))
}

/// Write the record sequence as a delimited table to any sink.
pub fn write_table_to<W: Write>(records: &[MetaRecord], writer: W, delimiter: u8) -> Result<()> {
    let Some(first) = records.first() else {
        bail!("no metadata records to write");
    };
    let columns: Vec<&str> = first.field_names().collect();

    let mut out = csv::WriterBuilder::new().delimiter(delimiter).from_writer(writer);
    out.write_record(&columns)?;
    for record in records {
        out.write_record(columns.iter().map(|column| record.get_or_na(column)))?;
    }
    out.flush()?;
    Ok(())
}
