//! Seqmeta Parse Catalog Tool
//!
//! Parses a directory of imeta catalog query exports into per-file JSON
//! metadata records. Each record gets a deterministic fastq naming prefix
//! and is written out as `{prefix}.json` with a fixed column set.

use anyhow::Result;
use clap::{Arg, Command};
use env_logger::Env;
use seqmeta_tools::{catalog, naming, ColumnConfig};
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let matches = Command::new("seqmeta-parse-catalog")
        .version("0.1.0")
        .about("Parse imeta catalog exports into per-file JSON metadata records")
        .arg(
            Arg::new("input_dir")
                .value_name("DIRECTORY")
                .help("Directory containing one imeta query export per cram file")
                .required(true),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-dir")
                .value_name("DIRECTORY")
                .help("Directory to write the per-file JSON records into")
                .default_value("."),
        )
        .get_matches();

    let input_dir = PathBuf::from(matches.get_one::<String>("input_dir").unwrap());
    let output_dir = PathBuf::from(matches.get_one::<String>("output_dir").unwrap());

    println!("📦 Seqmeta Parse Catalog Tool");
    println!("Input directory: {}", input_dir.display());
    println!("Output directory: {}", output_dir.display());

    std::fs::create_dir_all(&output_dir)?;

    let mut records = catalog::load_imeta_dir(&input_dir)?;
    log::info!("parsed {} imeta exports", records.len());

    let columns = ColumnConfig::default();
    for record in &mut records {
        catalog::derive_naming_fields(record)?;
    }
    let substitutions = naming::assign_prefixes(&mut records, &columns)?;
    for sub in &substitutions {
        log::info!(
            "prefix collision on '{}': {} assigned '{}'",
            sub.colliding_prefix,
            sub.cram_path,
            sub.assigned_prefix
        );
    }

    for record in &records {
        let prefix = record.require(&columns.prefix)?;
        let filtered = catalog::filter_columns(record, catalog::EXPORT_COLUMNS);
        catalog::write_json(&filtered, &output_dir.join(format!("{prefix}.json")))?;
    }

    println!("✅ Wrote {} JSON records", records.len());

    Ok(())
}
