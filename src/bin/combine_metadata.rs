//! Seqmeta Combine Tool
//!
//! Reads per-file metadata records from a directory of JSON files, assigns
//! naming prefixes, annotates read-channel labels, validates each sample's
//! records and writes everything as one delimited table.

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use env_logger::Env;
use seqmeta_tools::{catalog, channels, naming, table, validation, ColumnConfig, RuleFlags};
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let matches = Command::new("seqmeta-combine")
        .version("0.1.0")
        .about("Combine per-file sequencing metadata into one validated table")
        .arg(
            Arg::new("input_dir")
                .short('i')
                .long("input-dir")
                .value_name("DIRECTORY")
                .help("Directory containing one JSON metadata file per sequenced file")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output file for the combined table")
                .default_value("metadata.csv"),
        )
        .arg(
            Arg::new("sep")
                .long("sep")
                .value_name("CHAR")
                .help("Column separator for the output table")
                .default_value(","),
        )
        .arg(
            Arg::new("sample_column")
                .short('s')
                .long("sample-column")
                .value_name("NAME")
                .help("Name of the sample column")
                .default_value("sample"),
        )
        .arg(
            Arg::new("cram_column")
                .short('c')
                .long("cram-column")
                .value_name("NAME")
                .help("Name of the cram path column")
                .default_value("cram_path"),
        )
        .arg(
            Arg::new("prefix_column")
                .short('p')
                .long("prefix-column")
                .value_name("NAME")
                .help("Name of the fastq prefix column")
                .default_value("fastq_prefix"),
        )
        .arg(
            Arg::new("extended_checks")
                .long("extended-checks")
                .help("Also run the readcount, readlength and channel-rename checks")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let input_dir = PathBuf::from(matches.get_one::<String>("input_dir").unwrap());
    let output = PathBuf::from(matches.get_one::<String>("output").unwrap());
    let delimiter = table::delimiter_from_str(matches.get_one::<String>("sep").unwrap())?;
    let columns = ColumnConfig {
        sample: matches.get_one::<String>("sample_column").unwrap().clone(),
        cram: matches.get_one::<String>("cram_column").unwrap().clone(),
        prefix: matches.get_one::<String>("prefix_column").unwrap().clone(),
    };
    let flags = if matches.get_flag("extended_checks") {
        RuleFlags::extended()
    } else {
        RuleFlags::default()
    };

    println!("📋 Seqmeta Combine Tool");
    println!("Input directory: {}", input_dir.display());
    println!("Output: {}", output.display());

    let mut records = catalog::load_metadata_dir(&input_dir)?;
    log::info!("loaded {} metadata records", records.len());

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
    for record in &mut records {
        channels::annotate_channels(record);
    }

    let report = validation::validate(&records, &columns, flags);
    report.emit_to_log();
    if report.is_clean() {
        log::info!("no validation warnings");
    }

    table::sort_by_sample(&mut records, &columns);
    table::write_table(&records, &output, delimiter)?;

    println!("✅ Combined {} records", records.len());
    println!("⚠️  Validation warnings: {}", report.total_warnings());
    println!("💾 Table saved to: {}", output.display());

    Ok(())
}
