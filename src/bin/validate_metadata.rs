//! Seqmeta Validate Tool
//!
//! Reads a combined metadata file (a JSON array of records), runs the
//! selected consistency checks and writes the records as a delimited table.
//! Anomalies are advisory: the table is always written.

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use env_logger::Env;
use seqmeta_tools::{catalog, table, validation, ColumnConfig, RuleFlags};
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let matches = Command::new("seqmeta-validate")
        .version("0.1.0")
        .about("Validate combined sequencing metadata and write it as a table")
        .arg(
            Arg::new("input")
                .value_name("FILE")
                .help("JSON file with the metadata records to validate")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output file for the validated table")
                .default_value("metadata.tsv"),
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
                .help("Name of the file prefix column")
                .default_value("fastq_prefix"),
        )
        .arg(
            Arg::new("check_readcounts")
                .long("check-readcounts")
                .help("Check that metadata read counts match processed read counts")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check_readlengths")
                .long("check-readlengths")
                .help("Check that read lengths are consistent within each sample")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check_renamed")
                .long("check-renamed")
                .help("Report files whose read channels will be renamed for delivery")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let input = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let output = PathBuf::from(matches.get_one::<String>("output").unwrap());
    let delimiter = table::delimiter_from_str(matches.get_one::<String>("sep").unwrap())?;
    let columns = ColumnConfig {
        sample: matches.get_one::<String>("sample_column").unwrap().clone(),
        cram: matches.get_one::<String>("cram_column").unwrap().clone(),
        prefix: matches.get_one::<String>("prefix_column").unwrap().clone(),
    };
    // duplicated-prefix and library-type consistency always run
    let flags = RuleFlags {
        readcounts: matches.get_flag("check_readcounts"),
        readlengths: matches.get_flag("check_readlengths"),
        renamed: matches.get_flag("check_renamed"),
    };

    println!("🔍 Seqmeta Validate Tool");
    println!("Input: {}", input.display());
    println!("Output: {}", output.display());

    let mut records = catalog::load_combined_file(&input)?;
    log::info!("loaded {} metadata records", records.len());

    let report = validation::validate(&records, &columns, flags);
    report.emit_to_log();
    if report.is_clean() {
        log::info!("no validation warnings");
    }

    table::sort_by_sample(&mut records, &columns);
    table::write_table(&records, &output, delimiter)?;

    println!("✅ Validated {} records", records.len());
    println!("⚠️  Validation warnings: {}", report.total_warnings());
    println!("💾 Table saved to: {}", output.display());

    Ok(())
}
