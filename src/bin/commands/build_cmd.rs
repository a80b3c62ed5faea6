use anyhow::{bail, Context, Result};
use ipdb::{storage, DatabaseBuilder};
use std::path::PathBuf;
use std::time::Instant;

use crate::cli_utils::InputFormat;

pub struct BuildArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub fields: Vec<String>,
    pub languages: Vec<String>,
    pub input_format: InputFormat,
    pub build_time: Option<i64>,
}

pub fn cmd_build(args: BuildArgs) -> Result<()> {
    if args.fields.is_empty() || args.languages.is_empty() {
        bail!("--fields and --languages must each name at least one entry");
    }

    let mut builder = args
        .languages
        .iter()
        .fold(DatabaseBuilder::new(&args.fields), |b, code| {
            b.with_language(code.as_str())
        });
    if let Some(build) = args.build_time {
        builder = builder.with_build_time(build);
    }

    let start = Instant::now();
    let reader = storage::open_text(&args.input)
        .with_context(|| format!("Failed to open input: {}", args.input.display()))?;

    let mut csv_builder = csv::ReaderBuilder::new();
    csv_builder
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'));
    match args.input_format {
        InputFormat::Tsv => {
            csv_builder.delimiter(b'\t').quoting(false);
        }
        InputFormat::Csv => {
            csv_builder.delimiter(b',');
        }
    }
    let mut rdr = csv_builder.from_reader(reader);

    for (row_num, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_num + 1))?;
        let Some(network) = record.get(0) else {
            continue;
        };
        if network.trim().is_empty() {
            continue;
        }
        let values: Vec<&str> = record.iter().skip(1).collect();
        builder
            .insert(network.trim(), &values)
            .with_context(|| format!("Row {}", row_num + 1))?;
    }

    let stats = builder.stats();
    let bytes = builder.build().context("Failed to build database")?;
    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!("Built {}", args.output.display());
    println!(
        "  Networks:       {} ({} IPv4, {} IPv6)",
        stats.networks, stats.ipv4_networks, stats.ipv6_networks
    );
    println!("  Unique records: {}", stats.unique_records);
    println!(
        "  Languages:      {} x {} fields",
        args.languages.join(","),
        args.fields.len()
    );
    println!("  Size:           {} bytes", bytes.len());
    println!("  Time:           {:.2?}", start.elapsed());

    Ok(())
}
