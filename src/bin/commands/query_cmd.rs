use anyhow::{Context, Result};
use ipdb::{
    BaseStationInfo, CityInfo, Database, DistrictInfo, FieldMap, IdcInfo, IpdbError, Record,
    RiskInfo,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

use crate::cli_utils::{json_to_pairs, OutputFormat, Schema};

pub struct QueryArgs {
    pub database: PathBuf,
    pub addresses: Vec<String>,
    pub language: String,
    pub schema: Schema,
    pub format: OutputFormat,
    pub mmap: bool,
    pub quiet: bool,
}

pub fn cmd_query(args: QueryArgs) -> Result<()> {
    let all_found = match args.schema {
        Schema::Raw => run::<FieldMap>(&args)?,
        Schema::City => run::<CityInfo>(&args)?,
        Schema::District => run::<DistrictInfo>(&args)?,
        Schema::Idc => run::<IdcInfo>(&args)?,
        Schema::BaseStation => run::<BaseStationInfo>(&args)?,
        Schema::Risk => run::<RiskInfo>(&args)?,
    };

    // Exit code: 0 = every address found, 1 = at least one was not
    std::process::exit(if all_found { 0 } else { 1 });
}

fn run<R: Record + Serialize>(args: &QueryArgs) -> Result<bool> {
    let mut opener = Database::<R>::opener(&args.database).cache_capacity(0);
    if args.mmap {
        opener = opener.memory_map();
    }
    let db = opener
        .open()
        .with_context(|| format!("Failed to load database: {}", args.database.display()))?;

    // Language problems apply to every address; fail once instead of per line
    if !db.languages().iter().any(|l| l == &args.language) {
        return Err(IpdbError::LanguageNotSupported(args.language.clone()))
            .with_context(|| format!("available languages: {}", db.languages().join(", ")));
    }

    let mut all_found = true;
    let mut rows = Vec::with_capacity(args.addresses.len());
    for batch in db.find_batch(&args.addresses, &args.language) {
        let row = match batch.result {
            Ok(record) => json!({
                "address": batch.address,
                "data": serde_json::to_value(&record)?,
            }),
            Err(e) => {
                all_found = false;
                json!({
                    "address": batch.address,
                    "error": e.to_string(),
                })
            }
        };
        rows.push(row);
    }

    if args.quiet {
        return Ok(all_found);
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Text => {
            for row in &rows {
                let address = row["address"].as_str().unwrap_or_default();
                match row.get("data") {
                    Some(data) => println!("{}\t{}", address, json_to_pairs(data)),
                    None => println!(
                        "{}\terror={}",
                        address,
                        row["error"].as_str().unwrap_or_default()
                    ),
                }
            }
        }
    }

    Ok(all_found)
}
