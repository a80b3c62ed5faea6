use anyhow::{Context, Result};
use ipdb::Database;
use serde_json::json;
use std::path::PathBuf;

use crate::cli_utils::{format_build_time, format_ip_version};

pub fn cmd_inspect(database: PathBuf, json_output: bool) -> Result<()> {
    let db: Database = Database::opener(&database)
        .no_cache()
        .open()
        .with_context(|| format!("Failed to load database: {}", database.display()))?;

    let metadata = db.metadata();
    let file_size = std::fs::metadata(&database)
        .map(|m| m.len())
        .with_context(|| format!("Failed to stat {}", database.display()))?;

    if json_output {
        let info = json!({
            "file": database.display().to_string(),
            "file_size": file_size,
            "build": metadata.build,
            "build_time": db.build_time().to_rfc3339(),
            "ip_version": metadata.ip_version,
            "ipv4": db.is_ipv4_supported(),
            "ipv6": db.is_ipv6_supported(),
            "languages": metadata.languages,
            "fields": metadata.fields,
            "node_count": metadata.node_count,
            "total_size": metadata.total_size,
            "ipv4_start_node": db.ipv4_start_node(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Database: {}", database.display());
    println!("Size:            {} bytes", file_size);
    println!("Build time:      {}", format_build_time(db.build_time()));
    println!(
        "IP versions:     {}",
        format_ip_version(db.is_ipv4_supported(), db.is_ipv6_supported())
    );
    println!("Nodes:           {}", metadata.node_count);
    println!("Data size:       {} bytes", metadata.total_size);
    println!("IPv4 start node: {}", db.ipv4_start_node());
    println!();
    println!("Languages:");
    for (code, offset) in &metadata.languages {
        println!("  {:<6} offset {}", code, offset);
    }
    println!();
    println!("Fields ({}):", metadata.fields.len());
    for field in &metadata.fields {
        println!("  {}", field);
    }

    Ok(())
}
