use chrono::{DateTime, Utc};
use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Record type a query decodes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Schema {
    /// Field name -> value map, whatever the file declares
    Raw,
    /// City record, with district and ASN detail
    City,
    /// District record
    District,
    /// Data-centre record
    Idc,
    /// Mobile base-station record
    BaseStation,
    /// Risk score record
    Risk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty JSON array
    Json,
    /// One `address<TAB>field=value...` line per address, keys sorted
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Tab-separated, no quoting
    Tsv,
    /// Comma-separated, double-quote quoting
    Csv,
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` wins over the `-v` count.
pub fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn format_build_time(build: DateTime<Utc>) -> String {
    build.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Render an IP version bitmask
pub fn format_ip_version(ipv4: bool, ipv6: bool) -> &'static str {
    match (ipv4, ipv6) {
        (true, true) => "IPv4 + IPv6",
        (true, false) => "IPv4",
        (false, true) => "IPv6",
        (false, false) => "none",
    }
}

/// Flatten a JSON object to `key=value` pairs for text output
pub fn json_to_pairs(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("{}={}", k, s),
                other => format!("{}={}", k, other),
            })
            .collect::<Vec<_>>()
            .join("\t"),
        other => other.to_string(),
    }
}
