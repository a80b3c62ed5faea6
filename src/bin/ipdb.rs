mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use cli_utils::{InputFormat, OutputFormat, Schema};
use commands::{cmd_build, cmd_inspect, cmd_query, BuildArgs, QueryArgs};

#[derive(Parser)]
#[command(name = "ipdb")]
#[command(
    about = "Query, inspect and build .ipdb IP attribute databases",
    long_about = "ipdb - memory-resident IP address to localized attribute lookups\n\n\
    An .ipdb file maps IPv4/IPv6 networks to a fixed list of fields, stored once\n\
    per language. The whole file is loaded at startup; lookups never hit the disk.\n\n\
    Examples:\n\
      ipdb query city.ipdb 1.1.1.1 -l EN\n\
      ipdb query city.ipdb 1.1.1.1 240e::1 --schema city\n\
      ipdb inspect city.ipdb --json\n\
      ipdb build networks.tsv -o city.ipdb --fields country_name,city_name --languages CN,EN"
)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up one or more addresses
    Query {
        /// Path to the database (.ipdb, or .ipdb.gz)
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Addresses to look up
        #[arg(value_name = "ADDRESS", required = true)]
        addresses: Vec<String>,

        /// Language block to read
        #[arg(short, long, default_value = "CN")]
        language: String,

        /// Record type to decode into
        #[arg(short, long, value_enum, default_value_t = Schema::Raw)]
        schema: Schema,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Memory-map the database instead of reading it
        #[arg(long)]
        mmap: bool,

        /// Quiet mode - no output, only exit code (0 = all found, 1 = otherwise)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show a database's metadata
    Inspect {
        /// Path to the database
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Output metadata as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Build a database from delimited text
    ///
    /// Each line holds a network (address or CIDR) followed by every field of
    /// the first language, then every field of the next, and so on. Lines
    /// starting with '#' are skipped.
    Build {
        /// Input file (.gz is decompressed, "-" reads stdin)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output database file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Field names, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        fields: Vec<String>,

        /// Language codes, comma-separated, in block order
        #[arg(long, value_delimiter = ',', required = true)]
        languages: Vec<String>,

        /// Input format
        #[arg(short = 'F', long, value_enum, default_value_t = InputFormat::Tsv)]
        input_format: InputFormat,

        /// Build timestamp in seconds since the epoch (default: now)
        #[arg(long)]
        build_time: Option<i64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli_utils::init_logging(cli.verbose);

    match cli.command {
        Commands::Query {
            database,
            addresses,
            language,
            schema,
            format,
            mmap,
            quiet,
        } => cmd_query(QueryArgs {
            database,
            addresses,
            language,
            schema,
            format,
            mmap,
            quiet,
        }),
        Commands::Inspect { database, json } => cmd_inspect(database, json),
        Commands::Build {
            input,
            output,
            fields,
            languages,
            input_format,
            build_time,
        } => cmd_build(BuildArgs {
            input,
            output,
            fields,
            languages,
            input_format,
            build_time,
        }),
    }
}
