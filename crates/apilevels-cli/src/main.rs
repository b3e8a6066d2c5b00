mod cmd_generate;
mod cmd_query;
mod cmd_validate;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "apilevels")]
#[command(about = "Build and query version-annotated API manifests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Log more (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest observation snapshots, clean, and render the XML manifest
    Generate {
        /// Observations as JSON Lines, one snapshot per line (reads stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (writes to stdout if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Omit `since` on nested tags that match their class
        #[arg(long)]
        compact: bool,

        /// Value of the root `<api version>` attribute
        #[arg(long, default_value_t = 2)]
        api_version: u32,

        /// Run every closure pass on the current thread
        #[arg(long)]
        sequential: bool,
    },
    /// Query the cleaned class hierarchy
    Query {
        #[command(subcommand)]
        op: cmd_query::QueryOp,
    },
    /// Check that an observation file parses and is in version order
    Validate {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate {
            input,
            output,
            compact,
            api_version,
            sequential,
        } => cmd_generate::run(input, output, compact, api_version, sequential),
        Commands::Query { op } => cmd_query::run(op, cli.pretty),
        Commands::Validate { input } => cmd_validate::run(input),
    }
}

/// Log to stderr so the manifest on stdout stays clean.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
