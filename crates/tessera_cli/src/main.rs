//! Tessera CLI: inspection and maintenance of an incremental artifact cache.
//!
//! Provides `tessera dump` to list stored records, `tessera header` to show
//! the cache header, `tessera symbols` to print the symbols a metadata blob
//! declares, and `tessera clean` to reset the cache.

#![warn(missing_docs)]

mod clean;
mod dump;
mod header;
mod project;
mod symbols;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Tessera: incremental compilation artifact cache.
#[derive(Parser, Debug)]
#[command(name = "tessera", version, about = "Tessera artifact cache tools")]
pub struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a `tessera.toml` file or the directory containing it.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Cache directory, overriding the configured one.
    #[arg(long, global = true)]
    pub cache_dir: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every stored artifact record.
    Dump(DumpArgs),
    /// Show the cache header.
    Header,
    /// Print the symbols declared by a metadata file.
    Symbols(SymbolsArgs),
    /// Drop every stored record and the header.
    Clean,
}

/// Arguments for the `tessera dump` subcommand.
#[derive(Parser, Debug)]
pub struct DumpArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for the `tessera symbols` subcommand.
#[derive(Parser, Debug)]
pub struct SymbolsArgs {
    /// File holding encoded structural metadata.
    pub metadata_file: String,

    /// Source path the metadata belongs to (default: the metadata file).
    #[arg(long)]
    pub source: Option<String>,
}

/// Output format of `tessera dump`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to log at debug level.
    pub verbose: bool,
    /// Optional path to a configuration file or its directory.
    pub config: Option<String>,
    /// Optional cache directory override.
    pub cache_dir: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let global = GlobalArgs {
        verbose: cli.verbose,
        config: cli.config,
        cache_dir: cli.cache_dir,
    };

    let result = match cli.command {
        Command::Dump(ref args) => dump::run(args, &global),
        Command::Header => header::run(&global),
        Command::Symbols(ref args) => symbols::run(args),
        Command::Clean => clean::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
