mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Archie: inspect and validate plugin module manifests
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the normalized form of a module manifest as JSON
    Normalize {
        /// Path to the manifest (.json, .yaml, .yml or .toml)
        manifest: PathBuf,
        /// Directory leaf locations are resolved against; defaults to the manifest's directory
        #[arg(long)]
        base: Option<PathBuf>,
    },
    /// Validate a module manifest and report how many services it provides
    Check {
        /// Path to the manifest (.json, .yaml, .yml or .toml)
        manifest: PathBuf,
        #[arg(long)]
        base: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    // Route `log` records from archie-core into tracing
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records: {}", e);
    }

    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {}", e);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    let result = match args.command {
        Commands::Normalize { manifest, base } => cli::normalize(&manifest, base.as_deref()).await,
        Commands::Check { manifest, base } => cli::check(&manifest, base.as_deref()).await,
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::debug!("command failed: {:?}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
