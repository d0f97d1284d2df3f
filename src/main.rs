use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{warn, Level};

use unityquill::commands::{run_decode, run_extract, run_normalize};
use unityquill::config::Config;

/// UnityQuill - Normalize and query Unity YAML asset files
#[derive(Parser)]
#[command(name = "unityquill")]
#[command(version)]
#[command(about = "Normalize and query Unity YAML asset files", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract graph data: spawners, nodes or property
    Extract {
        /// What to extract (spawners, nodes, property)
        kind: String,

        /// Unity asset file (.asset, .prefab, .unity, optionally gzipped)
        file: PathBuf,

        /// Property name, required for `property` extraction
        #[arg(short, long)]
        property: Option<String>,
    },

    /// Decode the asset and print each document as standard YAML
    Decode {
        /// Unity asset file
        file: PathBuf,
    },

    /// Print the asset rewritten into standard YAML, without decoding it
    Normalize {
        /// Unity asset file
        file: PathBuf,
    },
}

/// The -v count wins over the configured level; an unknown level means warn.
fn log_level(verbose: u8, config: &Config) -> Level {
    match verbose {
        0 => config.log_level.parse().unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = Config::try_load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(log_level(cli.verbose, &config))
        .with_target(false)
        .init();

    // Reported only now so the subscriber is there to print it.
    if let Err(err) = &loaded {
        warn!("{:#}, using defaults", err);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Extract {
            kind,
            file,
            property,
        } => run_extract(
            &kind,
            &file,
            property.as_deref(),
            &config.property_catalog(),
            &mut out,
        )?,
        Command::Decode { file } => run_decode(&file, &mut out)?,
        Command::Normalize { file } => run_normalize(&file, &mut out)?,
    }

    out.flush()?;
    Ok(())
}
