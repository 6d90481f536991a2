//! noet-refs CLI tool
//!
//! Loads a directory of markdown files, builds the backlink index and prints results as JSON.
//!
//! ## Commands
//!
//! - `backlinks <dir> <key>`: every edge pointing at a reference key (`page`, `page#heading`,
//!   `page#^blockId`)
//! - `page <dir> <file>`: the transformed page view of one file
//! - `decorate <dir> <file>`: reference-count decorations for one file, optionally restricted to
//!   a byte window with `--start`/`--end`
//!
//! Logs go to stderr; set `RUST_LOG` to change their verbosity.

use clap::{Parser, Subcommand};
use noet_refs::{
    codec::load_vault,
    config::{ConfigProvider, RefConfig, TomlConfigProvider},
    service::ReferenceService,
    RefIndexError,
};
use serde::Serialize;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Parser)]
#[command(name = "noet-refs")]
#[command(author, version, about = "Backlink counts for a directory of markdown documents", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults apply when missing)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the backlinks of a reference key
    Backlinks {
        /// Vault root directory
        dir: PathBuf,
        /// Reference key, e.g. `Notes/Plan#Goals` or `A#^blk1`
        key: String,
    },

    /// Show the transformed page view of a file
    Page {
        /// Vault root directory
        dir: PathBuf,
        /// Vault-relative file path, e.g. `Notes/Plan.md`
        file: String,
    },

    /// Compute reference-count decorations for a file
    Decorate {
        /// Vault root directory
        dir: PathBuf,
        /// Vault-relative file path
        file: String,
        /// Window start (byte offset)
        #[arg(long)]
        start: Option<usize>,
        /// Window end (byte offset, exclusive)
        #[arg(long)]
        end: Option<usize>,
    },
}

fn open_service(dir: &Path, config: RefConfig) -> Result<ReferenceService, RefIndexError> {
    let vault = Arc::new(load_vault(dir)?);
    let mut service = ReferenceService::new(config, vault.clone(), vault)?;
    service.rebuild();
    Ok(service)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), RefIndexError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_ref() {
        Some(path) => TomlConfigProvider::new(path.clone()).get_config()?,
        None => RefConfig::default(),
    };

    match cli.command {
        Commands::Backlinks { dir, key } => {
            let service = open_service(&dir, config)?;
            print_json(&service.lookup(&key), cli.pretty)?;
        }
        Commands::Page { dir, file } => {
            let mut service = open_service(&dir, config)?;
            let page = service.get_page(&file)?;
            print_json(page.as_ref(), cli.pretty)?;
        }
        Commands::Decorate {
            dir,
            file,
            start,
            end,
        } => {
            let mut service = open_service(&dir, config)?;
            let viewport = match (start, end) {
                (None, None) => None,
                (start, end) => Some(start.unwrap_or(0)..end.unwrap_or(usize::MAX)),
            };
            let decorations = service.compute_decorations(&file, viewport)?;
            print_json(&decorations, cli.pretty)?;
        }
    }
    Ok(())
}
