//! # Stockbook CLI Library
//!
//! Command surface of the Stockbook back office: argument parsing, state
//! setup and dispatch to the views.
//!
//! ## Module Organization
//! ```text
//! stockbook_cli/
//! ├── lib.rs          ◄─── You are here (arguments, logging, dispatch)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── client.rs   ◄─── Query client wrapper
//! │   ├── selection.rs◄─── Products picked for a new sale
//! │   └── config.rs   ◄─── Download directory, page size
//! ├── commands/
//! │   ├── mod.rs      ◄─── Table rendering, shared list flags
//! │   ├── product.rs  ◄─── products list|show|add|edit|delete
//! │   ├── sale.rs     ◄─── sales list|show|add|delete|export
//! │   ├── platform.rs ◄─── platforms
//! │   └── backup.rs   ◄─── backup
//! ├── download.rs     ◄─── CSV file download
//! └── error.rs        ◄─── View error type for commands
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse arguments (clap; flags may also come from STOCKBOOK_* vars)   │
//! │  2. Initialize logging (tracing-subscriber, RUST_LOG, stderr)           │
//! │  3. Load QueryConfig: defaults ─► stockbook.toml ─► env ─► --api-url    │
//! │  4. Build state: ClientState, SelectionState, ConfigState               │
//! │  5. Run the command, print the view or the error                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod download;
pub mod error;
pub mod state;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stockbook_query::QueryConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::product::ProductCommand;
use commands::sale::SaleCommand;
use commands::ListArgs;
use error::ViewError;
use state::{ClientState, ConfigState, SelectionState};

/// Inventory and sales back office.
#[derive(Debug, Parser)]
#[command(name = "stockbook", version, about)]
pub struct Cli {
    /// Config file (default: stockbook.toml in the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Where CSV downloads are written
    #[arg(long, global = true, env = "STOCKBOOK_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Rows per page in tables
    #[arg(long, global = true, default_value_t = stockbook_core::listing::DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Products
    Products {
        #[command(subcommand)]
        command: ProductCommand,
    },

    /// Sales
    Sales {
        #[command(subcommand)]
        command: SaleCommand,
    },

    /// Platform table
    Platforms(ListArgs),

    /// Download products and sales as backup_inventario.csv
    Backup,
}

/// Builds state from the global flags and runs the chosen command.
pub async fn run(cli: Cli) -> Result<String, ViewError> {
    let mut query_config = QueryConfig::load(cli.config)?;
    if let Some(url) = cli.api_url {
        query_config.api.base_url = url;
        query_config.validate()?;
    }
    info!(base_url = %query_config.api.base_url, "Using backend");

    let client = ClientState::from_config(&query_config)?;
    let selection = SelectionState::new();
    let config = ConfigState::resolve(cli.download_dir).with_page_size(cli.page_size);

    dispatch(&client, &config, &selection, cli.command).await
}

async fn dispatch(
    client: &ClientState,
    config: &ConfigState,
    selection: &SelectionState,
    command: Command,
) -> Result<String, ViewError> {
    match command {
        Command::Products { command } => commands::product::run(client, config, command).await,
        Command::Sales { command } => {
            commands::sale::run(client, config, selection, command).await
        }
        Command::Platforms(args) => commands::platform::list_platforms(client, config, &args).await,
        Command::Backup => commands::backup::backup_inventory(client, config).await,
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stockbook_query=trace` - Trace the query layer only
/// - Default: INFO, DEBUG for stockbook crates
///
/// Logs go to stderr so views on stdout stay clean.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,stockbook=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
