//! # Stockbook Entry Point
//!
//! ```text
//! $ stockbook products list --sort price --desc
//! $ stockbook sales add --client Ana --product p1 --quantity p1=2
//! $ stockbook backup --download-dir ~/exports
//! ```
//!
//! The setup lives in lib.rs so it can be tested.

use std::process::ExitCode;

use clap::Parser;
use stockbook_cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    stockbook_cli::init_tracing();

    match stockbook_cli::run(cli).await {
        Ok(view) => {
            println!("{}", view);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error {}", err);
            ExitCode::FAILURE
        }
    }
}
