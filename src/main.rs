mod build;
mod cli;
mod commands;
mod error;
mod mcp;
mod page_range;
mod pdf;
mod rotation;
mod session;
mod source;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries command output and the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("pdfbuild={}", level)))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Scan { folder } => {
            commands::scan::run(&folder)?;
        }
        Commands::Pages { path } => {
            commands::pages::run(&path)?;
        }
        Commands::Resolve { range, target } => {
            commands::resolve::run(&range, &target)?;
        }
        Commands::Add {
            project,
            path,
            range,
            rotate,
        } => {
            commands::edit::add(&project, &path, &range, rotate)?;
        }
        Commands::List { project } => {
            commands::edit::list(&project)?;
        }
        Commands::Move {
            project,
            index,
            direction,
        } => {
            commands::edit::move_entry(&project, index, direction)?;
        }
        Commands::Remove { project, index } => {
            commands::edit::remove(&project, index)?;
        }
        Commands::Clear { project } => {
            commands::edit::clear(&project)?;
        }
        Commands::Export { project, output } => {
            commands::export::run(&project, &output)?;
        }
    }

    Ok(())
}
