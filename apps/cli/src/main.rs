//! orphanscan CLI: find orphan pages on a site.
//!
//! Imports a site snapshot into a local database, reconciles every published
//! page against the links found in content, redirect fields and menus, and
//! reports the pages nothing links to.

mod commands;
mod export;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
