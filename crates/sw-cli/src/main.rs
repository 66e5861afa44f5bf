//! Stepwise CLI - versioned SQL migrations with batched data loops

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod context;
mod reporter;

use cli::{Cli, Commands};
use commands::{fake, migrate, show_migrations};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    context::init_logging(cli.global.verbose);

    match &cli.command {
        Commands::Migrate(args) => migrate::execute(args, &cli.global).await,
        Commands::ShowMigrations(args) => show_migrations::execute(args, &cli.global).await,
        Commands::Fake(args) => fake::execute(args, &cli.global).await,
    }
}
