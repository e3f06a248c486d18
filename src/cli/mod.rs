//! CLI module for Concierge
//!
//! Provides commands:
//! - `chat`: Talk to the concierge from the terminal
//! - `actions`: List the actions the backend declares

use clap::{Parser, Subcommand};

use crate::loader;

pub mod actions;
pub mod chat;
pub mod view;

/// Concierge chat widget CLI
#[derive(Parser, Debug)]
#[command(name = "concierge")]
#[command(about = "Terminal host for the hotel concierge chat widget")]
#[command(version)]
pub struct Cli {
    /// Backend origin, e.g. https://hotel.example (overrides config)
    #[arg(long, global = true)]
    pub origin: Option<String>,

    /// Locale for actions and built-in texts (overrides config)
    #[arg(long, global = true)]
    pub locale: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Keep the session token in memory only
        #[arg(long)]
        ephemeral: bool,
    },
    /// Fetch and list action definitions
    Actions,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let mut config = loader::load_config()?;
    if let Some(origin) = cli.origin {
        config.origin = origin;
    }
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }
    config.validate()?;

    match command {
        Commands::Chat { ephemeral } => chat::run(config, ephemeral).await,
        Commands::Actions => actions::run(config).await,
    }
}
