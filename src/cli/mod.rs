//! CLI module for Showrunner
//!
//! Provides operator commands:
//! - `episodes` / `shows`: browse the catalog
//! - `run`: drive a script or audio workflow and follow it live
//! - `audit`, `finalize`, `reset`: episode lifecycle
//! - `watch`: print realtime progress for an episode
//! - `env`: show which backend environment is connected

use crate::config::AppConfig;
use crate::context::AppContext;
use clap::{Args, Parser, Subcommand};
use showrunner_core::{PhaseId, WorkflowKind};

pub mod catalog;
pub mod env;
pub mod lifecycle;
pub mod run;
pub mod watch;

/// Showrunner operator console
#[derive(Parser, Debug)]
#[command(name = "showrunner")]
#[command(about = "Operator console for AI-generated show production")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse episodes
    #[command(subcommand)]
    Episodes(EpisodeCommand),
    /// Browse shows
    #[command(subcommand)]
    Shows(ShowCommand),
    /// Run a generation workflow and follow it until it finishes
    Run(RunArgs),
    /// Check an episode for missing or inconsistent assets
    Audit {
        /// Episode id
        episode: String,
    },
    /// Mark an episode as finished
    Finalize {
        /// Episode id
        episode: String,
    },
    /// Clear generated script and audio so the workflows can start over
    Reset {
        /// Episode id
        episode: String,
    },
    /// Print realtime progress for an episode until interrupted
    Watch {
        /// Episode id
        episode: String,
    },
    /// Show the backend environment mode
    Env {
        /// Keep re-checking until interrupted
        #[arg(long)]
        follow: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum EpisodeCommand {
    /// List episodes
    List(EpisodeFilter),
    /// Show one episode with its workflow status
    Show {
        /// Episode id
        episode: String,
    },
}

#[derive(Args, Debug)]
pub struct EpisodeFilter {
    /// Only episodes of this show
    #[arg(long)]
    pub show: Option<String>,
    /// Filter by status
    #[arg(long)]
    pub status: Option<String>,
    /// Search title and logline
    #[arg(long)]
    pub search: Option<String>,
    /// Only this season
    #[arg(long)]
    pub season: Option<u32>,
    /// Page, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Page size
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum ShowCommand {
    /// List shows
    List {
        /// Search by name
        #[arg(long)]
        search: Option<String>,
        /// Page, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List the characters of a show
    Characters {
        /// Show id
        show: String,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Episode id
    pub episode: String,
    /// Workflow to drive: script or audio
    #[arg(long, short)]
    pub workflow: WorkflowKind,
    /// Run a single phase instead of the whole workflow
    #[arg(long, short)]
    pub phase: Option<PhaseId>,
}

/// Run the CLI command
pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let ctx = AppContext::new(config)?;
    crate::shutdown::cancel_on_signal(ctx.shutdown.clone());

    match command {
        Commands::Episodes(EpisodeCommand::List(filter)) => catalog::list_episodes(&ctx, filter).await,
        Commands::Episodes(EpisodeCommand::Show { episode }) => {
            catalog::show_episode(&ctx, &episode).await
        }
        Commands::Shows(ShowCommand::List { search, page }) => {
            catalog::list_shows(&ctx, search, page).await
        }
        Commands::Shows(ShowCommand::Characters { show }) => {
            catalog::list_characters(&ctx, &show).await
        }
        Commands::Run(args) => run::run(&ctx, args).await,
        Commands::Audit { episode } => lifecycle::audit(&ctx, &episode).await,
        Commands::Finalize { episode } => lifecycle::finalize(&ctx, &episode).await,
        Commands::Reset { episode } => lifecycle::reset(&ctx, &episode).await,
        Commands::Watch { episode } => watch::run(&ctx, &episode).await,
        Commands::Env { follow } => env::run(&ctx, follow).await,
    }
}
