mod apikey;
mod cli;
mod commands;
mod engine;
mod paths;
mod progress;
mod recyclarr;
mod runner;
mod schema;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// State document path
    pub config: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config_path(),
    };
    log::debug!("Using state document {}", ctx.config.display());

    match cli.command {
        Command::Plan(args) => commands::plan::run(&ctx, args.user.as_deref()),
        Command::Apply(args) => commands::apply::run(
            &ctx,
            args.user.as_deref(),
            &commands::apply::ApplyOptions {
                dry_run: args.dry_run,
                yes: args.yes,
            },
        ),
        Command::Status(args) => commands::status::run(&ctx, args.user.as_deref()),
        Command::Import { username } => commands::import::run(&ctx, &username),
        Command::ForgetKey { container } => commands::forget_key::run(&ctx, &container),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "arr-sync", &mut io::stdout());
            Ok(())
        }
    }
}
