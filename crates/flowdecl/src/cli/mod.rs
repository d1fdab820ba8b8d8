//! Command-line front end over the flowdecl session API.

/// Clap argument definitions
mod args;

/// Config command handlers
mod config;

/// `add`, `remove`, `duplicate`, `move-up`, `move-down`, `set`
mod property;

/// Shared CLI utilities
mod util;

/// `tree`, `show`, `orphans`
mod view;

use clap::Parser;
use std::path::PathBuf;

use flowdecl_core::Direction;

pub use args::Cli;
use args::Commands;
use util::CliSession;

/// Main entry point for the CLI
pub fn run_cli() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = util::load_config();

    let success = match cli.command {
        Commands::Config { command } => config::handle_config_command(command, &config),
        command => {
            let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let target = util::resolve_target(cli.file, cli.workspace, &config, &current_dir);
            match util::open_session(&target, &config) {
                Some(mut session) => {
                    let success = run_command(&mut session, command, cli.dry_run);
                    session.close();
                    success
                }
                None => false,
            }
        }
    };

    if !success {
        std::process::exit(1);
    }
}

/// Dispatch a document command
fn run_command(session: &mut CliSession, command: Commands, dry_run: bool) -> bool {
    match command {
        Commands::Tree => view::handle_tree(session),

        Commands::Show { key, json } => view::handle_show(session, key, json),

        Commands::Orphans => view::handle_orphans(session),

        Commands::Add {
            scope,
            name,
            attributes,
        } => property::handle_add(session, scope, &name, attributes, dry_run),

        Commands::Remove { key, scope } => property::handle_remove(session, &key, scope, dry_run),

        Commands::Duplicate {
            old_key,
            new_key,
            scope,
        } => property::handle_duplicate(session, &old_key, &new_key, scope, dry_run),

        Commands::MoveUp { key, scope } => {
            property::handle_move(session, &key, scope, Direction::Previous, dry_run)
        }

        Commands::MoveDown { key, scope } => {
            property::handle_move(session, &key, scope, Direction::Next, dry_run)
        }

        Commands::Set {
            key,
            field,
            value,
            scope,
        } => property::handle_set(session, &key, &field, &value, scope, dry_run),

        Commands::Config { .. } => {
            log::debug!("config handled before opening a session");
            true
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
