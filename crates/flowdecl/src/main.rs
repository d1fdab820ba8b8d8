//! `flowdecl` - edit flow element declaration files from the command line.

/// CLI module - command-line interface for flowdecl
mod cli;

fn main() {
    cli::run_cli();
}
