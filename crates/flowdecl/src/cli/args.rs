//! Command-line argument structures and enums

use clap::{Parser, Subcommand};
use flowdecl_core::Scope;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flowdecl")]
#[command(version)]
#[command(about = "Edit flow element declaration files as a property hierarchy", long_about = None)]
pub struct Cli {
    /// Declaration file to edit
    #[arg(short, long, global = true, conflicts_with = "workspace")]
    pub file: Option<PathBuf>,

    /// Workspace directory; its declaration is <dir>/<dir name>.xml
    #[arg(short, long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Log what the core is doing
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Show what would change without writing the file
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show both property hierarchies
    #[command(alias = "t")]
    Tree,

    /// Show a property's fields, or the document summary
    Show {
        /// Property key (element scope is searched first)
        key: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a property with the scope's default attributes
    #[command(alias = "a")]
    Add {
        /// Scope: element or connection
        #[arg(value_parser = parse_scope)]
        scope: Scope,

        /// Key of the new property
        name: String,

        /// Attribute to set instead of the defaults (repeatable)
        #[arg(short = 'a', long = "attr", value_name = "NAME=VALUE", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,
    },

    /// Remove a property (dependents are kept)
    #[command(alias = "rm")]
    Remove {
        /// Property key
        key: String,

        /// Scope override
        #[arg(short, long, value_parser = parse_scope)]
        scope: Option<Scope>,
    },

    /// Copy a property under a new key
    #[command(alias = "dup")]
    Duplicate {
        /// Source key
        old_key: String,

        /// Key of the copy
        new_key: String,

        /// Scope override
        #[arg(short, long, value_parser = parse_scope)]
        scope: Option<Scope>,
    },

    /// Move a top-level property before its previous sibling
    MoveUp {
        /// Property key
        key: String,

        /// Scope override
        #[arg(short, long, value_parser = parse_scope)]
        scope: Option<Scope>,
    },

    /// Move a top-level property after its next sibling
    MoveDown {
        /// Property key
        key: String,

        /// Scope override
        #[arg(short, long, value_parser = parse_scope)]
        scope: Option<Scope>,
    },

    /// Set one field of a property
    Set {
        /// Property key
        key: String,

        /// Field (attribute name, e.g. Tooltip or Dependency)
        field: String,

        /// New value
        value: String,

        /// Scope override
        #[arg(short, long, value_parser = parse_scope)]
        scope: Option<Scope>,
    },

    /// List properties whose dependency no longer exists
    Orphans,

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,

    /// Write a configuration file
    Init {
        /// Workspace used when neither --file nor --workspace is given
        #[arg(short = 'd', long)]
        default_workspace: Option<PathBuf>,

        /// Indentation width for written files
        #[arg(long)]
        indent: Option<usize>,
    },
}

fn parse_scope(s: &str) -> Result<Scope, String> {
    s.parse::<Scope>().map_err(|e| e.to_string())
}

/// Parse `NAME=VALUE`
pub fn parse_attribute(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{s}'")),
    }
}
