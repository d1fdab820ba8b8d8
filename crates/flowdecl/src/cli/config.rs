//! Config command handlers

use std::path::PathBuf;

use flowdecl_core::Config;

use crate::cli::args::ConfigCommands;

/// Handle the config command
pub fn handle_config_command(command: Option<ConfigCommands>, config: &Config) -> bool {
    match command {
        None | Some(ConfigCommands::Show) => {
            show_config(config);
            true
        }
        Some(ConfigCommands::Init {
            default_workspace,
            indent,
        }) => init_config(config, default_workspace, indent),
    }
}

/// Show the effective configuration
fn show_config(config: &Config) {
    println!("Flowdecl Configuration");
    println!("======================");
    match &config.default_workspace {
        Some(ws) => println!("Default workspace: {}", ws.display()),
        None => println!("Default workspace: (current directory)"),
    }
    println!("Indent: {}", config.indent);
    if !config.extra_structural_fields.is_empty() {
        println!(
            "Extra structural fields: {}",
            config.extra_structural_fields.join(", ")
        );
    }
    for (label, defaults) in [
        ("Element defaults", &config.element_defaults),
        ("Connection defaults", &config.connection_defaults),
    ] {
        if let Some(defaults) = defaults {
            let pairs: Vec<String> = defaults.iter().map(|(k, v)| format!("{k}={v}")).collect();
            println!("{}: {}", label, pairs.join(", "));
        }
    }
    match Config::config_path() {
        Some(path) if path.exists() => println!("Config file: {}", path.display()),
        Some(path) => println!("Config file: {} (not created)", path.display()),
        None => println!("Config file: (no config directory)"),
    }
}

/// Write the config file, keeping existing values not overridden
fn init_config(config: &Config, default_workspace: Option<PathBuf>, indent: Option<usize>) -> bool {
    let mut config = config.clone();
    if let Some(ws) = default_workspace {
        let ws = std::fs::canonicalize(&ws).unwrap_or(ws);
        config.default_workspace = Some(ws);
    }
    if let Some(indent) = indent {
        config.indent = indent;
    }

    match config.save() {
        Ok(()) => {
            match Config::config_path() {
                Some(path) => println!("✓ Wrote {}", path.display()),
                None => println!("✓ Configuration saved"),
            }
            true
        }
        Err(e) => {
            eprintln!("✗ Error saving config: {}", e);
            false
        }
    }
}
