//! Shared CLI utilities

use std::path::{Path, PathBuf};

use flowdecl_core::{Config, FlowdeclError, RealFileSystem, Session};

/// Session type used by every handler.
pub type CliSession = Session<RealFileSystem>;

/// Load config, falling back to defaults with a warning
pub fn load_config() -> Config {
    match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("⚠ Ignoring invalid config: {}", e);
            Config::default()
        }
    }
}

/// Where to find the declaration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// An explicit declaration file
    File(PathBuf),
    /// A workspace directory
    Workspace(PathBuf),
}

/// Pick the declaration from the flags, then the configured workspace, then
/// the current directory.
pub fn resolve_target(
    file: Option<PathBuf>,
    workspace: Option<PathBuf>,
    config: &Config,
    current_dir: &Path,
) -> Target {
    if let Some(file) = file {
        return Target::File(file);
    }
    let dir = workspace
        .or_else(|| config.default_workspace.clone())
        .unwrap_or_else(|| current_dir.to_path_buf());
    Target::Workspace(dir)
}

/// Open a session on the target, printing the error on failure
pub fn open_session(target: &Target, config: &Config) -> Option<CliSession> {
    let result = match target {
        Target::File(path) => Session::open(RealFileSystem, path.clone(), config.clone()),
        Target::Workspace(dir) => Session::open_workspace(RealFileSystem, dir, config.clone()),
    };
    match result {
        Ok(session) => Some(session),
        Err(e) => {
            print_error(&e);
            if let (FlowdeclError::DocumentNotFound(_), Target::Workspace(_)) = (&e, target) {
                eprintln!("  Use --file to name the declaration directly");
            }
            None
        }
    }
}

/// Print an error with the failure prefix
pub fn print_error(e: &FlowdeclError) {
    eprintln!("✗ {}", e);
}

/// Save the session unless this is a dry run
pub fn finish(session: &mut CliSession, dry_run: bool) -> bool {
    if dry_run {
        println!("(dry run) {} not written", session.path().display());
        return true;
    }
    match session.save() {
        Ok(()) => true,
        Err(e) => {
            print_error(&e);
            false
        }
    }
}
