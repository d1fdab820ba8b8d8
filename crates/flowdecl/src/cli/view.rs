//! Read-only command handlers: `tree`, `show`, `orphans`

use flowdecl_core::{Command, Response, Selection};

use crate::cli::util::{CliSession, print_error};

/// Print the document outline
pub fn handle_tree(session: &mut CliSession) -> bool {
    match session.execute(Command::GetOutline) {
        Ok(Response::Outline(outline)) => {
            print!("{}", outline.format());
            true
        }
        Ok(other) => unexpected(other),
        Err(e) => {
            print_error(&e);
            false
        }
    }
}

/// Print a property's editor rows, or the document summary
pub fn handle_show(session: &mut CliSession, key: Option<String>, json: bool) -> bool {
    let selection = match session.execute(Command::Select { key: key.clone() }) {
        Ok(Response::Selection(selection)) => selection,
        Ok(other) => return unexpected(other),
        Err(e) => {
            print_error(&e);
            return false;
        }
    };

    match selection {
        Selection::Root(summary) => {
            if let Some(key) = key {
                eprintln!("⚠ No property '{}', showing the document", key);
            }
            if json {
                return print_json(&summary);
            }
            println!("{}", summary.name);
            println!("  File: {}", summary.path.display());
            println!("  Element properties: {}", summary.element_count);
            println!("  Connection properties: {}", summary.connection_count);
            true
        }
        Selection::Property(property) => {
            let view = match session.view(property.scope, &property.key) {
                Ok(view) => view,
                Err(e) => {
                    print_error(&e);
                    return false;
                }
            };
            if json {
                return print_json(&view);
            }
            let width = view.rows.iter().map(|r| r.label.len()).max().unwrap_or(0);
            println!("{} ({} scope)", view.key, view.scope);
            for row in &view.rows {
                println!("  {:width$}  {}", row.label, row.value, width = width);
            }
            if let Some(dep) = property.dependency()
                && !session.catalog().contains(property.scope, dep)
            {
                println!("  ⚠ depends on missing property '{}'", dep);
            }
            true
        }
    }
}

/// List orphaned properties
pub fn handle_orphans(session: &mut CliSession) -> bool {
    match session.execute(Command::GetOrphans { scope: None }) {
        Ok(Response::Orphans(orphans)) => {
            if orphans.is_empty() {
                println!("✓ No orphaned properties");
                return true;
            }
            for property in &orphans {
                println!(
                    "{} ({}) depends on missing '{}'",
                    property.key,
                    property.scope,
                    property.dependency().unwrap_or_default()
                );
            }
            true
        }
        Ok(other) => unexpected(other),
        Err(e) => {
            print_error(&e);
            false
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            true
        }
        Err(e) => {
            eprintln!("✗ Failed to encode JSON: {}", e);
            false
        }
    }
}

fn unexpected(response: Response) -> bool {
    eprintln!("✗ Unexpected response: {:?}", response);
    false
}
