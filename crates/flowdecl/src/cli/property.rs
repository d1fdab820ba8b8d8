//! Property edit handlers: add, remove, duplicate, move, set

use indexmap::IndexMap;

use flowdecl_core::{Command, Direction, Response, Scope};

use crate::cli::util::{CliSession, finish, print_error};

/// Handle `add`
pub fn handle_add(
    session: &mut CliSession,
    scope: Scope,
    name: &str,
    attributes: Vec<(String, String)>,
    dry_run: bool,
) -> bool {
    let attributes = if attributes.is_empty() {
        None
    } else {
        Some(attributes.into_iter().collect::<IndexMap<_, _>>())
    };
    let command = Command::Add {
        scope,
        name: name.to_string(),
        attributes,
    };
    match session.execute(command) {
        Ok(_) => {
            println!("✓ Added {} property '{}'", scope, name);
            finish(session, dry_run)
        }
        Err(e) => {
            print_error(&e);
            false
        }
    }
}

/// Handle `remove`
pub fn handle_remove(session: &mut CliSession, key: &str, scope: Option<Scope>, dry_run: bool) -> bool {
    let command = Command::Remove {
        key: key.to_string(),
        scope,
    };
    match session.execute(command) {
        Ok(Response::Keys(orphaned)) => {
            println!("✓ Removed '{}'", key);
            if !orphaned.is_empty() {
                println!("  ⚠ Now orphaned: {}", orphaned.join(", "));
            }
            finish(session, dry_run)
        }
        Ok(_) => {
            println!("✓ Removed '{}'", key);
            finish(session, dry_run)
        }
        Err(e) => {
            print_error(&e);
            false
        }
    }
}

/// Handle `duplicate`
pub fn handle_duplicate(
    session: &mut CliSession,
    old_key: &str,
    new_key: &str,
    scope: Option<Scope>,
    dry_run: bool,
) -> bool {
    let command = Command::Duplicate {
        old_key: old_key.to_string(),
        new_key: new_key.to_string(),
        scope,
    };
    match session.execute(command) {
        Ok(_) => {
            println!("✓ Duplicated '{}' as '{}'", old_key, new_key);
            finish(session, dry_run)
        }
        Err(e) => {
            print_error(&e);
            false
        }
    }
}

/// Handle `move-up` / `move-down`
pub fn handle_move(
    session: &mut CliSession,
    key: &str,
    scope: Option<Scope>,
    direction: Direction,
    dry_run: bool,
) -> bool {
    let key = key.to_string();
    let command = match direction {
        Direction::Previous => Command::MoveUp { key: key.clone(), scope },
        Direction::Next => Command::MoveDown { key: key.clone(), scope },
    };
    match session.execute(command) {
        Ok(Response::Bool(true)) => {
            println!("✓ Moved '{}'", key);
            finish(session, dry_run)
        }
        Ok(_) => {
            // Not top-level, or already at the edge
            println!("'{}' was not moved", key);
            true
        }
        Err(e) => {
            print_error(&e);
            false
        }
    }
}

/// Handle `set`
pub fn handle_set(
    session: &mut CliSession,
    key: &str,
    field: &str,
    value: &str,
    scope: Option<Scope>,
    dry_run: bool,
) -> bool {
    let result = match scope {
        Some(scope) => session.view(scope, key).and_then(|view| {
            let mut changes = IndexMap::new();
            changes.insert(field.to_string(), value.to_string());
            session.apply_field_changes(&view, &changes)
        }),
        None => session
            .resolve_scope(key, None)
            .and_then(|_| {
                session.execute(Command::Select {
                    key: Some(key.to_string()),
                })
            })
            .and_then(|_| {
                session.execute(Command::PropertyFieldChanged {
                    key: key.to_string(),
                    field: field.to_string(),
                    value: value.to_string(),
                })
            })
            .map(|response| match response {
                Response::Keys(changed) => changed,
                _ => Vec::new(),
            }),
    };

    match result {
        Ok(changed) if changed.is_empty() => {
            println!("'{}' already has {} = {}", key, field, value);
            true
        }
        Ok(_) => {
            println!("✓ Set {} on '{}' to '{}'", field, key, value);
            finish(session, dry_run)
        }
        Err(e) => {
            print_error(&e);
            false
        }
    }
}
