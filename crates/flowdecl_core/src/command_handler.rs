//! Command execution handler.
//!
//! This module contains the implementation of the `execute()` method for
//! [`Session`]. It maps each [`Command`] to a session operation and wraps the
//! result in a [`Response`].

use crate::command::{Command, Response};
use crate::document::{Attributes, Scope};
use crate::error::Result;
use crate::fs::FileSystem;
use crate::session::Session;

impl<FS: FileSystem> Session<FS> {
    /// Execute a command and return the response.
    ///
    /// Key-only commands find the property's scope with
    /// [`Session::resolve_scope`], so the element scope wins when a key
    /// exists in both unless a scope is given.
    pub fn execute(&mut self, command: Command) -> Result<Response> {
        log::debug!("Executing {:?}", command);
        match command {
            // === Selection ===
            Command::Select { key } => Ok(Response::Selection(self.select(key.as_deref()))),

            // === Structural edits ===
            Command::Add {
                scope,
                name,
                attributes,
            } => {
                self.add(scope, &name, attributes.map(Attributes::from))?;
                Ok(Response::Ok)
            }

            Command::Remove { key, scope } => {
                let scope = self.resolve_scope(&key, scope)?;
                let orphaned = self.remove(scope, &key)?;
                Ok(Response::Keys(orphaned))
            }

            Command::Duplicate {
                old_key,
                new_key,
                scope,
            } => {
                let scope = self.resolve_scope(&old_key, scope)?;
                self.duplicate(scope, &old_key, &new_key)?;
                Ok(Response::Ok)
            }

            Command::MoveUp { key, scope } => {
                let scope = self.resolve_scope(&key, scope)?;
                Ok(Response::Bool(self.move_up(scope, &key)?))
            }

            Command::MoveDown { key, scope } => {
                let scope = self.resolve_scope(&key, scope)?;
                Ok(Response::Bool(self.move_down(scope, &key)?))
            }

            // === Persistence ===
            Command::Save => {
                self.save()?;
                Ok(Response::Saved(self.path().to_path_buf()))
            }

            Command::Reload => {
                self.reload()?;
                Ok(Response::Ok)
            }

            // === Editing ===
            Command::PropertyFieldChanged { key, field, value } => {
                let changed = self.property_field_changed(&key, &field, &value)?;
                Ok(Response::Keys(changed))
            }

            // === Queries ===
            Command::GetProperty { key, scope } => {
                let scope = self.resolve_scope(&key, scope)?;
                Ok(Response::Property(self.view(scope, &key)?))
            }

            Command::GetOutline => Ok(Response::Outline(self.outline()?)),

            Command::GetOrphans { scope } => {
                let scopes = match scope {
                    Some(scope) => vec![scope],
                    None => Scope::ALL.to_vec(),
                };
                let orphans = scopes
                    .into_iter()
                    .flat_map(|s| self.catalog.orphans(s))
                    .cloned()
                    .collect();
                Ok(Response::Orphans(orphans))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowdeclError;
    use crate::session::Selection;
    use crate::test_utils::{ABC_XML, sample_session, session_from};

    #[test]
    fn test_commands_deserialize_from_json() {
        let cmd: Command = serde_json::from_str(
            r#"{"type":"Add","params":{"scope":"connection","name":"Color"}}"#,
        )
        .unwrap();
        assert!(matches!(cmd, Command::Add { scope: Scope::Connection, .. }));
        assert!(cmd.is_mutation());

        let cmd: Command = serde_json::from_str(r#"{"type":"Select","params":{}}"#).unwrap();
        assert!(matches!(cmd, Command::Select { key: None }));

        let cmd: Command = serde_json::from_str(r#"{"type":"Save"}"#).unwrap();
        assert!(!cmd.is_mutation());
    }

    #[test]
    fn test_select_and_get_property() {
        let mut session = sample_session();
        let response = session
            .execute(Command::Select {
                key: Some("Priority".into()),
            })
            .unwrap();
        assert!(matches!(response, Response::Selection(Selection::Property(_))));

        let response = session
            .execute(Command::GetProperty {
                key: "Priority".into(),
                scope: None,
            })
            .unwrap();
        match response {
            Response::Property(view) => {
                assert_eq!(view.scope, Scope::Connection);
                assert_eq!(view.value("Validation"), Some("Standard"));
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn test_remove_reports_orphans() {
        let mut session = session_from(ABC_XML);
        let response = session
            .execute(Command::Remove {
                key: "A".into(),
                scope: None,
            })
            .unwrap();
        assert!(matches!(response, Response::Keys(ref k) if k == &vec!["B".to_string()]));

        match session.execute(Command::GetOrphans { scope: None }).unwrap() {
            Response::Orphans(orphans) => {
                assert_eq!(orphans.len(), 1);
                assert_eq!(orphans[0].key, "B");
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn test_move_commands_report_whether_moved() {
        let mut session = session_from(ABC_XML);
        let moved = session
            .execute(Command::MoveDown {
                key: "A".into(),
                scope: None,
            })
            .unwrap();
        assert!(matches!(moved, Response::Bool(true)));

        let moved = session
            .execute(Command::MoveDown {
                key: "A".into(),
                scope: None,
            })
            .unwrap();
        assert!(matches!(moved, Response::Bool(false)));
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let mut session = sample_session();
        let err = session
            .execute(Command::Duplicate {
                old_key: "Nope".into(),
                new_key: "Other".into(),
                scope: None,
            })
            .unwrap_err();
        assert!(matches!(err, FlowdeclError::NotFound { scope: None, .. }));
    }

    #[test]
    fn test_field_change_and_save() {
        let mut session = sample_session();
        session
            .execute(Command::Select {
                key: Some("Mode".into()),
            })
            .unwrap();
        let response = session
            .execute(Command::PropertyFieldChanged {
                key: "Mode".into(),
                field: "Default".into(),
                value: "Copy".into(),
            })
            .unwrap();
        assert!(matches!(response, Response::Keys(ref k) if k == &vec!["Default".to_string()]));

        let response = session.execute(Command::Save).unwrap();
        assert!(matches!(response, Response::Saved(_)));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_outline_response_serializes() {
        let mut session = sample_session();
        let response = session.execute(Command::GetOutline).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "Outline");
        assert_eq!(json["data"]["name"], "Archive mover");
        assert_eq!(json["data"]["element"][0]["key"], "Folder");
    }
}
