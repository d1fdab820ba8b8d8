//! Integration tests for editing sessions over the real filesystem

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use flowdecl_core::{
    Command, Config, Direction, FlowdeclError, RealFileSystem, Response, Scope, Selection,
    Session, document,
};
use tempfile::TempDir;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Object Format="2">
  <ElementFields>
    <Name>Splitter</Name>
    <Version>7</Version>
    <Description>Splits jobs by size</Description>
    <Threshold Editor="inline" LocalizedTagName="Threshold" Default="10" Type="number"/>
    <Unit Editor="dropdown" LocalizedTagName="Unit" Dependency="Threshold" DependencyCondition="Not equal" Dependencyvalue="0">MB</Unit>
    <Strategy Editor="dropdown" LocalizedTagName="Strategy" Weight="4"/>
    <Connections>
      <Connection Type="Traffic light"/>
    </Connections>
  </ElementFields>
  <ConnectionFields>
    <Order Editor="inline" LocalizedTagName="Order" Validation="Integer"/>
  </ConnectionFields>
  <Footer>kept</Footer>
</Object>
"#;

/// Create a workspace directory `<tmp>/Splitter` holding `Splitter.xml`.
fn workspace(content: &str) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("Splitter");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("Splitter.xml"), content).unwrap();
    (temp, dir)
}

fn open(dir: &Path) -> Session<RealFileSystem> {
    Session::open_workspace(RealFileSystem, dir, Config::default()).unwrap()
}

fn keys(session: &Session<RealFileSystem>, scope: Scope) -> Vec<String> {
    session.catalog().list(scope).map(|p| p.key.clone()).collect()
}

#[test]
fn test_open_edit_save_reopen() {
    let (_temp, dir) = workspace(DECLARATION);
    let mut session = open(&dir);
    assert_eq!(keys(&session, Scope::Element), vec!["Threshold", "Unit", "Strategy"]);

    session.add(Scope::Element, "Foo", None).unwrap();
    session.duplicate(Scope::Element, "Foo", "Foo_copy").unwrap();
    session.remove(Scope::Element, "Foo").unwrap();
    session.move_up(Scope::Element, "Strategy").unwrap();
    session.save().unwrap();

    let reopened = open(&dir);
    assert_eq!(
        keys(&reopened, Scope::Element),
        vec!["Strategy", "Unit", "Threshold", "Foo_copy"]
    );
    let copy = reopened.catalog().get(Scope::Element, "Foo_copy").unwrap();
    assert_eq!(copy.attributes().tag_name(), Some("Foo"));
    assert_eq!(copy.attributes().get("UserDefined"), Some("true"));

    let text = fs::read_to_string(dir.join("Splitter.xml")).unwrap();
    assert!(text.contains("<Description>Splits jobs by size</Description>"));
    assert!(text.contains("<Footer>kept</Footer>"));
    assert!(text.contains(r#"<Connection Type="Traffic light"/>"#));
    assert!(text.contains(r#"<Object Format="2">"#));
}

#[test]
fn test_round_trip_is_stable() {
    let (_temp, dir) = workspace(DECLARATION);
    let mut session = open(&dir);
    let original = session.document().clone();

    session.save().unwrap();
    let first = fs::read_to_string(dir.join("Splitter.xml")).unwrap();
    assert_eq!(document::load(&first).unwrap(), original);

    let mut again = open(&dir);
    again.save().unwrap();
    let second = fs::read_to_string(dir.join("Splitter.xml")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_scenario_move_parent_down() {
    let (_temp, dir) = workspace(
        r#"<Object><ElementFields><A/><B Dependency="A"/><C/></ElementFields><ConnectionFields/></Object>"#,
    );
    let mut session = open(&dir);
    assert!(session.reorder(Scope::Element, "A", Direction::Next).unwrap());

    let top: Vec<_> = session
        .catalog()
        .top_level(Scope::Element)
        .into_iter()
        .map(|p| p.key.clone())
        .collect();
    assert_eq!(top, vec!["C", "A"]);

    let outline = session.outline().unwrap();
    let a = outline.element.iter().find(|n| n.key == "A").unwrap();
    assert_eq!(a.children[0].key, "B");
}

#[test]
fn test_scenario_remove_parent_orphans_child() {
    let (_temp, dir) = workspace(
        r#"<Object><ElementFields><A/><B Dependency="A"/><C/></ElementFields><ConnectionFields/></Object>"#,
    );
    let mut session = open(&dir);
    let orphaned = session.remove(Scope::Element, "A").unwrap();
    assert_eq!(orphaned, vec!["B"]);
    session.save().unwrap();

    let reopened = open(&dir);
    let b = reopened.catalog().get(Scope::Element, "B").unwrap();
    assert_eq!(b.dependency(), Some("A"));
    let roots: Vec<_> = reopened
        .catalog()
        .tree(Scope::Element)
        .unwrap()
        .into_iter()
        .map(|n| n.key.clone())
        .collect();
    assert_eq!(roots, vec!["B", "C"]);
    assert_eq!(reopened.catalog().orphans(Scope::Element).len(), 1);
}

#[test]
fn test_scenario_self_dependency_fails_to_load() {
    let (_temp, dir) = workspace(
        r#"<Object><ElementFields><X Dependency="X"/></ElementFields></Object>"#,
    );
    let err = Session::open_workspace(RealFileSystem, &dir, Config::default()).unwrap_err();
    match err {
        FlowdeclError::Cycle { scope, keys } => {
            assert_eq!(scope, Scope::Element);
            assert_eq!(keys, vec!["X", "X"]);
        }
        other => panic!("expected cycle, got {other}"),
    }
}

#[test]
fn test_external_change_supersedes_unsaved_edits() {
    let (_temp, dir) = workspace(DECLARATION);
    let mut session = open(&dir);
    let generations = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&generations);
    session.subscribe(Arc::new(move |event| {
        if let flowdecl_core::SessionEvent::CatalogRebuilt { generation, .. } = event {
            seen.lock().unwrap().push(*generation);
        }
    }));

    session.add(Scope::Connection, "Unsaved", None).unwrap();
    let view = session.view(Scope::Element, "Threshold").unwrap();

    let edited = DECLARATION.replace(
        r#"<Order Editor="inline""#,
        r#"<Lane Editor="inline"/><Order Editor="inline""#,
    );
    fs::write(dir.join("Splitter.xml"), edited).unwrap();
    session.reload().unwrap();

    assert_eq!(keys(&session, Scope::Connection), vec!["Lane", "Order"]);
    assert!(!session.is_dirty());
    assert_eq!(*generations.lock().unwrap(), vec![1]);

    let mut changes = indexmap::IndexMap::new();
    changes.insert("Default".to_string(), "20".to_string());
    assert!(matches!(
        session.apply_field_changes(&view, &changes),
        Err(FlowdeclError::InvalidOperation(_))
    ));
}

#[test]
fn test_failed_reload_keeps_last_good_document() {
    let (_temp, dir) = workspace(DECLARATION);
    let mut session = open(&dir);
    fs::write(dir.join("Splitter.xml"), "<Object><ElementFields>").unwrap();

    assert!(session.reload().is_err());
    assert_eq!(keys(&session, Scope::Element), vec!["Threshold", "Unit", "Strategy"]);
    assert_eq!(session.generation(), 0);
}

#[test]
fn test_command_flow() {
    let (_temp, dir) = workspace(DECLARATION);
    let mut session = open(&dir);

    let selection = session
        .execute(Command::Select {
            key: Some("Unit".into()),
        })
        .unwrap();
    assert!(matches!(selection, Response::Selection(Selection::Property(_))));

    session
        .execute(Command::PropertyFieldChanged {
            key: "Unit".into(),
            field: "Dependencyvalue".into(),
            value: "5".into(),
        })
        .unwrap();
    session
        .execute(Command::Add {
            scope: Scope::Connection,
            name: "Color".into(),
            attributes: None,
        })
        .unwrap();
    let saved = session.execute(Command::Save).unwrap();
    assert!(matches!(saved, Response::Saved(ref p) if p == &dir.join("Splitter.xml")));

    let reopened = open(&dir);
    let unit = reopened.catalog().get(Scope::Element, "Unit").unwrap();
    assert_eq!(unit.attributes().get("Dependencyvalue"), Some("5"));
    assert_eq!(unit.node.text.as_deref(), Some("MB"));
    let color = reopened.catalog().get(Scope::Connection, "Color").unwrap();
    assert_eq!(color.attributes().validation(), Some("Standard"));
}

#[test]
fn test_missing_workspace_document() {
    let temp = TempDir::new().unwrap();
    let err = Session::open_workspace(RealFileSystem, temp.path(), Config::default()).unwrap_err();
    assert!(matches!(err, FlowdeclError::DocumentNotFound(_)));
}
