//! Test utilities for flowdecl_core
//!
//! This module provides shared testing fixtures: sample declaration documents
//! and helpers to open sessions over an in-memory filesystem.

use crate::config::Config;
use crate::fs::InMemoryFileSystem;
use crate::session::Session;

/// Path used for the sample declaration in the in-memory filesystem.
pub const SAMPLE_PATH: &str = "Mover/Mover.xml";

/// A small but complete declaration.
///
/// Element scope: structural `Name`, `Version` and `Connections`; properties
/// `Folder`, `Subfolder` (child of `Folder`) and `Mode`.
/// Connection scope: `Priority` and `Label` (child of `Priority`).
pub const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Object>
  <ElementFields>
    <Name>Archive mover</Name>
    <Version>3</Version>
    <Folder Editor="inline" LocalizedTagName="Folder" Type="string" Tooltip="Target folder" Default="out"/>
    <Subfolder Editor="inline" LocalizedTagName="Subfolder" Dependency="Folder" DependencyCondition="Not equal" Dependencyvalue=""/>
    <Mode Editor="dropdown" LocalizedTagName="Mode" Default="Move" Weight="2">Move</Mode>
    <Connections>
      <Connection Type="Move"/>
    </Connections>
  </ElementFields>
  <ConnectionFields>
    <Priority Editor="inline" LocalizedTagName="Priority" Validation="Standard"/>
    <Label Editor="inline" LocalizedTagName="Label" Dependency="Priority"/>
  </ConnectionFields>
</Object>
"#;

/// Scope order `[A, B, C]` where `B` depends on `A`.
pub const ABC_XML: &str = r#"<Object>
  <ElementFields>
    <A Editor="inline"/>
    <B Editor="inline" Dependency="A"/>
    <C Editor="inline"/>
  </ElementFields>
  <ConnectionFields/>
</Object>"#;

/// Build a document with only element-scope properties.
///
/// Each entry is `(key, dependency)`.
pub fn element_xml(props: &[(&str, Option<&str>)]) -> String {
    let mut xml = String::from("<Object><ElementFields>");
    for (key, dep) in props {
        match dep {
            Some(dep) => xml.push_str(&format!(r#"<{key} Dependency="{dep}"/>"#)),
            None => xml.push_str(&format!("<{key}/>")),
        }
    }
    xml.push_str("</ElementFields><ConnectionFields/></Object>");
    xml
}

/// Open a session over an in-memory copy of `xml`.
pub fn session_from(xml: &str) -> Session<InMemoryFileSystem> {
    let fs = InMemoryFileSystem::new().with_file(SAMPLE_PATH, xml);
    Session::open(fs, SAMPLE_PATH, Config::default()).unwrap()
}

/// Open a session over the sample declaration.
pub fn sample_session() -> Session<InMemoryFileSystem> {
    session_from(SAMPLE_XML)
}
