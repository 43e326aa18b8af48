//! Host metadata carried in a guest's description field.
//!
//! Operators can put a JSON object in the notes of a VM or container to attach
//! inventory variables and group memberships:
//!
//! ```text
//! {"groups": ["web", "prod"], "http_port": 8080}
//! ```
//!
//! Any other text is kept verbatim as a `notes` variable.

use serde_json::{Map, Value};
use tracing::warn;

/// Key holding the group membership directive.
pub const GROUPS_KEY: &str = "groups";
/// Variable a plain-text description is stored under.
pub const NOTES_KEY: &str = "notes";

/// The description field, classified once when it is read.
#[derive(Debug, Clone, PartialEq)]
pub enum Metadata {
    /// The description is a JSON object.
    Structured(Map<String, Value>),
    /// The description is free text.
    PlainNote(String),
    /// The guest has no description.
    Absent,
}

impl Metadata {
    /// Classifies a raw description.
    ///
    /// Only a JSON object counts as structured; other JSON values (numbers,
    /// arrays, strings) carry no keys to export and are treated as notes.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Metadata::Absent;
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Metadata::Structured(map),
            _ => Metadata::PlainNote(raw.to_string()),
        }
    }

    /// Group names requested through the `groups` key.
    ///
    /// A single string is accepted as one group; non-string entries are skipped.
    pub fn groups(&self) -> Vec<String> {
        let Metadata::Structured(map) = self else {
            return Vec::new();
        };
        match map.get(GROUPS_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(group)) => vec![group.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(group) => Some(group.clone()),
                    other => {
                        warn!(entry = %other, "Skipping non-string entry in metadata groups");
                        None
                    }
                })
                .collect(),
            Some(other) => {
                warn!(value = %other, "Ignoring metadata groups that are not a list");
                Vec::new()
            }
        }
    }

    /// Variables contributed to the host, `groups` included.
    pub fn variables(&self) -> Map<String, Value> {
        match self {
            Metadata::Structured(map) => map.clone(),
            Metadata::PlainNote(text) => {
                let mut vars = Map::new();
                vars.insert(NOTES_KEY.to_string(), Value::String(text.clone()));
                vars
            }
            Metadata::Absent => Map::new(),
        }
    }
}
