//! Exchange records: the serializable shape of a scene
//!
//! This module is organized into submodules:
//! - `ingest`: validating a record and staging it into graph nodes
//! - `export`: walking a graph back into a record
//!
//! Records derive `serde` traits; tests and fixtures use JSON.

mod export;
mod ingest;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};


/// Identifier of a node inside one record.
///
/// Hosts write either strings or integers; both are read as text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "KeyRepr")]
pub struct RecordKey(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum KeyRepr {
    Text(String),
    Int(i64),
}

impl From<KeyRepr> for RecordKey {
    fn from(repr: KeyRepr) -> Self {
        match repr {
            KeyRepr::Text(text) => RecordKey(text),
            KeyRepr::Int(int) => RecordKey(int.to_string()),
        }
    }
}

impl RecordKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordKey {
    fn from(key: &str) -> Self {
        RecordKey(key.to_string())
    }
}

impl From<u32> for RecordKey {
    fn from(uid: u32) -> Self {
        RecordKey(uid.to_string())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A whole scene or a subtree to attach.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub root: RecordKey,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualizations: Option<Vec<VisualizationRecord>>,
}

/// One node. Which geometry fields are read depends on `kind`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: RecordKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction_local: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_local: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<Vec<f64>>,
    /// Read for compatibility; the engine does not use it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_angle: Option<f64>,

    #[serde(
        rename = "is_UI",
        default,
        deserialize_with = "flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_ui: Option<bool>,
    #[serde(default, deserialize_with = "flag", skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "flag", skip_serializing_if = "Option::is_none")]
    pub parent_enabled: Option<bool>,
    #[serde(default, deserialize_with = "flag", skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, deserialize_with = "flag", skip_serializing_if = "Option::is_none")]
    pub parent_locked: Option<bool>,
    #[serde(default, deserialize_with = "flag", skip_serializing_if = "Option::is_none")]
    pub is_compute: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_fct: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_params: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl NodeRecord {
    pub fn new(kind: impl Into<String>, id: impl Into<RecordKey>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            ..Self::default()
        }
    }
}

/// A typed edge; a missing type means CHILD.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub src: RecordKey,
    pub dst: RecordKey,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl EdgeRecord {
    pub fn new(src: impl Into<RecordKey>, dst: impl Into<RecordKey>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationRecord {
    #[serde(rename = "type")]
    pub label: String,
    pub nodes: Vec<RecordKey>,
}

/// Booleans written either as `true`/`false` or as integers.
fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlagRepr {
        Bool(bool),
        Int(i64),
    }

    Ok(Option::<FlagRepr>::deserialize(deserializer)?.map(|repr| match repr {
        FlagRepr::Bool(value) => value,
        FlagRepr::Int(value) => value != 0,
    }))
}
