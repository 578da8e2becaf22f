#![allow(dead_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque resume identifier as issued by the scoring service.
///
/// The service has issued both UUID strings and integer keys; the JSON type is
/// preserved so that `1` and `"1"` never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResumeId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ResumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResumeId::Int(id) => write!(f, "{id}"),
            ResumeId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ResumeId {
    fn from(id: i64) -> Self {
        ResumeId::Int(id)
    }
}

impl From<&str> for ResumeId {
    fn from(id: &str) -> Self {
        ResumeId::Text(id.to_string())
    }
}

/// A resume known to the scoring service. Read-only for the whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub id: ResumeId,
    pub name: String,
}
