//! # Identifiers
//!
//! Cancellation ids come from a connection and are only unique within it.
//! Client ids identify one execution-context instance.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a cancellable call, assigned by the connection layer.
///
/// Unique only within one connection's lifetime. Records and addresses key on
/// the textual form, so `Number(7)` and `String("7")` name the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CancellationId {
    /// Numeric id (the common case for request ids).
    Number(i64),
    /// String id.
    String(String),
}

impl CancellationId {
    /// Key used by the record store and the address scheme.
    #[must_use]
    pub fn record_key(&self) -> String {
        self.to_string()
    }

    /// Parse a path segment back into an id, preferring the numeric form.
    #[must_use]
    pub fn from_segment(segment: &str) -> Self {
        segment
            .parse::<i64>()
            .map(Self::Number)
            .unwrap_or_else(|_| Self::String(segment.to_string()))
    }
}

impl fmt::Display for CancellationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CancellationId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for CancellationId {
    fn from(id: &str) -> Self {
        Self::String(id.to_string())
    }
}

impl From<String> for CancellationId {
    fn from(id: String) -> Self {
        Self::String(id)
    }
}

/// Identifier of one execution-context instance registered with the relay.
///
/// Random (UUID v4), so an id is never handed out twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Allocate a fresh client id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from the hyphenated string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ClientId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
