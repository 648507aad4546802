//! The stored record type shared by all backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a stored record, mirroring parameter store types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// Plain configuration value.
    #[serde(rename = "String")]
    Plain,
    /// Encrypted-at-rest secret value.
    #[serde(rename = "SecureString")]
    Secret,
}

impl RecordKind {
    /// Maps the entry secrecy flag to a record kind.
    #[must_use]
    pub const fn from_secret(secret: bool) -> Self {
        if secret {
            Self::Secret
        } else {
            Self::Plain
        }
    }

    /// Human-readable label used in table output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Plain => "String",
            Self::Secret => "SecureString",
        }
    }
}

/// One record as it exists in a store backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Absolute slash-delimited name.
    pub name: String,
    /// Current value, decrypted.
    pub value: String,
    /// Backend version identifier.
    pub version: String,
    /// Record kind.
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// When the record was first written.
    pub created: DateTime<Utc>,
    /// When the record was last changed.
    pub modified: DateTime<Utc>,
}

impl StoredRecord {
    /// Returns the last path segment of the record name.
    #[must_use]
    pub fn key(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}
