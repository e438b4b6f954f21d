//! Server-side object identity for uploads

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the server catalog entry an upload belongs to.
///
/// Negative values are the "create a new entry" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(i64);

impl ObjectId {
    /// Sentinel requesting a new catalog entry
    pub const NEW: ObjectId = ObjectId(-1);

    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    pub fn is_new(self) -> bool {
        self.0 < 0
    }

    /// Resolve to an explicit upload target
    pub fn target(self) -> UploadTarget {
        if self.0 < 0 {
            UploadTarget::CreateNew
        } else {
            UploadTarget::Attach(self.0 as u64)
        }
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::NEW
    }
}

impl From<i64> for ObjectId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an upload lands on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    /// Create a new catalog entry for the artifact
    CreateNew,
    /// Attach the artifact to an existing entry
    Attach(u64),
}

impl UploadTarget {
    /// Value sent to services that take the id as a header
    pub fn header_value(&self) -> String {
        match self {
            UploadTarget::CreateNew => "-1".to_string(),
            UploadTarget::Attach(id) => id.to_string(),
        }
    }
}
