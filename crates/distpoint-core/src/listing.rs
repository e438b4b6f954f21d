//! Server-reported share listing
//!
//! The management server knows every file share it distributes from. Older
//! configurations name a share and give only its password; the rest is
//! filled in from this listing. Fetching it is the caller's job.

use serde::{Deserialize, Serialize};

/// One file share as the server reports it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerShare {
    pub name: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    /// `AFP` or `SMB`
    #[serde(default)]
    pub connection_type: Option<String>,
    #[serde(default)]
    pub share_name: Option<String>,
    #[serde(default)]
    pub workgroup_or_domain: Option<String>,
    #[serde(default)]
    pub share_port: Option<u16>,
    #[serde(default)]
    pub read_write_username: Option<String>,
}

impl ServerShare {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// All shares known to the server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareListing {
    shares: Vec<ServerShare>,
}

impl ShareListing {
    pub fn new(shares: Vec<ServerShare>) -> Self {
        Self { shares }
    }

    /// Find a share by its display name
    pub fn find(&self, name: &str) -> Option<&ServerShare> {
        self.shares.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}

impl FromIterator<ServerShare> for ShareListing {
    fn from_iter<I: IntoIterator<Item = ServerShare>>(iter: I) -> Self {
        Self {
            shares: iter.into_iter().collect(),
        }
    }
}
