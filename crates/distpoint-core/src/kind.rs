//! Backend kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// The closed set of distribution point backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepositoryKind {
    #[serde(rename = "AFP")]
    Afp,
    #[serde(rename = "SMB")]
    Smb,
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "HTTPS")]
    Https,
    #[serde(rename = "DistributionService")]
    DistributionService,
}

impl RepositoryKind {
    /// Share-mount kinds need a mount before any file operation
    pub fn is_share(self) -> bool {
        matches!(self, RepositoryKind::Afp | RepositoryKind::Smb)
    }

    /// Port used when a share configuration does not name one.
    ///
    /// AFP listens on 548; 139 is the NetBIOS file service and never
    /// answers AFP.
    pub fn default_port(self) -> Option<u16> {
        match self {
            RepositoryKind::Afp => Some(548),
            RepositoryKind::Smb => Some(445),
            _ => None,
        }
    }

    /// URL scheme used when talking to this kind of backend
    pub fn scheme(self) -> &'static str {
        match self {
            RepositoryKind::Afp => "afp",
            RepositoryKind::Smb => "smb",
            RepositoryKind::Http => "http",
            RepositoryKind::Https | RepositoryKind::DistributionService => "https",
        }
    }

    /// Stem for generated repository names
    pub fn name_stem(self) -> &'static str {
        match self {
            RepositoryKind::Afp => "afp",
            RepositoryKind::Smb => "smb",
            RepositoryKind::Http => "http",
            RepositoryKind::Https => "https",
            RepositoryKind::DistributionService => "distribution-service",
        }
    }
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RepositoryKind::Afp => "AFP",
            RepositoryKind::Smb => "SMB",
            RepositoryKind::Http => "HTTP",
            RepositoryKind::Https => "HTTPS",
            RepositoryKind::DistributionService => "DistributionService",
        };
        f.write_str(label)
    }
}

impl FromStr for RepositoryKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "afp" => Ok(RepositoryKind::Afp),
            "smb" => Ok(RepositoryKind::Smb),
            "http" => Ok(RepositoryKind::Http),
            "https" => Ok(RepositoryKind::Https),
            // JDS is the name older preference files use
            "distributionservice" | "jds" => Ok(RepositoryKind::DistributionService),
            _ => Err(CoreError::UnknownKind {
                value: s.to_string(),
            }),
        }
    }
}
