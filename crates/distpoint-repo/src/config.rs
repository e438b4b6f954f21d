//! Distribution point configuration documents
//!
//! Stored by default in `~/.config/distpoint/distribution-points.yaml`.
//! The file carries share and service passwords, so it is written owner-only.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use distpoint_core::RawRepositoryConfig;

use crate::error::{RepoError, Result};

/// How aggregate operations visit their members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanOut {
    /// One member after another, in configuration order
    #[default]
    Sequential,
    /// All members at once; each member is still used by one task only
    Concurrent,
}

/// Behaviour of a distribution point set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetOptions {
    /// Upper bound on one member's part of an aggregate call
    #[serde(with = "humantime_serde")]
    pub member_timeout: Duration,

    /// Timeout for a single HTTP request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    pub fan_out: FanOut,

    /// Parent directory of generated share mount points
    pub mount_root: PathBuf,

    /// Whether shares mounted on demand appear in the volume list
    pub browseable: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            member_timeout: Duration::from_secs(600),
            request_timeout: Duration::from_secs(300),
            fan_out: FanOut::Sequential,
            mount_root: PathBuf::from("/Volumes"),
            browseable: false,
        }
    }
}

impl SetOptions {
    pub fn with_member_timeout(mut self, timeout: Duration) -> Self {
        self.member_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    pub fn with_mount_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.mount_root = root.into();
        self
    }

    pub fn with_browseable(mut self, browseable: bool) -> Self {
        self.browseable = browseable;
        self
    }
}

/// Distribution point configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistributionConfig {
    #[serde(default)]
    pub options: SetOptions,

    /// Repository entries, in fan-out order
    #[serde(default)]
    pub repositories: Vec<RawRepositoryConfig>,
}

impl DistributionConfig {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            RepoError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine config directory",
            ))
        })?;
        Ok(config_dir.join("distpoint").join("distribution-points.yaml"))
    }

    /// Append a repository entry
    pub fn push(&mut self, entry: RawRepositoryConfig) {
        self.repositories.push(entry);
    }
}
