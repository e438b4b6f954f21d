//! Unified distribution point trait
//!
//! Provides a single interface for all backend kinds (AFP, SMB, HTTP,
//! HTTPS, Distribution Service)

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use distpoint_core::{ArtifactKind, ObjectId, RepositoryConfig, RepositoryKind};

use crate::error::{RepoError, Result};
use crate::http::UploadRepository;
use crate::mount::{MountState, Mounter};
use crate::service::DistributionServiceRepository;
use crate::share::ShareRepository;

/// Outcome of an existence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    Present,
    Absent,
    /// The backend could not tell
    Unknown,
}

impl Existence {
    pub fn is_present(self) -> bool {
        self == Existence::Present
    }

    pub fn is_absent(self) -> bool {
        self == Existence::Absent
    }

    pub fn is_unknown(self) -> bool {
        self == Existence::Unknown
    }
}

impl From<bool> for Existence {
    fn from(present: bool) -> Self {
        if present {
            Existence::Present
        } else {
            Existence::Absent
        }
    }
}

impl fmt::Display for Existence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Existence::Present => f.write_str("present"),
            Existence::Absent => f.write_str("absent"),
            Existence::Unknown => f.write_str("unknown"),
        }
    }
}

/// Capability contract shared by every backend.
///
/// `mount` and `umount` exist on every kind; stateless upload backends
/// treat them as no-ops so callers never need to know which kind they hold.
#[async_trait]
pub trait DistributionPoint: Send + Sync {
    /// Repository name, unique within a set
    fn name(&self) -> &str;

    fn kind(&self) -> RepositoryKind;

    /// Where the repository lives, with credentials masked
    fn location(&self) -> String;

    /// Mount state for share kinds, `None` for stateless kinds
    fn mount_state(&self) -> Option<MountState> {
        None
    }

    /// Make the repository ready for transfers
    async fn mount(&mut self, _browseable: bool) -> Result<()> {
        Ok(())
    }

    /// Release whatever `mount` acquired. Never fails.
    async fn umount(&mut self) {}

    /// Copy an installer package or disk image
    async fn copy_package(&mut self, local: &Path, id: Option<ObjectId>) -> Result<()>;

    /// Copy a script (any non-package file)
    async fn copy_script(&mut self, local: &Path, id: Option<ObjectId>) -> Result<()>;

    /// Copy a file, routed by its extension
    async fn copy(&mut self, local: &Path, id: Option<ObjectId>) -> Result<()> {
        match ArtifactKind::from_path(local) {
            ArtifactKind::Package => self.copy_package(local, id).await,
            ArtifactKind::Script => self.copy_script(local, id).await,
        }
    }

    /// Check whether `filename` (no directory part) is stored here
    async fn exists(&mut self, filename: &str) -> Result<Existence>;

    /// Richer, best-effort existence check where the backend has one.
    /// Falls back to [`DistributionPoint::exists`], mapping errors to
    /// [`Existence::Unknown`].
    async fn exists_with_extended_probe(&mut self, filename: &str) -> Existence {
        match self.exists(filename).await {
            Ok(existence) => existence,
            Err(e) => {
                tracing::warn!(repository = %self.name(), "existence check failed: {}", e);
                Existence::Unknown
            }
        }
    }
}

/// Shared resources adapters are built with
#[derive(Clone)]
pub struct BackendContext {
    pub mounter: Arc<dyn Mounter>,
    /// Parent directory for generated share mount points
    pub mount_root: PathBuf,
    /// Whether shares mounted on demand show up in the volume list
    pub browseable: bool,
    /// Per-request timeout for HTTP sessions
    pub request_timeout: Duration,
}

/// Create the adapter matching a validated configuration
pub fn create_point(
    config: RepositoryConfig,
    context: &BackendContext,
) -> Result<Box<dyn DistributionPoint>> {
    match config.kind {
        RepositoryKind::Afp | RepositoryKind::Smb => {
            let share = ShareRepository::new(
                config,
                &context.mount_root,
                context.browseable,
                Arc::clone(&context.mounter),
            )?;
            Ok(Box::new(share))
        }
        RepositoryKind::Http | RepositoryKind::Https => {
            let upload = UploadRepository::new(config, context.request_timeout)?;
            Ok(Box::new(upload))
        }
        RepositoryKind::DistributionService => {
            let service = DistributionServiceRepository::new(config, context.request_timeout)?;
            Ok(Box::new(service))
        }
    }
}

/// File name component of a local artifact path
pub(crate) fn artifact_file_name(local: &Path) -> Result<String> {
    local
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| RepoError::ArtifactNotFound {
            path: local.display().to_string(),
        })
}

/// Read a single-file artifact for upload
pub(crate) async fn read_artifact(repo: &str, local: &Path) -> Result<(String, Vec<u8>)> {
    let file_name = artifact_file_name(local)?;
    let metadata = tokio::fs::metadata(local)
        .await
        .map_err(|_| RepoError::ArtifactNotFound {
            path: local.display().to_string(),
        })?;

    if metadata.is_dir() {
        return Err(RepoError::Unsupported {
            repo: repo.to_string(),
            operation: "uploading bundle (directory) packages",
        });
    }

    let data = tokio::fs::read(local).await?;
    Ok((file_name, data))
}

/// Copy directory recursively
pub(crate) fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)?;

    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dest_path)?;
        } else {
            std::fs::copy(&src_path, &dest_path)?;
        }
    }

    Ok(())
}
