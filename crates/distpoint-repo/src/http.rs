//! HTTP and HTTPS upload repositories
//!
//! Files are POSTed as multipart forms to `<base>/Packages/` or
//! `<base>/Scripts/`, alongside an `object_id` field naming the catalog
//! entry the file belongs to. There is no browse endpoint, so existence is a
//! best-effort HEAD on the file's would-be URL: a server that answers 404
//! for everything, or serves files from elsewhere, will mislead it.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;
use url::Url;

use distpoint_core::{ArtifactKind, CoreError, ObjectId, RepositoryConfig, RepositoryKind};

use crate::backend::{DistributionPoint, Existence, read_artifact};
use crate::client::{BasicAuth, UploadClient};
use crate::error::{RepoError, Result, UploadErrorKind};
use crate::multipart::{MultipartForm, Part};

/// Upload repository client
pub struct UploadRepository {
    /// Repository configuration
    config: RepositoryConfig,
    /// `scheme://host:port[/path]`
    base: Url,
    /// Session reused for every request
    client: UploadClient,
}

impl UploadRepository {
    /// Create a new upload repository client
    pub fn new(config: RepositoryConfig, timeout: Duration) -> Result<Self> {
        let upload = config.upload().cloned().ok_or_else(|| {
            RepoError::Config(CoreError::InvalidValue {
                key: "kind",
                message: format!("{} is not an upload repository kind", config.kind),
            })
        })?;

        let base = base_url(config.kind.scheme(), &config, upload.path.as_deref())?;
        let auth = upload
            .credentials
            .map(|(username, password)| BasicAuth::new(username, password));
        let client = UploadClient::new(&config.name, upload.verify_ssl, auth, timeout)?;

        Ok(Self {
            config,
            base,
            client,
        })
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL of the directory an artifact kind uploads into
    pub fn upload_url(&self, artifact: ArtifactKind) -> Url {
        endpoint(&self.base, &[artifact.subdirectory(), ""])
    }

    /// URL a stored file would be served from
    pub fn file_url(&self, artifact: ArtifactKind, filename: &str) -> Url {
        endpoint(&self.base, &[artifact.subdirectory(), filename])
    }

    async fn upload(
        &mut self,
        local: &Path,
        artifact: ArtifactKind,
        id: Option<ObjectId>,
    ) -> Result<()> {
        let (file_name, data) = read_artifact(&self.config.name, local).await?;
        let target = id.unwrap_or(self.config.object_id).target();

        let form = MultipartForm::new()
            .part(Part::text("object_id", target.header_value()))
            .part(Part::file("file", file_name.as_str(), data))
            .encode()
            .map_err(|collision| RepoError::Upload {
                repo: self.config.name.clone(),
                kind: UploadErrorKind::BoundaryCollision,
                message: format!(
                    "no multipart boundary absent from {} after {} attempts",
                    file_name, collision.attempts
                ),
            })?;

        let url = self.upload_url(artifact);
        tracing::info!(repository = %self.config.name, "uploading {} to {}", file_name, url);
        self.client.post_multipart(url.as_str(), form, &[]).await?;
        Ok(())
    }
}

#[async_trait]
impl DistributionPoint for UploadRepository {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> RepositoryKind {
        self.config.kind
    }

    fn location(&self) -> String {
        self.base.to_string()
    }

    async fn copy_package(&mut self, local: &Path, id: Option<ObjectId>) -> Result<()> {
        self.upload(local, ArtifactKind::Package, id).await
    }

    async fn copy_script(&mut self, local: &Path, id: Option<ObjectId>) -> Result<()> {
        self.upload(local, ArtifactKind::Script, id).await
    }

    async fn exists(&mut self, filename: &str) -> Result<Existence> {
        let url = self.file_url(ArtifactKind::from_path(filename), filename);
        let status = match self.client.head_status(url.as_str()).await {
            Ok(status) => status,
            Err(e @ (RepoError::NetworkError { .. } | RepoError::Timeout { .. })) => {
                tracing::warn!(
                    repository = %self.config.name,
                    "could not check {}: {}",
                    filename,
                    e
                );
                return Ok(Existence::Unknown);
            }
            Err(e) => return Err(e),
        };

        Ok(match status {
            s if s.is_success() => Existence::Present,
            StatusCode::NOT_FOUND | StatusCode::GONE => Existence::Absent,
            other => {
                tracing::debug!(
                    repository = %self.config.name,
                    "inconclusive existence check for {}: {}",
                    filename,
                    other
                );
                Existence::Unknown
            }
        })
    }
}

/// `scheme://host:port[/url path][/path]` for a configuration
pub(crate) fn base_url(scheme: &str, config: &RepositoryConfig, path: Option<&str>) -> Result<Url> {
    let mut raw = format!("{}://{}:{}", scheme, config.host(), config.port());
    for segment in config.url_path().into_iter().chain(path) {
        raw.push('/');
        raw.push_str(segment);
    }

    Url::parse(&raw).map_err(|e| {
        RepoError::Config(CoreError::InvalidValue {
            key: "url",
            message: format!("'{}' does not form a valid URL: {}", config.url, e),
        })
    })
}

/// Append path segments to a base URL, escaping each one
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use distpoint_core::RawRepositoryConfig;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo_for(server: &MockServer) -> UploadRepository {
        let address = server.address();
        let config = RawRepositoryConfig::new(RepositoryKind::Http)
            .with_name("CDN")
            .with_url(address.ip().to_string())
            .with_port(address.port())
            .with_credentials("uploader", "pw")
            .validate(None)
            .unwrap();
        UploadRepository::new(config, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_urls() {
        let config = RawRepositoryConfig::new(RepositoryKind::Https)
            .with_url("cdn.example.org")
            .with_port(8443)
            .with_path("jamf")
            .validate(None)
            .unwrap();
        let repo = UploadRepository::new(config, Duration::from_secs(5)).unwrap();

        assert_eq!(repo.base_url().as_str(), "https://cdn.example.org:8443/jamf");
        assert_eq!(
            repo.upload_url(ArtifactKind::Package).as_str(),
            "https://cdn.example.org:8443/jamf/Packages/"
        );
        assert_eq!(
            repo.file_url(ArtifactKind::Script, "clean up.sh").as_str(),
            "https://cdn.example.org:8443/jamf/Scripts/clean%20up.sh"
        );
    }

    #[test]
    fn test_port_follows_host_when_url_has_a_path() {
        let config = RawRepositoryConfig::new(RepositoryKind::Https)
            .with_url("cdn.example.org/jamf")
            .with_port(8443)
            .validate(None)
            .unwrap();
        let repo = UploadRepository::new(config, Duration::from_secs(5)).unwrap();

        assert_eq!(repo.base_url().as_str(), "https://cdn.example.org:8443/jamf");
        assert_eq!(
            repo.upload_url(ArtifactKind::Package).as_str(),
            "https://cdn.example.org:8443/jamf/Packages/"
        );

        let nested = RawRepositoryConfig::new(RepositoryKind::Http)
            .with_url("cdn.example.org/jamf")
            .with_port(8080)
            .with_path("/casper/")
            .validate(None)
            .unwrap();
        let repo = UploadRepository::new(nested, Duration::from_secs(5)).unwrap();
        assert_eq!(
            repo.upload_url(ArtifactKind::Script).as_str(),
            "http://cdn.example.org:8080/jamf/casper/Scripts/"
        );
    }

    #[test]
    fn test_bad_host_is_a_config_error() {
        let config = RawRepositoryConfig::new(RepositoryKind::Http)
            .with_url("bad host name")
            .with_port(80)
            .validate(None)
            .unwrap();
        let err = UploadRepository::new(config, Duration::from_secs(5)).err().unwrap();
        assert!(matches!(err, RepoError::Config(_)));
    }

    #[tokio::test]
    async fn test_copy_routes_by_extension() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Packages/"))
            .and(header_exists("authorization"))
            .and(body_string_contains("filename=\"installer.pkg\""))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/Scripts/"))
            .and(body_string_contains("echo hello"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("installer.pkg");
        let script = dir.path().join("script.sh");
        std::fs::write(&pkg, "pkg bytes").unwrap();
        std::fs::write(&script, "echo hello").unwrap();

        let mut repo = repo_for(&server);
        repo.copy(&pkg, None).await.unwrap();
        repo.copy(&script, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_names_object_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Packages/"))
            .and(body_string_contains("name=\"object_id\"\r\n\r\n42\r\n"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/Scripts/"))
            .and(body_string_contains("name=\"object_id\"\r\n\r\n-1\r\n"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("installer.pkg");
        let script = dir.path().join("script.sh");
        std::fs::write(&pkg, "pkg bytes").unwrap();
        std::fs::write(&script, "echo hello").unwrap();

        let mut repo = repo_for(&server);
        repo.copy(&pkg, Some(ObjectId::new(42))).await.unwrap();
        repo.copy(&script, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(413))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("huge.dmg");
        std::fs::write(&pkg, "dmg").unwrap();

        let err = repo_for(&server).copy(&pkg, None).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Upload {
                kind: UploadErrorKind::Rejected,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_exists_is_tri_state() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/Packages/present.pkg"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/Scripts/odd.sh"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut repo = repo_for(&server);
        assert_eq!(repo.exists("present.pkg").await.unwrap(), Existence::Present);
        assert_eq!(repo.exists("missing.pkg").await.unwrap(), Existence::Absent);
        assert_eq!(repo.exists("odd.sh").await.unwrap(), Existence::Unknown);
    }

    #[tokio::test]
    async fn test_exists_is_unknown_when_unreachable() {
        // Nothing listens on the discard port
        let config = RawRepositoryConfig::new(RepositoryKind::Http)
            .with_name("Offline")
            .with_url("127.0.0.1")
            .with_port(9)
            .validate(None)
            .unwrap();
        let mut repo = UploadRepository::new(config, Duration::from_secs(5)).unwrap();

        assert_eq!(repo.exists("present.pkg").await.unwrap(), Existence::Unknown);
    }

    #[tokio::test]
    async fn test_mount_is_a_no_op() {
        let server = MockServer::start().await;
        let mut repo = repo_for(&server);
        repo.mount(true).await.unwrap();
        repo.umount().await;
        assert!(repo.mount_state().is_none());
    }
}
