//! Distribution Service repository
//!
//! The service takes uploads through a multipart endpoint keyed by
//! request headers and replicates them to its own distribution servers.
//! It has no file listing, so existence can only be approximated: the
//! catalog lookup proves an object is registered, and the optional
//! `casper.jxml` probe reports what each distribution server holds.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;
use url::Url;

use distpoint_core::{ArtifactKind, CoreError, ObjectId, RepositoryConfig, RepositoryKind};

use crate::backend::{DistributionPoint, Existence, read_artifact};
use crate::client::{BasicAuth, UploadClient};
use crate::error::{RepoError, Result, UploadErrorKind};
use crate::http::{base_url, endpoint};
use crate::multipart::{MultipartForm, Part};

/// Upload endpoint, relative to the base URL
pub const UPLOAD_ENDPOINT: &str = "dbfileupload";

/// Undocumented server listing endpoint
pub const PROBE_ENDPOINT: &str = "casper.jxml";

/// `FILE_TYPE` header value for packages and disk images
pub const PACKAGE_FILE_TYPE: &str = "0";

/// `FILE_TYPE` header value for scripts
pub const SCRIPT_FILE_TYPE: &str = "5";

/// `DESTINATION` header value: the service's own database-backed store
const DESTINATION: &str = "1";

/// Distribution Service client
pub struct DistributionServiceRepository {
    config: RepositoryConfig,
    base: Url,
    client: UploadClient,
}

impl DistributionServiceRepository {
    pub fn new(config: RepositoryConfig, timeout: Duration) -> Result<Self> {
        let service = config.service().cloned().ok_or_else(|| {
            RepoError::Config(CoreError::InvalidValue {
                key: "kind",
                message: format!("{} is not a Distribution Service", config.kind),
            })
        })?;

        let scheme = if service.use_tls { "https" } else { "http" };
        let base = base_url(scheme, &config, None)?;
        let auth = BasicAuth::new(service.username, service.password);
        let client = UploadClient::new(&config.name, service.verify_ssl, Some(auth), timeout)?;

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

    pub fn upload_url(&self) -> Url {
        endpoint(&self.base, &[UPLOAD_ENDPOINT])
    }

    /// Catalog record for a file name
    pub fn catalog_url(&self, artifact: ArtifactKind, filename: &str) -> Url {
        endpoint(
            &self.base,
            &["JSSResource", artifact.catalog_resource(), "name", filename],
        )
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
            .part(Part::file(file_name.as_str(), file_name.as_str(), data))
            .encode()
            .map_err(|collision| RepoError::Upload {
                repo: self.config.name.clone(),
                kind: UploadErrorKind::BoundaryCollision,
                message: format!(
                    "no multipart boundary absent from {} after {} attempts",
                    file_name, collision.attempts
                ),
            })?;

        let file_type = match artifact {
            ArtifactKind::Package => PACKAGE_FILE_TYPE,
            ArtifactKind::Script => SCRIPT_FILE_TYPE,
        };
        let headers = [
            ("DESTINATION", DESTINATION.to_string()),
            ("OBJECT_ID", target.header_value()),
            ("FILE_TYPE", file_type.to_string()),
            ("FILE_NAME", file_name.clone()),
        ];

        let url = self.upload_url();
        tracing::info!(
            repository = %self.config.name,
            object_id = %target.header_value(),
            "uploading {} to {}",
            file_name,
            url
        );
        self.client.post_multipart(url.as_str(), form, &headers).await?;
        Ok(())
    }

    /// Ask the service which files each of its distribution servers holds
    #[cfg(feature = "extended-probe")]
    async fn probe(&self, filename: &str) -> Result<Existence> {
        let url = endpoint(&self.base, &[PROBE_ENDPOINT]);
        let (username, password) = match self.config.service() {
            Some(service) => (service.username.as_str(), service.password.expose()),
            None => return Ok(Existence::Unknown),
        };

        let response = self
            .client
            .post_form(url.as_str(), &[("username", username), ("password", password)])
            .await?;
        let body = response
            .text()
            .await
            .map_err(|e| RepoError::NetworkError {
                repo: self.config.name.clone(),
                message: e.to_string(),
            })?;

        Ok(probe::file_on_every_server(&body, filename))
    }
}

#[async_trait]
impl DistributionPoint for DistributionServiceRepository {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> RepositoryKind {
        RepositoryKind::DistributionService
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

    /// Catalog lookup only: a registered object says nothing about whether
    /// its file has replicated yet.
    async fn exists(&mut self, filename: &str) -> Result<Existence> {
        let url = self.catalog_url(ArtifactKind::from_path(filename), filename);
        let status = self.client.get_status(url.as_str()).await?;

        Ok(match status {
            s if s.is_success() => Existence::Present,
            StatusCode::NOT_FOUND => Existence::Absent,
            other => {
                tracing::debug!(
                    repository = %self.config.name,
                    "catalog lookup for {} answered {}",
                    filename,
                    other
                );
                Existence::Unknown
            }
        })
    }

    #[cfg(feature = "extended-probe")]
    async fn exists_with_extended_probe(&mut self, filename: &str) -> Existence {
        match self.probe(filename).await {
            Ok(existence) => existence,
            Err(e) => {
                tracing::warn!(repository = %self.config.name, "server probe failed: {}", e);
                Existence::Unknown
            }
        }
    }
}

/// Parsing of the `casper.jxml` server listing
#[cfg(feature = "extended-probe")]
mod probe {
    use percent_encoding::percent_decode_str;
    use std::collections::HashSet;

    use crate::backend::Existence;

    /// `Present` when every listed distribution server carries `filename`,
    /// `Absent` when at least one lacks it, `Unknown` when the document
    /// has no usable listing.
    pub(super) fn file_on_every_server(xml: &str, filename: &str) -> Existence {
        let Some(listing) = elements(xml, "distributionservers").into_iter().next() else {
            tracing::debug!("probe response has no distributionservers element");
            return Existence::Unknown;
        };

        let servers = elements(listing, "distributionserver");
        if servers.is_empty() {
            return Existence::Unknown;
        }

        let on_every_server = servers.iter().all(|server| {
            let files: HashSet<String> = elements(server, "package")
                .into_iter()
                .flat_map(|package| elements(package, "fileURL"))
                .map(file_name)
                .collect();
            files.contains(filename)
        });

        Existence::from(on_every_server)
    }

    /// Last path segment of a file URL, unescaped
    fn file_name(url: &str) -> String {
        let url = unescape(url.trim());
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let last = path.rsplit('/').next().unwrap_or_default();
        percent_decode_str(last).decode_utf8_lossy().into_owned()
    }

    fn unescape(text: &str) -> String {
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }

    /// Contents of every `<tag>` element, outermost first. Elements of the
    /// same name are assumed not to nest.
    pub(super) fn elements<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
        let open = format!("<{}", tag);
        let close = format!("</{}>", tag);
        let mut found = Vec::new();
        let mut rest = xml;

        while let Some(start) = rest.find(&open) {
            let after_name = &rest[start + open.len()..];
            let Some(end_of_tag) = after_name.find('>') else {
                break;
            };

            // `<tagname>` must not match `<tag>`
            let attributes = &after_name[..end_of_tag];
            if !attributes.is_empty()
                && !attributes.starts_with(char::is_whitespace)
                && attributes != "/"
            {
                rest = after_name;
                continue;
            }

            let body = &after_name[end_of_tag + 1..];
            if attributes.ends_with('/') {
                found.push("");
                rest = body;
                continue;
            }

            match body.find(&close) {
                Some(end) => {
                    found.push(&body[..end]);
                    rest = &body[end + close.len()..];
                }
                None => break,
            }
        }

        found
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const LISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<jamfServer>
  <distributionservers>
    <distributionserver>
      <name>Main</name>
      <packages>
        <package><fileURL>https://dp1.example.org/CasperShare/Packages/Firefox.pkg</fileURL></package>
        <package><fileURL>https://dp1.example.org/CasperShare/Packages/Office%20Suite.pkg</fileURL></package>
      </packages>
    </distributionserver>
    <distributionserver type="cloud">
      <name>Cloud</name>
      <packages>
        <package><fileURL>https://cdn.example.org/Packages/Firefox.pkg?a=1&amp;b=2</fileURL></package>
        <package><fileURL>https://cdn.example.org/Packages/Office%20Suite.pkg</fileURL></package>
      </packages>
    </distributionserver>
  </distributionservers>
</jamfServer>"#;

        #[test]
        fn test_elements_skips_longer_names() {
            let xml = "<a><ab>x</ab><a/><a k=\"v\">y</a></a>";
            assert_eq!(elements("<ab>x</ab><a>y</a>", "a"), vec!["y"]);
            assert_eq!(elements(xml, "ab"), vec!["x"]);
        }

        #[test]
        fn test_file_on_every_server() {
            assert_eq!(
                file_on_every_server(LISTING, "Office Suite.pkg"),
                Existence::Present
            );
            assert_eq!(file_on_every_server(LISTING, "Chrome.pkg"), Existence::Absent);
        }

        #[test]
        fn test_signed_urls_match_by_path() {
            assert_eq!(file_on_every_server(LISTING, "Firefox.pkg"), Existence::Present);
            assert_eq!(file_name("https://cdn/Packages/A%20B.pkg?sig=x#frag"), "A B.pkg");
        }

        #[test]
        fn test_unrecognized_documents_are_unknown() {
            assert_eq!(file_on_every_server("<html>login</html>", "a.pkg"), Existence::Unknown);
            assert_eq!(
                file_on_every_server("<distributionservers></distributionservers>", "a.pkg"),
                Existence::Unknown
            );
        }
    }
}
