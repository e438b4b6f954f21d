//! HTTP session shared by the upload-based backends
//!
//! One client per repository, reused for every request:
//! - Certificate verification follows the repository's `verify_ssl`; every
//!   request goes through the one client so the setting cannot be bypassed
//! - Redirects are never followed, so credentials never leave the
//!   configured host
//! - Status codes map to the repository error taxonomy

use reqwest::StatusCode;
use std::time::Duration;

use distpoint_core::Password;

use crate::error::{RepoError, Result, UploadErrorKind};
use crate::multipart::EncodedForm;

/// Username and password sent as HTTP basic auth
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: Password,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: Password) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Reusable HTTP session for one repository
pub struct UploadClient {
    client: reqwest::Client,
    repo: String,
    auth: Option<BasicAuth>,
    timeout: Duration,
    verify_ssl: bool,
}

impl UploadClient {
    /// Create a session for `repo`
    pub fn new(
        repo: &str,
        verify_ssl: bool,
        auth: Option<BasicAuth>,
        timeout: Duration,
    ) -> Result<Self> {
        if !verify_ssl {
            tracing::warn!(repository = %repo, "TLS certificate verification disabled");
        }

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(!verify_ssl)
            .timeout(timeout)
            .build()
            .map_err(|e| RepoError::NetworkError {
                repo: repo.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            repo: repo.to_string(),
            auth,
            timeout,
            verify_ssl,
        })
    }

    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(auth) => request.basic_auth(&auth.username, Some(auth.password.expose())),
            None => request,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> RepoError {
        RepoError::from_reqwest(&self.repo, self.timeout, e)
    }

    /// POST a multipart body with extra headers; fails on non-2xx
    pub async fn post_multipart(
        &self,
        url: &str,
        form: EncodedForm,
        headers: &[(&str, String)],
    ) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, form.content_type());
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = self
            .authorize(request)
            .body(form.into_body())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.check_status(url, response).await
    }

    /// POST a urlencoded form; fails on non-2xx
    pub async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .form(fields)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.check_status(url, response).await
    }

    /// HEAD a URL and report the status, whatever it is
    pub async fn head_status(&self, url: &str) -> Result<StatusCode> {
        let response = self
            .authorize(self.client.head(url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.reject_auth_failure(url, response.status())?;
        Ok(response.status())
    }

    /// GET a URL and report the status, whatever it is
    pub async fn get_status(&self, url: &str) -> Result<StatusCode> {
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.reject_auth_failure(url, response.status())?;
        Ok(response.status())
    }

    fn reject_auth_failure(&self, url: &str, status: StatusCode) -> Result<()> {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RepoError::AuthFailed {
                repo: self.repo.clone(),
                message: format!("{} from {}", status, url),
            });
        }
        Ok(())
    }

    async fn check_status(&self, url: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        self.reject_auth_failure(url, status)?;

        if status.is_redirection() {
            return Err(RepoError::Upload {
                repo: self.repo.clone(),
                kind: UploadErrorKind::Rejected,
                message: format!("{} redirected ({}); redirects are not followed", url, status),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.trim().chars().take(200).collect();
            return Err(RepoError::Upload {
                repo: self.repo.clone(),
                kind: UploadErrorKind::Rejected,
                message: format!("{} from {}: {}", status, url, excerpt),
            });
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multipart::{MultipartForm, Part};
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(auth: Option<BasicAuth>) -> UploadClient {
        UploadClient::new("Test", true, auth, Duration::from_secs(5)).unwrap()
    }

    fn form() -> EncodedForm {
        MultipartForm::new()
            .part(Part::file("file", "a.sh", b"echo".to_vec()))
            .encode()
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_multipart_sends_auth_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(header_exists("authorization"))
            .and(header("X-Extra", "1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let auth = BasicAuth::new("api", Password::new("pw"));
        client(Some(auth))
            .post_multipart(
                &format!("{}/upload", server.uri()),
                form(),
                &[("X-Extra", "1".to_string())],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(path("/denied"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(path("/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
            .mount(&server)
            .await;
        Mock::given(path("/moved"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "https://elsewhere.example/"),
            )
            .mount(&server)
            .await;

        let client = client(None);
        let err = client
            .post_multipart(&format!("{}/denied", server.uri()), form(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::AuthFailed { .. }));

        let err = client
            .post_multipart(&format!("{}/broken", server.uri()), form(), &[])
            .await
            .unwrap_err();
        match err {
            RepoError::Upload { kind, message, .. } => {
                assert_eq!(kind, UploadErrorKind::Rejected);
                assert!(message.contains("disk full"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = client
            .post_multipart(&format!("{}/moved", server.uri()), form(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Upload { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_a_connection_error() {
        let client = client(None);
        let err = client.head_status("http://127.0.0.1:9/").await.unwrap_err();
        assert!(err.is_connection());
        assert_eq!(err.repository(), Some("Test"));
    }

    /// HTTPS server with a self-signed certificate, answering 200 to anything
    async fn start_tls_server() -> std::net::SocketAddr {
        use std::sync::Arc;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let _ = rustls::crypto::ring::default_provider().install_default();

        let fixtures = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures");
        let cert_pem = std::fs::read(fixtures.join("test.crt")).unwrap();
        let key_pem = std::fs::read(fixtures.join("test.key")).unwrap();
        let certs = rustls_pemfile::certs(&mut cert_pem.as_slice())
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        let key = rustls_pemfile::private_key(&mut key_pem.as_slice())
            .unwrap()
            .unwrap();

        let config = rustls::ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .unwrap();
        let acceptor = tokio_rustls::TlsAcceptor::from(Arc::new(config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    // Clients that reject the certificate stop here
                    let Ok(mut tls) = acceptor.accept(stream).await else {
                        return;
                    };
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match tls.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let _ = tls
                        .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                        .await;
                    let _ = tls.shutdown().await;
                });
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_verify_ssl_governs_every_request() {
        let addr = start_tls_server().await;
        let url = format!("https://127.0.0.1:{}/Packages/a.pkg", addr.port());

        let unverified = UploadClient::new("Test", false, None, Duration::from_secs(5)).unwrap();
        assert!(!unverified.verify_ssl());
        assert_eq!(unverified.head_status(&url).await.unwrap(), StatusCode::OK);
        assert_eq!(unverified.get_status(&url).await.unwrap(), StatusCode::OK);
        unverified.post_form(&url, &[("a", "b")]).await.unwrap();

        let err = client(None).get_status(&url).await.unwrap_err();
        assert!(matches!(err, RepoError::NetworkError { .. }));
    }
}
