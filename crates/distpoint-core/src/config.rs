//! Repository configuration and validation
//!
//! A [`RawRepositoryConfig`] is whatever the caller wrote down: every key is
//! optional and some have legacy spellings. [`RawRepositoryConfig::validate`]
//! turns it into a [`RepositoryConfig`] whose settings are complete for its
//! kind, or fails naming every key that is missing.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::kind::RepositoryKind;
use crate::listing::{ServerShare, ShareListing};
use crate::object_id::ObjectId;

/// Prefixes removed from configured URLs; adapters add their own
const SCHEME_PREFIXES: [&str; 4] = ["afp://", "smb://", "http://", "https://"];

/// A password that stays out of `Debug` output
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Unvalidated repository entry, as found in a configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRepositoryConfig {
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Host (and optional path), without protocol prefix
    #[serde(default, alias = "URL", alias = "host", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(
        default,
        alias = "share_port",
        deserialize_with = "lenient_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<u16>,

    #[serde(default, alias = "workgroup_or_domain", skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Password>,

    #[serde(
        default,
        alias = "id",
        deserialize_with = "lenient_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub object_id: Option<i64>,

    /// Explicit mount point for share kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_point: Option<PathBuf>,

    /// Certificate verification for HTTPS-based kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_ssl: Option<bool>,

    /// URL path prefix for upload kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Whether the Distribution Service is reached over HTTPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_tls: Option<bool>,
}

impl RawRepositoryConfig {
    /// Start an entry of the given kind
    pub fn new(kind: RepositoryKind) -> Self {
        Self {
            kind: Some(kind.to_string()),
            ..Default::default()
        }
    }

    /// Legacy share entry: a share name plus its read/write password.
    /// Everything else comes from the server's share listing.
    pub fn legacy_share(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            password: Some(Password::new(password)),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_share_name(mut self, share_name: impl Into<String>) -> Self {
        self.share_name = Some(share_name.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Password::new(password));
        self
    }

    pub fn with_credentials(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.with_username(username).with_password(password)
    }

    pub fn with_object_id(mut self, id: impl Into<ObjectId>) -> Self {
        self.object_id = Some(id.into().get());
        self
    }

    pub fn with_mount_point(mut self, mount_point: impl Into<PathBuf>) -> Self {
        self.mount_point = Some(mount_point.into());
        self
    }

    pub fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = Some(verify);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = Some(use_tls);
        self
    }

    /// Whether the entry names itself
    pub fn has_explicit_name(&self) -> bool {
        non_empty(&self.name).is_some()
    }

    /// Validate against the rules for the entry's kind.
    ///
    /// `listing` is consulted for share kinds only, matched by name.
    pub fn validate(&self, listing: Option<&ShareListing>) -> Result<RepositoryConfig> {
        let name = non_empty(&self.name);
        let listed = match (name, listing) {
            (Some(name), Some(listing)) => listing.find(name),
            _ => None,
        };

        let kind = self.resolve_kind(listed)?;
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| kind.name_stem().to_string());
        let url = non_empty(&self.url).map(strip_scheme);
        let object_id = self.object_id.map(ObjectId::new).unwrap_or_default();

        let settings = match kind {
            RepositoryKind::Afp | RepositoryKind::Smb => {
                self.share_settings(kind, &name, url.as_deref(), listed)?
            }
            RepositoryKind::Http | RepositoryKind::Https => {
                self.upload_settings(kind, &name, url.as_deref())?
            }
            RepositoryKind::DistributionService => {
                self.service_settings(kind, &name, url.as_deref())?
            }
        };

        let url = match (url, listed) {
            (Some(url), _) => url,
            (None, Some(share)) => non_empty(&share.ip_address)
                .map(strip_scheme)
                .unwrap_or_default(),
            (None, None) => String::new(),
        };

        Ok(RepositoryConfig {
            name,
            kind,
            url,
            object_id,
            settings,
        })
    }

    fn resolve_kind(&self, listed: Option<&ServerShare>) -> Result<RepositoryKind> {
        if let Some(value) = non_empty(&self.kind) {
            return value.parse();
        }

        let connection_type = listed.and_then(|share| non_empty(&share.connection_type));
        match connection_type {
            Some(value) => {
                let kind: RepositoryKind = value.parse()?;
                if kind.is_share() {
                    Ok(kind)
                } else {
                    Err(CoreError::InvalidValue {
                        key: "kind",
                        message: format!(
                            "server reports connection type {} for share '{}'",
                            kind,
                            listed.map(|s| s.name.as_str()).unwrap_or_default()
                        ),
                    })
                }
            }
            None => Err(CoreError::MissingKeys {
                repository: self.label(),
                kind: "unknown".to_string(),
                keys: self.missing_without_kind(listed),
            }),
        }
    }

    /// Without a kind, report `kind` plus whatever a share entry would still lack
    fn missing_without_kind(&self, listed: Option<&ServerShare>) -> Vec<&'static str> {
        let listed_has = |value: Option<&Option<String>>| value.and_then(non_empty).is_some();

        let mut missing = vec!["kind"];
        note_missing(
            &mut missing,
            "url",
            non_empty(&self.url).is_none() && !listed_has(listed.map(|s| &s.ip_address)),
        );
        note_missing(
            &mut missing,
            "share_name",
            non_empty(&self.share_name).is_none() && !listed_has(listed.map(|s| &s.share_name)),
        );
        note_missing(
            &mut missing,
            "username",
            non_empty(&self.username).is_none() && !listed_has(listed.map(|s| &s.read_write_username)),
        );
        note_missing(
            &mut missing,
            "password",
            self.password.as_ref().is_none_or(|p| p.is_empty()),
        );
        missing
    }

    fn share_settings(
        &self,
        kind: RepositoryKind,
        name: &str,
        url: Option<&str>,
        listed: Option<&ServerShare>,
    ) -> Result<RepositorySettings> {
        if listed.is_some() {
            tracing::debug!(repository = %name, "backfilling share settings from server listing");
        }

        let url = url
            .map(str::to_string)
            .or_else(|| listed.and_then(|s| non_empty(&s.ip_address)).map(strip_scheme));
        let share_name = non_empty(&self.share_name)
            .or_else(|| listed.and_then(|s| non_empty(&s.share_name)))
            .map(str::to_string);
        let username = non_empty(&self.username)
            .or_else(|| listed.and_then(|s| non_empty(&s.read_write_username)))
            .map(str::to_string);
        let password = self.password.clone().filter(|p| !p.is_empty());
        let port = self
            .port
            .or_else(|| listed.and_then(|s| s.share_port))
            .or_else(|| kind.default_port());
        let domain = non_empty(&self.domain)
            .or_else(|| listed.and_then(|s| non_empty(&s.workgroup_or_domain)))
            .map(str::to_string);

        let mut missing = Vec::new();
        note_missing(&mut missing, "url", url.is_none());
        note_missing(&mut missing, "port", port.is_none());
        note_missing(&mut missing, "share_name", share_name.is_none());
        note_missing(&mut missing, "username", username.is_none());
        note_missing(&mut missing, "password", password.is_none());

        match (url, port, share_name, username, password) {
            (Some(_), Some(port), Some(share_name), Some(username), Some(password)) => {
                Ok(RepositorySettings::Share(ShareSettings {
                    share_name,
                    username,
                    password,
                    port,
                    domain,
                    mount_point: self.mount_point.clone(),
                }))
            }
            _ => Err(missing_keys(name, kind, missing)),
        }
    }

    fn upload_settings(
        &self,
        kind: RepositoryKind,
        name: &str,
        url: Option<&str>,
    ) -> Result<RepositorySettings> {
        let username = non_empty(&self.username).map(str::to_string);
        let password = self.password.clone().filter(|p| !p.is_empty());

        let mut missing = Vec::new();
        note_missing(&mut missing, "url", url.is_none());
        note_missing(&mut missing, "port", self.port.is_none());
        // Credentials are optional, but only as a pair
        note_missing(&mut missing, "username", username.is_none() && password.is_some());
        note_missing(&mut missing, "password", password.is_none() && username.is_some());

        match (url, self.port) {
            (Some(_), Some(port)) if missing.is_empty() => {
                Ok(RepositorySettings::Upload(UploadSettings {
                    port,
                    path: normalized_path(&self.path),
                    credentials: username.zip(password),
                    verify_ssl: self.verify_ssl.unwrap_or(true),
                }))
            }
            _ => Err(missing_keys(name, kind, missing)),
        }
    }

    fn service_settings(
        &self,
        kind: RepositoryKind,
        name: &str,
        url: Option<&str>,
    ) -> Result<RepositorySettings> {
        let username = non_empty(&self.username).map(str::to_string);
        let password = self.password.clone().filter(|p| !p.is_empty());

        let mut missing = Vec::new();
        note_missing(&mut missing, "url", url.is_none());
        note_missing(&mut missing, "port", self.port.is_none());
        note_missing(&mut missing, "username", username.is_none());
        note_missing(&mut missing, "password", password.is_none());

        match (url, self.port, username, password) {
            (Some(_), Some(port), Some(username), Some(password)) => {
                Ok(RepositorySettings::Service(ServiceSettings {
                    port,
                    username,
                    password,
                    verify_ssl: self.verify_ssl.unwrap_or(true),
                    use_tls: self.use_tls.unwrap_or(true),
                }))
            }
            _ => Err(missing_keys(name, kind, missing)),
        }
    }

    fn label(&self) -> String {
        non_empty(&self.name).unwrap_or("<unnamed>").to_string()
    }
}

/// A complete, validated repository configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryConfig {
    /// Unique within a distribution point set
    pub name: String,
    pub kind: RepositoryKind,
    /// Host (and optional path) without protocol prefix
    pub url: String,
    /// Catalog entry uploads attach to unless the caller names another
    pub object_id: ObjectId,
    pub settings: RepositorySettings,
}

impl RepositoryConfig {
    /// Validate a raw entry without a server listing
    pub fn from_raw(raw: &RawRepositoryConfig) -> Result<Self> {
        raw.validate(None)
    }

    pub fn share(&self) -> Option<&ShareSettings> {
        match &self.settings {
            RepositorySettings::Share(settings) => Some(settings),
            _ => None,
        }
    }

    pub fn upload(&self) -> Option<&UploadSettings> {
        match &self.settings {
            RepositorySettings::Upload(settings) => Some(settings),
            _ => None,
        }
    }

    pub fn service(&self) -> Option<&ServiceSettings> {
        match &self.settings {
            RepositorySettings::Service(settings) => Some(settings),
            _ => None,
        }
    }

    /// Host part of `url`, without any path
    pub fn host(&self) -> &str {
        self.url.split_once('/').map_or(self.url.as_str(), |(host, _)| host)
    }

    /// Path part of `url`, without surrounding slashes
    pub fn url_path(&self) -> Option<&str> {
        self.url
            .split_once('/')
            .map(|(_, path)| path.trim_matches('/'))
            .filter(|path| !path.is_empty())
    }

    pub fn port(&self) -> u16 {
        match &self.settings {
            RepositorySettings::Share(s) => s.port,
            RepositorySettings::Upload(s) => s.port,
            RepositorySettings::Service(s) => s.port,
        }
    }
}

impl fmt::Display for RepositoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {}:{}", self.name, self.kind, self.host(), self.port())?;
        if let Some(path) = self.url_path() {
            write!(f, "/{}", path)?;
        }
        Ok(())
    }
}

/// Kind-specific settings
#[derive(Debug, Clone, PartialEq)]
pub enum RepositorySettings {
    Share(ShareSettings),
    Upload(UploadSettings),
    Service(ServiceSettings),
}

/// AFP and SMB shares
#[derive(Debug, Clone, PartialEq)]
pub struct ShareSettings {
    pub share_name: String,
    pub username: String,
    pub password: Password,
    pub port: u16,
    /// SMB workgroup or domain
    pub domain: Option<String>,
    pub mount_point: Option<PathBuf>,
}

/// HTTP and HTTPS upload endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSettings {
    pub port: u16,
    pub path: Option<String>,
    pub credentials: Option<(String, Password)>,
    pub verify_ssl: bool,
}

/// The Distribution Service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub port: u16,
    pub username: String,
    pub password: Password,
    pub verify_ssl: bool,
    pub use_tls: bool,
}

/// Remove a leading protocol prefix (any case) and trailing slashes
pub fn strip_scheme(url: &str) -> String {
    let url = url.trim();
    let stripped = SCHEME_PREFIXES
        .iter()
        .find_map(|prefix| {
            url.get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &url[prefix.len()..])
        })
        .unwrap_or(url);
    stripped.trim_end_matches('/').to_string()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn normalized_path(path: &Option<String>) -> Option<String> {
    non_empty(path)
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

fn note_missing(missing: &mut Vec<&'static str>, key: &'static str, is_missing: bool) {
    if is_missing {
        missing.push(key);
    }
}

fn missing_keys(name: &str, kind: RepositoryKind, keys: Vec<&'static str>) -> CoreError {
    CoreError::MissingKeys {
        repository: name.to_string(),
        kind: kind.to_string(),
        keys,
    }
}

/// Accept integers written either as numbers or as numeric strings
fn lenient_int<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + TryFrom<i64>,
    <T as FromStr>::Err: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Number(i64),
        Text(String),
    }

    match Option::<Lenient>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Lenient::Number(n)) => T::try_from(n)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("{} is out of range", n))),
        Some(Lenient::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Lenient::Text(s)) => s.trim().parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> ShareListing {
        ShareListing::new(vec![ServerShare {
            name: "Main".to_string(),
            ip_address: Some("files.example.org".to_string()),
            connection_type: Some("SMB".to_string()),
            share_name: Some("CasperShare".to_string()),
            workgroup_or_domain: Some("EXAMPLE".to_string()),
            share_port: Some(1445),
            read_write_username: Some("casperadmin".to_string()),
        }])
    }

    #[test]
    fn test_explicit_smb() {
        let config = RawRepositoryConfig::new(RepositoryKind::Smb)
            .with_name("Main")
            .with_url("files.example.org")
            .with_share_name("CasperShare")
            .with_credentials("rw", "secret")
            .validate(None)
            .unwrap();

        assert_eq!(config.kind, RepositoryKind::Smb);
        assert_eq!(config.url, "files.example.org");
        let share = config.share().unwrap();
        assert_eq!(share.port, 445);
        assert_eq!(share.domain, None);
        assert!(config.object_id.is_new());
    }

    #[test]
    fn test_afp_default_port() {
        let config = RawRepositoryConfig::new(RepositoryKind::Afp)
            .with_url("files.example.org")
            .with_share_name("CasperShare")
            .with_credentials("rw", "secret")
            .validate(None)
            .unwrap();

        assert_eq!(config.port(), 548);
        assert_eq!(config.name, "afp");
    }

    #[test]
    fn test_missing_keys_are_all_reported() {
        let err = RawRepositoryConfig::new(RepositoryKind::Smb)
            .with_name("Broken")
            .with_username("rw")
            .validate(None)
            .unwrap_err();

        assert_eq!(err.missing_keys(), &["url", "share_name", "password"]);
        insta::assert_snapshot!(
            err.to_string(),
            @"Missing required keys for SMB repository 'Broken': url, share_name, password"
        );
    }

    #[test]
    fn test_service_requires_everything() {
        let err = RawRepositoryConfig::new(RepositoryKind::DistributionService)
            .validate(None)
            .unwrap_err();
        assert_eq!(err.missing_keys(), &["url", "port", "username", "password"]);

        let err = RawRepositoryConfig::new(RepositoryKind::DistributionService)
            .with_url("jss.example.org")
            .with_port(8443)
            .with_username("api")
            .validate(None)
            .unwrap_err();
        assert_eq!(err.missing_keys(), &["password"]);
    }

    #[test]
    fn test_service_ignores_listing() {
        let err = RawRepositoryConfig::new(RepositoryKind::DistributionService)
            .with_name("Main")
            .validate(Some(&listing()))
            .unwrap_err();
        assert_eq!(err.missing_keys(), &["url", "port", "username", "password"]);
    }

    #[test]
    fn test_upload_credentials_come_in_pairs() {
        let ok = RawRepositoryConfig::new(RepositoryKind::Https)
            .with_url("cdn.example.org")
            .with_port(443)
            .validate(None)
            .unwrap();
        assert!(ok.upload().unwrap().credentials.is_none());
        assert!(ok.upload().unwrap().verify_ssl);

        let err = RawRepositoryConfig::new(RepositoryKind::Http)
            .with_url("cdn.example.org")
            .with_username("uploader")
            .validate(None)
            .unwrap_err();
        assert_eq!(err.missing_keys(), &["port", "password"]);
    }

    #[test]
    fn test_scheme_prefix_is_stripped() {
        for url in [
            "afp://files.example.org/",
            "AFP://files.example.org",
            "smb://files.example.org",
            "SmB://files.example.org",
            "files.example.org",
        ] {
            let config = RawRepositoryConfig::new(RepositoryKind::Https)
                .with_url(url)
                .with_port(443)
                .validate(None)
                .unwrap();
            assert_eq!(config.url, "files.example.org", "input {}", url);
        }
    }

    #[test]
    fn test_strip_scheme_keeps_other_text() {
        assert_eq!(strip_scheme("afp.example.org"), "afp.example.org");
        assert_eq!(strip_scheme("smb:/host"), "smb:/host");
        assert_eq!(strip_scheme("ß://x"), "ß://x");
    }

    #[test]
    fn test_legacy_share_from_listing() {
        let config = RawRepositoryConfig::legacy_share("Main", "secret")
            .validate(Some(&listing()))
            .unwrap();

        assert_eq!(config.kind, RepositoryKind::Smb);
        assert_eq!(config.name, "Main");
        assert_eq!(config.url, "files.example.org");
        let share = config.share().unwrap();
        assert_eq!(share.share_name, "CasperShare");
        assert_eq!(share.username, "casperadmin");
        assert_eq!(share.port, 1445);
        assert_eq!(share.domain.as_deref(), Some("EXAMPLE"));
    }

    #[test]
    fn test_explicit_keys_override_listing() {
        let config = RawRepositoryConfig::new(RepositoryKind::Smb)
            .with_name("Main")
            .with_port(445)
            .with_username("other")
            .with_password("secret")
            .validate(Some(&listing()))
            .unwrap();

        assert_eq!(config.port(), 445);
        assert_eq!(config.share().unwrap().username, "other");
    }

    #[test]
    fn test_legacy_share_without_listing() {
        let err = RawRepositoryConfig::legacy_share("Main", "secret")
            .validate(None)
            .unwrap_err();
        assert_eq!(err.missing_keys(), &["kind", "url", "share_name", "username"]);
    }

    #[test]
    fn test_empty_entry_reports_every_key() {
        let err = RawRepositoryConfig::default().validate(None).unwrap_err();
        assert_eq!(
            err.missing_keys(),
            &["kind", "url", "share_name", "username", "password"]
        );
    }

    #[test]
    fn test_url_path_is_kept_apart_from_host() {
        let config = RawRepositoryConfig::new(RepositoryKind::Https)
            .with_name("CDN")
            .with_url("https://cdn.example.org/jamf/")
            .with_port(8443)
            .validate(None)
            .unwrap();

        assert_eq!(config.host(), "cdn.example.org");
        assert_eq!(config.url_path(), Some("jamf"));
        assert_eq!(config.to_string(), "CDN (HTTPS) cdn.example.org:8443/jamf");

        let bare = RawRepositoryConfig::new(RepositoryKind::Https)
            .with_url("cdn.example.org")
            .with_port(443)
            .validate(None)
            .unwrap();
        assert_eq!(bare.host(), "cdn.example.org");
        assert_eq!(bare.url_path(), None);
    }

    #[test]
    fn test_unknown_kind() {
        let raw = RawRepositoryConfig {
            kind: Some("CDP".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            raw.validate(None),
            Err(CoreError::UnknownKind { .. })
        ));
    }

    #[test]
    fn test_yaml_with_legacy_keys() {
        let yaml = r#"
type: SMB
name: Main
URL: smb://files.example.org
share_port: "139"
workgroup_or_domain: EXAMPLE
share_name: CasperShare
username: rw
password: "p@ss word"
id: "12"
"#;
        let raw: RawRepositoryConfig = serde_yaml::from_str(yaml).unwrap();
        let config = raw.validate(None).unwrap();

        assert_eq!(config.url, "files.example.org");
        assert_eq!(config.port(), 139);
        assert_eq!(config.object_id, ObjectId::new(12));
        let share = config.share().unwrap();
        assert_eq!(share.domain.as_deref(), Some("EXAMPLE"));
        assert_eq!(share.password.expose(), "p@ss word");
    }

    #[test]
    fn test_password_is_redacted_in_debug() {
        let raw = RawRepositoryConfig::new(RepositoryKind::Afp).with_password("hunter2");
        assert!(!format!("{:?}", raw).contains("hunter2"));
    }

    #[test]
    fn test_upload_path_is_normalized() {
        let config = RawRepositoryConfig::new(RepositoryKind::Http)
            .with_url("cdn.example.org")
            .with_port(80)
            .with_path("/jamf/")
            .validate(None)
            .unwrap();
        assert_eq!(config.upload().unwrap().path.as_deref(), Some("jamf"));
    }
}
