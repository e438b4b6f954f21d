//! distpoint core - configuration types for distribution points
//!
//! This crate holds the data the distribution layer is built from:
//! - `RawRepositoryConfig` / `RepositoryConfig`: per-backend configuration
//!   and its validation
//! - `RepositoryKind`: the closed set of backends
//! - `ArtifactKind`: package vs script routing by extension
//! - `ObjectId` / `UploadTarget`: server catalog identity for uploads
//! - `ShareListing`: the server's own share list, used to backfill legacy
//!   share entries

pub mod artifact;
pub mod config;
pub mod error;
pub mod kind;
pub mod listing;
pub mod object_id;

pub use artifact::ArtifactKind;
pub use config::{
    Password, RawRepositoryConfig, RepositoryConfig, RepositorySettings, ServiceSettings,
    ShareSettings, UploadSettings, strip_scheme,
};
pub use error::{CoreError, Result};
pub use kind::RepositoryKind;
pub use listing::{ServerShare, ShareListing};
pub use object_id::{ObjectId, UploadTarget};
