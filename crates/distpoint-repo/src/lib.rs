//! distpoint Distribution Points
//!
//! This crate moves packages and scripts to the places managed Macs install
//! them from:
//!
//! - **File shares**: AFP and SMB shares, mounted on demand
//! - **Upload endpoints**: HTTP/HTTPS servers taking multipart uploads
//! - **Distribution Service**: the management server's own replicated store
//!
//! ## Key Features
//!
//! - **Unified interface**: every backend answers the same `copy`/`exists`
//!   calls; mount and unmount are no-ops where nothing needs mounting
//! - **Partial failure**: one unreachable member never aborts a batch
//! - **Tri-state existence**: "could not tell" is never reported as "absent"
//! - **Bounded members**: every member call runs under a timeout
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use distpoint_repo::{DistributionConfig, DistributionPointSet};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DistributionConfig::load()?;
//! let mut set = DistributionPointSet::from_config(&config)?;
//!
//! // Copy to every member; failures are reported per member
//! let report = set.copy(Path::new("Firefox.pkg"), None).await?;
//! print!("{}", report);
//!
//! let existence = set.exists("Firefox.pkg").await?;
//! println!("Firefox.pkg: {}", existence.overall());
//!
//! set.umount_all().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Notes
//!
//! - Share passwords are percent-escaped into mount URLs and masked in
//!   every `Display` and `Debug` rendering
//! - HTTP sessions never follow redirects, so credentials stay on the
//!   configured host

pub mod error;
pub mod config;
pub mod mount;
pub mod multipart;
pub mod client;
pub mod backend;
pub mod share;
pub mod http;
pub mod service;
pub mod set;

// Re-exports for convenience
pub use error::{ErrorCategory, RepoError, Result, UploadErrorKind};
pub use config::{DistributionConfig, FanOut, SetOptions};
pub use mount::{MountRequest, MountState, Mounter, SystemMounter};
pub use multipart::{EncodedForm, MultipartForm, Part};
pub use client::{BasicAuth, UploadClient};
pub use backend::{BackendContext, DistributionPoint, Existence, create_point};
pub use share::ShareRepository;
pub use http::UploadRepository;
pub use service::DistributionServiceRepository;
pub use set::{DistributionPointSet, DistributionReport, ExistenceReport, MemberOutcome, Selector};

pub use distpoint_core::{ObjectId, RawRepositoryConfig, RepositoryConfig, RepositoryKind};
