//! Distribution point set
//!
//! An ordered collection of adapters that fans copies and existence checks
//! out to every member. A failing member never aborts the batch: each
//! member's result lands in the returned report, named after the member.

use futures::future::join_all;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use distpoint_core::{ArtifactKind, ObjectId, RawRepositoryConfig, RepositoryKind, ShareListing};

use crate::backend::{BackendContext, DistributionPoint, Existence, create_point};
use crate::config::{DistributionConfig, FanOut, SetOptions};
use crate::error::{RepoError, Result};
use crate::mount::{Mounter, SystemMounter};

/// Picks a member by name or by position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Name(String),
    Index(usize),
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        Selector::Name(name.to_string())
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Selector::Name(name)
    }
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Selector::Index(index)
    }
}

/// One member's share of an aggregate call
#[derive(Debug)]
pub struct MemberOutcome<T> {
    pub name: String,
    pub kind: RepositoryKind,
    pub result: Result<T>,
}

impl<T> MemberOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-member results of a copy or mount
#[derive(Debug)]
pub struct DistributionReport {
    pub outcomes: Vec<MemberOutcome<()>>,
}

impl DistributionReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &MemberOutcome<()>> {
        self.outcomes.iter().filter(|o| o.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &MemberOutcome<()>> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    /// Every member succeeded
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.is_ok())
    }

    pub fn get(&self, name: &str) -> Option<&MemberOutcome<()>> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Fail with [`RepoError::AllFailed`] when no member succeeded
    pub fn into_result(self) -> Result<Self> {
        if !self.outcomes.is_empty() && self.succeeded().next().is_none() {
            return Err(RepoError::AllFailed {
                count: self.outcomes.len(),
            });
        }
        Ok(self)
    }
}

impl fmt::Display for DistributionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(()) => writeln!(f, "{} ({}): ok", outcome.name, outcome.kind)?,
                Err(e) => writeln!(f, "{} ({}): {}", outcome.name, outcome.kind, e)?,
            }
        }
        Ok(())
    }
}

/// Per-member results of an existence check
#[derive(Debug)]
pub struct ExistenceReport {
    pub filename: String,
    pub outcomes: Vec<MemberOutcome<Existence>>,
}

impl ExistenceReport {
    /// `Present` if any member has the file, `Absent` only if every member
    /// is sure it does not. Member errors count as `Unknown`.
    pub fn overall(&self) -> Existence {
        let mut all_absent = true;
        for outcome in &self.outcomes {
            match outcome.result {
                Ok(Existence::Present) => return Existence::Present,
                Ok(Existence::Absent) => {}
                Ok(Existence::Unknown) | Err(_) => all_absent = false,
            }
        }

        if all_absent {
            Existence::Absent
        } else {
            Existence::Unknown
        }
    }

    pub fn is_present(&self) -> bool {
        self.overall().is_present()
    }

    pub fn get(&self, name: &str) -> Option<&MemberOutcome<Existence>> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

/// Ordered, uniquely named collection of distribution points
pub struct DistributionPointSet {
    points: Vec<Box<dyn DistributionPoint>>,
    options: SetOptions,
    listing: Option<ShareListing>,
    mounter: Arc<dyn Mounter>,
}

impl DistributionPointSet {
    /// Set with no members, mounting through the host's mount tools
    pub fn empty(options: SetOptions) -> Self {
        Self {
            points: Vec::new(),
            options,
            listing: None,
            mounter: Arc::new(SystemMounter::new()),
        }
    }

    /// Build a set from repository entries, in order.
    /// The first entry that fails validation or construction fails the set.
    pub fn new<'a>(
        configs: impl IntoIterator<Item = &'a RawRepositoryConfig>,
        options: SetOptions,
    ) -> Result<Self> {
        let mut set = Self::empty(options);
        set.add_all(configs)?;
        Ok(set)
    }

    /// Like [`DistributionPointSet::new`], resolving share entries against
    /// the server's share listing
    pub fn with_listing<'a>(
        configs: impl IntoIterator<Item = &'a RawRepositoryConfig>,
        listing: ShareListing,
        options: SetOptions,
    ) -> Result<Self> {
        let mut set = Self::empty(options);
        set.listing = Some(listing);
        set.add_all(configs)?;
        Ok(set)
    }

    pub fn from_config(config: &DistributionConfig) -> Result<Self> {
        Self::new(&config.repositories, config.options.clone())
    }

    /// Mount shares through `mounter`; affects members added afterwards
    pub fn with_mounter(mut self, mounter: Arc<dyn Mounter>) -> Self {
        self.mounter = mounter;
        self
    }

    /// Share listing consulted by later `add` calls
    pub fn set_listing(&mut self, listing: ShareListing) {
        self.listing = Some(listing);
    }

    pub fn options(&self) -> &SetOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn DistributionPoint> {
        self.points
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref() as &dyn DistributionPoint)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn DistributionPoint + 'static)> {
        self.points
            .iter_mut()
            .find(|p| p.name() == name)
            .map(|p| p.as_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn DistributionPoint> {
        self.points.iter().map(|p| p.as_ref() as &dyn DistributionPoint)
    }

    fn context(&self) -> BackendContext {
        BackendContext {
            mounter: Arc::clone(&self.mounter),
            mount_root: self.options.mount_root.clone(),
            browseable: self.options.browseable,
            request_timeout: self.options.request_timeout,
        }
    }

    /// Validate and append an entry. Returns the member's final name,
    /// which carries a numeric suffix when the requested one was taken.
    pub fn add(&mut self, raw: &RawRepositoryConfig) -> Result<String> {
        let mut config = raw.validate(self.listing.as_ref())?;
        config.name = self.unique_name(&config.name, raw.has_explicit_name());

        let name = config.name.clone();
        let point = create_point(config, &self.context())?;
        tracing::debug!(repository = %name, kind = %point.kind(), "added distribution point");
        self.points.push(point);
        Ok(name)
    }

    pub fn add_all<'a>(
        &mut self,
        configs: impl IntoIterator<Item = &'a RawRepositoryConfig>,
    ) -> Result<Vec<String>> {
        configs.into_iter().map(|raw| self.add(raw)).collect()
    }

    /// Append a ready-made adapter. Its name is fixed, so a collision is
    /// an error rather than a rename.
    pub fn add_point(&mut self, point: Box<dyn DistributionPoint>) -> Result<()> {
        if self.contains(point.name()) {
            return Err(RepoError::RepositoryAlreadyExists {
                name: point.name().to_string(),
            });
        }
        self.points.push(point);
        Ok(())
    }

    /// Detach a member. It is returned as-is; unmounting is the caller's
    /// business.
    pub fn remove(&mut self, selector: impl Into<Selector>) -> Result<Box<dyn DistributionPoint>> {
        let index = match selector.into() {
            Selector::Name(name) => self
                .points
                .iter()
                .position(|p| p.name() == name)
                .ok_or(RepoError::RepositoryNotFound { name })?,
            Selector::Index(index) if index < self.points.len() => index,
            Selector::Index(index) => {
                return Err(RepoError::RepositoryNotFound {
                    name: format!("#{}", index),
                });
            }
        };

        let point = self.points.remove(index);
        tracing::debug!(repository = %point.name(), "removed distribution point");
        Ok(point)
    }

    fn contains(&self, name: &str) -> bool {
        self.points.iter().any(|p| p.name() == name)
    }

    fn unique_name(&self, base: &str, explicit: bool) -> String {
        if explicit && !self.contains(base) {
            return base.to_string();
        }

        let first = if explicit { 2 } else { 1 };
        (first..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Copy a file to every member, routed by its extension
    pub async fn copy(&mut self, local: &Path, id: Option<ObjectId>) -> Result<DistributionReport> {
        let artifact = ArtifactKind::from_path(local);
        self.transfer(local, id, artifact).await
    }

    pub async fn copy_package(
        &mut self,
        local: &Path,
        id: Option<ObjectId>,
    ) -> Result<DistributionReport> {
        self.transfer(local, id, ArtifactKind::Package).await
    }

    pub async fn copy_script(
        &mut self,
        local: &Path,
        id: Option<ObjectId>,
    ) -> Result<DistributionReport> {
        self.transfer(local, id, ArtifactKind::Script).await
    }

    async fn transfer(
        &mut self,
        local: &Path,
        id: Option<ObjectId>,
        artifact: ArtifactKind,
    ) -> Result<DistributionReport> {
        if self.points.is_empty() {
            return Err(RepoError::EmptySet);
        }
        if tokio::fs::metadata(local).await.is_err() {
            return Err(RepoError::ArtifactNotFound {
                path: local.display().to_string(),
            });
        }

        tracing::info!(
            "copying {} to {} distribution point(s)",
            local.display(),
            self.points.len()
        );

        let browseable = self.options.browseable;
        let outcomes = fan_out(
            &mut self.points,
            self.options.fan_out,
            self.options.member_timeout,
            move |point| async move {
                point.mount(browseable).await?;
                match artifact {
                    ArtifactKind::Package => point.copy_package(local, id).await,
                    ArtifactKind::Script => point.copy_script(local, id).await,
                }
            },
        )
        .await;

        let report = DistributionReport { outcomes };
        for outcome in report.failed() {
            if let Err(e) = &outcome.result {
                tracing::warn!(repository = %outcome.name, "copy failed: {}", e);
            }
        }
        Ok(report)
    }

    /// Ask every member whether it holds `filename`
    pub async fn exists(&mut self, filename: &str) -> Result<ExistenceReport> {
        if self.points.is_empty() {
            return Err(RepoError::EmptySet);
        }

        let outcomes = fan_out(
            &mut self.points,
            self.options.fan_out,
            self.options.member_timeout,
            |point| point.exists(filename),
        )
        .await;

        Ok(ExistenceReport {
            filename: filename.to_string(),
            outcomes,
        })
    }

    /// Like [`DistributionPointSet::exists`], using each member's richer
    /// probe where it has one
    pub async fn exists_with_extended_probe(&mut self, filename: &str) -> Result<ExistenceReport> {
        if self.points.is_empty() {
            return Err(RepoError::EmptySet);
        }

        let outcomes = fan_out(
            &mut self.points,
            self.options.fan_out,
            self.options.member_timeout,
            |point| async move { Ok(point.exists_with_extended_probe(filename).await) },
        )
        .await;

        Ok(ExistenceReport {
            filename: filename.to_string(),
            outcomes,
        })
    }

    /// Mount every share member ahead of time
    pub async fn mount_all(&mut self, browseable: bool) -> DistributionReport {
        let outcomes = fan_out(
            &mut self.points,
            self.options.fan_out,
            self.options.member_timeout,
            |point| point.mount(browseable),
        )
        .await;
        DistributionReport { outcomes }
    }

    /// Unmount every share member. Never fails.
    pub async fn umount_all(&mut self) {
        for point in &mut self.points {
            point.umount().await;
        }
    }
}

impl fmt::Display for DistributionPointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Distribution points ({}):", self.points.len())?;
        for (index, point) in self.points.iter().enumerate() {
            write!(f, "  {}: {} ({}) {}", index, point.name(), point.kind(), point.location())?;
            if let Some(state) = point.mount_state() {
                write!(f, " [{}]", state)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Run `op` against every member under the member timeout. Each member is
/// borrowed by exactly one future, so no adapter is ever used concurrently.
async fn fan_out<'a, T, F, Fut>(
    points: &'a mut [Box<dyn DistributionPoint>],
    mode: FanOut,
    limit: Duration,
    mut op: F,
) -> Vec<MemberOutcome<T>>
where
    F: FnMut(&'a mut dyn DistributionPoint) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let tasks: Vec<_> = points
        .iter_mut()
        .map(|point| {
            let name = point.name().to_string();
            let kind = point.kind();
            let work = op(point.as_mut());
            async move {
                let result = bounded(&name, limit, work).await;
                MemberOutcome { name, kind, result }
            }
        })
        .collect();

    match mode {
        FanOut::Sequential => {
            let mut outcomes = Vec::with_capacity(tasks.len());
            for task in tasks {
                outcomes.push(task.await);
            }
            outcomes
        }
        FanOut::Concurrent => join_all(tasks).await,
    }
}

async fn bounded<T>(name: &str, limit: Duration, work: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => Err(RepoError::Timeout {
            repo: name.to_string(),
            limit,
        }),
    }
}
