//! Per-asset job bookkeeping.
//!
//! At most one job runs per asset. A job is known by its root and, when the
//! caller has one, by the asset name; either identifies it. Registering hands
//! out a guard that frees the slot when dropped, whether the job completed,
//! failed or was cancelled.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use biograf_store::resource_path;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Add,
    Prefetch,
    Remove,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Add => write!(f, "add"),
            JobKind::Prefetch => write!(f, "prefetch"),
            JobKind::Remove => write!(f, "remove"),
        }
    }
}

#[derive(Debug)]
struct ActiveJob {
    kind: JobKind,
    name: Option<String>,
    token: CancellationToken,
}

impl ActiveJob {
    fn answers_to(&self, root: &str, id: &str) -> bool {
        root == id || self.name.as_deref() == Some(id)
    }
}

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, ActiveJob>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ActiveJob>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim the slot for `root`.
    ///
    /// Returns the kind of the job already holding it on conflict.
    pub fn register(&self, root: &str, kind: JobKind) -> Result<JobGuard<'_>, JobKind> {
        self.claim(root, None, kind)
    }

    /// Claim the slot for `root` on behalf of the asset called `name`.
    ///
    /// Conflicts with any job whose root or name is `root` or `name`.
    pub fn register_named(
        &self,
        root: &str,
        name: &str,
        kind: JobKind,
    ) -> Result<JobGuard<'_>, JobKind> {
        self.claim(root, Some(name), kind)
    }

    fn claim(
        &self,
        root: &str,
        name: Option<&str>,
        kind: JobKind,
    ) -> Result<JobGuard<'_>, JobKind> {
        let root = resource_path(root);
        let mut jobs = self.lock();
        let ids = [Some(root.as_str()), name];
        let conflict = jobs
            .iter()
            .find(|(key, job)| ids.iter().flatten().any(|id| job.answers_to(key, id)))
            .map(|(_, job)| job.kind);
        if let Some(active) = conflict {
            return Err(active);
        }

        let token = CancellationToken::new();
        jobs.insert(
            root.clone(),
            ActiveJob {
                kind,
                name: name.map(str::to_string),
                token: token.clone(),
            },
        );
        tracing::trace!(%root, %kind, "job registered");
        Ok(JobGuard {
            registry: self,
            root,
            token,
        })
    }

    fn find<'a>(jobs: &'a HashMap<String, ActiveJob>, asset: &str) -> Option<&'a ActiveJob> {
        let root = resource_path(asset);
        jobs.get(&root)
            .or_else(|| jobs.values().find(|job| job.name.as_deref() == Some(asset)))
    }

    /// Kind of the job running for `asset` (root or name).
    pub fn active(&self, asset: &str) -> Option<JobKind> {
        Self::find(&self.lock(), asset).map(|job| job.kind)
    }

    /// Request cancellation of the job for `asset` (root or name).
    ///
    /// Returns `false` if none runs.
    pub fn cancel(&self, asset: &str) -> bool {
        match Self::find(&self.lock(), asset) {
            Some(job) => {
                job.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every job of `kind`, returning how many were signalled.
    pub fn cancel_kind(&self, kind: JobKind) -> usize {
        let jobs = self.lock();
        jobs.values()
            .filter(|job| job.kind == kind)
            .inspect(|job| job.token.cancel())
            .count()
    }

    pub fn cancel_all(&self) -> usize {
        let jobs = self.lock();
        for job in jobs.values() {
            job.token.cancel();
        }
        jobs.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Holds a registry slot for the lifetime of a job.
#[derive(Debug)]
pub struct JobGuard<'a> {
    registry: &'a JobRegistry,
    root: String,
    token: CancellationToken,
}

impl JobGuard<'_> {
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.root);
        tracing::trace!(root = %self.root, "job released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_job_per_root() {
        let registry = JobRegistry::new();
        let guard = registry.register("/show/ep-1/", JobKind::Add).unwrap();
        assert_eq!(guard.root(), "show/ep-1");

        assert_eq!(
            registry.register("show/ep-1", JobKind::Prefetch).unwrap_err(),
            JobKind::Add
        );
        assert!(registry.register("show/ep-2", JobKind::Prefetch).is_ok());
        assert_eq!(registry.active("show/ep-1"), Some(JobKind::Add));
    }

    #[test]
    fn test_guard_releases_slot() {
        let registry = JobRegistry::new();
        {
            let _guard = registry.register("a", JobKind::Remove).unwrap();
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
        assert!(registry.register("a", JobKind::Add).is_ok());
    }

    #[test]
    fn test_name_identifies_job() {
        let registry = JobRegistry::new();
        let add = registry
            .register_named("show/ep-1", "ep-1", JobKind::Add)
            .unwrap();

        assert_eq!(registry.active("ep-1"), Some(JobKind::Add));
        assert_eq!(registry.active("show/ep-1/"), Some(JobKind::Add));
        assert_eq!(
            registry.register_named("ep-1", "ep-1", JobKind::Remove).unwrap_err(),
            JobKind::Add
        );
        assert_eq!(
            registry.register("show/ep-1", JobKind::Prefetch).unwrap_err(),
            JobKind::Add
        );

        assert!(registry.cancel("ep-1"));
        assert!(add.is_cancelled());
        drop(add);
        assert!(registry.register_named("ep-1", "ep-1", JobKind::Remove).is_ok());
    }

    #[test]
    fn test_cancel() {
        let registry = JobRegistry::new();
        let add = registry.register("a", JobKind::Add).unwrap();
        let prefetch = registry.register("b", JobKind::Prefetch).unwrap();

        assert!(!registry.cancel("missing"));
        assert_eq!(registry.cancel_kind(JobKind::Prefetch), 1);
        assert!(prefetch.is_cancelled());
        assert!(!add.is_cancelled());

        assert!(registry.cancel("a"));
        assert!(registry.cancel("a"));
        assert!(add.is_cancelled());
    }
}
