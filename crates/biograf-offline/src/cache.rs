use std::fmt;
use std::sync::Arc;

use biograf_fetch::{
    FetchOptions, Fetcher, HttpClient, PlannedResource, SegmentPlanner, planned_bytes,
};
use biograf_store::{
    AssetRecord, ByteSpan, Catalog, ChunkStore, KeyPrefix, ResourceRecord, Tier, UnitKey,
    UnitMeta, covers, resource_path,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::OfflineConfig;
use crate::error::{OfflineError, Result};
use crate::library::Library;
use crate::registry::{JobKind, JobRegistry};
use crate::state::AssetState;

pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;
pub type CompleteFn = Arc<dyn Fn() + Send + Sync>;

/// Callbacks for a user-visible download.
#[derive(Clone, Default)]
pub struct AddCallbacks {
    pub on_progress: Option<ProgressFn>,
    pub on_complete: Option<CompleteFn>,
}

impl AddCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with `(bytes_loaded, bytes_total)` after each stored unit.
    #[must_use]
    pub fn on_progress(mut self, f: impl Fn(u64, u64) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(f));
        self
    }

    /// Called once when every unit is stored.
    #[must_use]
    pub fn on_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for AddCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddCallbacks")
            .field("on_progress", &self.on_progress.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Stores whole assets for offline playback and warms the start of popular ones.
///
/// The cache is the only writer of its store. Readers such as a ranged
/// response synthesizer can share the same store through [`OfflineCache::store`].
pub struct OfflineCache<S, C: HttpClient> {
    store: Arc<S>,
    fetcher: Fetcher<C>,
    planner: SegmentPlanner,
    config: OfflineConfig,
    jobs: JobRegistry,
}

impl<S, C> OfflineCache<S, C>
where
    S: ChunkStore + Catalog,
    C: HttpClient,
{
    pub fn new(store: Arc<S>, fetcher: Fetcher<C>, config: OfflineConfig) -> Self {
        Self {
            store,
            fetcher,
            planner: SegmentPlanner::default(),
            config,
            jobs: JobRegistry::new(),
        }
    }

    /// Build the fetcher from the configured origin and retry settings.
    pub fn connect(store: Arc<S>, client: C, config: OfflineConfig) -> Result<Self> {
        let fetcher = Fetcher::new(client, &config.origin)
            .map_err(|source| OfflineError::Resolution {
                asset: config.origin.clone(),
                source,
            })?
            .with_options(FetchOptions::default().max_retries(config.max_retries));
        Ok(Self::new(store, fetcher, config))
    }

    #[must_use]
    pub fn with_planner(mut self, planner: SegmentPlanner) -> Self {
        self.planner = planner;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &Fetcher<C> {
        &self.fetcher
    }

    /// Offline record whose name or root is `asset`.
    fn offline_record(&self, asset: &str) -> Result<Option<AssetRecord>> {
        let root = resource_path(asset);
        if let Some(record) = self.store.record(Tier::Offline, &root)? {
            return Ok(Some(record));
        }
        Ok(self
            .store
            .records(Tier::Offline)?
            .into_iter()
            .find(|record| record.name == asset))
    }

    /// Whether every planned unit of `record` is in the store.
    fn is_intact(&self, record: &AssetRecord) -> Result<bool> {
        if !record.complete {
            return Ok(false);
        }
        for resource in &record.resources {
            let spans: Vec<ByteSpan> = self
                .store
                .keys(&KeyPrefix::resource(record.tier, &resource.path))?
                .into_iter()
                .map(|key| key.span)
                .collect();
            if !covers(&spans, resource.planned_span()) {
                debug!(asset = %record.name, path = %resource.path, "record has missing units");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn tier_intact(&self, tier: Tier, root: &str) -> Result<bool> {
        match self.store.record(tier, root)? {
            Some(record) => self.is_intact(&record),
            None => Ok(false),
        }
    }

    /// Whether `asset` (name or root) is fully available offline.
    pub fn has(&self, asset: &str) -> Result<bool> {
        match self.offline_record(asset)? {
            Some(record) => self.is_intact(&record),
            None => Ok(false),
        }
    }

    /// Whether a completed prefetch exists for a composite manifest path.
    pub fn has_prefetched(&self, composite: &str) -> Result<bool> {
        let root = self
            .config
            .prefetch_root(composite)
            .unwrap_or(composite);
        self.tier_intact(Tier::Prefetch, root)
    }

    pub fn state(&self, root: &str) -> Result<AssetState> {
        if let Some(kind) = self.jobs.active(root) {
            return Ok(match kind {
                JobKind::Add => AssetState::Adding,
                JobKind::Prefetch => AssetState::Prefetching,
                JobKind::Remove => AssetState::Removing,
            });
        }
        if self.tier_intact(Tier::Offline, root)? {
            return Ok(AssetState::Complete);
        }
        if self.tier_intact(Tier::Prefetch, root)? {
            return Ok(AssetState::PartiallyPrefetched);
        }
        Ok(AssetState::Absent)
    }

    /// Every catalog record, offline first.
    pub fn assets(&self) -> Result<Vec<AssetRecord>> {
        let mut records = self.store.records(Tier::Offline)?;
        records.extend(self.store.records(Tier::Prefetch)?);
        Ok(records)
    }

    /// Download every offline file of an asset.
    ///
    /// Returns once the job is terminal. Adding an asset that is already
    /// complete returns immediately without invoking callbacks.
    ///
    /// # Errors
    ///
    /// - [`OfflineError::AlreadyInProgress`] if a job runs for `root`
    /// - [`OfflineError::Resolution`] if a file length cannot be determined
    /// - [`OfflineError::Download`] on the first failed unit fetch
    /// - [`OfflineError::Cancelled`] if [`OfflineCache::cancel`] was observed
    /// - [`OfflineError::StoreIo`] if a write fails
    ///
    /// Units written before a failure are deleted.
    pub async fn add(
        &self,
        name: &str,
        root: &str,
        page_path: Option<&str>,
        callbacks: AddCallbacks,
    ) -> Result<()> {
        let root = resource_path(root);
        let guard = self
            .jobs
            .register_named(&root, name, JobKind::Add)
            .map_err(|_| OfflineError::AlreadyInProgress {
                asset: root.clone(),
            })?;

        if self.tier_intact(Tier::Offline, &root)? {
            debug!(asset = %name, "already available offline");
            return Ok(());
        }

        info!(asset = %name, %root, "adding asset for offline use");
        let result = self
            .run_add(guard.token(), name, &root, page_path, &callbacks)
            .await;

        match result {
            Ok(()) => {
                info!(asset = %name, "asset available offline");
                if let Some(on_complete) = &callbacks.on_complete {
                    on_complete();
                }
                Ok(())
            }
            Err(e) => {
                warn!(asset = %name, error = %e, "offline download stopped");
                self.discard(Tier::Offline, &root);
                Err(e)
            }
        }
    }

    async fn run_add(
        &self,
        token: &CancellationToken,
        name: &str,
        root: &str,
        page_path: Option<&str>,
        callbacks: &AddCallbacks,
    ) -> Result<()> {
        let plan = self
            .planner
            .plan(&self.fetcher, root, &self.config.offline_refs())
            .await
            .map_err(|source| OfflineError::Resolution {
                asset: name.to_string(),
                source,
            })?;

        let mut record = AssetRecord::new(name, root, Tier::Offline);
        record.page_path = page_path.map(str::to_string);
        record.resources = plan.iter().map(resource_record).collect();
        self.store.put_record(&record)?;

        self.download(token, Tier::Offline, root, &plan, callbacks.on_progress.as_ref())
            .await?;

        if token.is_cancelled() {
            return Err(OfflineError::Cancelled {
                asset: root.to_string(),
            });
        }
        record.complete = true;
        self.store.put_record(&record)?;
        self.store.flush()?;
        Ok(())
    }

    /// Fetch and store the units of `plan` one at a time.
    async fn download(
        &self,
        token: &CancellationToken,
        tier: Tier,
        root: &str,
        plan: &[PlannedResource],
        on_progress: Option<&ProgressFn>,
    ) -> Result<()> {
        let total = planned_bytes(plan);
        let mut loaded = 0u64;
        let cancelled = || OfflineError::Cancelled {
            asset: root.to_string(),
        };

        for resource in plan {
            let meta = UnitMeta {
                content_type: resource.content_type.clone(),
                total_length: resource.length,
            };

            for segment in &resource.segments {
                if token.is_cancelled() {
                    return Err(cancelled());
                }

                let fetched = self
                    .fetcher
                    .fetch_range(&resource.url, segment.start, segment.end)
                    .await;
                if token.is_cancelled() {
                    debug!(url = %resource.url, "discarding unit fetched after cancellation");
                    return Err(cancelled());
                }
                let bytes = fetched.map_err(|source| OfflineError::Download {
                    url: resource.url.to_string(),
                    source,
                })?;

                let key = UnitKey::new(tier, &resource.path, ByteSpan::new(segment.start, segment.end));
                self.store.put(&key, &bytes, &meta)?;
                loaded += bytes.len() as u64;
                debug!(%key, loaded, total, "stored unit");

                if let Some(on_progress) = on_progress {
                    on_progress(loaded, total);
                }
            }
        }
        Ok(())
    }

    /// Delete the units and record of a failed or cancelled job.
    fn discard(&self, tier: Tier, root: &str) {
        let units = self.store.delete_prefix(&KeyPrefix::asset(tier, root));
        let record = self.store.delete_record(tier, root);
        match (units, record) {
            (Ok(count), Ok(_)) => debug!(%root, %tier, count, "discarded partial download"),
            (Err(e), _) | (_, Err(e)) => {
                warn!(%root, %tier, error = %e, "failed to discard partial download")
            }
        }
    }

    /// Request cancellation of the job running for `asset` (root or name).
    ///
    /// Idempotent. The job stops at its next unit boundary and deletes what
    /// it stored.
    pub fn cancel(&self, asset: &str) -> bool {
        let signalled = self.jobs.cancel(asset);
        if signalled {
            info!(%asset, "cancellation requested");
        }
        signalled
    }

    /// Delete the offline copy of `asset` (name or root).
    ///
    /// Removing an absent asset is a no-op.
    ///
    /// # Errors
    ///
    /// [`OfflineError::JobActive`] if any job runs for the asset.
    pub async fn remove(&self, asset: &str) -> Result<()> {
        let busy = |kind| OfflineError::JobActive {
            asset: asset.to_string(),
            kind,
        };
        let _guard = self
            .jobs
            .register_named(asset, asset, JobKind::Remove)
            .map_err(busy)?;

        let Some(record) = self.offline_record(asset)? else {
            debug!(%asset, "nothing to remove");
            return Ok(());
        };
        // Found by name: its root needs a slot of its own.
        let _root_guard = if record.root == resource_path(asset) {
            None
        } else {
            Some(
                self.jobs
                    .register(&record.root, JobKind::Remove)
                    .map_err(busy)?,
            )
        };
        let root = record.root;

        let count = self.store.delete_prefix(&KeyPrefix::asset(Tier::Offline, &root))?;
        self.store.delete_record(Tier::Offline, &root)?;
        self.store.flush()?;
        info!(%asset, units = count, "removed offline copy");
        Ok(())
    }

    /// Warm the first `buffer_goal` bytes of each prefetch file of an asset.
    ///
    /// Best effort: failures are logged, not returned. Returns whether the
    /// prefetch completed.
    pub async fn prefetch(&self, composite: &str, buffer_goal: u64) -> bool {
        let Some(root) = self.config.prefetch_root(composite) else {
            warn!(%composite, "not a prefetch manifest path");
            return false;
        };

        match self.has_prefetched(composite) {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => {
                warn!(%composite, error = %e, "prefetch lookup failed");
                return false;
            }
        }

        let Ok(guard) = self.jobs.register(root, JobKind::Prefetch) else {
            debug!(%composite, "asset busy, skipping prefetch");
            return false;
        };

        debug!(%composite, buffer_goal, "prefetching");
        match self
            .run_prefetch(guard.token(), composite, root, buffer_goal)
            .await
        {
            Ok(()) => {
                info!(%composite, "prefetched");
                true
            }
            Err(e) => {
                warn!(%composite, error = %e, "prefetch failed");
                self.discard(Tier::Prefetch, root);
                false
            }
        }
    }

    async fn run_prefetch(
        &self,
        token: &CancellationToken,
        composite: &str,
        root: &str,
        buffer_goal: u64,
    ) -> Result<()> {
        let plan = self
            .planner
            .plan_prefix(&self.fetcher, root, &self.config.prefetch_refs(), buffer_goal)
            .await
            .map_err(|source| OfflineError::Resolution {
                asset: composite.to_string(),
                source,
            })?;

        let mut record = AssetRecord::new(composite, root, Tier::Prefetch);
        record.resources = plan.iter().map(resource_record).collect();
        self.store.put_record(&record)?;

        self.download(token, Tier::Prefetch, root, &plan, None).await?;

        record.complete = true;
        self.store.put_record(&record)?;
        // A purge may have cancelled after the last unit; the caller discards.
        if token.is_cancelled() {
            return Err(OfflineError::Cancelled {
                asset: root.to_string(),
            });
        }
        Ok(())
    }

    /// Cancel running prefetches and delete every prefetched unit and record.
    ///
    /// Offline copies are left alone.
    pub async fn remove_all_prefetched(&self) -> Result<()> {
        let cancelled = self.jobs.cancel_kind(JobKind::Prefetch);
        let units = self.store.delete_prefix(&KeyPrefix::Tier(Tier::Prefetch))?;
        let mut records = 0;
        for record in self.store.records(Tier::Prefetch)? {
            if self.store.delete_record(Tier::Prefetch, &record.root)? {
                records += 1;
            }
        }
        self.store.flush()?;
        info!(cancelled, units, records, "removed prefetched data");
        Ok(())
    }

    /// Prefetch every popular episode that is not prefetched yet, one at a time.
    ///
    /// Each episode gets half of `buffer_goal`. Returns how many completed.
    pub async fn prefetch_popular(&self, library: &Library, buffer_goal: u64) -> usize {
        let mut completed = 0;
        for episode in library.popular() {
            let composite = self.config.prefetch_path(&episode.asset_path);
            match self.has_prefetched(&composite) {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    warn!(%composite, error = %e, "prefetch lookup failed");
                    continue;
                }
            }
            info!(%composite, "prefetching popular episode");
            if self.prefetch(&composite, buffer_goal / 2).await {
                completed += 1;
            }
        }
        completed
    }

    /// Bring prefetched data in line with the user's prefetch setting.
    ///
    /// Returns how many episodes were prefetched.
    pub async fn apply_prefetch_setting(&self, enabled: bool, library: &Library) -> Result<usize> {
        if !enabled {
            self.remove_all_prefetched().await?;
            return Ok(0);
        }
        Ok(self
            .prefetch_popular(library, self.config.prefetch_buffer_goal)
            .await)
    }

    /// Cancel every job and flush the store.
    pub fn shutdown(&self) -> Result<()> {
        let cancelled = self.jobs.cancel_all();
        if cancelled > 0 {
            info!(cancelled, "cancelled running jobs");
        }
        self.store.flush()?;
        Ok(())
    }
}

fn resource_record(resource: &PlannedResource) -> ResourceRecord {
    ResourceRecord {
        path: resource.path.clone(),
        length: resource.length,
        planned: resource.planned,
        content_type: resource.content_type.clone(),
    }
}
