mod add;
mod get;
mod ls;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use biograf_fetch::ReqwestClient;
use biograf_offline::{DownloadState, Library, OfflineCache, OfflineConfig, Outcome};
use biograf_store::{SledStore, StoreOptions};

use crate::env::BiografEnv;

pub use add::Add;
pub use get::Get;
pub use ls::Ls;

pub type Cache = OfflineCache<SledStore, ReqwestClient>;

#[derive(Debug, Parser)]
#[command(name = "biograf", version, about = "Keep streaming media available offline")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download an asset for offline playback
    Add(Add),
    /// Remove an offline asset
    #[command(visible_alias = "remove")]
    Rm(Rm),
    /// Report whether an asset is available offline
    Has(Has),
    Ls(Ls),
    /// Warm the beginning of an asset
    Prefetch(Prefetch),
    /// Delete every prefetched unit
    PurgePrefetched,
    /// Apply the prefetch setting to a video library
    Sync(Sync),
    /// Run a request through the cache
    Get(Get),
}

/// Everything a command needs: paths, configuration and the cache.
pub struct Session {
    pub cache: Arc<Cache>,
}

impl Session {
    pub fn open(env: BiografEnv) -> Result<Self> {
        let config = OfflineConfig::load(env.config())
            .with_context(|| format!("Failed to read {}", env.config().display()))?;
        let store = SledStore::open(env.store(), StoreOptions::default().capacity(config.capacity))
            .with_context(|| format!("Failed to open store at {}", env.store().display()))?;
        let cache = OfflineCache::connect(Arc::new(store), ReqwestClient::new(), config)
            .context("Invalid origin")?;

        tracing::debug!(root = %env.root().display(), "session opened");
        Ok(Self {
            cache: Arc::new(cache),
        })
    }

    pub fn config(&self) -> &OfflineConfig {
        self.cache.config()
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let session = Session::open(BiografEnv::new()?)?;
        let result = match self.command {
            Command::Add(cmd) => cmd.run(&session).await,
            Command::Rm(cmd) => cmd.run(&session).await,
            Command::Has(cmd) => cmd.run(&session),
            Command::Ls(cmd) => cmd.run(&session),
            Command::Prefetch(cmd) => cmd.run(&session).await,
            Command::PurgePrefetched => session
                .cache
                .remove_all_prefetched()
                .await
                .context("Failed to remove prefetched data"),
            Command::Sync(cmd) => cmd.run(&session).await,
            Command::Get(cmd) => cmd.run(&session).await,
        };
        session.cache.shutdown().context("Failed to flush store")?;
        result
    }
}

#[derive(Debug, clap::Args)]
pub struct Rm {
    /// Asset name or root
    name: String,
}

impl Rm {
    pub async fn run(self, session: &Session) -> Result<()> {
        let state = DownloadState::Removing;
        if let Some(notice) = state.start_notice() {
            eprintln!("{notice}");
        }
        session
            .cache
            .remove(&self.name)
            .await
            .with_context(|| format!("Failed to remove {}", self.name))?;
        if let Some(notice) = state.end_notice(Outcome::Finished) {
            println!("{notice}");
        }
        Ok(())
    }
}

#[derive(Debug, clap::Args)]
pub struct Has {
    /// Asset name or root
    name: String,
}

impl Has {
    pub fn run(self, session: &Session) -> Result<()> {
        let cache = &session.cache;
        let offline = cache.has(&self.name)?;
        let prefetched = cache.has_prefetched(&session.config().prefetch_path(&self.name))?;
        let state = cache.state(&self.name)?;
        println!(
            "{}: offline={} prefetched={} state={}",
            self.name, offline, prefetched, state
        );
        Ok(())
    }
}

#[derive(Debug, clap::Args)]
pub struct Prefetch {
    /// Asset root below the origin
    root: String,
    /// Bytes to warm per file; defaults to the configured buffer goal
    #[arg(long)]
    goal: Option<u64>,
}

impl Prefetch {
    pub async fn run(self, session: &Session) -> Result<()> {
        let composite = session.config().prefetch_path(&self.root);
        let goal = self.goal.unwrap_or(session.config().prefetch_buffer_goal);
        if session.cache.prefetch(&composite, goal).await {
            println!("Prefetched {composite}.");
        } else {
            println!("Could not prefetch {composite}; see the log for details.");
        }
        Ok(())
    }
}

#[derive(Debug, clap::Args)]
pub struct Sync {
    /// Path to a videos.json library
    library: PathBuf,
    /// Treat prefetching as disabled regardless of configuration
    #[arg(long)]
    disable: bool,
}

impl Sync {
    pub async fn run(self, session: &Session) -> Result<()> {
        let library = Library::load(&self.library)
            .with_context(|| format!("Failed to read library {}", self.library.display()))?;
        let enabled = session.config().prefetch_enabled && !self.disable;
        let prefetched = session
            .cache
            .apply_prefetch_setting(enabled, &library)
            .await?;
        if enabled {
            println!("Prefetched {prefetched} popular episode(s).");
        } else {
            println!("Prefetching disabled; removed prefetched data.");
        }
        Ok(())
    }
}
