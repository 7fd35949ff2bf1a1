use anyhow::{Context, Result};

use biograf_offline::{AddCallbacks, DownloadState, OfflineError, Outcome};

use super::Session;
use crate::ui::{ProgressTrackerBuilder, Tracker, TrackerBuilder};

#[derive(Debug, clap::Args)]
pub struct Add {
    /// Asset name (slug)
    name: String,
    /// Asset root below the origin; defaults to the name
    #[arg(long)]
    root: Option<String>,
    /// Page path remembered with the asset
    #[arg(long)]
    page: Option<String>,
}

impl Add {
    /// Download the asset, cancelling cleanly on Ctrl-C.
    pub async fn run(self, session: &Session) -> Result<()> {
        let cache = &session.cache;
        let root = self.root.unwrap_or_else(|| self.name.clone());

        if cache.has(&self.name)? {
            println!("{} is already available offline.", self.name);
            return Ok(());
        }

        let state = DownloadState::Adding;
        if let Some(notice) = state.start_notice() {
            eprintln!("{notice}");
        }

        let mut builder = ProgressTrackerBuilder::default().with_prefix(&self.name);
        if let Some(notice) = state.end_notice(Outcome::Finished) {
            builder = builder.with_finish(notice);
        }
        let tracker = builder.build();
        let callbacks = AddCallbacks::new().on_progress({
            let tracker = tracker.clone();
            move |loaded, total| {
                tracker.update(loaded, total);
            }
        });

        let add = cache.add(&self.name, &root, self.page.as_deref(), callbacks);
        tokio::pin!(add);
        let result = tokio::select! {
            result = &mut add => result,
            _ = tokio::signal::ctrl_c() => {
                cache.cancel(&root);
                add.await
            }
        };

        match result {
            Ok(()) => {
                tracker.finish();
                Ok(())
            }
            Err(OfflineError::Cancelled { .. }) => {
                tracker.abandon(state.end_notice(Outcome::Cancelled).unwrap_or("Cancelled."));
                Ok(())
            }
            Err(e) => {
                tracker.abandon("failed");
                Err(e).with_context(|| format!("Failed to add {}", self.name))
            }
        }
    }
}
