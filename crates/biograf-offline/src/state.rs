//! Asset lifecycle and the notifications shown for it.

use std::fmt;

/// Where an asset is in its lifecycle.
///
/// ```text
/// Absent -> Prefetching -> PartiallyPrefetched | Absent
/// Absent | PartiallyPrefetched -> Adding -> Complete | Absent
/// Complete -> Removing -> Absent
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    Absent,
    Prefetching,
    PartiallyPrefetched,
    Adding,
    Complete,
    Removing,
}

impl AssetState {
    /// Whether a job currently owns the asset.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            AssetState::Prefetching | AssetState::Adding | AssetState::Removing
        )
    }
}

impl fmt::Display for AssetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetState::Absent => "absent",
            AssetState::Prefetching => "prefetching",
            AssetState::PartiallyPrefetched => "prefetched",
            AssetState::Adding => "adding",
            AssetState::Complete => "offline",
            AssetState::Removing => "removing",
        };
        f.write_str(s)
    }
}

/// What the user-facing toggle is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadState {
    #[default]
    Idle,
    Adding,
    Removing,
}

/// How a user-triggered operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Finished,
    Cancelled,
}

impl DownloadState {
    /// Message shown when an operation starts from this state.
    pub fn start_notice(self) -> Option<&'static str> {
        match self {
            DownloadState::Idle => None,
            DownloadState::Adding => Some("Caching video for offline."),
            DownloadState::Removing => Some("Deleting video."),
        }
    }

    /// Message shown when the operation ends. `Idle` has nothing to report.
    pub fn end_notice(self, outcome: Outcome) -> Option<&'static str> {
        match (self, outcome) {
            (DownloadState::Idle, _) => None,
            (DownloadState::Adding, Outcome::Finished) => Some("Downloaded video."),
            (DownloadState::Adding, Outcome::Cancelled) => Some("Cancelled download."),
            (DownloadState::Removing, _) => Some("Removed video."),
        }
    }

    /// Message shown when the user toggles while an operation is running.
    pub fn busy_notice(self) -> Option<&'static str> {
        match self {
            DownloadState::Idle => None,
            DownloadState::Adding => Some("Do you want to cancel this download?"),
            DownloadState::Removing => Some("Deleting video. Please wait."),
        }
    }
}
