use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;

pub trait TrackerBuilder<T: Tracker> {
    fn build(self) -> T;
}

pub trait Tracker {
    /// Report `loaded` of `total` bytes.
    fn update(&self, loaded: u64, total: u64) -> &Self;
    fn finish(self);
    fn abandon(self, msg: &str);
}

const PB_STYLE: &str = "{spinner:.blue} {prefix:>12.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {wide_msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    let pb_style = match ProgressStyle::with_template(PB_STYLE) {
        Ok(pb_style) => pb_style.tick_chars(TICK).progress_chars(PB_CHARS),
        Err(_) => return None,
    };

    Some(pb_style)
});

/// Byte progress of one download, cheap to clone into callbacks.
#[derive(Clone)]
pub struct ProgressTracker {
    pb: ProgressBar,
    finish: Option<String>,
}

impl Tracker for ProgressTracker {
    fn update(&self, loaded: u64, total: u64) -> &Self {
        if self.pb.length() != Some(total) {
            self.pb.set_length(total);
        }
        self.pb.set_position(loaded);
        self
    }

    fn finish(self) {
        match self.finish {
            Some(msg) => self.pb.finish_with_message(msg),
            None => self.pb.finish(),
        }
    }

    fn abandon(self, msg: &str) {
        self.pb.abandon_with_message(msg.to_string());
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTrackerBuilder {
    prefix: Option<String>,
    finish: Option<String>,
}

impl ProgressTrackerBuilder {
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn with_finish(mut self, finish: &str) -> Self {
        self.finish = Some(finish.to_string());
        self
    }
}

impl TrackerBuilder<ProgressTracker> for ProgressTrackerBuilder {
    fn build(self) -> ProgressTracker {
        let pb = ProgressBar::no_length();
        let pb = match PB_TEMPLATE.as_ref() {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };

        if let Some(prefix) = self.prefix {
            pb.set_prefix(prefix);
        }
        ProgressTracker {
            pb,
            finish: self.finish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_follows_totals() {
        let tracker = ProgressTrackerBuilder::default()
            .with_prefix("ep-1")
            .build();
        tracker.update(10, 100).update(60, 100);
        assert_eq!(tracker.pb.length(), Some(100));
        assert_eq!(tracker.pb.position(), 60);
        tracker.finish();
    }
}
