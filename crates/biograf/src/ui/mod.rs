pub mod table;
pub mod tracker;

pub use table::Formatter;
pub use tracker::{ProgressTracker, ProgressTrackerBuilder, Tracker, TrackerBuilder};
