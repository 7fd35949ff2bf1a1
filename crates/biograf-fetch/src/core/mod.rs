//! Pure transformations for planning and fetching units.
//!
//! Nothing in this module performs I/O.

mod mime;
mod retry;
mod segment;
mod validation;

pub use mime::guess_content_type;
pub use retry::retry_delay;
pub use segment::{CHUNK_SIZE, Segment, chunk_segments, prefix_len};
pub use validation::{is_retryable_status, is_success, range_header};
