//! Serves byte-range requests for cached media from stored units.
//!
//! [`RangedResponder`] rebuilds `206 Partial Content` responses from the
//! units an offline cache wrote, and [`Interceptor`] puts it in front of the
//! network: synthesized range, then whole cached resource, then origin.
//!
//! ```text
//! request -> Range? -> units cached? -> synthesize -> 206 | 416
//!                                   \-> gap ----------------------\
//!         -> no Range -> fully cached? -> 200                       -> network
//!                                   \-> no ------------------------/
//! ```

mod error;
mod interceptor;
mod range;
mod synth;

pub use error::{RangeError, Result};
pub use interceptor::Interceptor;
pub use range::{ByteRange, ResolvedRange, unsatisfied_range};
pub use synth::{RangedResponder, Synthesized, not_satisfiable};
