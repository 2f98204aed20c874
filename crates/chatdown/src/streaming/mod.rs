//! Streaming completion detection.
//!
//! [`StreamingDetector`] watches a [`ChangeSource`] and reports, exactly
//! once, when a new copy button has appeared and the page has been quiet for
//! the debounce period. The session logic lives in the pure
//! [`WatchSession`] state machine; the detector drives it from a tokio task.

mod detector;
mod session;
mod source;

pub use detector::{StreamingDetector, WatchHandle, DEFAULT_DEBOUNCE};
pub use session::{WatchSession, WatchState};
pub use source::{ChangeSource, LiveDocument, MutationBatch};
