//! Diagnostic log ring for the Voxbridge call service.
//!
//! Every call session step, upstream response and inbound HTTP request is
//! appended to a bounded, in-memory [`LogBuffer`] that the front end can
//! read back through `GET /agent`. The buffer is diagnostic, not
//! authoritative: once it reaches capacity the oldest entries are evicted.
//!
//! Entries are mirrored to `tracing` so they also reach the process logs,
//! and messages are scrubbed of credential-looking substrings before they
//! are stored.
//!
//! # Usage
//!
//! ```rust
//! use voxbridge_observe::LogBuffer;
//!
//! let logs = LogBuffer::new(50);
//! logs.push("session", "joined channel call-1700000000000-ab12cd");
//! logs.push_error("agent", "start failed: 503");
//!
//! let entries = logs.snapshot();
//! assert_eq!(entries.len(), 2);
//! assert!(entries[1].is_error);
//! ```

mod event;
mod redact;
mod store;

pub use event::LogEntry;
pub use redact::redact;
pub use store::{LogBuffer, COMPACT_LOG_CAPACITY, DEFAULT_LOG_CAPACITY};

#[cfg(test)]
mod tests;
