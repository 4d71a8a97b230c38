//! Log entry record type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single diagnostic log line.
///
/// `seq` is assigned by the buffer and increases monotonically for the
/// lifetime of the process, so it survives eviction and can be used by
/// readers to detect gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    /// Free-form source tag (`session`, `token`, `agent`, `http`, ...).
    pub category: String,
    pub message: String,
    pub is_error: bool,
}
