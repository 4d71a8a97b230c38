//! Bounded in-memory storage for log entries.
//!
//! All writes go through [`LogBuffer::push`] / [`LogBuffer::push_error`],
//! which assign the sequence number and timestamp under the same lock, so
//! the stored order is also timestamp order even when several sessions
//! write concurrently.
//!
//! Reads go through [`LogBuffer::snapshot`], which copies the current
//! contents oldest-first.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::event::LogEntry;
use crate::redact::redact;

/// Default ring capacity for a server deployment.
pub const DEFAULT_LOG_CAPACITY: usize = 200;

/// Ring capacity for constrained deployments (single-page demos).
pub const COMPACT_LOG_CAPACITY: usize = 50;

#[derive(Debug)]
struct Ring {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_seq: u64,
}

/// Process-wide, append-only ring of diagnostic log entries.
///
/// Cloning is cheap and yields a handle onto the same ring.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    ring: Arc<Mutex<Ring>>,
}

impl LogBuffer {
    /// Creates an empty ring holding at most `capacity` entries.
    ///
    /// A capacity of zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Arc::new(Mutex::new(Ring {
                entries: VecDeque::with_capacity(capacity),
                capacity,
                next_seq: 1,
            })),
        }
    }

    /// Appends an informational entry.
    pub fn push(&self, category: &str, message: impl AsRef<str>) -> u64 {
        self.append(category, message.as_ref(), false)
    }

    /// Appends an error entry.
    pub fn push_error(&self, category: &str, message: impl AsRef<str>) -> u64 {
        self.append(category, message.as_ref(), true)
    }

    fn append(&self, category: &str, message: &str, is_error: bool) -> u64 {
        let message = redact(message);

        if is_error {
            tracing::error!(target: "voxbridge::log", category, "{}", message);
        } else {
            tracing::info!(target: "voxbridge::log", category, "{}", message);
        }

        let mut ring = self.lock();
        let seq = ring.next_seq;
        ring.next_seq += 1;

        if ring.entries.len() == ring.capacity {
            ring.entries.pop_front();
        }
        ring.entries.push_back(LogEntry {
            seq,
            timestamp: Utc::now(),
            category: category.to_string(),
            message,
            is_error,
        });
        seq
    }

    /// Returns a copy of every retained entry, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.lock().entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// Drops every retained entry. Sequence numbers keep increasing.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Ring> {
        match self.ring.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A writer panicked mid-append; the ring is still structurally
                // valid, so keep logging rather than losing diagnostics.
                tracing::error!("log ring lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
