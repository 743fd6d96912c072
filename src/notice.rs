//! Transient user-visible notices.
//!
//! Every action-level failure becomes one short notice plus a log entry; the
//! host bridge drains the buffer and renders the messages as toasts. Entries
//! sit in a fixed-capacity ring so an unattended session can't grow the
//! history without bound.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const NOTICE_RING_CAPACITY: usize = 100;

/// One transient message shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: u64,
    pub timestamp_ms: i64,
    pub message: String,
}

/// Fixed-capacity ring of notices, oldest dropped first.
struct NoticeBuffer {
    entries: Vec<Option<Notice>>,
    capacity: usize,
    write_pos: usize,
    count: usize,
    next_id: u64,
}

impl NoticeBuffer {
    fn new(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, || None);
        Self {
            entries,
            capacity,
            write_pos: 0,
            count: 0,
            next_id: 1,
        }
    }

    fn push(&mut self, message: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries[self.write_pos] = Some(Notice {
            id,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            message,
        });
        self.write_pos = (self.write_pos + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
        id
    }

    /// Entries in chronological order, oldest first.
    fn entries(&self) -> Vec<Notice> {
        let start = if self.count < self.capacity {
            0
        } else {
            // write_pos points at the oldest entry once the ring is full
            self.write_pos
        };
        (0..self.count)
            .filter_map(|i| self.entries[(start + i) % self.capacity].clone())
            .collect()
    }

    fn clear(&mut self) {
        for slot in self.entries.iter_mut() {
            *slot = None;
        }
        self.write_pos = 0;
        self.count = 0;
        // next_id stays monotonic across clears
    }
}

/// Cloneable handle the action handlers push into and the host drains.
#[derive(Clone)]
pub struct Notices {
    buffer: Arc<Mutex<NoticeBuffer>>,
}

impl Default for Notices {
    fn default() -> Self {
        Self::new()
    }
}

impl Notices {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(NoticeBuffer::new(NOTICE_RING_CAPACITY))),
        }
    }

    /// Record a notice and mirror it to the diagnostic log.
    pub fn push(&self, message: impl Into<String>) -> u64 {
        let message = message.into();
        tracing::warn!(notice = %message, "user notice");
        self.buffer.lock().push(message)
    }

    /// All buffered notices, oldest first.
    pub fn entries(&self) -> Vec<Notice> {
        self.buffer.lock().entries()
    }

    /// Drain and return all buffered notices, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        let mut buffer = self.buffer.lock();
        let drained = buffer.entries();
        buffer.clear();
        drained
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last notice message, for quick assertions and status surfaces.
    pub fn last_message(&self) -> Option<String> {
        self.entries().pop().map(|notice| notice.message)
    }
}
