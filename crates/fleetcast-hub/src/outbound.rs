//! Per-connection outbound message queue.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fleetcast_telemetry::Metrics;
use parking_lot::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct QueueState {
    messages: VecDeque<Arc<str>>,
    closed: bool,
}

/// Bounded queue between the dispatch task and a connection's writer.
///
/// Pushing never blocks: when the queue is full the oldest message is
/// discarded and counted.
#[derive(Debug)]
pub struct OutboundQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    capacity: usize,
    dropped: AtomicU64,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            capacity: capacity.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue a serialized message. Returns false if the queue is closed.
    pub fn push(&self, message: Arc<str>) -> bool {
        {
            let mut state = self.state.lock();
            if state.closed {
                return false;
            }
            if state.messages.len() >= self.capacity {
                state.messages.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Metrics::messages_dropped(1);
            }
            state.messages.push_back(message);
        }
        self.notify.notify_one();
        true
    }

    /// Wait for the next message. Returns `None` once closed and drained.
    pub async fn recv(&self) -> Option<Arc<str>> {
        loop {
            {
                let mut state = self.state.lock();
                if let Some(message) = state.messages.pop_front() {
                    return Some(message);
                }
                if state.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Stop accepting messages and wake the reader.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Messages discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().messages.is_empty()
    }
}
