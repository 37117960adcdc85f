use std::collections::VecDeque;
use std::mem;

use parking_lot::Mutex;
use protocol::SrvEvent;
use tokio::sync::Notify;

/// Unbounded FIFO of server notifications.
///
/// Producers are the library's internal threads and never wait for the
/// consumer. The consumer sleeps on [`EventQueue::wait`] and drains on the
/// host context.
#[derive(Default)]
pub struct EventQueue {
    queue: Mutex<VecDeque<SrvEvent>>,
    wake: Notify,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, event: SrvEvent) {
        self.queue.lock().push_back(event);
        self.wake.notify_one();
    }

    /// Hands every queued event to `handler` in publish order and returns how
    /// many were handled. The lock is released before `handler` runs, so
    /// events published meanwhile wait for the next drain.
    pub fn drain(&self, mut handler: impl FnMut(SrvEvent)) -> usize {
        let batch = mem::take(&mut *self.queue.lock());
        let count = batch.len();
        batch.into_iter().for_each(&mut handler);
        count
    }

    /// Resolves once something was published since the last wake.
    pub async fn wait(&self) {
        self.wake.notified().await;
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
