//! Single-writer coordinator
//!
//! The store already serializes writes within one `StatsStore`, but
//! producers that live on different threads or tasks can instead enqueue
//! their writes here. One worker thread owns the store and applies commands
//! in arrival order, so the read-modify-write cycles never interleave.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{debug, warn};

use crate::store::{Completion, StatsSink, StatsStore, StorageBackend};
use crate::types::Increment;

enum Command {
    Block(Increment, Option<Sender<bool>>),
    Visit(String, Option<Sender<bool>>),
    Reset(Sender<bool>),
    /// Stop after everything queued ahead of it
    Shutdown,
}

/// Owner of the writer thread. Dropping it drains the queue and joins,
/// even while producers still hold handles.
pub struct WriteQueue {
    handle: QueueHandle,
    worker: Option<JoinHandle<usize>>,
}

/// Cloneable producer-side handle to a [`WriteQueue`].
#[derive(Clone)]
pub struct QueueHandle {
    sender: Sender<Command>,
}

impl WriteQueue {
    /// Start the writer thread for a store.
    pub fn spawn<B>(store: Arc<StatsStore<B>>) -> std::io::Result<Self>
    where
        B: StorageBackend + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let worker = std::thread::Builder::new()
            .name("eru-stats-writer".into())
            .spawn(move || run_worker(&store, receiver))?;
        Ok(Self {
            handle: QueueHandle { sender },
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> QueueHandle {
        self.handle.clone()
    }

    /// Close the queue, wait for every command queued so far to be applied,
    /// and return how many commands the worker processed. Writes submitted
    /// through surviving handles afterwards report not applied.
    pub fn shutdown(mut self) -> usize {
        self.finish()
    }

    fn finish(&mut self) -> usize {
        let Some(worker) = self.worker.take() else {
            return 0;
        };
        if self.handle.sender.send(Command::Shutdown).is_err() {
            warn!("Stats writer already stopped");
        }
        worker.join().unwrap_or_else(|_| {
            warn!("Stats writer thread panicked");
            0
        })
    }
}

impl Drop for WriteQueue {
    fn drop(&mut self) {
        self.finish();
    }
}

fn run_worker<B: StorageBackend>(store: &StatsStore<B>, receiver: Receiver<Command>) -> usize {
    let mut processed = 0;
    for command in receiver {
        let (applied, reply) = match command {
            Command::Block(inc, reply) => (store.merge_increment(&inc), reply),
            Command::Visit(host, reply) => (store.record_visit(&host), reply),
            Command::Reset(reply) => (store.reset(), Some(reply)),
            Command::Shutdown => break,
        };
        if let Some(reply) = reply {
            let _ = reply.send(applied);
        }
        processed += 1;
    }
    debug!("Stats writer stopped after {} commands", processed);
    processed
}

impl QueueHandle {
    fn enqueue(&self, command: Command) -> bool {
        if self.sender.send(command).is_err() {
            warn!("Stats write dropped: queue closed");
            return false;
        }
        true
    }

    /// Queue a block increment without waiting for it.
    pub fn block(&self, inc: Increment) -> bool {
        self.enqueue(Command::Block(inc, None))
    }

    /// Queue a protected-site visit without waiting for it.
    pub fn visit(&self, host: String) -> bool {
        self.enqueue(Command::Visit(host, None))
    }

    /// Queue a reset behind every write already submitted.
    pub fn reset(&self) -> Completion {
        let (tx, rx) = mpsc::channel();
        if self.enqueue(Command::Reset(tx)) {
            Completion::Pending(rx)
        } else {
            Completion::Ready(false)
        }
    }
}

impl StatsSink for QueueHandle {
    fn submit_block(&self, inc: Increment) -> Completion {
        let (tx, rx) = mpsc::channel();
        if self.enqueue(Command::Block(inc, Some(tx))) {
            Completion::Pending(rx)
        } else {
            Completion::Ready(false)
        }
    }

    fn submit_visit(&self, host: String) -> Completion {
        let (tx, rx) = mpsc::channel();
        if self.enqueue(Command::Visit(host, Some(tx))) {
            Completion::Pending(rx)
        } else {
            Completion::Ready(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusion::ExclusionSet;
    use crate::store::MemoryBackend;

    fn inc(domain: &str, count: u64) -> Increment {
        Increment {
            domain: domain.to_string(),
            category: "Display".to_string(),
            method: "Script".to_string(),
            count,
        }
    }

    fn shared_store() -> Arc<StatsStore<MemoryBackend>> {
        Arc::new(StatsStore::new(MemoryBackend::new(), Arc::new(ExclusionSet::default())))
    }

    #[test]
    fn test_queue_applies_in_order() {
        let store = shared_store();
        let queue = WriteQueue::spawn(Arc::clone(&store)).unwrap();
        let handle = queue.handle();

        assert!(handle.block(inc("a.com", 2)));
        assert!(handle.visit("a.com".to_string()));
        assert!(handle.submit_block(inc("b.com", 1)).wait());
        drop(handle);

        assert_eq!(queue.shutdown(), 3);
        let record = store.read();
        assert_eq!(record.total_blocked, 3);
        assert_eq!(store.read_protected()["a.com"], 1);
    }

    #[test]
    fn test_reset_runs_after_pending_writes() {
        let store = shared_store();
        let queue = WriteQueue::spawn(Arc::clone(&store)).unwrap();
        let handle = queue.handle();

        handle.block(inc("a.com", 5));
        handle.visit("a.com".to_string());
        assert!(handle.reset().wait());
        assert!(store.read().is_zeroed());
        assert!(store.read_protected().is_empty());
    }

    #[test]
    fn test_many_producers_no_lost_updates() {
        let store = shared_store();
        let queue = WriteQueue::spawn(Arc::clone(&store)).unwrap();

        let producers: Vec<_> = (0..6)
            .map(|t| {
                let handle = queue.handle();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        handle.block(inc(&format!("p{}.com", t), 1));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        queue.shutdown();

        let record = store.read();
        assert_eq!(record.total_blocked, 300);
        assert_eq!(record.by_domain.len(), 6);
        assert!(record.by_domain.values().all(|&n| n == 50));
    }

    #[test]
    fn test_drop_with_live_handle_drains_and_returns() {
        use std::time::Duration;

        let store = shared_store();
        let queue = WriteQueue::spawn(Arc::clone(&store)).unwrap();
        let handle = queue.handle();
        assert!(handle.block(inc("a.com", 2)));

        let (done_tx, done_rx) = mpsc::channel();
        std::thread::spawn(move || {
            drop(queue);
            let _ = done_tx.send(());
        });
        assert!(done_rx.recv_timeout(Duration::from_secs(3)).is_ok());

        assert_eq!(store.read().total_blocked, 2);
        assert!(!handle.block(inc("a.com", 1)));
        assert!(!handle.submit_visit("a.com".to_string()).wait());
        assert_eq!(store.read().total_blocked, 2);
    }

    #[test]
    fn test_shutdown_with_live_handle() {
        let store = shared_store();
        let queue = WriteQueue::spawn(Arc::clone(&store)).unwrap();
        let handle = queue.handle();
        handle.block(inc("a.com", 1));
        handle.visit("a.com".to_string());

        assert_eq!(queue.shutdown(), 2);
        assert_eq!(store.read_protected()["a.com"], 1);
        assert!(!handle.reset().wait());
    }

    #[test]
    fn test_closed_queue_reports_not_applied() {
        let (closed, _) = mpsc::channel::<Command>();
        let orphan = QueueHandle { sender: closed };
        assert!(!orphan.block(inc("a.com", 1)));
        assert!(!orphan.submit_block(inc("a.com", 1)).wait());
        assert!(!orphan.submit_visit("a.com".to_string()).wait());
        assert!(!orphan.reset().wait());
    }
}
