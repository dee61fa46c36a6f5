//! Fan-out of received chunks to listeners on worker threads.
//!
//! The read loop only enqueues. Workers pull chunks from a bounded queue and
//! call every registered listener, so a slow listener holds up other
//! listeners but never the socket.

use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, trace, warn};

use crate::config::{DispatchConfig, OverflowPolicy};

/// Callback invoked with every raw chunk read from the device.
pub type Listener = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Listeners shared by a connection and its workers.
#[derive(Clone, Default)]
pub(crate) struct ListenerSet {
    inner: Arc<RwLock<Vec<Listener>>>,
}

impl ListenerSet {
    pub(crate) fn push(&self, listener: Listener) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub(crate) fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn snapshot(&self) -> Vec<Listener> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

thread_local! {
    static ON_WORKER: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is a dispatch worker.
pub(crate) fn on_worker_thread() -> bool {
    ON_WORKER.with(Cell::get)
}

/// Bounded queue plus the worker threads draining it.
pub(crate) struct Dispatcher {
    sender: Sender<Bytes>,
    workers: Vec<JoinHandle<()>>,
    overflow: OverflowPolicy,
    dropped: Arc<AtomicU64>,
}

impl Dispatcher {
    pub(crate) fn start(
        config: &DispatchConfig,
        listeners: ListenerSet,
        dropped: Arc<AtomicU64>,
    ) -> std::io::Result<Self> {
        let (sender, receiver) = bounded(config.queue_capacity.max(1));

        let mut workers = Vec::with_capacity(config.workers.max(1));
        for index in 0..config.workers.max(1) {
            let receiver = receiver.clone();
            let listeners = listeners.clone();
            let handle = thread::Builder::new()
                .name(format!("pixelbox-dispatch-{index}"))
                .spawn(move || run_worker(receiver, listeners))?;
            workers.push(handle);
        }

        debug!(
            capacity = config.queue_capacity,
            workers = workers.len(),
            overflow = ?config.overflow,
            "dispatcher started"
        );
        Ok(Self {
            sender,
            workers,
            overflow: config.overflow,
            dropped,
        })
    }

    /// Hand a chunk to the workers. Returns `false` once every worker is gone.
    pub(crate) fn dispatch(&self, chunk: Bytes) -> bool {
        match self.overflow {
            OverflowPolicy::DropNewest => match self.sender.try_send(chunk) {
                Ok(()) => true,
                Err(TrySendError::Full(chunk)) => {
                    let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(bytes = chunk.len(), total, "dispatch queue full, dropping chunk");
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            },
            OverflowPolicy::Block => self.sender.send(chunk).is_ok(),
        }
    }

    /// Close the queue and wait until the workers have drained it.
    pub(crate) fn close(self) {
        drop(self.sender);
        for worker in self.workers {
            if worker.join().is_err() {
                warn!("dispatch worker panicked");
            }
        }
    }
}

fn run_worker(receiver: Receiver<Bytes>, listeners: ListenerSet) {
    ON_WORKER.with(|flag| flag.set(true));
    while let Ok(chunk) = receiver.recv() {
        trace!(bytes = chunk.len(), "dispatching chunk");
        for listener in listeners.snapshot() {
            if catch_unwind(AssertUnwindSafe(|| listener(&chunk[..]))).is_err() {
                warn!("listener panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use crossbeam::channel;

    use super::*;

    fn config(capacity: usize, workers: usize, overflow: OverflowPolicy) -> DispatchConfig {
        DispatchConfig {
            queue_capacity: capacity,
            workers,
            overflow,
            ..DispatchConfig::default()
        }
    }

    #[test]
    fn every_listener_sees_every_chunk() {
        let listeners = ListenerSet::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b"] {
            let seen = Arc::clone(&seen);
            listeners.push(Arc::new(move |chunk: &[u8]| {
                seen.lock().unwrap().push((tag, chunk.to_vec()));
            }));
        }

        let dispatcher = Dispatcher::start(
            &config(8, 1, OverflowPolicy::Block),
            listeners,
            Arc::new(AtomicU64::new(0)),
        )
        .expect("dispatcher should start");
        assert!(dispatcher.dispatch(Bytes::from_static(b"one")));
        assert!(dispatcher.dispatch(Bytes::from_static(b"two")));
        dispatcher.close();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ("a", b"one".to_vec()),
                ("b", b"one".to_vec()),
                ("a", b"two".to_vec()),
                ("b", b"two".to_vec()),
            ]
        );
    }

    #[test]
    fn full_queue_drops_newest_without_blocking() {
        let (entered_tx, entered_rx) = channel::bounded::<()>(1);
        let (release_tx, release_rx) = channel::bounded::<()>(0);
        let listeners = ListenerSet::default();
        listeners.push(Arc::new(move |_chunk: &[u8]| {
            let _ = entered_tx.try_send(());
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
        }));

        let dropped = Arc::new(AtomicU64::new(0));
        let dispatcher = Dispatcher::start(
            &config(1, 1, OverflowPolicy::DropNewest),
            listeners,
            Arc::clone(&dropped),
        )
        .expect("dispatcher should start");

        assert!(dispatcher.dispatch(Bytes::from_static(b"held")));
        entered_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker should pick up first chunk");

        assert!(dispatcher.dispatch(Bytes::from_static(b"queued")));
        assert!(dispatcher.dispatch(Bytes::from_static(b"dropped")));
        assert_eq!(dropped.load(Ordering::Relaxed), 1);

        drop(release_tx);
        dispatcher.close();
    }

    #[test]
    fn panicking_listener_does_not_stop_worker() {
        let listeners = ListenerSet::default();
        let count = Arc::new(AtomicU64::new(0));
        listeners.push(Arc::new(|chunk: &[u8]| {
            if chunk == b"boom" {
                panic!("listener failure");
            }
        }));
        let counter = Arc::clone(&count);
        listeners.push(Arc::new(move |_chunk: &[u8]| {
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        let dispatcher = Dispatcher::start(
            &config(4, 1, OverflowPolicy::Block),
            listeners,
            Arc::new(AtomicU64::new(0)),
        )
        .expect("dispatcher should start");
        dispatcher.dispatch(Bytes::from_static(b"boom"));
        dispatcher.dispatch(Bytes::from_static(b"fine"));
        dispatcher.close();

        // the panic skips the second listener for "boom" only
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn workers_flag_their_threads() {
        let listeners = ListenerSet::default();
        let flagged = Arc::new(AtomicU64::new(0));
        let flag = Arc::clone(&flagged);
        listeners.push(Arc::new(move |_chunk: &[u8]| {
            if on_worker_thread() {
                flag.fetch_add(1, Ordering::Relaxed);
            }
        }));
        let dispatcher = Dispatcher::start(
            &config(4, 2, OverflowPolicy::Block),
            listeners,
            Arc::new(AtomicU64::new(0)),
        )
        .expect("dispatcher should start");
        dispatcher.dispatch(Bytes::from_static(b"x"));
        dispatcher.close();

        assert_eq!(flagged.load(Ordering::Relaxed), 1);
        assert!(!on_worker_thread());
    }
}
