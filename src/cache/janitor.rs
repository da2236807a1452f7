//! cache::janitor
//!
//! Background sweep of expired snapshots.
//!
//! The janitor is a supervised thread: it is started explicitly, wakes every
//! `interval` to call [`SnapshotStore::sweep`], and is stopped either with
//! [`Janitor::stop`] or by dropping the handle. Stopping wakes the thread
//! immediately instead of waiting out the interval.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::store::SnapshotStore;

/// Handle to a running sweep thread.
#[derive(Debug)]
pub struct Janitor {
    interval: Duration,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Janitor {
    /// Spawn the sweep thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn start(store: Arc<SnapshotStore>, interval: Duration, retention: Duration) -> io::Result<Self> {
        let (shutdown, signal) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("gitblog-janitor".into())
            .spawn(move || {
                info!(interval_secs = interval.as_secs(), retention_secs = retention.as_secs(), "Janitor started");
                loop {
                    match signal.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let removed = store.sweep(retention);
                            debug!(removed, remaining = store.len(), "Sweep finished");
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("Janitor stopped");
            })?;

        Ok(Self {
            interval,
            shutdown: Some(shutdown),
            thread: Some(thread),
        })
    }

    /// Time between sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the sweep thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the thread and wait for it to exit. Idempotent.
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Janitor thread panicked");
            }
        }
    }
}

impl Drop for Janitor {
    fn drop(&mut self) {
        self.stop();
    }
}
