//! Fan-out/fan-in task group.
//!
//! Each producer is spawned as its own task and pushes its items into a
//! single bounded [`flume`] channel. A separate closer task joins every
//! producer and only then drops the last sender, which is what ends the
//! merged stream. A producer that fails is logged and contributes zero
//! items; it never aborts its siblings.

use std::fmt::Display;
use std::future::Future;

use tokio::task::{JoinHandle, JoinSet};

use crate::cancel::{CancelSignal, Cancelled};

/// Default capacity of the merge channel.
pub const DEFAULT_CAPACITY: usize = 256;

pub struct FanIn<T> {
    tx: flume::Sender<T>,
    rx: flume::Receiver<T>,
    producers: JoinSet<()>,
}

impl<T: Send + 'static> Default for FanIn<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T: Send + 'static> FanIn<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = flume::bounded(capacity.max(1));
        Self {
            tx,
            rx,
            producers: JoinSet::new(),
        }
    }

    /// Number of producers spawned so far.
    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }

    /// Spawn one producer. `label` identifies it in logs.
    pub fn spawn<F, E>(&mut self, label: impl Display + Send + 'static, fut: F)
    where
        F: Future<Output = Result<Vec<T>, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let tx = self.tx.clone();
        self.producers.spawn(async move {
            match fut.await {
                Ok(items) => {
                    let count = items.len();
                    for item in items {
                        if tx.send_async(item).await.is_err() {
                            tracing::debug!(producer = %label, "merge receiver dropped");
                            return;
                        }
                    }
                    tracing::trace!(producer = %label, count, "producer finished");
                }
                Err(e) => {
                    tracing::warn!(producer = %label, error = %e, "producer failed; contributing no items");
                }
            }
        });
    }

    /// Wait for every producer and return the merged items.
    ///
    /// No ordering is guaranteed across producers; items from one producer
    /// arrive in the order it yielded them. If `cancel` fires first, every
    /// in-flight producer is aborted and `Err(Cancelled)` is returned; a
    /// partially merged result is never handed back.
    pub async fn collect(self, mut cancel: CancelSignal) -> Result<Vec<T>, Cancelled> {
        let FanIn { tx, rx, producers } = self;
        let closer = AbortOnDrop(tokio::spawn(close_after_all(producers, tx)));

        let mut merged = Vec::new();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    closer.0.abort();
                    return Err(Cancelled);
                }
                item = rx.recv_async() => match item {
                    Ok(item) => merged.push(item),
                    // closer dropped the final sender: all producers are done
                    Err(_) => break,
                },
            }
        }

        Ok(merged)
    }
}

/// The closer: a barrier over every producer, then release the channel.
async fn close_after_all<T>(mut producers: JoinSet<()>, tx: flume::Sender<T>) {
    while let Some(joined) = producers.join_next().await {
        if let Err(e) = joined {
            if e.is_panic() {
                tracing::error!(error = %e, "producer panicked");
            }
        }
    }
    drop(tx);
}

/// Aborting the closer drops its `JoinSet`, which aborts the producers.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
