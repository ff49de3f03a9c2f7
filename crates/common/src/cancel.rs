//! Cancellation signal built on a `watch` channel.
//!
//! A [`CancelHandle`] fires the signal; any number of cloned
//! [`CancelSignal`]s observe it. Dropping the handle without firing
//! leaves the signal pending forever, so work started with a signal
//! whose owner went away simply runs to completion.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation was cancelled")]
pub struct Cancelled;

#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace never fails, even with every receiver dropped
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

/// Create a linked handle/signal pair.
pub fn pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, signal) = pair();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Return `Err(Cancelled)` if the signal has fired.
    ///
    /// Streaming loops call this between chunks.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve once the signal fires.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // handle dropped without firing
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Fires a signal once a timeout elapses. Dropping the deadline disarms it.
#[derive(Debug)]
pub struct Deadline {
    signal: CancelSignal,
    timer: JoinHandle<()>,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        let (handle, signal) = pair();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            handle.cancel();
        });
        Self { signal, timer }
    }

    pub fn signal(&self) -> CancelSignal {
        self.signal.clone()
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_cancel_wakes_waiter() {
        let (handle, mut signal) = pair();
        assert!(!signal.is_cancelled());

        let waiter = tokio::spawn(async move {
            signal.cancelled().await;
        });

        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_never_stays_pending() {
        let mut signal = CancelSignal::never();
        assert!(signal.check().is_ok());
        let res = tokio::time::timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn test_deadline_fires() {
        let deadline = Deadline::after(Duration::from_millis(10));
        let mut signal = deadline.signal();
        tokio::time::timeout(Duration::from_secs(1), signal.cancelled())
            .await
            .expect("deadline should fire");
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_deadline_never_fires() {
        let deadline = Deadline::after(Duration::from_millis(10));
        let signal = deadline.signal();
        drop(deadline);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!signal.is_cancelled());
    }

    #[test]
    fn test_check_after_cancel() {
        let (handle, signal) = pair();
        let clone = signal.clone();
        handle.cancel();
        assert_eq!(signal.check(), Err(Cancelled));
        assert!(clone.is_cancelled());
    }
}
