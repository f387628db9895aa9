//! Polling fallback engine
//!
//! A fixed-interval probe running on its own task. Reports flow back over a
//! channel to whoever owns the run; the first probe fires one interval after
//! start. The task stops when the handle is cancelled or dropped, or when the
//! report receiver goes away.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle to a running poll. Cancelling is idempotent.
#[derive(Debug)]
pub struct PollHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop polling. Returns `true` only for the call that actually stopped it.
    pub fn cancel(&self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Whether the poll is still scheduled
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }

    /// Token observers can use to see cancellation
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Start probing every `every`.
///
/// A probe that is still in flight when the handle is cancelled is abandoned
/// and its report never delivered.
pub fn start<F, Fut, T>(every: Duration, mut probe: F) -> (PollHandle, mpsc::Receiver<T>)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send,
    T: Send + 'static,
{
    let token = CancellationToken::new();
    let (tx, rx) = mpsc::channel(1);
    let cancelled = token.clone();

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks: u64 = 0;
        loop {
            tokio::select! {
                () = cancelled.cancelled() => break,
                _ = ticker.tick() => {}
            }
            ticks += 1;
            let report = tokio::select! {
                () = cancelled.cancelled() => break,
                report = probe() => report,
            };
            if tx.send(report).await.is_err() {
                break;
            }
        }
        debug!(ticks, "Poll stopped");
    });

    (PollHandle { token, task }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_probe() -> (Arc<AtomicUsize>, impl FnMut() -> std::future::Ready<usize> + Send) {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&calls);
        let probe = move || std::future::ready(inner.fetch_add(1, Ordering::SeqCst) + 1);
        (calls, probe)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_probe_after_one_interval() {
        let (calls, probe) = counting_probe();
        let (handle, mut reports) = start(Duration::from_secs(10), probe);

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(reports.recv().await, Some(1));
        assert_eq!(reports.recv().await, Some(2));
        assert!(handle.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent_and_stops_probing() {
        let (calls, probe) = counting_probe();
        let (handle, mut reports) = start(Duration::from_secs(10), probe);
        assert_eq!(reports.recv().await, Some(1));

        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(!handle.is_active());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(reports.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let (calls, probe) = counting_probe();
        let (handle, _reports) = start(Duration::from_secs(1), probe);
        drop(handle);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
