//! Backend environment indicator
//!
//! Re-probes the backend mode on a fixed interval and publishes the latest
//! value through a watch channel. The first probe runs immediately.

use showrunner_api::EnvironmentMode;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Start probing every `every` until `cancel` fires
pub fn spawn_watcher<F, Fut>(
    every: Duration,
    mut probe: F,
    cancel: CancellationToken,
) -> watch::Receiver<EnvironmentMode>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = EnvironmentMode> + Send,
{
    let (tx, rx) = watch::channel(EnvironmentMode::default());

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let mode = tokio::select! {
                () = cancel.cancelled() => break,
                mode = probe() => mode,
            };
            let changed = tx.send_if_modified(|current| {
                let changed = *current != mode;
                *current = mode;
                changed
            });
            if changed {
                info!(mode = mode.as_str(), "Backend environment changed");
            }
        }
        debug!("Environment watcher stopped");
    });

    rx
}
