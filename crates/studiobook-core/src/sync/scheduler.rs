use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use super::EventCacheSync;

/// Drive `sync` from a fixed-period timer and a visibility signal.
///
/// Ticks are skipped while `visibility` reads `false`; a change to `true`
/// syncs immediately without waiting for the next tick. Returns once the
/// visibility sender is dropped. Run `initialize` first; the first tick
/// lands one `period` from now.
pub async fn run_sync_loop(
    sync: &EventCacheSync,
    period: Duration,
    mut visibility: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if *visibility.borrow() {
                    sync.sync_remote().await;
                } else {
                    trace!("Hidden, skipping periodic sync");
                }
            }
            changed = visibility.changed() => {
                if changed.is_err() {
                    debug!("Visibility channel closed, stopping sync loop");
                    break;
                }
                if *visibility.borrow_and_update() {
                    info!("Visible again, syncing booked events");
                    sync.sync_remote().await;
                }
            }
        }
    }
}
