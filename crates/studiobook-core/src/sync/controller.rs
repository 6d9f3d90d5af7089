use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::cache::CacheManager;
use crate::config::SyncSettings;
use crate::models::{active_snapshot, EventRecord};

use super::{EventRenderer, EventSource, Indicator, SyncError, SyncOutcome, SyncPhase, SyncStatus};

/// Keeps the booked-events view in step with the remote sheet.
///
/// One instance owns one cache slot, its retry counter and its status
/// channel, so independent instances never share state.
pub struct EventCacheSync {
    source: Arc<dyn EventSource>,
    cache: CacheManager,
    renderer: Arc<dyn EventRenderer>,
    settings: SyncSettings,
    retry_count: AtomicU32,
    in_flight: AtomicBool,
    /// What is on screen while the cache slot cannot be written
    unsaved: Mutex<Option<String>>,
    status: watch::Sender<SyncStatus>,
}

/// Clears the in-flight flag however the cycle ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl EventCacheSync {
    pub fn new(
        source: Arc<dyn EventSource>,
        cache: CacheManager,
        renderer: Arc<dyn EventRenderer>,
        settings: SyncSettings,
    ) -> Self {
        let (status, _) = watch::channel(SyncStatus::default());
        Self {
            source,
            cache,
            renderer,
            settings,
            retry_count: AtomicU32::new(0),
            in_flight: AtomicBool::new(false),
            unsaved: Mutex::new(None),
            status,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count.load(Ordering::Acquire)
    }

    /// The persisted snapshot; empty when absent or unreadable
    pub fn load_cached_snapshot(&self) -> Vec<EventRecord> {
        self.cache.load_booked_events()
    }

    pub fn render_snapshot(&self, snapshot: &[EventRecord]) {
        self.renderer.render(snapshot);
    }

    /// Initial load: show whatever the cache holds right away, then sync.
    pub async fn initialize(&self) -> SyncOutcome {
        let cached = self.load_cached_snapshot();
        if cached.is_empty() {
            self.status.send_modify(|s| s.indicator = Indicator::Loading);
        } else {
            debug!(count = cached.len(), "Rendering cached bookings");
            self.render_snapshot(&cached);
            self.status.send_modify(|s| s.indicator = Indicator::Hidden);
        }
        self.sync_remote().await
    }

    /// Run one sync cycle, retries included. Never fails: every error ends
    /// as a scheduled retry, a silent abort, or the visible terminal state.
    pub async fn sync_remote(&self) -> SyncOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("Sync already in flight, skipping trigger");
            return SyncOutcome::Skipped;
        }
        let _in_flight = InFlight(&self.in_flight);

        loop {
            self.status.send_modify(|s| s.phase = SyncPhase::Fetching);

            match self.attempt().await {
                Ok(changed) => {
                    self.retry_count.store(0, Ordering::Release);
                    let phase = if changed { SyncPhase::Applied } else { SyncPhase::Unchanged };
                    self.status.send_modify(|s| {
                        s.phase = phase;
                        s.indicator = Indicator::Hidden;
                        s.retry_count = 0;
                        s.last_synced = Some(Utc::now());
                        s.last_error = None;
                    });
                    return if changed { SyncOutcome::Applied } else { SyncOutcome::Unchanged };
                }
                Err(e) if !e.is_retryable() => {
                    debug!(error = %e, "Booked events fetch aborted");
                    self.status.send_modify(|s| s.phase = SyncPhase::Idle);
                    return SyncOutcome::Aborted;
                }
                Err(e) => {
                    let attempts = self.retry_count.fetch_add(1, Ordering::AcqRel) + 1;
                    warn!(error = %e, attempt = attempts, "Booked events sync failed");

                    if attempts <= self.settings.max_retries {
                        self.status.send_modify(|s| {
                            s.phase = SyncPhase::Failed(attempts);
                            s.retry_count = attempts;
                            s.last_error = Some(e.to_string());
                        });
                        tokio::time::sleep(self.settings.retry_delay()).await;
                        continue;
                    }

                    let failure = SyncError::PersistentFailure { attempts };
                    error!(error = %failure, cause = %e, "Giving up until the next sync trigger");
                    self.status.send_modify(|s| {
                        s.phase = SyncPhase::Error;
                        s.indicator = Indicator::Unavailable;
                        s.retry_count = attempts;
                        s.last_error = Some(failure.to_string());
                    });
                    return SyncOutcome::Exhausted;
                }
            }
        }
    }

    /// One fetch-and-apply. `Ok(true)` when the snapshot was replaced.
    async fn attempt(&self) -> Result<bool, SyncError> {
        // The deadline timer lives inside `timeout_at` and is dropped with it
        let deadline = Instant::now() + self.settings.fetch_timeout();
        let response = timeout_at(deadline, self.source.fetch_booked_events(deadline))
            .await
            .map_err(|_| SyncError::TimeoutAbort)??;

        if !response.is_success() {
            return Err(SyncError::InvalidResponse(format!(
                "status {}",
                response.status.as_deref().unwrap_or("missing")
            )));
        }

        let fetched = response.data.len();
        let active = active_snapshot(response.data);
        let fresh = serde_json::to_string(&active)
            .map_err(|e| SyncError::InvalidResponse(e.to_string()))?;

        let mut unsaved = self.unsaved.lock().unwrap_or_else(|e| e.into_inner());
        let current = match unsaved.as_ref() {
            Some(shown) => shown.clone(),
            None => self.cache.booked_events_fingerprint(),
        };
        if fresh == current {
            debug!(count = active.len(), "Booked events unchanged");
            return Ok(false);
        }

        match self.cache.save_booked_events(&active) {
            Ok(()) => *unsaved = None,
            Err(e) => {
                warn!(error = %e, "Failed to cache booked events");
                *unsaved = Some(fresh);
            }
        }
        drop(unsaved);
        self.render_snapshot(&active);
        info!(fetched, active = active.len(), "Booked events updated");
        Ok(true)
    }
}
