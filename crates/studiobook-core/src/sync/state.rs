use chrono::{DateTime, Utc};

/// Where the current (or last) sync cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    /// Fresh data differed from the cache and replaced it
    Applied,
    /// Fresh data matched the cache
    Unchanged,
    /// Failed attempt `n`; another attempt follows after the retry delay
    Failed(u32),
    /// Retry budget spent; waiting for an external trigger
    Error,
}

/// The status line that stands in for the table while it cannot be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Hidden,
    Loading,
    Unavailable,
}

impl Indicator {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Indicator::Hidden => None,
            Indicator::Loading => Some("Loading events..."),
            Indicator::Unavailable => Some("Unable to load events"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    pub phase: SyncPhase,
    pub indicator: Indicator,
    pub retry_count: u32,
    pub last_synced: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            phase: SyncPhase::Idle,
            indicator: Indicator::Hidden,
            retry_count: 0,
            last_synced: None,
            last_error: None,
        }
    }
}

/// How a `sync_remote` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    Unchanged,
    /// Deadline hit; nothing counted, nothing shown
    Aborted,
    /// Retry budget spent
    Exhausted,
    /// Another cycle was already running
    Skipped,
}
