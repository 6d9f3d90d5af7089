//! Application state management for studiobook.
//!
//! This module contains the core `App` struct that manages UI state, the
//! booked-events sync controller, and the schedule refresh task.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use studiobook_core::models::{booked_rows, schedule_rows, BookedRow, EventRecord, ScheduleRow};
use studiobook_core::sync::run_sync_loop;
use studiobook_core::utils::format_age;
use studiobook_core::{
    ApiClient, CacheManager, Config, EventCacheSync, EventRenderer, Indicator, SyncPhase,
    SyncStatus,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Schedule columns that stay put while the rest scroll sideways (date, event id).
pub const SCHEDULE_PINNED_COLUMNS: usize = 2;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Booked,
    Schedule,
}

impl Tab {
    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Booked => "Booked",
            Tab::Schedule => "Schedule",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Booked => Tab::Schedule,
            Tab::Schedule => Tab::Booked,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        // Two tabs: previous and next coincide
        self.next()
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Load state of the schedule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStatus {
    Loading,
    Ready,
    Failed,
}

impl ScheduleStatus {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            ScheduleStatus::Loading => Some("Loading schedule..."),
            ScheduleStatus::Ready => None,
            ScheduleStatus::Failed => Some("Failed to load data"),
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from the schedule refresh task back to the main loop.
#[derive(Debug)]
enum RefreshResult {
    /// Schedule rows fetched and formatted
    Schedule(Vec<ScheduleRow>),
    /// The schedule fetch failed
    ScheduleError(String),
}

/// Publishes every rendered snapshot on a watch channel the UI reads each frame.
pub struct WatchRenderer {
    tx: watch::Sender<Vec<BookedRow>>,
}

impl WatchRenderer {
    pub fn new() -> (Self, watch::Receiver<Vec<BookedRow>>) {
        let (tx, rx) = watch::channel(Vec::new());
        (Self { tx }, rx)
    }
}

impl EventRenderer for WatchRenderer {
    fn render(&self, records: &[EventRecord]) {
        self.tx.send_replace(booked_rows(records));
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    pub config: Config,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub booked_selection: usize,
    pub schedule_selection: usize,
    /// First scrolled (non-pinned) schedule column on screen
    pub schedule_column_offset: usize,

    // Booked events, kept current by the sync controller
    sync: Arc<EventCacheSync>,
    booked: watch::Receiver<Vec<BookedRow>>,
    sync_status: watch::Receiver<SyncStatus>,
    visibility_tx: watch::Sender<bool>,

    // Schedule, refreshed by its own task
    pub schedule: Vec<ScheduleRow>,
    pub schedule_status: ScheduleStatus,
    pub schedule_updated: Option<DateTime<Utc>>,
    schedule_api: Option<ApiClient>,

    // Background task channel
    refresh_rx: mpsc::Receiver<RefreshResult>,
    refresh_tx: mpsc::Sender<RefreshResult>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance from a loaded config
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(config.endpoint()?)?;
        let cache = CacheManager::new(config.cache_dir()?)?;
        debug!(endpoint = api.endpoint(), cache_dir = ?cache.cache_dir(), "App configured");
        Ok(Self::from_parts(config, api, cache))
    }

    pub(crate) fn from_parts(config: Config, api: ApiClient, cache: CacheManager) -> Self {
        let (renderer, booked) = WatchRenderer::new();
        let schedule_api = config.schedule_endpoint().map(|url| api.with_endpoint(url));
        let sync = Arc::new(EventCacheSync::new(
            Arc::new(api),
            cache,
            Arc::new(renderer),
            config.sync,
        ));
        let sync_status = sync.subscribe();
        let (visibility_tx, _) = watch::channel(true);
        let (refresh_tx, refresh_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Self {
            config,
            state: AppState::Normal,
            current_tab: Tab::Booked,
            booked_selection: 0,
            schedule_selection: 0,
            schedule_column_offset: 0,
            sync,
            booked,
            sync_status,
            visibility_tx,
            schedule: Vec::new(),
            schedule_status: ScheduleStatus::Loading,
            schedule_updated: None,
            schedule_api,
            refresh_rx,
            refresh_tx,
            status_message: None,
        }
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Spawn the booked-events sync (cache first, then timer + visibility
    /// triggers) and the periodic schedule refresh.
    pub fn start_background(&self) {
        info!("Starting background sync");

        let sync = Arc::clone(&self.sync);
        let visibility = self.visibility_tx.subscribe();
        let period = self.config.sync.refresh_interval();
        tokio::spawn(async move {
            sync.initialize().await;
            run_sync_loop(&sync, period, visibility).await;
        });

        match self.schedule_api.clone() {
            Some(api) => {
                let tx = self.refresh_tx.clone();
                let period = self.config.sync.schedule_refresh();
                tokio::spawn(async move {
                    loop {
                        Self::execute_schedule_refresh(&api, &tx).await;
                        tokio::select! {
                            _ = tokio::time::sleep(period) => {}
                            _ = tx.closed() => break,
                        }
                    }
                    debug!("Schedule refresh task stopped");
                });
            }
            None => warn!("No schedule endpoint configured"),
        }
    }

    /// Feed terminal focus into the sync loop; repeats of the same state are ignored
    pub fn set_visible(&self, visible: bool) {
        let changed = self.visibility_tx.send_if_modified(|current| {
            if *current == visible {
                false
            } else {
                *current = visible;
                true
            }
        });
        if changed {
            debug!(visible, "Visibility changed");
        }
    }

    pub fn is_visible(&self) -> bool {
        *self.visibility_tx.borrow()
    }

    /// On-demand refresh of whatever the current tab shows
    pub fn refresh_current_tab(&mut self) {
        match self.current_tab {
            Tab::Booked => {
                let sync = Arc::clone(&self.sync);
                tokio::spawn(async move {
                    let outcome = sync.sync_remote().await;
                    debug!(?outcome, "Manual sync finished");
                });
                self.status_message = Some("Syncing booked events...".to_string());
            }
            Tab::Schedule => match self.schedule_api.clone() {
                Some(api) => {
                    let tx = self.refresh_tx.clone();
                    tokio::spawn(async move {
                        Self::execute_schedule_refresh(&api, &tx).await;
                    });
                    self.status_message = Some("Refreshing schedule...".to_string());
                }
                None => {
                    self.status_message = Some("No schedule endpoint configured".to_string());
                }
            },
        }
    }

    async fn execute_schedule_refresh(api: &ApiClient, tx: &mpsc::Sender<RefreshResult>) {
        let result = match api.fetch_schedule().await {
            Ok(raw) => RefreshResult::Schedule(schedule_rows(raw)),
            Err(e) => {
                error!(error = %e, "Schedule fetch failed");
                RefreshResult::ScheduleError(e.to_string())
            }
        };
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send refresh result - channel closed");
        }
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.refresh_rx.try_recv() {
            self.process_refresh_result(result);
        }
        if self.sync_status.has_changed().unwrap_or(false) {
            let phase = self.sync_status.borrow_and_update().phase;
            // A finished cycle replaces the "Syncing..." note with its own status
            let settled = !matches!(phase, SyncPhase::Fetching | SyncPhase::Failed(_));
            if settled && self.current_tab == Tab::Booked {
                self.status_message = None;
            }
        }
        self.clamp_selections();
    }

    fn process_refresh_result(&mut self, result: RefreshResult) {
        match result {
            RefreshResult::Schedule(rows) => {
                info!(count = rows.len(), "Schedule refreshed");
                self.schedule = rows;
                self.schedule_status = ScheduleStatus::Ready;
                self.schedule_updated = Some(Utc::now());
                if self.current_tab == Tab::Schedule {
                    self.status_message = None;
                }
            }
            RefreshResult::ScheduleError(msg) => {
                debug!(error = %msg, "Keeping previous schedule rows");
                self.schedule_status = ScheduleStatus::Failed;
                if self.current_tab == Tab::Schedule {
                    self.status_message = None;
                }
            }
        }
    }

    // =========================================================================
    // Data Access
    // =========================================================================

    pub fn booked_rows(&self) -> Vec<BookedRow> {
        self.booked.borrow().clone()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync_status.borrow().clone()
    }

    /// Text for the left side of the status bar
    pub fn status_line(&self) -> String {
        if let Some(ref msg) = self.status_message {
            return msg.clone();
        }
        match self.current_tab {
            Tab::Booked => {
                let status = self.sync_status();
                match (status.indicator.message(), status.last_synced) {
                    (Some(msg), _) => msg.to_string(),
                    (None, Some(at)) => format!("Synced {}", format_age(at)),
                    (None, None) => "Showing cached bookings".to_string(),
                }
            }
            Tab::Schedule => match (self.schedule_status.message(), self.schedule_updated) {
                (Some(msg), _) => msg.to_string(),
                (None, Some(at)) => format!("Updated {}", format_age(at)),
                (None, None) => String::new(),
            },
        }
    }

    /// Whether the status line is reporting a load failure
    pub fn status_is_error(&self) -> bool {
        if self.status_message.is_some() {
            return false;
        }
        match self.current_tab {
            Tab::Booked => self.sync_status.borrow().indicator == Indicator::Unavailable,
            Tab::Schedule => self.schedule_status == ScheduleStatus::Failed,
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    fn current_len(&self) -> usize {
        match self.current_tab {
            Tab::Booked => self.booked.borrow().len(),
            Tab::Schedule => self.schedule.len(),
        }
    }

    fn selection_mut(&mut self) -> &mut usize {
        match self.current_tab {
            Tab::Booked => &mut self.booked_selection,
            Tab::Schedule => &mut self.schedule_selection,
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.current_len();
        let selection = self.selection_mut();
        if len == 0 {
            *selection = 0;
            return;
        }
        let target = (*selection as isize + delta).clamp(0, len as isize - 1);
        *selection = target as usize;
    }

    pub fn select_first(&mut self) {
        *self.selection_mut() = 0;
    }

    pub fn select_last(&mut self) {
        let last = self.current_len().saturating_sub(1);
        *self.selection_mut() = last;
    }

    /// Widest schedule row, in cells
    pub fn schedule_column_count(&self) -> usize {
        self.schedule.iter().map(|row| row.cells.len()).max().unwrap_or(0)
    }

    fn max_schedule_column_offset(&self) -> usize {
        self.schedule_column_count()
            .saturating_sub(SCHEDULE_PINNED_COLUMNS + 1)
    }

    pub fn scroll_schedule_columns(&mut self, delta: isize) {
        let max = self.max_schedule_column_offset() as isize;
        let target = (self.schedule_column_offset as isize + delta).clamp(0, max);
        self.schedule_column_offset = target as usize;
    }

    /// Keep selections inside their tables after data shrinks
    fn clamp_selections(&mut self) {
        let booked_len = self.booked.borrow().len();
        self.booked_selection = self.booked_selection.min(booked_len.saturating_sub(1));
        self.schedule_selection = self
            .schedule_selection
            .min(self.schedule.len().saturating_sub(1));
        self.schedule_column_offset = self
            .schedule_column_offset
            .min(self.max_schedule_column_offset());
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.status_message = None;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use studiobook_core::models::EventDate;
    use tempfile::TempDir;

    fn record(id: &str, date: &str) -> EventRecord {
        EventRecord {
            event_id: id.to_string(),
            event_date: Some(EventDate::Text(date.to_string())),
            customer_name: "A".to_string(),
            event_type: "Wedding".to_string(),
            attended: false,
        }
    }

    fn test_app(dir: &TempDir) -> App {
        let config = Config {
            endpoint_url: Some("http://127.0.0.1:9/exec".to_string()),
            ..Config::default()
        };
        let api = ApiClient::new("http://127.0.0.1:9/exec").unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        App::from_parts(config, api, cache)
    }

    #[test]
    fn test_tab_next() {
        assert_eq!(Tab::Booked.next(), Tab::Schedule);
        assert_eq!(Tab::Schedule.next(), Tab::Booked);
        assert_eq!(Tab::Booked.prev(), Tab::Schedule);
    }

    #[test]
    fn test_watch_renderer_replaces_rows() {
        let (renderer, rx) = WatchRenderer::new();
        let snapshot = vec![record("E1", "2024-01-10"), record("E2", "2024-01-11")];

        renderer.render(&snapshot);
        let first = rx.borrow().clone();
        renderer.render(&snapshot);
        assert_eq!(*rx.borrow(), first);
        assert_eq!(first[0].display_line(), "10-01-2024 | E1 | A | Wedding");

        renderer.render(&snapshot[..1]);
        assert_eq!(rx.borrow().len(), 1);
    }

    #[test]
    fn test_schedule_results_update_state() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        assert_eq!(app.schedule_status, ScheduleStatus::Loading);

        app.process_refresh_result(RefreshResult::Schedule(vec![ScheduleRow {
            cells: vec!["10-01-2024".to_string(), "E1".to_string()],
        }]));
        assert_eq!(app.schedule_status, ScheduleStatus::Ready);
        assert_eq!(app.schedule.len(), 1);

        // Failure keeps the last good rows
        app.process_refresh_result(RefreshResult::ScheduleError("offline".to_string()));
        assert_eq!(app.schedule_status, ScheduleStatus::Failed);
        assert_eq!(app.schedule.len(), 1);

        app.switch_tab(Tab::Schedule);
        assert_eq!(app.status_line(), "Failed to load data");
        assert!(app.status_is_error());

        app.status_message = Some("Refreshing schedule...".to_string());
        assert!(!app.status_is_error());
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.switch_tab(Tab::Schedule);
        app.move_selection(5);
        assert_eq!(app.schedule_selection, 0);

        app.schedule = (0..4)
            .map(|i| ScheduleRow {
                cells: vec![String::new(), format!("E{}", i)],
            })
            .collect();
        app.move_selection(10);
        assert_eq!(app.schedule_selection, 3);
        app.move_selection(-2);
        assert_eq!(app.schedule_selection, 1);
        app.select_last();
        assert_eq!(app.schedule_selection, 3);
        app.select_first();
        assert_eq!(app.schedule_selection, 0);

        app.schedule_selection = 3;
        app.schedule.truncate(2);
        app.check_background_tasks();
        assert_eq!(app.schedule_selection, 1);
    }

    #[test]
    fn test_schedule_column_offset_is_bounded() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.scroll_schedule_columns(3);
        assert_eq!(app.schedule_column_offset, 0);

        app.schedule = vec![ScheduleRow {
            cells: (0..24).map(|i| format!("c{:02}", i)).collect(),
        }];
        app.scroll_schedule_columns(100);
        assert_eq!(app.schedule_column_offset, 21);
        app.scroll_schedule_columns(-1);
        assert_eq!(app.schedule_column_offset, 20);

        app.schedule[0].cells.truncate(5);
        app.check_background_tasks();
        assert_eq!(app.schedule_column_offset, 2);
    }

    #[test]
    fn test_status_line_for_booked_tab() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        assert_eq!(app.status_line(), "Showing cached bookings");

        app.status_message = Some("Syncing booked events...".to_string());
        assert_eq!(app.status_line(), "Syncing booked events...");
    }

    #[test]
    fn test_set_visible_ignores_repeats() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir);
        let mut rx = app.visibility_tx.subscribe();

        app.set_visible(true);
        assert!(!rx.has_changed().unwrap());

        app.set_visible(false);
        assert!(rx.has_changed().unwrap());
        assert!(!*rx.borrow_and_update());
        assert!(!app.is_visible());
    }
}
