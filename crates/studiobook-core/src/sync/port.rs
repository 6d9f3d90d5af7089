use async_trait::async_trait;
use tokio::time::Instant;

use crate::api::ApiError;
use crate::models::{BookedEventsResponse, EventRecord};

/// Where booked events come from.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch the full booked-events list. Implementations should stop
    /// waiting at `deadline` and report `ApiError::Timeout`.
    async fn fetch_booked_events(&self, deadline: Instant) -> Result<BookedEventsResponse, ApiError>;
}

/// Where the active snapshot is shown. Each call replaces the whole view.
pub trait EventRenderer: Send + Sync {
    fn render(&self, records: &[EventRecord]);
}
