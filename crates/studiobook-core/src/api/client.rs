//! API client for the booking sheet's script endpoint.
//!
//! Every request carries a `t=<millis>` query parameter so that no cache
//! between us and the script hands back a stale sheet.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::models::{BookedEventsResponse, ScheduleResponse};
use crate::sync::EventSource;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds for requests without their own deadline.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const ACTION_BOOKED_EVENTS: &str = "getBookedEvents";
const ACTION_SCHEDULE: &str = "getData";

#[derive(Debug, Deserialize)]
struct DateCheckResponse {
    #[serde(default, deserialize_with = "de_strict_true")]
    booked: bool,
}

/// Only a JSON `true` counts as booked; any other value reads as free
fn de_strict_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

/// API client for the script endpoint.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: String,
}

impl ApiClient {
    /// Create a new API client for the given script URL
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Create a client for another script URL, sharing the connection pool.
    pub fn with_endpoint(&self, endpoint: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn cache_buster() -> String {
        Utc::now().timestamp_millis().to_string()
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        query: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<T, ApiError> {
        let mut request = self.client.get(&self.endpoint).query(query);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(ApiError::from_request)?;
        let response = Self::check_response(response).await?;
        let text = response.text().await.map_err(ApiError::from_request)?;
        debug!(bytes = text.len(), "Endpoint response received");

        serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(200).collect();
            ApiError::InvalidResponse(format!("{} (body starts with: {})", e, preview))
        })
    }

    // ===== Data Fetching Methods =====

    /// Fetch the booked-events list, giving up once `deadline` passes.
    ///
    /// A non-"success" status is returned as-is; judging it is the caller's job.
    pub async fn fetch_booked_events_until(
        &self,
        deadline: Instant,
    ) -> Result<BookedEventsResponse, ApiError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ApiError::Timeout);
        }

        let t = Self::cache_buster();
        self.get(&[("action", ACTION_BOOKED_EVENTS), ("t", &t)], Some(remaining))
            .await
    }

    /// Fetch every raw row of the schedule sheet
    pub async fn fetch_schedule(&self) -> Result<Vec<Vec<Value>>> {
        let t = Self::cache_buster();
        let response: ScheduleResponse = self
            .get(&[("action", ACTION_SCHEDULE), ("t", &t)], None)
            .await
            .context("Failed to fetch schedule")?;
        debug!(rows = response.data.len(), "Schedule fetched");
        Ok(response.data)
    }

    /// Ask the endpoint whether a date already carries a booking
    pub async fn check_date(&self, date: &str) -> Result<bool> {
        let response: DateCheckResponse = self
            .get(&[("checkDate", date)], None)
            .await
            .with_context(|| format!("Failed to check availability of {}", date))?;
        Ok(response.booked)
    }
}

#[async_trait]
impl EventSource for ApiClient {
    async fn fetch_booked_events(&self, deadline: Instant) -> Result<BookedEventsResponse, ApiError> {
        self.fetch_booked_events_until(deadline).await
    }
}
