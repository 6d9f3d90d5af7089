//! studiobook core library.
//!
//! Booking models, the script endpoint client, the local snapshot cache,
//! configuration, and the background sync that ties them together. The
//! terminal front end lives in `studiobook-tui`.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod sync;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use cache::CacheManager;
pub use config::{Config, SyncSettings};
pub use sync::{EventCacheSync, EventRenderer, EventSource, Indicator, SyncOutcome, SyncPhase, SyncStatus};
