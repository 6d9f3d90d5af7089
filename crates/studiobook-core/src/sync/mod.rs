//! Background synchronization of the booked-events snapshot.
//!
//! `EventCacheSync` owns the cached snapshot and reconciles it against the
//! remote sheet: instant render from cache, a deadline-bounded fetch, a
//! whole-snapshot compare-and-replace, and a fixed-delay retry budget.
//! `run_sync_loop` drives it from a timer and a visibility signal.

pub mod controller;
pub mod error;
pub mod port;
pub mod scheduler;
pub mod state;

pub use controller::EventCacheSync;
pub use error::SyncError;
pub use port::{EventRenderer, EventSource};
pub use scheduler::run_sync_loop;
pub use state::{Indicator, SyncOutcome, SyncPhase, SyncStatus};
