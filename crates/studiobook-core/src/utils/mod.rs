//! Utility functions for date and string formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_age, format_date_safe, parse_event_timestamp, truncate_string};
