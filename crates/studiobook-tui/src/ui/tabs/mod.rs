//! Per-tab content rendering.

pub mod booked;
pub mod schedule;
