//! Local caching module for instant startup.
//!
//! This module provides the `CacheManager` for storing and retrieving the
//! booked-events snapshot locally. Each slot is one JSON file holding the
//! whole value; slots are only ever replaced in full.

pub mod manager;

pub use manager::CacheManager;
