use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::models::EventRecord;

/// Slot holding the active booked-events snapshot
pub const BOOKED_EVENTS_SLOT: &str = "booked_events";

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: T = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    /// Write to a sibling temp file and rename over the slot, so readers see
    /// either the old value or the new one.
    fn save<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.cache_path(name);
        let tmp_path = self.cache_dir.join(format!("{}.json.tmp", name));
        let contents = serde_json::to_string(data)?;
        std::fs::write(&tmp_path, contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        std::fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to replace cache file: {}", name))?;
        Ok(())
    }

    // ===== Booked Events =====

    /// Load the cached snapshot. Missing or unreadable slots come back empty.
    pub fn load_booked_events(&self) -> Vec<EventRecord> {
        match self.load::<Vec<EventRecord>>(BOOKED_EVENTS_SLOT) {
            Ok(Some(events)) => events,
            Ok(None) => Vec::new(),
            Err(e) => {
                debug!(cache = BOOKED_EVENTS_SLOT, error = %e, "Ignoring unreadable cache");
                Vec::new()
            }
        }
    }

    pub fn save_booked_events(&self, events: &[EventRecord]) -> Result<()> {
        self.save(BOOKED_EVENTS_SLOT, events)
    }

    /// Serialized form of the cached snapshot, as compared against fresh data
    pub fn booked_events_fingerprint(&self) -> String {
        serde_json::to_string(&self.load_booked_events()).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
