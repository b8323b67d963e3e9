//! Navigation state records
//!
//! One `NavigationState` per route path, plus the aggregate history map that
//! mirrors every record under a single storage key.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Snapshot of the viewport taken when leaving a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    /// Vertical scroll offset at save time
    #[serde(deserialize_with = "de_offset")]
    pub scroll_position: u32,
    /// Wall-clock ms at save time
    #[serde(default)]
    pub timestamp: u64,
    /// Route path this state belongs to
    #[serde(default)]
    pub from_path: String,
    /// Viewport height at save time (0 in records from older writers)
    #[serde(default)]
    pub viewport_height: u32,
    /// Full scrollable content height at save time (0 in records from older writers)
    #[serde(default)]
    pub document_height: u32,
}

impl NavigationState {
    pub fn new(
        path: &str,
        scroll_position: u32,
        viewport_height: u32,
        document_height: u32,
        timestamp: u64,
    ) -> Self {
        Self {
            scroll_position,
            timestamp,
            from_path: path.to_string(),
            viewport_height,
            document_height,
        }
    }

    /// Largest offset the page could scroll to when this was saved
    pub fn max_extent(&self) -> u32 {
        self.document_height.saturating_sub(self.viewport_height)
    }
}

/// Accept any finite, non-negative JSON number for an offset.
///
/// Browsers report fractional offsets on high-DPI screens, so `1200.5` is
/// rounded rather than rejected.
fn de_offset<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    offset_from_f64(raw).ok_or_else(|| serde::de::Error::custom(format!("invalid offset {raw}")))
}

/// Convert a raw numeric offset, rejecting NaN, infinities and negatives
pub fn offset_from_f64(raw: f64) -> Option<u32> {
    if !raw.is_finite() || raw < 0.0 || raw > f64::from(u32::MAX) {
        return None;
    }
    Some(raw.round() as u32)
}

/// Default number of paths kept in the history map
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Aggregate `path -> NavigationState` map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryMap {
    pub entries: BTreeMap<String, NavigationState>,
}

impl HistoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a stored map, keeping every well-formed entry.
    ///
    /// A malformed entry written by some other consumer must not take the
    /// rest of the map down with it.
    pub fn from_json_lenient(json: &str) -> Result<Self, serde_json::Error> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut entries = BTreeMap::new();
        for (path, value) in raw {
            match serde_json::from_value::<NavigationState>(value) {
                Ok(state) => {
                    entries.insert(path, state);
                }
                Err(e) => log::debug!("Dropping malformed history entry for {}: {}", path, e),
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, path: &str) -> Option<&NavigationState> {
        self.entries.get(path)
    }

    /// Insert or overwrite `path`, then evict the oldest entries beyond `capacity`.
    ///
    /// Returns the paths that were evicted.
    pub fn record(&mut self, path: &str, state: NavigationState, capacity: usize) -> Vec<String> {
        self.entries.insert(path.to_string(), state);

        let mut evicted = Vec::new();
        while self.entries.len() > capacity.max(1) {
            // Oldest save goes first; ties break on path so eviction is stable
            let oldest = self
                .entries
                .iter()
                .filter(|(p, _)| p.as_str() != path)
                .min_by(|(pa, a), (pb, b)| a.timestamp.cmp(&b.timestamp).then(pa.cmp(pb)))
                .map(|(p, _)| p.clone());
            match oldest {
                Some(p) => {
                    self.entries.remove(&p);
                    evicted.push(p);
                }
                None => break,
            }
        }
        evicted
    }

    pub fn remove(&mut self, path: &str) -> Option<NavigationState> {
        self.entries.remove(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
