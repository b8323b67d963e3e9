//! Redundant encodings of a navigation record
//!
//! Every save writes through all representations; every read folds over them
//! in priority order and stops at the first usable offset.
//!
//! | key                     | value                          |
//! |-------------------------|--------------------------------|
//! | `pageState_<path>`      | JSON `NavigationState`         |
//! | `navigationHistory`     | JSON `{ path: NavigationState }` |
//! | `scrollPosition_<path>` | decimal offset                 |

use super::SessionStore;
use crate::error::{CodecError, StoreError};
use crate::state::{HistoryMap, NavigationState};

pub const PAGE_STATE_PREFIX: &str = "pageState_";
pub const HISTORY_KEY: &str = "navigationHistory";
pub const LEGACY_PREFIX: &str = "scrollPosition_";

/// One storage encoding of a navigation record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// Full record under a per-path key
    PerPath,
    /// Entry in the aggregate history map
    History,
    /// Bare offset for older consumers
    Legacy,
}

impl Representation {
    /// Read priority, which is also the write order
    pub const ALL: [Representation; 3] = [
        Representation::PerPath,
        Representation::History,
        Representation::Legacy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Representation::PerPath => "per-path",
            Representation::History => "history",
            Representation::Legacy => "legacy",
        }
    }

    /// Storage key holding this representation for `path`
    pub fn key(&self, path: &str) -> String {
        match self {
            Representation::PerPath => format!("{PAGE_STATE_PREFIX}{path}"),
            Representation::History => HISTORY_KEY.to_string(),
            Representation::Legacy => format!("{LEGACY_PREFIX}{path}"),
        }
    }

    /// Whether `key` belongs to this representation (for any path)
    pub fn owns_key(&self, key: &str) -> bool {
        match self {
            Representation::PerPath => key.starts_with(PAGE_STATE_PREFIX),
            Representation::History => key == HISTORY_KEY,
            Representation::Legacy => key.starts_with(LEGACY_PREFIX),
        }
    }

    /// Encode `state` into the store
    pub fn write<S: SessionStore>(
        &self,
        store: &mut S,
        state: &NavigationState,
        history_capacity: usize,
    ) -> Result<(), CodecError> {
        let path = state.from_path.as_str();
        match self {
            Representation::PerPath => {
                let json = serde_json::to_string(state)?;
                store.set(&self.key(path), &json)?;
            }
            Representation::History => {
                // A corrupt map is replaced rather than blocking the save
                let mut map = read_history(store).unwrap_or_default();
                let evicted = map.record(path, state.clone(), history_capacity);
                if !evicted.is_empty() {
                    log::debug!("History map evicted {:?}", evicted);
                }
                store.set(HISTORY_KEY, &serde_json::to_string(&map)?)?;
            }
            Representation::Legacy => {
                store.set(&self.key(path), &state.scroll_position.to_string())?;
            }
        }
        Ok(())
    }

    /// Decode the saved offset for `path`, `Ok(None)` when absent
    pub fn read_offset<S: SessionStore>(
        &self,
        store: &S,
        path: &str,
    ) -> Result<Option<u32>, CodecError> {
        match self {
            Representation::PerPath | Representation::History => {
                Ok(self.read_record(store, path)?.map(|s| s.scroll_position))
            }
            Representation::Legacy => match store.get(&self.key(path))? {
                Some(raw) => parse_legacy_offset(&raw).map(Some),
                None => Ok(None),
            },
        }
    }

    /// Decode the full record, if this representation carries one
    pub fn read_record<S: SessionStore>(
        &self,
        store: &S,
        path: &str,
    ) -> Result<Option<NavigationState>, CodecError> {
        match self {
            Representation::PerPath => match store.get(&self.key(path))? {
                Some(json) => Ok(Some(serde_json::from_str(&json)?)),
                None => Ok(None),
            },
            Representation::History => match store.get(HISTORY_KEY)? {
                Some(json) => Ok(HistoryMap::from_json_lenient(&json)?.remove(path)),
                None => Ok(None),
            },
            Representation::Legacy => Ok(None),
        }
    }

    /// Drop this representation's data for `path`
    pub fn remove<S: SessionStore>(&self, store: &mut S, path: &str) -> Result<(), CodecError> {
        match self {
            Representation::PerPath | Representation::Legacy => {
                store.remove(&self.key(path))?;
            }
            Representation::History => {
                let Some(json) = store.get(HISTORY_KEY)? else {
                    return Ok(());
                };
                let mut map = HistoryMap::from_json_lenient(&json)?;
                if map.remove(path).is_some() {
                    if map.is_empty() {
                        store.remove(HISTORY_KEY)?;
                    } else {
                        store.set(HISTORY_KEY, &serde_json::to_string(&map)?)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn read_history<S: SessionStore>(store: &S) -> Result<HistoryMap, CodecError> {
    match store.get(HISTORY_KEY)? {
        Some(json) => Ok(HistoryMap::from_json_lenient(&json)?),
        None => Ok(HistoryMap::new()),
    }
}

/// Parse a legacy offset the lenient way older writers expect.
///
/// Leading whitespace is skipped and parsing stops at the first non-digit, so
/// `"1200.5"` and `"1200px"` both yield 1200. Negative values are rejected.
pub fn parse_legacy_offset(raw: &str) -> Result<u32, CodecError> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = unsigned.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(CodecError::InvalidOffset(raw.to_string()));
    }
    digits
        .parse()
        .map_err(|_| CodecError::InvalidOffset(raw.to_string()))
}

/// Outcome of writing a record through every representation
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<Representation>,
    pub failed: Vec<(Representation, CodecError)>,
}

impl WriteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Write-through facade over a session store
#[derive(Debug)]
pub struct StateStore<S> {
    store: S,
    history_capacity: usize,
}

impl<S: SessionStore> StateStore<S> {
    pub fn new(store: S, history_capacity: usize) -> Self {
        Self {
            store,
            history_capacity: history_capacity.max(1),
        }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Write `state` into every representation, in priority order.
    ///
    /// Each representation is attempted even if an earlier one failed, so a
    /// quota hit on the history map still leaves the per-path record behind.
    /// A representation that could not be written is cleared for the path,
    /// so an older record there never outranks the one just saved.
    pub fn write(&mut self, state: &NavigationState) -> WriteReport {
        let mut report = WriteReport::default();
        for repr in Representation::ALL {
            match repr.write(&mut self.store, state, self.history_capacity) {
                Ok(()) => report.written.push(repr),
                Err(e) => {
                    if let Err(clear) = repr.remove(&mut self.store, &state.from_path) {
                        log::warn!(
                            "Stale {} state for {} left behind: {}",
                            repr.as_str(),
                            state.from_path,
                            clear
                        );
                    }
                    report.failed.push((repr, e));
                }
            }
        }
        report
    }

    /// First usable saved offset for `path`
    pub fn read_offset(&self, path: &str) -> Option<u32> {
        Representation::ALL.iter().find_map(|repr| {
            match repr.read_offset(&self.store, path) {
                Ok(offset) => offset,
                Err(e) => {
                    log::warn!("Ignoring {} state for {}: {}", repr.as_str(), path, e);
                    None
                }
            }
        })
    }

    /// First full record for `path` (the legacy scalar carries none)
    pub fn read_record(&self, path: &str) -> Option<NavigationState> {
        Representation::ALL
            .iter()
            .find_map(|repr| repr.read_record(&self.store, path).ok().flatten())
    }

    /// Remove every representation for `path`
    pub fn forget(&mut self, path: &str) -> Result<(), CodecError> {
        let mut first_err = None;
        for repr in Representation::ALL {
            if let Err(e) = repr.remove(&mut self.store, path) {
                log::warn!("Failed to clear {} state for {}: {}", repr.as_str(), path, e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Remove every key owned by any representation, returning how many went
    pub fn purge_all(&mut self) -> Result<usize, StoreError> {
        let keys = self.store.keys()?;
        let mut removed = 0;
        for key in keys {
            if !Representation::ALL.iter().any(|r| r.owns_key(&key)) {
                continue;
            }
            match self.store.remove(&key) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("Failed to purge {}: {}", key, e),
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use proptest::prelude::*;

    fn state(path: &str, offset: u32) -> NavigationState {
        NavigationState::new(path, offset, 800, 4000, 1_000)
    }

    #[test]
    fn test_write_populates_all_representations() {
        let mut store = StateStore::new(MemoryStore::new(), 10);
        let report = store.write(&state("/gallery", 1200));
        assert!(report.is_complete());
        assert_eq!(report.written, Representation::ALL.to_vec());

        let inner = store.inner();
        assert!(inner.get("pageState_/gallery").unwrap().is_some());
        assert_eq!(inner.get("scrollPosition_/gallery").unwrap().as_deref(), Some("1200"));
        let history = HistoryMap::from_json_lenient(&inner.get(HISTORY_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(history.get("/gallery").map(|s| s.scroll_position), Some(1200));
    }

    #[test]
    fn test_read_prefers_per_path_record() {
        let mut store = StateStore::new(MemoryStore::new(), 10);
        store.write(&state("/a", 100));
        store.inner_mut().set("scrollPosition_/a", "999").unwrap();
        assert_eq!(store.read_offset("/a"), Some(100));
    }

    #[test]
    fn test_read_falls_back_to_history() {
        let mut store = StateStore::new(MemoryStore::new(), 10);
        store.write(&state("/a", 100));
        store.inner_mut().remove("pageState_/a").unwrap();
        store.inner_mut().set("scrollPosition_/a", "999").unwrap();
        assert_eq!(store.read_offset("/a"), Some(100));
    }

    #[test]
    fn test_read_skips_corrupt_sources() {
        let mut store = StateStore::new(MemoryStore::new(), 10);
        let inner = store.inner_mut();
        inner.set("pageState_/a", "{broken").unwrap();
        inner.set(HISTORY_KEY, "not a map").unwrap();
        inner.set("scrollPosition_/a", "321").unwrap();
        assert_eq!(store.read_offset("/a"), Some(321));
    }

    #[test]
    fn test_read_none_when_everything_is_unusable() {
        let mut store = StateStore::new(MemoryStore::new(), 10);
        assert_eq!(store.read_offset("/a"), None);

        let inner = store.inner_mut();
        inner.set("pageState_/a", r#"{"scrollPosition":-1}"#).unwrap();
        inner.set("scrollPosition_/a", "NaN").unwrap();
        assert_eq!(store.read_offset("/a"), None);
    }

    #[test]
    fn test_legacy_parse() {
        assert_eq!(parse_legacy_offset("1200").unwrap(), 1200);
        assert_eq!(parse_legacy_offset("  42px").unwrap(), 42);
        assert_eq!(parse_legacy_offset("1200.9").unwrap(), 1200);
        assert_eq!(parse_legacy_offset("+7").unwrap(), 7);
        assert!(parse_legacy_offset("-5").is_err());
        assert!(parse_legacy_offset("").is_err());
        assert!(parse_legacy_offset("abc").is_err());
        assert!(parse_legacy_offset("99999999999").is_err());
    }

    #[test]
    fn test_forget_removes_one_path_only() {
        let mut store = StateStore::new(MemoryStore::new(), 10);
        store.write(&state("/a", 1));
        store.write(&state("/b", 2));
        store.forget("/a").unwrap();

        assert_eq!(store.read_offset("/a"), None);
        assert_eq!(store.read_offset("/b"), Some(2));
        assert!(store.read_record("/b").is_some());
    }

    #[test]
    fn test_forget_last_path_drops_history_key() {
        let mut store = StateStore::new(MemoryStore::new(), 10);
        store.write(&state("/a", 1));
        store.forget("/a").unwrap();
        assert!(store.inner().is_empty());
    }

    #[test]
    fn test_purge_leaves_foreign_keys() {
        let mut store = StateStore::new(MemoryStore::new(), 10);
        store.write(&state("/a", 1));
        store.write(&state("/b", 2));
        store.inner_mut().set("theme", "dark").unwrap();

        let removed = store.purge_all().unwrap();
        assert_eq!(removed, 5);
        assert_eq!(store.inner().keys().unwrap(), vec!["theme".to_string()]);
    }

    #[test]
    fn test_quota_failure_is_partial_not_fatal() {
        // Room for the per-path record but not for the history map as well
        let record_len = "pageState_/a".len() + serde_json::to_string(&state("/a", 1)).unwrap().len();
        let mut store = StateStore::new(MemoryStore::with_capacity(record_len + 8), 10);
        let report = store.write(&state("/a", 1));

        assert!(!report.is_complete());
        assert!(report.written.contains(&Representation::PerPath));
        assert!(report.failed.iter().any(|(r, _)| *r == Representation::History));
        assert_eq!(store.read_offset("/a"), Some(1));
    }

    /// Accepts everything until `reject_prefix` is armed, then refuses sets
    /// of matching keys
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        reject_prefix: Option<&'static str>,
    }

    impl SessionStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            match self.reject_prefix {
                Some(prefix) if key.starts_with(prefix) => {
                    Err(StoreError::Backend(format!("write to {key} refused")))
                }
                _ => self.inner.set(key, value),
            }
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }

        fn keys(&self) -> Result<Vec<String>, StoreError> {
            self.inner.keys()
        }
    }

    #[test]
    fn test_failed_per_path_write_does_not_shadow_newer_offset() {
        let mut store = StateStore::new(FlakyStore::default(), 10);
        assert!(store.write(&state("/a", 100)).is_complete());

        store.inner_mut().reject_prefix = Some(PAGE_STATE_PREFIX);
        let report = store.write(&state("/a", 900));

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, Representation::PerPath);
        assert!(store.inner().get("pageState_/a").unwrap().is_none());
        assert_eq!(store.read_offset("/a"), Some(900));
        assert_eq!(store.read_record("/a").unwrap().scroll_position, 900);
    }

    proptest! {
        #[test]
        fn prop_purge_removes_every_owned_key(
            paths in proptest::collection::btree_set("/[a-z]{1,8}", 0..12),
            offset in 0u32..100_000,
        ) {
            let mut store = StateStore::new(MemoryStore::new(), 100);
            for path in &paths {
                store.write(&state(path, offset));
            }
            store.purge_all().unwrap();
            let keys = store.inner().keys().unwrap();
            prop_assert!(keys.iter().all(|k| !Representation::ALL.iter().any(|r| r.owns_key(k))));
        }

        #[test]
        fn prop_write_then_read_offset(path in "/[a-z/]{0,16}", offset in 0u32..10_000_000) {
            let mut store = StateStore::new(MemoryStore::new(), 10);
            store.write(&state(&path, offset));
            prop_assert_eq!(store.read_offset(&path), Some(offset));
        }
    }
}
