//! Persistent stats store
//!
//! The store keeps two top-level keys in a durable key-value backend:
//! `stats` (a [`StatsRecord`]) and `protected` (a [`ProtectedSites`] map).
//! The backend has no atomic increment, so every mutation is a full
//! read-modify-write. The store keeps that window short and in-process
//! serialized: one lock around read, apply and a single batched write.
//! Change events are delivered before that lock is released, so every
//! subscriber sees writes in the order they landed.
//!
//! Failures never reach the producers. Reads fall back to empty records,
//! writes log and report `false`; a lost event only means an undercount.

use std::collections::BTreeMap;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, trace, warn};
use serde_json::Value;

use crate::error::StoreError;
use crate::exclusion::ExclusionSet;
use crate::notify::{ChangeEvent, Notifier, SubscriptionId};
use crate::types::{bump, counts_from_value, Increment, ProtectedSites, StatsRecord, StorageKey};
use crate::url::{normalize_host, DIRECT_DOMAIN};

// =============================================================================
// Backends
// =============================================================================

/// Durable key-value storage provided by the host platform.
pub trait StorageBackend: Send + Sync {
    /// Fetch one key. `Ok(None)` means the key was never written.
    fn get(&self, key: StorageKey) -> Result<Option<Value>, StoreError>;

    /// Write a batch of keys. The whole batch lands or none of it does.
    fn set(&self, entries: &[(StorageKey, Value)]) -> Result<(), StoreError>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn get(&self, key: StorageKey) -> Result<Option<Value>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, entries: &[(StorageKey, Value)]) -> Result<(), StoreError> {
        (**self).set(entries)
    }
}

/// In-memory backend. Used inside the extension (where the host platform
/// mirrors it to its own storage) and in tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: Mutex<BTreeMap<StorageKey, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate from a persisted `{ "stats": ..., "protected": ... }` object.
    /// Unknown keys are ignored; anything but an object yields an empty store.
    pub fn from_snapshot(snapshot: &Value) -> Self {
        let mut data = BTreeMap::new();
        if let Value::Object(map) = snapshot {
            for key in StorageKey::ALL {
                if let Some(value) = map.get(key.as_str()).filter(|v| !v.is_null()) {
                    data.insert(key, value.clone());
                }
            }
        }
        Self { data: Mutex::new(data) }
    }

    /// Export every stored key as one JSON object.
    pub fn snapshot(&self) -> Value {
        let data = self.lock();
        let map = data
            .iter()
            .map(|(key, value)| (key.as_str().to_string(), value.clone()))
            .collect();
        Value::Object(map)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<StorageKey, Value>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: StorageKey) -> Result<Option<Value>, StoreError> {
        Ok(self.lock().get(&key).cloned())
    }

    fn set(&self, entries: &[(StorageKey, Value)]) -> Result<(), StoreError> {
        let mut data = self.lock();
        for (key, value) in entries {
            data.insert(*key, value.clone());
        }
        Ok(())
    }
}

/// Single JSON document on disk holding both keys.
///
/// Writes go to a sibling temp file which is then renamed over the
/// original, so a crash mid-write leaves the previous document intact.
#[cfg(feature = "native")]
#[derive(Debug)]
pub struct FileBackend {
    path: std::path::PathBuf,
    lock: Mutex<()>,
}

#[cfg(feature = "native")]
impl FileBackend {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn read_document(&self) -> Result<serde_json::Map<String, Value>, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(serde_json::Map::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        match serde_json::from_str(&text)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::Malformed {
                key: "<document>",
                reason: format!("'{}' is not a JSON object", self.path.display()),
            }),
        }
    }

    fn write_document(&self, document: &serde_json::Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = std::path::PathBuf::from(tmp);
        std::fs::write(&tmp, serde_json::to_vec_pretty(document)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(feature = "native")]
impl StorageBackend for FileBackend {
    fn get(&self, key: StorageKey) -> Result<Option<Value>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut document = self.read_document()?;
        Ok(document.remove(key.as_str()).filter(|v| !v.is_null()))
    }

    fn set(&self, entries: &[(StorageKey, Value)]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut document = self.read_document()?;
        for (key, value) in entries {
            document.insert(key.as_str().to_string(), value.clone());
        }
        self.write_document(&document)
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Source of the current time in milliseconds since the Unix epoch.
pub type Clock = fn() -> u64;

#[cfg(feature = "native")]
pub fn system_clock() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// wasm32 has no system clock; the bindings install the JS clock instead.
#[cfg(not(feature = "native"))]
pub fn system_clock() -> u64 {
    0
}

// =============================================================================
// Sink
// =============================================================================

/// Outcome of a submitted write.
#[derive(Debug)]
pub enum Completion {
    /// The write already ran; `true` if it was applied.
    Ready(bool),
    /// The write is queued; the receiver yields once it resolves.
    Pending(mpsc::Receiver<bool>),
}

impl Completion {
    /// Block until the write resolves. A dropped queue counts as not applied.
    pub fn wait(self) -> bool {
        match self {
            Completion::Ready(applied) => applied,
            Completion::Pending(rx) => rx.recv().unwrap_or(false),
        }
    }
}

/// Where producers send their filtered, normalized writes.
///
/// Implemented by [`StatsStore`] (applies inline) and by the write queue
/// handle (hands the write to a single writer thread).
pub trait StatsSink: Send + Sync {
    fn submit_block(&self, inc: Increment) -> Completion;
    fn submit_visit(&self, host: String) -> Completion;
}

impl<T: StatsSink + ?Sized> StatsSink for Arc<T> {
    fn submit_block(&self, inc: Increment) -> Completion {
        (**self).submit_block(inc)
    }

    fn submit_visit(&self, host: String) -> Completion {
        (**self).submit_visit(host)
    }
}

// =============================================================================
// Stats Store
// =============================================================================

/// The shared counter store every producer funnels into.
pub struct StatsStore<B> {
    backend: B,
    exclusions: Arc<ExclusionSet>,
    notifier: Arc<Notifier>,
    clock: Clock,
    write_lock: Mutex<()>,
}

impl<B: StorageBackend> StatsStore<B> {
    pub fn new(backend: B, exclusions: Arc<ExclusionSet>) -> Self {
        Self {
            backend,
            exclusions,
            notifier: Arc::new(Notifier::new()),
            clock: system_clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    /// Register for change events after every successful mutation.
    ///
    /// Callbacks run under the store's write lock: they may read the store
    /// but must not write to it.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Current stats record. Never fails: missing or unreadable state reads
    /// as an empty record.
    pub fn read(&self) -> StatsRecord {
        match self.load_stats() {
            Ok((_, record)) => record,
            Err(e) => {
                warn!("Stats read failed: {}", e);
                StatsRecord::empty((self.clock)())
            }
        }
    }

    /// Current protected-sites map. Never fails.
    pub fn read_protected(&self) -> ProtectedSites {
        match self.load_protected() {
            Ok((_, sites)) => sites,
            Err(e) => {
                warn!("Protected sites read failed: {}", e);
                ProtectedSites::new()
            }
        }
    }

    /// Count `count` blocked items for a host, URL or initiator.
    ///
    /// Excluded candidates and zero counts are no-ops. Unparseable input is
    /// counted under the `direct` domain. Returns true if the write landed.
    pub fn record_block(&self, domain_or_initiator: &str, category: &str, method: &str, count: u64) -> bool {
        if count == 0 {
            return false;
        }
        if self.exclusions.contains_in(domain_or_initiator) {
            debug!("Skipping excluded block source '{}'", domain_or_initiator);
            return false;
        }
        let domain = normalize_host(domain_or_initiator).unwrap_or_else(|| DIRECT_DOMAIN.to_string());
        self.merge_increment(&Increment {
            domain,
            category: category.to_string(),
            method: method.to_string(),
            count,
        })
    }

    /// Apply an already-filtered increment to all four counters in one
    /// persisted write. Returns true if the write landed.
    pub fn merge_increment(&self, inc: &Increment) -> bool {
        let _guard = self.lock_writes();
        match self.try_merge(inc) {
            Ok(event) => {
                trace!("Counted {} x {} ({} / {})", inc.count, inc.domain, inc.category, inc.method);
                self.notifier.notify(&event);
                true
            }
            Err(e) => {
                warn!("Stats update skipped: {}", e);
                false
            }
        }
    }

    /// Increment the protected-sites counter for a normalized host.
    pub fn record_visit(&self, host: &str) -> bool {
        let _guard = self.lock_writes();
        match self.try_visit(host) {
            Ok(event) => {
                trace!("Protected visit to {}", host);
                self.notifier.notify(&event);
                true
            }
            Err(e) => {
                warn!("Protected sites update skipped: {}", e);
                false
            }
        }
    }

    /// Zero the stats record and clear protected sites in one write.
    pub fn reset(&self) -> bool {
        let _guard = self.lock_writes();
        match self.try_reset() {
            Ok(event) => {
                debug!("Stats and protected sites reset");
                self.notifier.notify(&event);
                true
            }
            Err(e) => {
                warn!("Reset failed: {}", e);
                false
            }
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_stats(&self) -> Result<(Option<Value>, StatsRecord), StoreError> {
        let raw = self.backend.get(StorageKey::Stats)?;
        let record = match &raw {
            None => StatsRecord::empty((self.clock)()),
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
                warn!("Discarding malformed stats record: {}", e);
                StatsRecord::empty((self.clock)())
            }),
        };
        Ok((raw, record))
    }

    fn load_protected(&self) -> Result<(Option<Value>, ProtectedSites), StoreError> {
        let raw = self.backend.get(StorageKey::Protected)?;
        let sites = raw.as_ref().map(counts_from_value).unwrap_or_default();
        Ok((raw, sites))
    }

    fn try_merge(&self, inc: &Increment) -> Result<ChangeEvent, StoreError> {
        let (old, mut record) = self.load_stats()?;
        record.apply(inc);
        let new = serde_json::to_value(&record)?;
        self.backend.set(&[(StorageKey::Stats, new.clone())])?;
        Ok(ChangeEvent::new().with_change(StorageKey::Stats, old, new))
    }

    fn try_visit(&self, host: &str) -> Result<ChangeEvent, StoreError> {
        let (old, mut sites) = self.load_protected()?;
        bump(&mut sites, host, 1);
        let new = serde_json::to_value(&sites)?;
        self.backend.set(&[(StorageKey::Protected, new.clone())])?;
        Ok(ChangeEvent::new().with_change(StorageKey::Protected, old, new))
    }

    fn try_reset(&self) -> Result<ChangeEvent, StoreError> {
        let old_stats = self.backend.get(StorageKey::Stats)?;
        let old_protected = self.backend.get(StorageKey::Protected)?;
        let stats = serde_json::to_value(StatsRecord::empty((self.clock)()))?;
        let protected = Value::Object(serde_json::Map::new());
        self.backend.set(&[
            (StorageKey::Stats, stats.clone()),
            (StorageKey::Protected, protected.clone()),
        ])?;
        Ok(ChangeEvent::new()
            .with_change(StorageKey::Stats, old_stats, stats)
            .with_change(StorageKey::Protected, old_protected, protected))
    }
}

impl<B: StorageBackend> StatsSink for StatsStore<B> {
    fn submit_block(&self, inc: Increment) -> Completion {
        Completion::Ready(self.merge_increment(&inc))
    }

    fn submit_visit(&self, host: String) -> Completion {
        Completion::Ready(self.record_visit(&host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NOW: u64 = 1_700_000_000_000;

    fn fixed_clock() -> u64 {
        NOW
    }

    fn store() -> StatsStore<MemoryBackend> {
        StatsStore::new(MemoryBackend::new(), Arc::new(ExclusionSet::default())).with_clock(fixed_clock)
    }

    struct BrokenBackend;

    impl StorageBackend for BrokenBackend {
        fn get(&self, _key: StorageKey) -> Result<Option<Value>, StoreError> {
            Err(StoreError::Backend("storage unavailable".into()))
        }

        fn set(&self, _entries: &[(StorageKey, Value)]) -> Result<(), StoreError> {
            Err(StoreError::Backend("storage unavailable".into()))
        }
    }

    #[test]
    fn test_read_defaults_when_absent() {
        let store = store();
        let record = store.read();
        assert!(record.is_zeroed());
        assert_eq!(record.last_reset, NOW);
        assert!(store.read_protected().is_empty());
    }

    #[test]
    fn test_record_block_updates_all_counters() {
        let store = store();
        assert!(store.record_block("www.bar.com", "Native", "Element/CSS", 3));

        let record = store.read();
        assert_eq!(record.total_blocked, 3);
        assert_eq!(record.by_domain["bar.com"], 3);
        assert_eq!(record.by_category["Native"], 3);
        assert_eq!(record.by_method["Element/CSS"], 3);
    }

    #[test]
    fn test_total_grows_by_event_count() {
        let store = store();
        let mut expected = 0;
        for (i, host) in ["a.com", "b.com", "https://c.com/x", "a.com"].iter().enumerate() {
            let before = store.read().total_blocked;
            let count = i as u64 + 1;
            assert!(store.record_block(host, "Display", "Script", count));
            expected += count;
            assert_eq!(store.read().total_blocked, before + count);
        }
        let record = store.read();
        assert_eq!(record.total_blocked, expected);
        assert_eq!(record.by_domain["a.com"], 5);
        assert_eq!(record.by_domain["c.com"], 3);
    }

    #[test]
    fn test_excluded_block_is_noop() {
        let store = store();
        store.record_block("foo.com", "Display", "Script", 1);
        let before = store.backend().snapshot();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!store.record_block("www.youtube.com", "Display", "Script", 1));
        assert!(!store.record_block("https://chatgpt.com/c/1", "Native", "Element/CSS", 4));
        assert_eq!(store.backend().snapshot(), before);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_count_is_noop() {
        let store = store();
        assert!(!store.record_block("foo.com", "Display", "Script", 0));
        assert_eq!(store.backend().snapshot(), serde_json::json!({}));
    }

    #[test]
    fn test_unparseable_domain_counts_as_direct() {
        let store = store();
        assert!(store.record_block("   ", "Other", "Other", 1));
        assert_eq!(store.read().by_domain[DIRECT_DOMAIN], 1);
    }

    #[test]
    fn test_record_visit() {
        let store = store();
        assert!(store.record_visit("news.example.com"));
        assert!(store.record_visit("news.example.com"));
        assert!(store.record_visit("example.org"));
        let sites = store.read_protected();
        assert_eq!(sites["news.example.com"], 2);
        assert_eq!(sites["example.org"], 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let store = store();
        store.record_block("foo.com", "Display", "Script", 2);
        store.record_visit("foo.com");

        let rx = store.notifier().subscribe_channel();
        assert!(store.reset());

        let record = store.read();
        assert!(record.is_zeroed());
        assert_eq!(record.last_reset, NOW);
        assert!(store.read_protected().is_empty());

        let event = rx.recv().unwrap();
        assert!(event.touches(StorageKey::Stats));
        assert!(event.touches(StorageKey::Protected));
        let old = event.get(StorageKey::Stats).unwrap().old_value.clone().unwrap();
        assert_eq!(old["totalBlocked"], 2);
    }

    #[test]
    fn test_change_notification_carries_old_and_new() {
        let store = store();
        let rx = store.notifier().subscribe_channel();

        store.record_block("foo.com", "Display", "Script", 1);
        let first = rx.recv().unwrap();
        let change = first.get(StorageKey::Stats).unwrap();
        assert!(change.old_value.is_none());
        assert_eq!(change.new_value["totalBlocked"], 1);

        store.record_block("foo.com", "Display", "Script", 1);
        let second = rx.recv().unwrap();
        let change = second.get(StorageKey::Stats).unwrap();
        assert_eq!(change.old_value.as_ref().unwrap()["totalBlocked"], 1);
        assert_eq!(change.new_value["totalBlocked"], 2);
    }

    #[test]
    fn test_change_events_arrive_in_write_order() {
        use std::time::Duration;

        let store = Arc::new(store());
        let (stalled_tx, stalled_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);

        // The first subscriber stalls on the first write until released.
        store.subscribe(move |event| {
            let total = &event.get(StorageKey::Stats).unwrap().new_value["totalBlocked"];
            if total == 1 {
                let _ = stalled_tx.send(());
                let _ = release_rx.lock().unwrap().recv_timeout(Duration::from_secs(2));
            }
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |event| {
            let total = event.get(StorageKey::Stats).unwrap().new_value["totalBlocked"].as_u64();
            sink.lock().unwrap().push(total.unwrap());
        });

        let first = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.record_block("a.com", "Display", "Script", 1))
        };
        stalled_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.record_block("b.com", "Display", "Script", 1))
        };
        std::thread::sleep(Duration::from_millis(100));
        release_tx.send(()).unwrap();

        assert!(first.join().unwrap());
        assert!(second.join().unwrap());
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(store.read().total_blocked, 2);
    }

    #[test]
    fn test_backend_failures_degrade() {
        let store = StatsStore::new(BrokenBackend, Arc::new(ExclusionSet::default())).with_clock(fixed_clock);
        assert!(store.read().is_zeroed());
        assert!(store.read_protected().is_empty());
        assert!(!store.record_block("foo.com", "Display", "Script", 1));
        assert!(!store.record_visit("foo.com"));
        assert!(!store.reset());
    }

    #[test]
    fn test_malformed_record_self_heals() {
        let backend = MemoryBackend::from_snapshot(&serde_json::json!({"stats": "garbage", "protected": [1]}));
        let store = StatsStore::new(backend, Arc::new(ExclusionSet::default())).with_clock(fixed_clock);
        assert!(store.read().is_zeroed());
        assert!(store.read_protected().is_empty());

        assert!(store.record_block("foo.com", "Display", "Script", 1));
        assert_eq!(store.read().total_blocked, 1);
    }

    #[test]
    fn test_hydrates_javascript_record() {
        let snapshot = serde_json::json!({
            "stats": {"totalBlocked": 10, "byDomain": {"foo.com": 10}, "byType": {"Display": 10}, "byRule": {"Script": 10}, "lastReset": 5},
            "protected": {"foo.com": 4}
        });
        let store = StatsStore::new(MemoryBackend::from_snapshot(&snapshot), Arc::new(ExclusionSet::default()));
        store.record_block("foo.com", "Display", "Script", 1);
        let record = store.read();
        assert_eq!(record.total_blocked, 11);
        assert_eq!(record.last_reset, 5);
        assert_eq!(store.read_protected()["foo.com"], 4);
    }

    #[test]
    fn test_concurrent_disjoint_domains() {
        let store = Arc::new(store());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.record_block(&format!("site{}-{}.com", t, i % 5), "Display", "Script", 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let record = store.read();
        assert_eq!(record.by_domain.len(), 40);
        for t in 0..8 {
            for i in 0..5 {
                assert_eq!(record.by_domain[&format!("site{}-{}.com", t, i)], 5);
            }
        }
        assert_eq!(record.total_blocked, 200);
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_file_backend_survives_restart() {
        let dir = std::env::temp_dir().join(format!("eru-store-test-{}", std::process::id()));
        let path = dir.join("state.json");
        let _ = std::fs::remove_file(&path);

        {
            let store = StatsStore::new(FileBackend::new(&path), Arc::new(ExclusionSet::default()));
            assert!(store.record_block("https://www.foo.com", "Display", "Script", 2));
            assert!(store.record_visit("foo.com"));
        }

        let store = StatsStore::new(FileBackend::new(&path), Arc::new(ExclusionSet::default()));
        assert_eq!(store.read().by_domain["foo.com"], 2);
        assert_eq!(store.read_protected()["foo.com"], 1);

        let text = std::fs::read_to_string(&path).unwrap();
        let document: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(document["stats"]["byType"]["Display"], 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_file_backend_rejects_non_object() {
        let dir = std::env::temp_dir().join(format!("eru-store-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("state.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let backend = FileBackend::new(&path);
        assert!(matches!(backend.get(StorageKey::Stats), Err(StoreError::Malformed { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
