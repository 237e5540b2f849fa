//! In-memory collaborators shared by unit tests.
#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use chrono::{DateTime, TimeDelta, Utc};
use vtvguide_api::library::{
    CatalogItem, CatalogQuery, ItemKind, LocalCatalogApi, LocalIdentityApi, LocalMediaSourceApi,
    MediaSource, User,
};
use vtvguide_store::RecordStore;

use crate::clock::Clock;

/// Movie with the given runtime in minutes.
pub fn movie(id: &str, minutes: i64) -> CatalogItem {
    CatalogItem::new(id, format!("Movie {id}"), ItemKind::Movie)
        .with_runtime(TimeDelta::minutes(minutes))
}

/// Library double with call counters and switchable failures.
pub struct MockLibrary {
    items: Mutex<Vec<CatalogItem>>,
    extras: Mutex<HashMap<String, CatalogItem>>,
    failing_lookups: Mutex<HashSet<String>>,
    users: Vec<User>,
    sources: Vec<MediaSource>,
    queries: Mutex<Vec<CatalogQuery>>,
    find_calls: AtomicU32,
    get_calls: AtomicU32,
    fail_find: AtomicBool,
}

impl MockLibrary {
    /// Library whose only user is `user-1`.
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items: Mutex::new(items),
            extras: Mutex::new(HashMap::new()),
            failing_lookups: Mutex::new(HashSet::new()),
            users: vec![User {
                id: String::from("user-1"),
                name: String::from("Alice"),
            }],
            sources: Vec::new(),
            queries: Mutex::new(Vec::new()),
            find_calls: AtomicU32::new(0),
            get_calls: AtomicU32::new(0),
            fail_find: AtomicBool::new(false),
        }
    }

    /// Sets the sources returned for every playback lookup.
    pub fn with_sources(mut self, sources: Vec<MediaSource>) -> Self {
        self.sources = sources;
        self
    }

    /// Replaces the favorites list.
    pub fn set_items(&self, items: Vec<CatalogItem>) {
        *self.items.lock().unwrap() = items;
    }

    /// Adds an item only reachable by ID (series, albums).
    pub fn add_extra(&self, item: CatalogItem) {
        self.extras.lock().unwrap().insert(item.id.clone(), item);
    }

    /// Makes lookups of `item_id` fail.
    pub fn fail_lookup(&self, item_id: &str) {
        self.failing_lookups
            .lock()
            .unwrap()
            .insert(String::from(item_id));
    }

    /// Makes `find_items` fail.
    pub fn fail_find(&self, fail: bool) {
        self.fail_find.store(fail, Ordering::SeqCst);
    }

    pub fn find_calls(&self) -> u32 {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> u32 {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<CatalogQuery> {
        self.queries.lock().unwrap().clone()
    }
}

impl LocalCatalogApi for MockLibrary {
    async fn find_items(&self, query: &CatalogQuery) -> Result<Vec<CatalogItem>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        // Let concurrent callers interleave.
        tokio::task::yield_now().await;
        if self.fail_find.load(Ordering::SeqCst) {
            bail!("catalog unavailable");
        }
        Ok(self.items.lock().unwrap().clone())
    }

    async fn get_item(&self, item_id: &str) -> Result<Option<CatalogItem>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_lookups.lock().unwrap().contains(item_id) {
            bail!("lookup of {item_id} failed");
        }
        let found = self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.id == item_id)
            .cloned();
        Ok(found.or_else(|| self.extras.lock().unwrap().get(item_id).cloned()))
    }
}

impl LocalIdentityApi for MockLibrary {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == user_id).cloned())
    }
}

impl LocalMediaSourceApi for MockLibrary {
    async fn playback_sources(&self, item_id: &str) -> Result<Vec<MediaSource>> {
        Ok(self
            .sources
            .iter()
            .cloned()
            .map(|mut source| {
                source.id = format!("{}-{item_id}", source.id);
                source
            })
            .collect())
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap();
        *now = now.checked_add_signed(by).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Record store kept in memory with a write counter and failure switches.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    records: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    writes: Arc<AtomicU32>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Overwrites a raw record, bypassing counters.
    pub fn put_raw(&self, path: &Path, bytes: &[u8]) {
        self.records
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), bytes.to_vec());
    }
}

impl RecordStore for MemoryRecordStore {
    fn read_record(&self, path: &Path) -> io::Result<Vec<u8>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read denied"));
        }
        self.records
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn write_record(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "write denied"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.put_raw(path, bytes);
        Ok(())
    }

    fn delete_tree(&self, path: &Path) -> io::Result<()> {
        self.records
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(path));
        Ok(())
    }
}
