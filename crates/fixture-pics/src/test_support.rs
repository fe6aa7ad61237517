use std::collections::{BTreeMap, HashMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::{AvatarFetcher, FetchError, PictureStore, ProgressObserver, ProvisionOutcome};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn injected(what: &str, name: &str) -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, format!("injected {what} failure for {name}"))
}

/// In-memory picture store for testing. Failures can be injected per file.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    failing_removes: Mutex<HashSet<String>>,
    failing_writes: Mutex<HashSet<String>>,
    fail_list: AtomicBool,
    fail_ensure_dir: AtomicBool,
    dir_ensured: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given names, each holding placeholder bytes.
    pub fn with_files<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        {
            let mut files = lock(&store.files);
            for name in names {
                files.insert(name.into(), b"previous run".to_vec());
            }
        }
        store
    }

    /// Sorted file names currently stored.
    pub fn names(&self) -> Vec<String> {
        lock(&self.files).keys().cloned().collect()
    }

    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        lock(&self.files).get(name).cloned()
    }

    pub fn fail_remove(&self, name: &str) {
        lock(&self.failing_removes).insert(name.to_owned());
    }

    pub fn fail_write(&self, name: &str) {
        lock(&self.failing_writes).insert(name.to_owned());
    }

    pub fn fail_list(&self) {
        self.fail_list.store(true, Ordering::SeqCst);
    }

    pub fn fail_ensure_dir(&self) {
        self.fail_ensure_dir.store(true, Ordering::SeqCst);
    }

    pub fn dir_ensured(&self) -> bool {
        self.dir_ensured.load(Ordering::SeqCst)
    }
}

impl PictureStore for MemoryStore {
    fn location(&self) -> String {
        "memory".to_owned()
    }

    fn ensure_dir(&self) -> io::Result<()> {
        if self.fail_ensure_dir.load(Ordering::SeqCst) {
            return Err(injected("mkdir", "memory"));
        }
        self.dir_ensured.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn list(&self) -> io::Result<Vec<OsString>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(injected("list", "memory"));
        }
        Ok(self.names().into_iter().map(OsString::from).collect())
    }

    fn remove(&self, name: &OsStr) -> io::Result<()> {
        let name = name.to_string_lossy();
        let name = name.as_ref();
        if lock(&self.failing_removes).contains(name) {
            return Err(injected("remove", name));
        }
        lock(&self.files)
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_owned()))
    }

    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        if lock(&self.failing_writes).contains(name) {
            return Err(injected("write", name));
        }
        lock(&self.files).insert(name.to_owned(), bytes.to_vec());
        Ok(())
    }
}

/// Bytes `ScriptedFetcher` returns for a successful index.
pub fn avatar_bytes(index: u32) -> Vec<u8> {
    format!("avatar-{index}").into_bytes()
}

/// Avatar fetcher with a scripted set of failures. Every other index
/// succeeds with `avatar_bytes(index)`.
#[derive(Default)]
pub struct ScriptedFetcher {
    failures: HashMap<u32, FetchError>,
    flaky: Mutex<HashMap<u32, (u32, FetchError)>>,
    calls: Mutex<Vec<u32>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `index` always fails with `error`.
    pub fn failing(mut self, index: u32, error: FetchError) -> Self {
        self.failures.insert(index, error);
        self
    }

    /// Index `index` fails `times` times with `error`, then succeeds.
    pub fn flaky(self, index: u32, times: u32, error: FetchError) -> Self {
        lock(&self.flaky).insert(index, (times, error));
        self
    }

    /// Every index fetched so far, in call order (retries included).
    pub fn calls(&self) -> Vec<u32> {
        lock(&self.calls).clone()
    }
}

#[async_trait::async_trait]
impl AvatarFetcher for ScriptedFetcher {
    fn label(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, index: u32) -> Result<Vec<u8>, FetchError> {
        lock(&self.calls).push(index);

        if let Some(error) = self.failures.get(&index) {
            return Err(error.clone());
        }

        let mut flaky = lock(&self.flaky);
        if let Some((remaining, error)) = flaky.get_mut(&index)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(error.clone());
        }

        Ok(avatar_bytes(index))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started(u32),
    Advanced { index: u32, succeeded: bool },
    Completed { downloaded: u32, failed: usize },
}

/// Observer that records every event it receives.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        lock(&self.events).clone()
    }

    pub fn advanced_count(&self) -> usize {
        lock(&self.events)
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Advanced { .. }))
            .count()
    }
}

impl ProgressObserver for RecordingProgress {
    fn started(&self, total: u32) {
        lock(&self.events).push(ProgressEvent::Started(total));
    }

    fn advanced(&self, index: u32, succeeded: bool) {
        lock(&self.events).push(ProgressEvent::Advanced { index, succeeded });
    }

    fn completed(&self, outcome: &ProvisionOutcome) {
        lock(&self.events).push(ProgressEvent::Completed {
            downloaded: outcome.downloaded,
            failed: outcome.failures.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_fetcher_fails_only_scripted_indices() {
        let fetcher = ScriptedFetcher::new().failing(2, FetchError::Timeout);

        assert_eq!(fetcher.fetch(1).await.unwrap(), avatar_bytes(1));
        assert_eq!(fetcher.fetch(2).await, Err(FetchError::Timeout));
        assert_eq!(fetcher.calls(), vec![1, 2]);
    }

    #[tokio::test]
    async fn flaky_index_recovers() {
        let fetcher = ScriptedFetcher::new().flaky(1, 1, FetchError::Network("reset".into()));

        assert!(fetcher.fetch(1).await.is_err());
        assert_eq!(fetcher.fetch(1).await.unwrap(), avatar_bytes(1));
    }

    #[test]
    fn memory_store_write_and_remove() {
        let store = MemoryStore::new();
        store.write("1.jfif", b"abc").unwrap();
        assert_eq!(store.contents("1.jfif").as_deref(), Some(&b"abc"[..]));
        store.remove(OsStr::new("1.jfif")).unwrap();
        assert!(store.names().is_empty());
        assert!(store.remove(OsStr::new("1.jfif")).is_err());
    }
}
