//! One-shot bulk load of the indexed word list
//!
//! The loader reads the store once per session and hands out the result as
//! a shared, immutable [`IndexSnapshot`]. Until the read succeeds the
//! loader reports "not ready" and navigation treats the index as empty.

use crate::error::IndexError;
use crate::models::{ActiveWordList, Dictionary, IndexedWord};
use crate::store::LexicalStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "message")]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub dictionaries: usize,
    pub indexed_roots: usize,
    pub words: usize,
    /// Word rows dropped because their position data was malformed
    pub skipped_words: usize,
    pub loaded_at: DateTime<Utc>,
}

/// The loaded index: the active word list in its canonical order plus
/// lookup tables derived from it.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    dictionaries: Vec<Dictionary>,
    words: Vec<IndexedWord>,
    /// surface word -> positions in `words`, ascending
    instances: HashMap<String, Vec<usize>>,
    stats: IndexStats,
}

impl IndexSnapshot {
    /// `indexed_roots` is the number of indexed roots the list was joined
    /// from; roots without words still count.
    pub fn new(dictionaries: Vec<Dictionary>, indexed_roots: usize, list: ActiveWordList) -> Self {
        let mut instances: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, entry) in list.entries.iter().enumerate() {
            instances.entry(entry.word.word.clone()).or_default().push(i);
        }

        let stats = IndexStats {
            dictionaries: dictionaries.len(),
            indexed_roots,
            words: list.entries.len(),
            skipped_words: list.skipped,
            loaded_at: Utc::now(),
        };

        Self {
            dictionaries,
            words: list.entries,
            instances,
            stats,
        }
    }

    /// Build a snapshot straight from an ordered entry list.
    pub fn from_entries(entries: Vec<IndexedWord>) -> Self {
        let roots: HashSet<i64> = entries.iter().map(|e| e.root.id).collect();
        Self::new(Vec::new(), roots.len(), ActiveWordList { entries, skipped: 0 })
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, ActiveWordList::default())
    }

    pub fn words(&self) -> &[IndexedWord] {
        &self.words
    }

    pub fn get(&self, index: usize) -> Option<&IndexedWord> {
        self.words.get(index)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Positions in the word list of every entry with this surface word,
    /// in list order.
    pub fn instances_of(&self, word: &str) -> &[usize] {
        self.instances.get(word).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Position of the entry for `word` under `root_id`.
    pub fn find(&self, word: &str, root_id: i64) -> Option<usize> {
        self.instances_of(word)
            .iter()
            .copied()
            .find(|&i| self.words[i].root.id == root_id)
    }

    pub fn dictionaries(&self) -> &[Dictionary] {
        &self.dictionaries
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }
}

struct LoaderInner {
    state: LoadState,
    snapshot: Option<Arc<IndexSnapshot>>,
}

pub struct IndexLoader {
    store: Arc<dyn LexicalStore>,
    inner: RwLock<LoaderInner>,
    /// Held for the whole store read so concurrent loads run it once
    load_gate: Mutex<()>,
}

impl IndexLoader {
    pub fn new(store: Arc<dyn LexicalStore>) -> Self {
        Self {
            store,
            inner: RwLock::new(LoaderInner {
                state: LoadState::Idle,
                snapshot: None,
            }),
            load_gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn LexicalStore> {
        &self.store
    }

    pub fn state(&self) -> LoadState {
        self.read().state.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.read().state == LoadState::Ready
    }

    /// The loaded index, or `None` until a load has succeeded.
    pub fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.read().snapshot.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, LoaderInner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, LoaderInner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_store(&self) -> anyhow::Result<IndexSnapshot> {
        let dictionaries = self.store.load_dictionaries()?;
        let roots = self.store.load_indexed_roots()?;
        let indexed_roots = roots.len();
        let list = self.store.join_indexed_words(&dictionaries, roots)?;
        Ok(IndexSnapshot::new(dictionaries, indexed_roots, list))
    }

    /// Read the store synchronously. A loader that is already ready returns
    /// its cached snapshot without touching the store again; a caller that
    /// arrives while another load is running waits for it and shares its
    /// result.
    pub fn load_blocking(&self) -> Result<Arc<IndexSnapshot>, IndexError> {
        let _gate = self.load_gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        {
            let mut inner = self.write();
            if let (LoadState::Ready, Some(snapshot)) = (&inner.state, &inner.snapshot) {
                return Ok(Arc::clone(snapshot));
            }
            inner.state = LoadState::Loading;
        }

        match self.read_store() {
            Ok(snapshot) => {
                let stats = snapshot.stats();
                info!(
                    dictionaries = stats.dictionaries,
                    indexed_roots = stats.indexed_roots,
                    words = stats.words,
                    skipped_words = stats.skipped_words,
                    "Index loaded"
                );
                let snapshot = Arc::new(snapshot);
                let mut inner = self.write();
                inner.state = LoadState::Ready;
                inner.snapshot = Some(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(e) => {
                let message = format!("{:#}", e);
                warn!("Index load failed: {}", message);
                self.write().state = LoadState::Failed(message.clone());
                Err(IndexError::Database(message))
            }
        }
    }

    /// Read the store on the blocking thread pool.
    pub async fn load(self: &Arc<Self>) -> Result<Arc<IndexSnapshot>, IndexError> {
        let loader = Arc::clone(self);
        tokio::task::spawn_blocking(move || loader.load_blocking())
            .await
            .map_err(|e| IndexError::Other(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dictionary, Root, Word};
    use crate::store::tests::fixture_db;
    use crate::store::{MemoryStore, SqliteStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts bulk reads and can be told to fail or to stall.
    struct CountingStore {
        inner: MemoryStore,
        reads: AtomicUsize,
        root_reads: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl LexicalStore for CountingStore {
        fn load_dictionaries(&self) -> anyhow::Result<Vec<Dictionary>> {
            self.inner.load_dictionaries()
        }
        fn load_indexed_roots(&self) -> anyhow::Result<Vec<Root>> {
            self.root_reads.fetch_add(1, Ordering::SeqCst);
            self.inner.load_indexed_roots()
        }
        fn load_words_for_root(&self, root_id: i64) -> anyhow::Result<Vec<Word>> {
            self.inner.load_words_for_root(root_id)
        }
        fn join_indexed_words(&self, dictionaries: &[Dictionary], roots: Vec<Root>) -> anyhow::Result<ActiveWordList> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            if self.fail {
                anyhow::bail!("disk I/O error");
            }
            self.inner.join_indexed_words(dictionaries, roots)
        }
        fn get_definition(&self, dictionary_name: &str, root: &str) -> anyhow::Result<Option<String>> {
            self.inner.get_definition(dictionary_name, root)
        }
    }

    fn counting_store(fail: bool) -> Arc<CountingStore> {
        let dictionaries = vec![Dictionary::new(1, "العين")];
        let roots = vec![Root {
            id: 1,
            dictionary_id: 1,
            root: "علم".into(),
            definition: "علم وعلم".into(),
            order_index: 0,
        }];
        let words = vec![Word {
            id: 1,
            root_id: 1,
            word: "علم".into(),
            first_position: 0,
            all_positions: vec![0, 4],
        }];
        Arc::new(CountingStore {
            inner: MemoryStore::new(dictionaries, roots, words),
            reads: AtomicUsize::new(0),
            root_reads: AtomicUsize::new(0),
            fail,
            delay: Duration::ZERO,
        })
    }

    #[test]
    fn test_not_ready_before_load() {
        let loader = IndexLoader::new(counting_store(false));
        assert_eq!(loader.state(), LoadState::Idle);
        assert!(!loader.is_ready());
        assert!(loader.snapshot().is_none());
    }

    #[test]
    fn test_loads_once() {
        let store = counting_store(false);
        let loader = IndexLoader::new(store.clone());

        let first = loader.load_blocking().unwrap();
        let second = loader.load_blocking().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
        assert_eq!(store.root_reads.load(Ordering::SeqCst), 1);
        assert_eq!(first.stats().indexed_roots, 1);
        assert!(loader.is_ready());
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_concurrent_loads_share_one_read() {
        let mut store = counting_store(false);
        Arc::get_mut(&mut store).unwrap().delay = Duration::from_millis(100);
        let loader = IndexLoader::new(store.clone());

        let (a, b) = std::thread::scope(|scope| {
            let a = scope.spawn(|| loader.load_blocking().unwrap());
            let b = scope.spawn(|| loader.load_blocking().unwrap());
            (a.join().unwrap(), b.join().unwrap())
        });

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
        assert_eq!(loader.state(), LoadState::Ready);
    }

    #[test]
    fn test_load_after_failure_retries() {
        let mut store = counting_store(true);
        let loader = IndexLoader::new(store.clone());
        assert!(loader.load_blocking().is_err());
        drop(loader);

        Arc::get_mut(&mut store).unwrap().fail = false;
        let loader = IndexLoader::new(store.clone());
        assert!(loader.load_blocking().is_ok());
        assert_eq!(store.reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failure_keeps_not_ready() {
        let loader = IndexLoader::new(counting_store(true));
        let err = loader.load_blocking().unwrap_err();
        assert!(err.to_string().contains("disk I/O error"));
        assert!(!loader.is_ready());
        assert!(matches!(loader.state(), LoadState::Failed(ref m) if m.contains("disk I/O error")));
        assert!(loader.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_async_load_from_sqlite() {
        let (_dir, path) = fixture_db(true);
        let loader = Arc::new(IndexLoader::new(Arc::new(SqliteStore::new(path))));
        let snapshot = loader.load().await.unwrap();

        let stats = snapshot.stats();
        assert_eq!(stats.dictionaries, 2);
        assert_eq!(stats.indexed_roots, 3);
        assert_eq!(stats.words, 5);
        assert_eq!(stats.skipped_words, 1);

        // "علم" is indexed under two dictionaries
        assert_eq!(snapshot.instances_of("علم"), &[2, 4]);
        assert_eq!(snapshot.find("علم", 20), Some(4));
        assert_eq!(snapshot.find("علم", 11), None);
        assert!(snapshot.instances_of("جهل").is_empty());
    }

    #[test]
    fn test_load_state_serialization() {
        let json = serde_json::to_string(&LoadState::Failed("boom".into())).unwrap();
        assert_eq!(json, r#"{"state":"failed","message":"boom"}"#);
        let json = serde_json::to_string(&LoadState::Ready).unwrap();
        assert_eq!(json, r#"{"state":"ready"}"#);
    }
}
