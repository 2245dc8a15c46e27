//! Application state management

use crate::config::EngineConfig;
use crate::error::IndexError;
use crate::loader::{IndexLoader, IndexSnapshot, LoadState};
use crate::matcher::OccurrenceMatcher;
use crate::models::Span;
use crate::scroll::ScrollDecision;
use crate::session::NavigationSession;
use crate::store::{LexicalStore, SqliteStore};
use std::sync::Arc;

/// Application state holding the store, the index loader and the shared
/// occurrence cache
pub struct AppState {
    pub config: EngineConfig,
    pub loader: Arc<IndexLoader>,
    pub matcher: Arc<OccurrenceMatcher>,
}

impl AppState {
    /// State over the SQLite database named in `config`. Nothing is read
    /// until [`load`](Self::load) is called.
    pub fn new(config: EngineConfig) -> Self {
        let store = Arc::new(SqliteStore::new(config.db_path.clone()));
        Self::with_store(config, store)
    }

    pub fn with_store(config: EngineConfig, store: Arc<dyn LexicalStore>) -> Self {
        let matcher = Arc::new(OccurrenceMatcher::new(config.occurrence_cache_capacity));
        Self {
            config,
            loader: Arc::new(IndexLoader::new(store)),
            matcher,
        }
    }

    pub async fn load(&self) -> Result<Arc<IndexSnapshot>, IndexError> {
        self.loader.load().await
    }

    pub fn load_state(&self) -> LoadState {
        self.loader.state()
    }

    pub fn is_ready(&self) -> bool {
        self.loader.is_ready()
    }

    /// The loaded index, or `NotReady` while loading has not succeeded.
    pub fn snapshot(&self) -> Result<Arc<IndexSnapshot>, IndexError> {
        self.loader.snapshot().ok_or_else(|| {
            let reason = match self.loader.state() {
                LoadState::Failed(message) => message,
                LoadState::Loading => "index is still loading".to_string(),
                LoadState::Idle | LoadState::Ready => "index has not been loaded".to_string(),
            };
            IndexError::NotReady(reason)
        })
    }

    /// A fresh cursor session sharing this state's index and cache
    pub fn session(&self) -> NavigationSession {
        NavigationSession::new(Arc::clone(&self.loader), Arc::clone(&self.matcher))
    }

    pub fn get_occurrences(&self, definition: &str, word: &str) -> Arc<[Span]> {
        self.matcher.occurrences(definition, word)
    }

    /// Definition text for a root; missing roots read as empty.
    pub fn definition(&self, dictionary_name: &str, root: &str) -> Result<String, IndexError> {
        Ok(self
            .loader
            .store()
            .get_definition(dictionary_name, root)?
            .unwrap_or_default())
    }

    /// Occurrences of `word` in the named root's definition.
    pub fn occurrences_in(&self, dictionary_name: &str, root: &str, word: &str) -> Result<Arc<[Span]>, IndexError> {
        let definition = self.definition(dictionary_name, root)?;
        Ok(self.matcher.occurrences(&definition, word))
    }

    pub fn resolve_scroll(&self, y: f64, scroll_y: f64, viewport_h: f64) -> ScrollDecision {
        self.config.scroll.resolve(y, scroll_y, viewport_h)
    }
}
