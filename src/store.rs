//! Read-only access to the dictionary database
//!
//! The database is produced offline by the ingestion scripts; this module
//! only reads it. Every call opens its own read-only connection, so a
//! `SqliteStore` can be shared freely between threads.

use crate::models::{parse_positions, ActiveWordList, Dictionary, IndexedWord, Root, Word};
use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Source of dictionary, root and word records.
///
/// Implementations must be idempotent and free of side effects.
pub trait LexicalStore: Send + Sync {
    fn load_dictionaries(&self) -> Result<Vec<Dictionary>>;

    /// Indexed roots only (`order_index >= 0`), ordered by
    /// `(dictionary_id, order_index, id)`.
    fn load_indexed_roots(&self) -> Result<Vec<Root>>;

    /// Words of one root, ordered by `(first_position, id)`.
    fn load_words_for_root(&self, root_id: i64) -> Result<Vec<Word>>;

    /// Attach the words of `roots` (as returned by
    /// [`load_indexed_roots`](Self::load_indexed_roots)) to their root and
    /// dictionary, in active-word-list order. Each root is wrapped in one
    /// `Arc` shared by all of its entries.
    fn join_indexed_words(&self, dictionaries: &[Dictionary], roots: Vec<Root>) -> Result<ActiveWordList>;

    /// Every word of every indexed root in active-word-list order.
    fn load_all_indexed_words(&self) -> Result<ActiveWordList> {
        let dictionaries = self.load_dictionaries()?;
        let roots = self.load_indexed_roots()?;
        self.join_indexed_words(&dictionaries, roots)
    }

    fn get_definition(&self, dictionary_name: &str, root: &str) -> Result<Option<String>>;
}

/// Turn a raw `words` row into a `Word`, logging and dropping rows whose
/// position list is malformed.
fn word_from_parts(
    id: i64,
    root_id: i64,
    word: String,
    first_position: i64,
    all_positions: Option<String>,
) -> Option<Word> {
    match parse_positions(all_positions.as_deref()) {
        Ok(all_positions) => Some(Word {
            id,
            root_id,
            word,
            first_position,
            all_positions,
        }),
        Err(e) => {
            warn!(word_id = id, root_id, "skipping word row: {}", e);
            None
        }
    }
}

// ============ SQLite ============

const ROOT_COLUMNS: &str = "id, dictionary_id, root, definition, first_word_position";

fn row_to_root(row: &Row) -> rusqlite::Result<Root> {
    Ok(Root {
        id: row.get(0)?,
        dictionary_id: row.get(1)?,
        root: row.get(2)?,
        definition: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        order_index: row.get::<_, Option<i64>>(4)?.unwrap_or(-1),
    })
}

type WordRow = (i64, i64, String, i64, Option<String>);

fn row_to_word_parts(row: &Row) -> rusqlite::Result<WordRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Get a new read-only connection (each call creates a new connection)
    fn connection(&self) -> Result<Connection> {
        Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open dictionary db at {:?}", self.db_path))
    }

    /// Older databases only carry `id, name` for dictionaries.
    fn dictionary_columns(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('dictionaries')")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }
}

impl LexicalStore for SqliteStore {
    fn load_dictionaries(&self) -> Result<Vec<Dictionary>> {
        let conn = self.connection()?;
        let columns = Self::dictionary_columns(&conn)?;
        let has = |name: &str| columns.iter().any(|c| c == name);

        let select = |name: &str| {
            if has(name) {
                name.to_string()
            } else {
                "NULL".to_string()
            }
        };
        let sql = format!(
            "SELECT id, name, {}, {}, {} FROM dictionaries ORDER BY id",
            select("description"),
            select("type"),
            select("indexing_pattern"),
        );

        let mut stmt = conn.prepare(&sql)?;
        let dictionaries = stmt
            .query_map([], |row| {
                Ok(Dictionary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    kind: row.get(3)?,
                    indexing_pattern: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read dictionaries")?;

        Ok(dictionaries)
    }

    fn load_indexed_roots(&self) -> Result<Vec<Root>> {
        let conn = self.connection()?;
        let sql = format!(
            "SELECT {} FROM roots
             WHERE first_word_position >= 0
             ORDER BY dictionary_id, first_word_position, id",
            ROOT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let roots = stmt
            .query_map([], row_to_root)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read indexed roots")?;
        Ok(roots)
    }

    fn load_words_for_root(&self, root_id: i64) -> Result<Vec<Word>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, root_id, word, first_position, all_positions
             FROM words WHERE root_id = ?1
             ORDER BY first_position, id",
        )?;
        let words = stmt
            .query_map([root_id], row_to_word_parts)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("Failed to read words for root {}", root_id))?
            .into_iter()
            .filter_map(|(id, root_id, word, first, all)| word_from_parts(id, root_id, word, first, all))
            .collect();
        Ok(words)
    }

    fn join_indexed_words(&self, dictionaries: &[Dictionary], roots: Vec<Root>) -> Result<ActiveWordList> {
        let dictionaries: HashMap<i64, Arc<str>> = dictionaries
            .iter()
            .map(|d| (d.id, Arc::from(d.name.as_str())))
            .collect();
        let roots: HashMap<i64, Arc<Root>> = roots.into_iter().map(|r| (r.id, Arc::new(r))).collect();

        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT w.id, w.root_id, w.word, w.first_position, w.all_positions
             FROM words w
             JOIN roots r ON r.id = w.root_id
             WHERE r.first_word_position >= 0
             ORDER BY r.dictionary_id, r.first_word_position, r.id, w.first_position, w.id",
        )?;
        let rows = stmt
            .query_map([], row_to_word_parts)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read indexed words")?;

        let mut list = ActiveWordList {
            entries: Vec::with_capacity(rows.len()),
            skipped: 0,
        };

        for (id, root_id, word, first, all) in rows {
            let Some(word) = word_from_parts(id, root_id, word, first, all) else {
                list.skipped += 1;
                continue;
            };
            let Some(root) = roots.get(&root_id) else {
                continue;
            };
            let Some(dictionary_name) = dictionaries.get(&root.dictionary_id) else {
                debug!(root_id, dictionary_id = root.dictionary_id, "root has no dictionary row");
                continue;
            };
            list.entries.push(IndexedWord {
                word,
                root: Arc::clone(root),
                dictionary_name: Arc::clone(dictionary_name),
            });
        }

        Ok(list)
    }

    fn get_definition(&self, dictionary_name: &str, root: &str) -> Result<Option<String>> {
        let conn = self.connection()?;
        let definition = conn
            .query_row(
                "SELECT r.definition FROM roots r
                 JOIN dictionaries d ON d.id = r.dictionary_id
                 WHERE d.name = ?1 AND r.root = ?2
                 ORDER BY r.id LIMIT 1",
                rusqlite::params![dictionary_name, root],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .context("Failed to read definition")?;
        Ok(definition.flatten())
    }
}

// ============ In-memory ============

/// A store backed by plain vectors. Used for embedding hosts that already
/// hold the records in memory, and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    dictionaries: Vec<Dictionary>,
    roots: Vec<Root>,
    words: Vec<Word>,
}

impl MemoryStore {
    pub fn new(dictionaries: Vec<Dictionary>, roots: Vec<Root>, words: Vec<Word>) -> Self {
        Self {
            dictionaries,
            roots,
            words,
        }
    }
}

impl LexicalStore for MemoryStore {
    fn load_dictionaries(&self) -> Result<Vec<Dictionary>> {
        let mut dictionaries = self.dictionaries.clone();
        dictionaries.sort_by_key(|d| d.id);
        Ok(dictionaries)
    }

    fn load_indexed_roots(&self) -> Result<Vec<Root>> {
        let mut roots: Vec<Root> = self.roots.iter().filter(|r| r.is_indexed()).cloned().collect();
        roots.sort_by_key(|r| (r.dictionary_id, r.order_index, r.id));
        Ok(roots)
    }

    fn load_words_for_root(&self, root_id: i64) -> Result<Vec<Word>> {
        let mut words: Vec<Word> = self.words.iter().filter(|w| w.root_id == root_id).cloned().collect();
        words.sort_by_key(|w| (w.first_position, w.id));
        Ok(words)
    }

    fn join_indexed_words(&self, dictionaries: &[Dictionary], roots: Vec<Root>) -> Result<ActiveWordList> {
        let names: HashMap<i64, Arc<str>> = dictionaries
            .iter()
            .map(|d| (d.id, Arc::from(d.name.as_str())))
            .collect();

        let mut entries = Vec::new();
        for root in roots {
            let Some(name) = names.get(&root.dictionary_id) else {
                continue;
            };
            let root = Arc::new(root);
            for word in self.load_words_for_root(root.id)? {
                entries.push(IndexedWord {
                    word,
                    root: Arc::clone(&root),
                    dictionary_name: Arc::clone(name),
                });
            }
        }

        Ok(ActiveWordList { entries, skipped: 0 })
    }

    fn get_definition(&self, dictionary_name: &str, root: &str) -> Result<Option<String>> {
        let Some(dictionary) = self.dictionaries.iter().find(|d| d.name == dictionary_name) else {
            return Ok(None);
        };
        Ok(self
            .roots
            .iter()
            .filter(|r| r.dictionary_id == dictionary.id && r.root == root)
            .min_by_key(|r| r.id)
            .map(|r| r.definition.clone()))
    }
}
