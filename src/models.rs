//! Dictionary, root and word records read from the lexical store

use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Value of the `type` column (e.g. "lisan", "moraqman")
    pub kind: Option<String>,
    pub indexing_pattern: Option<String>,
}

impl Dictionary {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            kind: None,
            indexing_pattern: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    pub id: i64,
    pub dictionary_id: i64,
    pub root: String,
    pub definition: String,
    /// Position of the root within its dictionary's source document.
    /// Negative means the root was never indexed.
    pub order_index: i64,
}

impl Root {
    pub fn is_indexed(&self) -> bool {
        self.order_index >= 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub root_id: i64,
    pub word: String,
    pub first_position: i64,
    pub all_positions: Vec<usize>,
}

/// Parse the JSON position list stored in `words.all_positions`.
///
/// NULL and empty strings read as an empty list; anything else must be a
/// JSON array of non-negative integers in ascending order.
pub fn parse_positions(raw: Option<&str>) -> Result<Vec<usize>, String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(Vec::new()),
        Some(r) => r,
    };

    let positions: Vec<usize> =
        serde_json::from_str(raw).map_err(|e| format!("invalid position list {:?}: {}", raw, e))?;

    if positions.windows(2).any(|w| w[0] >= w[1]) {
        return Err(format!("position list not ascending: {:?}", raw));
    }

    Ok(positions)
}

/// One entry of the active word list: a word together with the root and
/// dictionary that own it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedWord {
    pub word: Word,
    pub root: Arc<Root>,
    pub dictionary_name: Arc<str>,
}

impl IndexedWord {
    /// Whether both entries display the same definition.
    pub fn same_definition(&self, other: &IndexedWord) -> bool {
        self.root.id == other.root.id && self.root.dictionary_id == other.root.dictionary_id
    }
}

/// The full ordered word list as read from the store, plus the number of
/// rows dropped because their position data could not be parsed.
#[derive(Debug, Clone, Default)]
pub struct ActiveWordList {
    pub entries: Vec<IndexedWord>,
    pub skipped: usize,
}

/// Character offsets `[start, end)` of one occurrence inside a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
