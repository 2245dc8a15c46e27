//! M3ajem - indexed lexical search and highlight engine
//!
//! Locates a word and its clitic-attached forms inside classical Arabic
//! dictionary definitions, and drives word / instance / occurrence
//! navigation over the pre-built word index.

// Records must be defined first as they're used by everything else
pub mod models;
pub mod error;
pub mod config;
pub mod store;
pub mod loader;
pub mod variants;
pub mod matcher;
pub mod cursor;
pub mod session;
pub mod scroll;
pub mod highlight;
pub mod state;

pub use error::IndexError;
pub use config::{get_data_dir, EngineConfig};
pub use models::{ActiveWordList, Dictionary, IndexedWord, Root, Span, Word};
pub use store::{LexicalStore, MemoryStore, SqliteStore};
pub use loader::{IndexLoader, IndexSnapshot, IndexStats, LoadState};
pub use variants::{generate_variants, strip_diacritics, Variant};
pub use matcher::{get_occurrences, OccurrenceMatcher};
pub use cursor::{transition, Cursor, CursorState, NavContext, NavEvent};
pub use session::{NavOutcome, NavRequest, NavigationSession};
pub use scroll::{resolve_scroll_target, ScrollConfig, ScrollDecision};
pub use highlight::{segment_definition, Segment, SegmentKind};
pub use state::AppState;
