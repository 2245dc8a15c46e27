//! Locating a target word inside a definition, with LRU memoization

use crate::models::Span;
use crate::variants::{generate_variants, Variant};
use lru::LruCache;
use regex_lite::Regex;
use std::borrow::Borrow;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// Default occurrence cache capacity (number of (definition, word) pairs)
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Zero or more Arabic diacritics, allowed after each prefix letter.
const OPTIONAL_DIACRITICS: &str = r"[\x{064B}-\x{065F}\x{0670}]*";

/// Build the pattern fragment for one variant: prefix letters tolerate
/// diacritics, the core is matched literally.
fn variant_fragment(variant: &Variant) -> String {
    let mut fragment = String::new();
    for c in variant.prefix.chars() {
        fragment.push_str(&regex_lite::escape(c.encode_utf8(&mut [0; 4])));
        fragment.push_str(OPTIONAL_DIACRITICS);
    }
    fragment.push_str(&regex_lite::escape(&variant.core));
    fragment
}

/// Compile the alternation of all variants of `word`, longest first.
pub fn build_pattern(word: &str) -> Result<Regex, regex_lite::Error> {
    let alternation = generate_variants(word)
        .iter()
        .map(variant_fragment)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation)
}

/// Convert byte offsets of matches into character offsets, walking the
/// text once.
fn byte_spans_to_char_spans(text: &str, byte_spans: impl Iterator<Item = (usize, usize)>) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut chars = text.char_indices().enumerate().peekable();
    let mut char_at = |byte: usize| -> usize {
        while let Some(&(ci, (bi, _))) = chars.peek() {
            if bi >= byte {
                return ci;
            }
            chars.next();
        }
        text.chars().count()
    };

    for (start, end) in byte_spans {
        let start = char_at(start);
        let end = char_at(end);
        spans.push(Span::new(start, end));
    }
    spans
}

/// Exact-string fallback used when the variant pattern cannot be built.
fn literal_occurrences(definition: &str, word: &str) -> Vec<Span> {
    let byte_spans = definition
        .match_indices(word)
        .map(|(start, m)| (start, start + m.len()));
    byte_spans_to_char_spans(definition, byte_spans)
}

/// Every occurrence of `word` (or one of its clitic-attached variants) in
/// `definition`, as ordered non-overlapping character spans.
pub fn get_occurrences(definition: &str, word: &str) -> Vec<Span> {
    if definition.is_empty() || word.is_empty() {
        return Vec::new();
    }

    match build_pattern(word) {
        Ok(pattern) => {
            let byte_spans = pattern.find_iter(definition).map(|m| (m.start(), m.end()));
            byte_spans_to_char_spans(definition, byte_spans)
        }
        Err(e) => {
            warn!(word, "variant pattern failed to compile, matching literally: {}", e);
            literal_occurrences(definition, word)
        }
    }
}

/// `(definition, word)` as borrowed strings. Owned and borrowed keys hash
/// and compare through this, so a cache hit allocates nothing.
trait KeyParts {
    fn parts(&self) -> (&str, &str);
}

impl KeyParts for (&str, &str) {
    fn parts(&self) -> (&str, &str) {
        (self.0, self.1)
    }
}

impl Hash for dyn KeyParts + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts().hash(state);
    }
}

impl PartialEq for dyn KeyParts + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.parts() == other.parts()
    }
}

impl Eq for dyn KeyParts + '_ {}

#[derive(Debug, Clone)]
struct OccurrenceKey {
    definition: Arc<str>,
    word: Arc<str>,
}

impl KeyParts for OccurrenceKey {
    fn parts(&self) -> (&str, &str) {
        (&*self.definition, &*self.word)
    }
}

impl<'a> Borrow<dyn KeyParts + 'a> for OccurrenceKey {
    fn borrow(&self) -> &(dyn KeyParts + 'a) {
        self
    }
}

impl Hash for OccurrenceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts().hash(state);
    }
}

impl PartialEq for OccurrenceKey {
    fn eq(&self, other: &Self) -> bool {
        self.parts() == other.parts()
    }
}

impl Eq for OccurrenceKey {}

/// Memoizing front for [`get_occurrences`].
///
/// Results are shared as `Arc<[Span]>`; repeated lookups for the same
/// `(definition, word)` pair hand back the same allocation.
pub struct OccurrenceMatcher {
    cache: Mutex<LruCache<OccurrenceKey, Arc<[Span]>>>,
}

impl OccurrenceMatcher {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<OccurrenceKey, Arc<[Span]>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn occurrences(&self, definition: &str, word: &str) -> Arc<[Span]> {
        let lookup = (definition, word);
        if let Some(spans) = self.lock().get(&lookup as &dyn KeyParts) {
            return Arc::clone(spans);
        }

        let spans: Arc<[Span]> = get_occurrences(definition, word).into();
        let key = OccurrenceKey {
            definition: Arc::from(definition),
            word: Arc::from(word),
        };
        self.lock().put(key, Arc::clone(&spans));
        spans
    }

    pub fn count(&self, definition: &str, word: &str) -> usize {
        self.occurrences(definition, word).len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// `(entries, capacity)`
    pub fn stats(&self) -> (usize, usize) {
        let cache = self.lock();
        (cache.len(), cache.cap().get())
    }
}

impl Default for OccurrenceMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
