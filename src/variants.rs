//! Clitic-attached surface forms of a target word
//!
//! Only a fixed table of one- and two-letter proclitics is recognised.
//! This is a surface heuristic, not a morphological analyser.

use serde::{Deserialize, Serialize};

/// Single-letter proclitics: prepositions and conjunctions that attach
/// directly to the following word.
pub const CLITICS: [char; 5] = ['ب', 'و', 'ك', 'ف', 'ل'];

/// Compound prefixes that replace a leading definite article.
const ARTICLE_REPLACEMENTS: [&str; 3] = ["لل", "وب", "وك"];

const DEFINITE_ARTICLE: &str = "ال";

/// Compound prefix that replaces a leading hamza/alef.
const HAMZA_REPLACEMENT: &str = "وس";

/// True for the Arabic short-vowel and related combining marks
/// (U+064B–U+065F and the superscript alef U+0670).
pub fn is_diacritic(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}')
}

/// Remove Arabic diacritics from text.
pub fn strip_diacritics(text: &str) -> String {
    text.chars().filter(|c| !is_diacritic(*c)).collect()
}

/// One searchable surface form, split into the attachable prefix (whose
/// diacritics are optional when matching) and the lexical core (which
/// must match exactly).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub prefix: String,
    pub core: String,
}

impl Variant {
    fn new(prefix: &str, core: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            core: core.to_string(),
        }
    }

    /// The variant as it would appear undiacritized in running text.
    pub fn surface(&self) -> String {
        format!("{}{}", self.prefix, self.core)
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.prefix.chars().count() + self.core.chars().count()
    }
}

/// Generate the surface forms to search for, longest first.
///
/// The ordering is load-bearing: when the forms are joined into one
/// alternation, a longer attached form must win over a shorter form that
/// matches at the same position.
pub fn generate_variants(word: &str) -> Vec<Variant> {
    if word.is_empty() {
        return Vec::new();
    }

    let mut variants = vec![Variant::new("", word)];

    for clitic in CLITICS {
        variants.push(Variant::new(clitic.encode_utf8(&mut [0; 4]), word));
    }

    if word.chars().count() > 2 {
        if let Some(rest) = word.strip_prefix(DEFINITE_ARTICLE) {
            for prefix in ARTICLE_REPLACEMENTS {
                variants.push(Variant::new(prefix, rest));
            }
        }
    }

    if word.chars().count() > 1 {
        if let Some(rest) = word.strip_prefix('أ').or_else(|| word.strip_prefix('ا')) {
            variants.push(Variant::new(HAMZA_REPLACEMENT, rest));
        }
    }

    // Stable: equal lengths keep generation order
    variants.sort_by(|a, b| b.char_len().cmp(&a.char_len()));

    let mut seen = std::collections::HashSet::new();
    variants.retain(|v| seen.insert(v.surface()));

    variants
}
