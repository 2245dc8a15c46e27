//! Three-level navigation over the indexed word list
//!
//! Level 1 walks the active word list entry by entry. Level 2 walks the
//! instances of the current surface word (the same word under other roots
//! or dictionaries). Level 3 walks the occurrences of the word inside the
//! current instance's definition.
//!
//! The cursor is a plain value. [`transition`] maps a state and an event to
//! the next state given a [`NavContext`]; it never fails, and every
//! boundary is a no-op.

use crate::loader::IndexSnapshot;
use crate::matcher::OccurrenceMatcher;
use crate::models::{IndexedWord, Root, Span};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorState {
    pub word_index: usize,
    pub instance_index: usize,
    pub occurrence_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "index")]
pub enum NavEvent {
    NextWord,
    PrevWord,
    NextInstance,
    PrevInstance,
    NextOccurrence,
    PrevOccurrence,
    /// Jump to an entry of the active word list
    SelectWord(usize),
}

/// Everything a transition needs to read: the loaded index and the
/// occurrence matcher.
#[derive(Clone, Copy)]
pub struct NavContext<'a> {
    index: &'a IndexSnapshot,
    matcher: &'a OccurrenceMatcher,
}

impl<'a> NavContext<'a> {
    pub fn new(index: &'a IndexSnapshot, matcher: &'a OccurrenceMatcher) -> Self {
        Self { index, matcher }
    }

    pub fn index(&self) -> &'a IndexSnapshot {
        self.index
    }

    pub fn word(&self, state: &CursorState) -> Option<&'a IndexedWord> {
        self.index.get(state.word_index)
    }

    /// Word-list positions of every instance of the current word.
    pub fn instances(&self, state: &CursorState) -> &'a [usize] {
        match self.word(state) {
            Some(entry) => self.index.instances_of(&entry.word.word),
            None => &[],
        }
    }

    /// The entry whose definition is on display.
    pub fn instance(&self, state: &CursorState) -> Option<&'a IndexedWord> {
        let position = *self.instances(state).get(state.instance_index)?;
        self.index.get(position)
    }

    /// Occurrences of the current word in the current instance's definition.
    pub fn occurrences(&self, state: &CursorState) -> Arc<[Span]> {
        match (self.word(state), self.instance(state)) {
            (Some(word), Some(instance)) => self
                .matcher
                .occurrences(&instance.root.definition, &word.word.word),
            _ => Arc::from(Vec::new()),
        }
    }

    fn occurrence_count(&self, state: &CursorState) -> usize {
        self.occurrences(state).len()
    }
}

fn last_index(count: usize) -> usize {
    count.saturating_sub(1)
}

/// Cursor positioned on list entry `word_index`, showing the instance that
/// belongs to that entry.
fn at_entry(ctx: &NavContext<'_>, word_index: usize) -> CursorState {
    let mut state = CursorState {
        word_index,
        instance_index: 0,
        occurrence_index: 0,
    };
    state.instance_index = ctx
        .instances(&state)
        .iter()
        .position(|&i| i == word_index)
        .unwrap_or(0);
    state
}

fn move_word(state: CursorState, ctx: &NavContext<'_>, target: usize) -> CursorState {
    let Some(new) = ctx.index.get(target) else {
        return state;
    };
    // The definition on screen belongs to the current instance, which may
    // be another root than the current word's own entry
    let Some(shown) = ctx.instance(&state).or_else(|| ctx.word(&state)) else {
        return state;
    };

    if new.same_definition(shown) {
        // Same definition stays on screen: keep the occurrence position
        let mut next = at_entry(ctx, target);
        next.occurrence_index = state.occurrence_index.min(last_index(ctx.occurrence_count(&next)));
        next
    } else {
        CursorState {
            word_index: target,
            instance_index: 0,
            occurrence_index: 0,
        }
    }
}

/// Apply one navigation event.
pub fn transition(state: CursorState, ctx: &NavContext<'_>, event: NavEvent) -> CursorState {
    if ctx.index.is_empty() {
        return state;
    }

    match event {
        NavEvent::NextWord => {
            if state.word_index + 1 >= ctx.index.len() {
                return state;
            }
            move_word(state, ctx, state.word_index + 1)
        }
        NavEvent::PrevWord => {
            if state.word_index == 0 {
                return state;
            }
            move_word(state, ctx, state.word_index - 1)
        }
        NavEvent::NextInstance => {
            if state.instance_index + 1 >= ctx.instances(&state).len() {
                return state;
            }
            CursorState {
                instance_index: state.instance_index + 1,
                occurrence_index: 0,
                ..state
            }
        }
        NavEvent::PrevInstance => {
            if state.instance_index == 0 {
                return state;
            }
            CursorState {
                instance_index: state.instance_index - 1,
                occurrence_index: 0,
                ..state
            }
        }
        NavEvent::NextOccurrence => {
            if state.occurrence_index + 1 < ctx.occurrence_count(&state) {
                CursorState {
                    occurrence_index: state.occurrence_index + 1,
                    ..state
                }
            } else if state.instance_index + 1 < ctx.instances(&state).len() {
                CursorState {
                    instance_index: state.instance_index + 1,
                    occurrence_index: 0,
                    ..state
                }
            } else {
                state
            }
        }
        NavEvent::PrevOccurrence => {
            if state.occurrence_index > 0 {
                let count = ctx.occurrence_count(&state);
                CursorState {
                    occurrence_index: (state.occurrence_index - 1).min(last_index(count)),
                    ..state
                }
            } else if state.instance_index > 0 {
                let mut previous = CursorState {
                    instance_index: state.instance_index - 1,
                    occurrence_index: 0,
                    ..state
                };
                // Occurrences of the previous instance decide where we land
                previous.occurrence_index = last_index(ctx.occurrence_count(&previous));
                previous
            } else {
                state
            }
        }
        NavEvent::SelectWord(index) => {
            if index >= ctx.index.len() {
                return state;
            }
            at_entry(ctx, index)
        }
    }
}

/// A cursor bound to its context, exposing the navigation API as methods.
pub struct Cursor<'a> {
    ctx: NavContext<'a>,
    state: CursorState,
}

impl<'a> Cursor<'a> {
    pub fn new(ctx: NavContext<'a>) -> Self {
        Self::with_state(ctx, CursorState::default())
    }

    pub fn with_state(ctx: NavContext<'a>, state: CursorState) -> Self {
        Self { ctx, state }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn apply(&mut self, event: NavEvent) -> CursorState {
        self.state = transition(self.state, &self.ctx, event);
        self.state
    }

    pub fn next_word(&mut self) -> CursorState {
        self.apply(NavEvent::NextWord)
    }

    pub fn prev_word(&mut self) -> CursorState {
        self.apply(NavEvent::PrevWord)
    }

    pub fn next_instance(&mut self) -> CursorState {
        self.apply(NavEvent::NextInstance)
    }

    pub fn prev_instance(&mut self) -> CursorState {
        self.apply(NavEvent::PrevInstance)
    }

    pub fn next_occurrence(&mut self) -> CursorState {
        self.apply(NavEvent::NextOccurrence)
    }

    pub fn prev_occurrence(&mut self) -> CursorState {
        self.apply(NavEvent::PrevOccurrence)
    }

    pub fn select_word(&mut self, index: usize) -> CursorState {
        self.apply(NavEvent::SelectWord(index))
    }

    pub fn current_word(&self) -> Option<&'a str> {
        self.ctx.word(&self.state).map(|e| e.word.word.as_str())
    }

    pub fn current_root(&self) -> Option<&'a Root> {
        self.ctx.instance(&self.state).map(|e| e.root.as_ref())
    }

    pub fn current_dictionary(&self) -> Option<&'a str> {
        self.ctx.instance(&self.state).map(|e| &*e.dictionary_name)
    }

    pub fn current_instance_index(&self) -> usize {
        self.state.instance_index
    }

    pub fn total_instances(&self) -> usize {
        self.ctx.instances(&self.state).len()
    }

    pub fn current_occurrence_index(&self) -> usize {
        self.state.occurrence_index
    }

    pub fn total_occurrences(&self) -> usize {
        self.ctx.occurrence_count(&self.state)
    }

    pub fn occurrences(&self) -> Arc<[Span]> {
        self.ctx.occurrences(&self.state)
    }

    /// Span of the active occurrence, if the definition contains any.
    pub fn current_span(&self) -> Option<Span> {
        self.occurrences().get(self.state.occurrence_index).copied()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Word;

    fn root(id: i64, dictionary_id: i64, definition: &str) -> Arc<Root> {
        Arc::new(Root {
            id,
            dictionary_id,
            root: format!("r{}", id),
            definition: definition.to_string(),
            order_index: 0,
        })
    }

    fn entry(id: i64, word: &str, root: &Arc<Root>, dictionary: &str) -> IndexedWord {
        IndexedWord {
            word: Word {
                id,
                root_id: root.id,
                word: word.to_string(),
                first_position: 0,
                all_positions: Vec::new(),
            },
            root: Arc::clone(root),
            dictionary_name: Arc::from(dictionary),
        }
    }

    /// Two dictionaries; "علم" is indexed under both.
    ///
    /// 0: علم  (root 1, لسان)  3 occurrences
    /// 1: جهل  (root 1, لسان)  1 occurrence
    /// 2: كتب  (root 2, لسان)  0 occurrences of itself
    /// 3: علم  (root 3, العين) 2 occurrences
    pub(crate) fn sample_index() -> IndexSnapshot {
        let r1 = root(1, 1, "علم الشيء وعلم ضد جهل فعلم");
        let r2 = root(2, 1, "خط");
        let r3 = root(3, 2, "علم وبعلم");
        IndexSnapshot::from_entries(vec![
            entry(1, "علم", &r1, "لسان العرب"),
            entry(2, "جهل", &r1, "لسان العرب"),
            entry(3, "كتب", &r2, "لسان العرب"),
            entry(4, "علم", &r3, "العين"),
        ])
    }

    fn state(word_index: usize, instance_index: usize, occurrence_index: usize) -> CursorState {
        CursorState {
            word_index,
            instance_index,
            occurrence_index,
        }
    }

    #[test]
    fn test_derived_values() {
        let index = sample_index();
        let matcher = OccurrenceMatcher::default();
        let cursor = Cursor::new(NavContext::new(&index, &matcher));

        assert_eq!(cursor.current_word(), Some("علم"));
        assert_eq!(cursor.current_dictionary(), Some("لسان العرب"));
        assert_eq!(cursor.current_root().map(|r| r.id), Some(1));
        assert_eq!(cursor.total_instances(), 2);
        assert_eq!(cursor.total_occurrences(), 3);
        assert_eq!(cursor.current_span(), Some(Span::new(0, 3)));
    }

    #[test]
    fn test_next_occurrence_then_next_instance() {
        let index = sample_index();
        let matcher = OccurrenceMatcher::default();
        let mut cursor = Cursor::new(NavContext::new(&index, &matcher));

        assert_eq!(cursor.next_occurrence(), state(0, 0, 1));
        assert_eq!(cursor.next_occurrence(), state(0, 0, 2));
        // last occurrence of instance 0 rolls over into instance 1
        assert_eq!(cursor.next_occurrence(), state(0, 1, 0));
        assert_eq!(cursor.current_dictionary(), Some("العين"));
        assert_eq!(cursor.total_occurrences(), 2);
        assert_eq!(cursor.next_occurrence(), state(0, 1, 1));
    }

    #[test]
    fn test_next_occurrence_terminal_is_noop() {
        let index = sample_index();
        let matcher = OccurrenceMatcher::default();
        let ctx = NavContext::new(&index, &matcher);

        let terminal = state(0, 1, 1);
        assert_eq!(transition(terminal, &ctx, NavEvent::NextOccurrence), terminal);
    }

    #[test]
    fn test_prev_occurrence_lands_on_last_of_previous_instance() {
        let index = sample_index();
        let matcher = OccurrenceMatcher::default();
        let ctx = NavContext::new(&index, &matcher);

        assert_eq!(transition(state(0, 1, 1), &ctx, NavEvent::PrevOccurrence), state(0, 1, 0));
        assert_eq!(transition(state(0, 1, 0), &ctx, NavEvent::PrevOccurrence), state(0, 0, 2));
        assert_eq!(transition(state(0, 0, 0), &ctx, NavEvent::PrevOccurrence), state(0, 0, 0));
    }

    #[test]
    fn test_prev_occurrence_into_instance_without_occurrences() {
        // second instance has no occurrences of the word: lands on 0
        let r1 = root(1, 1, "لا شيء هنا");
        let r2 = root(2, 2, "كتب وكتب");
        let index = IndexSnapshot::from_entries(vec![
            entry(1, "كتب", &r1, "أ"),
            entry(2, "كتب", &r2, "ب"),
        ]);
        let matcher = OccurrenceMatcher::default();
        let ctx = NavContext::new(&index, &matcher);

        assert_eq!(transition(state(0, 1, 0), &ctx, NavEvent::PrevOccurrence), state(0, 0, 0));
        // and moving forward from an empty instance goes straight to the next one
        assert_eq!(transition(state(0, 0, 0), &ctx, NavEvent::NextOccurrence), state(0, 1, 0));
    }

    #[test]
    fn test_instance_navigation() {
        let index = sample_index();
        let matcher = OccurrenceMatcher::default();
        let mut cursor = Cursor::new(NavContext::new(&index, &matcher));

        assert_eq!(cursor.total_instances(), 2);
        assert_eq!(cursor.prev_instance(), state(0, 0, 0));

        cursor.next_occurrence();
        assert_eq!(cursor.next_instance(), state(0, 1, 0));
        assert_eq!(cursor.current_instance_index(), 1);
        assert_eq!(cursor.current_occurrence_index(), 0);
        assert_eq!(cursor.next_instance(), state(0, 1, 0));
        assert_eq!(cursor.prev_instance(), state(0, 0, 0));
    }

    #[test]
    fn test_word_navigation_within_same_definition_keeps_occurrence() {
        let index = sample_index();
        let matcher = OccurrenceMatcher::default();
        let ctx = NavContext::new(&index, &matcher);

        // "جهل" shares root 1 with "علم" but has one occurrence: clamp to 0
        assert_eq!(transition(state(0, 0, 2), &ctx, NavEvent::NextWord), state(1, 0, 0));

        // back to "علم" keeps occurrence 0 and shows root 1 (instance 0)
        assert_eq!(transition(state(1, 0, 0), &ctx, NavEvent::PrevWord), state(0, 0, 0));
    }

    #[test]
    fn test_same_definition_keeps_occurrence_when_in_range() {
        let r1 = root(1, 1, "علم علم علم جهل جهل جهل");
        let index = IndexSnapshot::from_entries(vec![entry(1, "علم", &r1, "أ"), entry(2, "جهل", &r1, "أ")]);
        let matcher = OccurrenceMatcher::default();
        let ctx = NavContext::new(&index, &matcher);

        assert_eq!(transition(state(0, 0, 2), &ctx, NavEvent::NextWord), state(1, 0, 2));
    }

    #[test]
    fn test_same_definition_is_judged_by_displayed_instance() {
        let r1 = root(1, 1, "علم علم جهل جهل");
        let r3 = root(3, 2, "علم علم");
        let index = IndexSnapshot::from_entries(vec![
            entry(1, "علم", &r1, "أ"),
            entry(2, "جهل", &r1, "أ"),
            entry(3, "علم", &r3, "ب"),
        ]);
        let matcher = OccurrenceMatcher::default();
        let ctx = NavContext::new(&index, &matcher);

        // showing root 1: the next word stays on root 1 and keeps the occurrence
        assert_eq!(transition(state(0, 0, 1), &ctx, NavEvent::NextWord), state(1, 0, 1));
        // showing root 3 (second instance): moving to a root 1 word is a new definition
        assert_eq!(transition(state(0, 1, 1), &ctx, NavEvent::NextWord), state(1, 0, 0));
    }

    #[test]
    fn test_word_navigation_across_definitions_resets() {
        let index = sample_index();
        let matcher = OccurrenceMatcher::default();
        let ctx = NavContext::new(&index, &matcher);

        assert_eq!(transition(state(1, 0, 0), &ctx, NavEvent::NextWord), state(2, 0, 0));
        // entry 3 is the second instance of "علم", but a word move starts at instance 0
        assert_eq!(transition(state(2, 0, 0), &ctx, NavEvent::NextWord), state(3, 0, 0));
    }

    #[test]
    fn test_word_boundaries() {
        let index = sample_index();
        let matcher = OccurrenceMatcher::default();
        let ctx = NavContext::new(&index, &matcher);

        assert_eq!(transition(state(0, 0, 1), &ctx, NavEvent::PrevWord), state(0, 0, 1));
        assert_eq!(transition(state(3, 1, 1), &ctx, NavEvent::NextWord), state(3, 1, 1));
    }

    #[test]
    fn test_select_word() {
        let index = sample_index();
        let matcher = OccurrenceMatcher::default();
        let mut cursor = Cursor::new(NavContext::new(&index, &matcher));

        assert_eq!(cursor.select_word(3), state(3, 1, 0));
        assert_eq!(cursor.current_root().map(|r| r.id), Some(3));
        assert_eq!(cursor.select_word(99), state(3, 1, 0));
    }

    #[test]
    fn test_word_without_occurrences() {
        let index = sample_index();
        let matcher = OccurrenceMatcher::default();
        let mut cursor = Cursor::new(NavContext::new(&index, &matcher));
        cursor.select_word(2);

        assert_eq!(cursor.total_occurrences(), 0);
        assert_eq!(cursor.current_span(), None);
        assert_eq!(cursor.next_occurrence(), state(2, 0, 0));
        assert_eq!(cursor.prev_occurrence(), state(2, 0, 0));
    }

    #[test]
    fn test_empty_index_is_inert() {
        let index = IndexSnapshot::empty();
        let matcher = OccurrenceMatcher::default();
        let mut cursor = Cursor::new(NavContext::new(&index, &matcher));

        for event in [
            NavEvent::NextWord,
            NavEvent::PrevWord,
            NavEvent::NextInstance,
            NavEvent::PrevInstance,
            NavEvent::NextOccurrence,
            NavEvent::PrevOccurrence,
            NavEvent::SelectWord(0),
        ] {
            assert_eq!(cursor.apply(event), CursorState::default());
        }
        assert_eq!(cursor.current_word(), None);
        assert_eq!(cursor.total_instances(), 0);
        assert_eq!(cursor.total_occurrences(), 0);
    }

    #[test]
    fn test_event_serialization() {
        assert_eq!(serde_json::to_string(&NavEvent::NextWord).unwrap(), r#"{"type":"next_word"}"#);
        assert_eq!(
            serde_json::to_string(&NavEvent::SelectWord(4)).unwrap(),
            r#"{"type":"select_word","index":4}"#
        );
    }
}
