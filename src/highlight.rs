//! Splitting a definition into plain and highlighted runs

use crate::models::Span;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Plain,
    Match,
    /// The occurrence the cursor is on
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
    /// Character offset of the segment within the definition
    pub start: usize,
    /// Index into the span list for `Match`/`Active` segments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<usize>,
}

/// Cut `definition` at the given spans. Spans must be ordered and
/// non-overlapping (as produced by the matcher); spans reaching past the
/// end of the text are truncated, and out-of-order ones are skipped.
pub fn segment_definition(definition: &str, spans: &[Span], active: Option<usize>) -> Vec<Segment> {
    let chars: Vec<char> = definition.chars().collect();
    let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = 0;

    let text = |from: usize, to: usize| -> String { chars[from..to].iter().collect() };

    for (i, span) in spans.iter().enumerate() {
        let start = span.start.min(chars.len());
        let end = span.end.min(chars.len());
        if start < cursor || start >= end {
            continue;
        }

        if start > cursor {
            segments.push(Segment {
                kind: SegmentKind::Plain,
                text: text(cursor, start),
                start: cursor,
                occurrence: None,
            });
        }

        let kind = if active == Some(i) {
            SegmentKind::Active
        } else {
            SegmentKind::Match
        };
        segments.push(Segment {
            kind,
            text: text(start, end),
            start,
            occurrence: Some(i),
        });
        cursor = end;
    }

    if cursor < chars.len() {
        segments.push(Segment {
            kind: SegmentKind::Plain,
            text: text(cursor, chars.len()),
            start: cursor,
            occurrence: None,
        });
    }

    segments
}
