//! Span Selector module
//!
//! Candidate spans and the tiered subject/object search around a verb.
//! Subjects are searched left of the verb, objects right of it; within a
//! tier the span closest to the verb wins.

use sro_core::{EntityLabel, Sentence, Title, Token};

use crate::entity::{CandidateSource, CandidateTiers};

// ============================================================================
// Spans
// ============================================================================

/// Where a span's range is anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanOrigin {
    /// Index of the sentence within its document
    Sentence(usize),
    /// The document title (fallback subject)
    Title,
    /// No span at all (fallback object before any object was chosen)
    Empty,
}

/// A candidate subject or object: a half-open token range with cached text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub origin: SpanOrigin,
    pub start: usize,
    pub end: usize,
    pub label: Option<EntityLabel>,
    /// Surface text of every token in the range
    pub text: String,
    /// Lowercased surface text of the content tokens (no stop words, no punctuation)
    pub content: String,
}

impl Span {
    /// Build a span over `tokens`, which must be the tokens of `[start, end)`
    pub fn from_tokens(
        origin: SpanOrigin,
        start: usize,
        end: usize,
        tokens: &[Token],
        label: Option<EntityLabel>,
    ) -> Self {
        let text = tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let content = collapse_whitespace(
            tokens
                .iter()
                .filter(|t| t.is_content())
                .map(|t| t.text.to_lowercase()),
        );

        Self {
            origin,
            start,
            end,
            label,
            text,
            content,
        }
    }

    /// Span over `[start, end)` of sentence number `index`
    pub fn in_sentence(
        index: usize,
        sentence: &Sentence,
        start: usize,
        end: usize,
        label: Option<EntityLabel>,
    ) -> Self {
        Self::from_tokens(
            SpanOrigin::Sentence(index),
            start,
            end,
            &sentence.tokens[start..end],
            label,
        )
    }

    /// The whole title as one span
    pub fn title(title: &Title) -> Self {
        Self::from_tokens(SpanOrigin::Title, 0, title.tokens.len(), &title.tokens, None)
    }

    /// The empty span
    pub fn empty() -> Self {
        Self {
            origin: SpanOrigin::Empty,
            start: 0,
            end: 0,
            label: None,
            text: String::new(),
            content: String::new(),
        }
    }

    /// Same range in the same context; text is not compared
    pub fn same_span(&self, other: &Span) -> bool {
        self.origin == other.origin && self.start == other.start && self.end == other.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Join words with single spaces, splitting any embedded whitespace runs
pub(crate) fn collapse_whitespace<I, S>(words: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for word in words {
        for part in word.as_ref().split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(part);
        }
    }
    out
}

// ============================================================================
// Selection
// ============================================================================

/// A chosen span plus the relation boundary it implies
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub span: &'a Span,
    /// Start of the relation range (subjects) or its end (objects)
    pub boundary: usize,
    pub source: CandidateSource,
}

/// Find the subject for the verb at `verb`.
///
/// Returns the rightmost span of the first tier that has one ending at or
/// before the verb and after `lower_bound`.
pub fn find_subject(tiers: &CandidateTiers, verb: usize, lower_bound: usize) -> Option<Selection<'_>> {
    tiers.in_priority_order().into_iter().find_map(|(source, spans)| {
        subject_in_tier(spans, verb, lower_bound).map(|span| Selection {
            span,
            boundary: span.end,
            source,
        })
    })
}

fn subject_in_tier(spans: &[Span], verb: usize, lower_bound: usize) -> Option<&Span> {
    let mut best = None;
    for span in spans {
        if span.end > verb {
            break;
        }
        if span.end > lower_bound {
            best = Some(span);
        }
    }
    best
}

/// Find the object for the verb at `verb` whose surface text is `verb_text`.
///
/// Returns the leftmost span of the first tier that has one ending after the
/// verb. Domain-term candidates equal to the verb itself are skipped.
pub fn find_object<'a>(tiers: &'a CandidateTiers, verb: usize, verb_text: &str) -> Option<Selection<'a>> {
    let verb_lower = verb_text.to_lowercase();
    tiers.in_priority_order().into_iter().find_map(|(source, spans)| {
        let reject = match source {
            CandidateSource::Global => Some(verb_lower.as_str()),
            _ => None,
        };
        object_in_tier(spans, verb, reject).map(|span| Selection {
            span,
            boundary: span.start,
            source,
        })
    })
}

fn object_in_tier<'a>(spans: &'a [Span], verb: usize, reject: Option<&str>) -> Option<&'a Span> {
    let mut best = None;
    for span in spans.iter().rev() {
        if span.end <= verb {
            break;
        }
        if reject.is_some_and(|text| span.text.to_lowercase() == text) {
            continue;
        }
        best = Some(span);
    }
    best
}

// ============================================================================
// Tests
// ============================================================================
