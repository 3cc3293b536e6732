//! Triplet Assembler module
//!
//! Turns a (subject, relation, object) selection into a triplet, rejects
//! degenerate ones, and collapses consecutive same-span duplicates within a
//! sentence to the one with the longest relation. Also carries the
//! previous-object state the span selector needs.

use serde::{Deserialize, Serialize};

use sro_core::Triplet;

use crate::span::Span;

/// Why a candidate triplet was not emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    EmptySubject,
    EmptyRelation,
    EmptyObject,
    SelfReference,
}

/// Result of pushing one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Appended as a new row
    Accepted,
    /// Merged into the previous row of the same sentence
    Collapsed,
    Rejected(Rejection),
}

/// Check the triplet invariants
pub fn validate(triplet: &Triplet) -> Result<(), Rejection> {
    if triplet.subject.is_empty() {
        Err(Rejection::EmptySubject)
    } else if triplet.relation.is_empty() {
        Err(Rejection::EmptyRelation)
    } else if triplet.object.is_empty() {
        Err(Rejection::EmptyObject)
    } else if triplet.subject == triplet.object {
        Err(Rejection::SelfReference)
    } else {
        Ok(())
    }
}

/// Accumulates the Triplet Collection of one document
#[derive(Debug, Clone)]
pub struct TripletAssembler {
    triplets: Vec<Triplet>,
    /// Object of the previous verb, carried across sentences
    prev_obj: Span,
    /// End of the previous verb's object in the current sentence
    prev_obj_end: usize,
    /// Spans of the last row accepted in the current sentence
    last_accepted: Option<(Span, Span)>,
}

impl TripletAssembler {
    /// Create an empty assembler
    pub fn new() -> Self {
        Self {
            triplets: Vec::new(),
            prev_obj: Span::empty(),
            prev_obj_end: 0,
            last_accepted: None,
        }
    }

    /// Reset the per-sentence state
    pub fn begin_sentence(&mut self) {
        self.prev_obj_end = 0;
        self.last_accepted = None;
    }

    /// Lower bound on subject ends for the next verb
    pub fn lower_bound(&self) -> usize {
        self.prev_obj_end
    }

    /// Fallback object for a verb with no object candidate
    pub fn previous_object(&self) -> &Span {
        &self.prev_obj
    }

    /// Offer a candidate. The previous-object state advances whatever the outcome.
    pub fn push(&mut self, subject: &Span, relation: &str, object: &Span) -> Outcome {
        let candidate = Triplet::new(
            subject.content.as_str(),
            relation.trim(),
            object.content.as_str(),
        );

        let outcome = match validate(&candidate) {
            Err(rejection) => Outcome::Rejected(rejection),
            Ok(()) => {
                let duplicate = self
                    .last_accepted
                    .as_ref()
                    .is_some_and(|(s, o)| s.same_span(subject) && o.same_span(object));

                let outcome = match self.triplets.last_mut() {
                    Some(previous) if duplicate => {
                        if candidate.relation.chars().count() >= previous.relation.chars().count() {
                            *previous = candidate;
                        }
                        Outcome::Collapsed
                    }
                    _ => {
                        self.triplets.push(candidate);
                        Outcome::Accepted
                    }
                };
                self.last_accepted = Some((subject.clone(), object.clone()));
                outcome
            }
        };

        self.prev_obj = object.clone();
        self.prev_obj_end = object.end;
        outcome
    }

    /// Rows accepted so far
    pub fn triplets(&self) -> &[Triplet] {
        &self.triplets
    }

    pub fn into_triplets(self) -> Vec<Triplet> {
        self.triplets
    }
}

impl Default for TripletAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SpanOrigin;
    use sro_core::{PartOfSpeech, Token};

    fn span(sentence: usize, start: usize, text: &str) -> Span {
        let tokens: Vec<Token> = text
            .split(' ')
            .map(|w| Token::new(w, w, PartOfSpeech::Noun))
            .collect();
        let end = start + tokens.len();
        Span::from_tokens(SpanOrigin::Sentence(sentence), start, end, &tokens, None)
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate(&Triplet::new("a", "r", "b")), Ok(()));
        assert_eq!(validate(&Triplet::new("", "r", "b")), Err(Rejection::EmptySubject));
        assert_eq!(validate(&Triplet::new("a", "", "b")), Err(Rejection::EmptyRelation));
        assert_eq!(validate(&Triplet::new("a", "r", "")), Err(Rejection::EmptyObject));
        assert_eq!(validate(&Triplet::new("a", "r", "a")), Err(Rejection::SelfReference));
    }

    #[test]
    fn test_accept_and_advance() {
        let mut asm = TripletAssembler::new();
        asm.begin_sentence();
        let obj = span(0, 4, "corsica");
        assert_eq!(asm.push(&span(0, 0, "napoleon"), "bear", &obj), Outcome::Accepted);
        assert_eq!(asm.lower_bound(), 5);
        assert!(asm.previous_object().same_span(&obj));
        assert_eq!(asm.triplets()[0], Triplet::new("napoleon", "bear", "corsica"));
    }

    #[test]
    fn test_rejected_still_advances() {
        let mut asm = TripletAssembler::new();
        let obj = span(0, 3, "paris");
        let outcome = asm.push(&span(0, 0, "paris"), "visit", &obj);
        assert_eq!(outcome, Outcome::Rejected(Rejection::SelfReference));
        assert!(asm.triplets().is_empty());
        assert_eq!(asm.lower_bound(), 4);
    }

    #[test]
    fn test_consecutive_same_spans_keep_longer_relation() {
        let mut asm = TripletAssembler::new();
        let subj = span(0, 0, "napoleon");
        let obj = span(0, 6, "france");

        asm.push(&subj, "rule", &obj);
        assert_eq!(asm.push(&subj, "rule emperor", &obj), Outcome::Collapsed);
        assert_eq!(asm.push(&subj, "lead", &obj), Outcome::Collapsed);

        assert_eq!(asm.triplets().len(), 1);
        assert_eq!(asm.triplets()[0].relation, "rule emperor");
    }

    #[test]
    fn test_equal_text_different_span_not_collapsed() {
        let mut asm = TripletAssembler::new();
        let subj = span(0, 0, "napoleon");
        asm.push(&subj, "rule", &span(0, 6, "france"));
        asm.push(&subj, "invade", &span(0, 9, "france"));
        assert_eq!(asm.triplets().len(), 2);
    }

    #[test]
    fn test_no_collapse_across_sentences() {
        let mut asm = TripletAssembler::new();
        let subj = span(0, 0, "napoleon");
        let obj = span(0, 3, "france");
        asm.begin_sentence();
        asm.push(&subj, "rule", &obj);
        asm.begin_sentence();
        assert_eq!(asm.lower_bound(), 0);
        assert_eq!(asm.push(&subj, "rule", &obj), Outcome::Accepted);
        assert_eq!(asm.triplets().len(), 2);
    }

    #[test]
    fn test_collapse_skips_rejected_in_between() {
        let mut asm = TripletAssembler::new();
        let subj = span(0, 0, "napoleon");
        let obj = span(0, 5, "france");
        asm.push(&subj, "rule", &obj);
        asm.push(&subj, "", &obj);
        assert_eq!(asm.push(&subj, "govern strongly", &obj), Outcome::Collapsed);
        assert_eq!(asm.triplets().len(), 1);
        assert_eq!(asm.triplets()[0].relation, "govern strongly");
    }
}
