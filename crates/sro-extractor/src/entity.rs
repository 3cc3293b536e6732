//! Entity Classifier module
//!
//! Partitions a sentence's spans into the candidate tiers searched by the
//! span selector: Main entities, Global (domain) terms, noun chunks, and
//! Additional entities. Numeric categories are discarded.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use sro_core::{AnnotatedSpan, EntityLabel, Sentence};

use crate::span::Span;

// ============================================================================
// Tiers
// ============================================================================

/// Priority tier of an entity span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityTier {
    Main,
    Global,
    Additional,
    Discarded,
}

impl EntityTier {
    /// Tier for an adapter entity label; Global comes from domain terms, never from a label
    pub fn classify(label: Option<&EntityLabel>) -> Self {
        use EntityLabel::*;

        match label {
            Some(Date | Time | Money | Quantity) => Self::Additional,
            Some(Cardinal | Ordinal | Percent) => Self::Discarded,
            Some(
                Person | Norp | Fac | Org | Gpe | Loc | Product | Event | WorkOfArt | Law
                | Language,
            ) => Self::Main,
            Some(Other(_)) | None => Self::Discarded,
        }
    }
}

impl std::fmt::Display for EntityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Global => write!(f, "global"),
            Self::Additional => write!(f, "additional"),
            Self::Discarded => write!(f, "discarded"),
        }
    }
}

/// Candidate list a selection came from, in search priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Main,
    Global,
    NounChunk,
    Additional,
}

/// The four candidate lists of one sentence, each in document order
#[derive(Debug, Clone, Default)]
pub struct CandidateTiers {
    pub main: Vec<Span>,
    pub global: Vec<Span>,
    pub noun_chunks: Vec<Span>,
    pub additional: Vec<Span>,
}

impl CandidateTiers {
    /// Lists in the order subjects and objects are searched
    pub fn in_priority_order(&self) -> [(CandidateSource, &[Span]); 4] {
        [
            (CandidateSource::Main, self.main.as_slice()),
            (CandidateSource::Global, self.global.as_slice()),
            (CandidateSource::NounChunk, self.noun_chunks.as_slice()),
            (CandidateSource::Additional, self.additional.as_slice()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty()
            && self.global.is_empty()
            && self.noun_chunks.is_empty()
            && self.additional.is_empty()
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// Builds candidate tiers from adapter spans and a domain-term set
#[derive(Debug, Clone, Default)]
pub struct EntityClassifier {
    domain_terms: HashSet<String>,
}

impl EntityClassifier {
    /// Create a classifier; terms are lowercased
    pub fn new<I, S>(domain_terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            domain_terms: domain_terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Check whether a token text is a domain term
    pub fn is_domain_term(&self, text: &str) -> bool {
        self.domain_terms.contains(&text.to_lowercase())
    }

    /// Classify sentence number `index` into candidate tiers
    pub fn classify(&self, index: usize, sentence: &Sentence) -> CandidateTiers {
        let mut tiers = CandidateTiers::default();

        for entity in valid_spans(index, sentence, &sentence.entities, "entity") {
            let target = match EntityTier::classify(entity.label.as_ref()) {
                EntityTier::Main => &mut tiers.main,
                EntityTier::Additional => &mut tiers.additional,
                EntityTier::Global | EntityTier::Discarded => continue,
            };
            target.push(Span::in_sentence(
                index,
                sentence,
                entity.start,
                entity.end,
                entity.label.clone(),
            ));
        }

        tiers.global = sentence
            .tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| self.is_domain_term(&token.text))
            .map(|(i, _)| Span::in_sentence(index, sentence, i, i + 1, None))
            .collect();

        tiers.noun_chunks = valid_spans(index, sentence, &sentence.noun_chunks, "noun chunk")
            .map(|chunk| Span::in_sentence(index, sentence, chunk.start, chunk.end, None))
            .collect();

        tiers
    }
}

/// Spans that fit the sentence, sorted by position
fn valid_spans<'a>(
    index: usize,
    sentence: &Sentence,
    spans: &'a [AnnotatedSpan],
    kind: &'static str,
) -> impl Iterator<Item = &'a AnnotatedSpan> {
    let len = sentence.len();
    let mut kept: Vec<&AnnotatedSpan> = spans
        .iter()
        .filter(|span| {
            let ok = span.is_within(len);
            if !ok {
                warn!(
                    sentence = index,
                    start = span.start,
                    end = span.end,
                    tokens = len,
                    "Dropping out-of-range {kind} span"
                );
            }
            ok
        })
        .collect();
    kept.sort_by_key(|span| (span.start, span.end));
    kept.into_iter()
}

// ============================================================================
// Tests
// ============================================================================
