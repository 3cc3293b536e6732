//! SRO Extractor - Knowledge triplet extraction pipeline
//!
//! Derives Subject-Relation-Object triplets from annotated sentences with a
//! deterministic, rule-based search around every verb, then refines the
//! whole collection (subject merging and frequency/self-loop pruning).

use sro_core::{Annotator, Document, Result};

pub mod assembler;
pub mod entity;
pub mod export;
pub mod metrics;
pub mod pipeline;
pub mod postprocess;
pub mod relation;
pub mod retokenize;
pub mod span;

pub use entity::{CandidateSource, CandidateTiers, EntityClassifier, EntityTier};
pub use pipeline::{Extraction, ExtractionStats, RuleBasedSro};
pub use postprocess::{PostProcessReport, PostProcessor};
pub use span::{Span, SpanOrigin};

/// Trait for triplet extractors
pub trait TripletExtractor: Send + Sync {
    fn extract(&self, document: &Document) -> Result<Extraction>;
}

/// Annotate raw text with `annotator`, then extract triplets from it
pub fn extract_text<A, E>(annotator: &A, extractor: &E, title: &str, text: &str) -> Result<Extraction>
where
    A: Annotator + ?Sized,
    E: TripletExtractor + ?Sized,
{
    let document = annotator.annotate(title, text)?;
    tracing::debug!(
        annotator = annotator.name(),
        sentences = document.sentences.len(),
        "Annotated document"
    );
    extractor.extract(&document)
}
