//! Rule-based triplet extraction pipeline
//!
//! Drives the per-sentence, per-verb loop (classify, select, build relation,
//! assemble) over a document and then runs the post-processing passes.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use sro_core::{AppConfig, Document, ExtractionConfig, PostProcessConfig, Result, SroError, Triplet};

use crate::assembler::{Outcome, TripletAssembler};
use crate::entity::EntityClassifier;
use crate::postprocess::{PostProcessReport, PostProcessor};
use crate::relation::build_relation;
use crate::retokenize::retokenize;
use crate::span::{find_object, find_subject, Span};
use crate::TripletExtractor;

// ============================================================================
// Results
// ============================================================================

/// Counters collected while extracting one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub sentences: usize,
    pub verbs: usize,
    /// Verbs whose subject fell back to the title
    pub title_subjects: usize,
    /// Verbs whose object fell back to the previous object
    pub carried_objects: usize,
    pub accepted: usize,
    pub collapsed: usize,
    pub rejected: usize,
    pub postprocess: PostProcessReport,
}

/// Triplets of one processed document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub triplets: Vec<Triplet>,
    pub stats: ExtractionStats,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.triplets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.triplets.len()
    }
}

// ============================================================================
// Rule-based extractor
// ============================================================================

/// Deterministic SRO extractor
#[derive(Debug, Clone, Default)]
pub struct RuleBasedSro {
    extraction: ExtractionConfig,
    postprocessor: PostProcessor,
}

impl RuleBasedSro {
    /// Create an extractor with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(extraction: ExtractionConfig, postprocess: PostProcessConfig) -> Self {
        Self {
            extraction,
            postprocessor: PostProcessor::new(postprocess),
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::with_config(config.extraction.clone(), config.postprocess.clone())
    }

    /// Add domain terms on top of the configured ones
    pub fn with_domain_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extraction
            .domain_terms
            .extend(terms.into_iter().map(Into::into));
        self
    }

    /// Extract the Triplet Collection without post-processing
    pub fn extract_raw(&self, document: &Document) -> Result<Extraction> {
        if document.sentences.is_empty() {
            return Err(SroError::EmptyDocument);
        }

        let classifier = EntityClassifier::new(
            self.extraction
                .domain_terms
                .iter()
                .chain(document.domain_terms.iter()),
        );
        let title = document
            .title
            .as_ref()
            .filter(|t| !t.is_empty())
            .map(Span::title);

        let mut assembler = TripletAssembler::new();
        let mut found_subject = false;
        let mut first_untitled = None;
        let mut stats = ExtractionStats {
            sentences: document.sentences.len(),
            ..Default::default()
        };

        for (index, raw) in document.sentences.iter().enumerate() {
            let sentence = if self.extraction.retokenize {
                Cow::Owned(retokenize(raw))
            } else {
                Cow::Borrowed(raw)
            };

            let tiers = classifier.classify(index, &sentence);
            let verbs = sentence.verbs();
            debug!(
                sentence = index,
                text = %sentence.text(),
                main = tiers.main.len(),
                global = tiers.global.len(),
                noun_chunks = tiers.noun_chunks.len(),
                additional = tiers.additional.len(),
                verbs = verbs.len(),
                "Processing sentence"
            );

            assembler.begin_sentence();
            for verb in verbs {
                stats.verbs += 1;

                let (subject, rel_start) = match find_subject(&tiers, verb, assembler.lower_bound()) {
                    Some(selection) => {
                        found_subject = true;
                        (selection.span.clone(), selection.boundary)
                    }
                    None => match title.as_ref() {
                        Some(title) => {
                            stats.title_subjects += 1;
                            (title.clone(), verb)
                        }
                        // Rejected as an empty subject below
                        None => {
                            first_untitled.get_or_insert((index, verb));
                            (Span::empty(), verb)
                        }
                    },
                };

                let verb_text = sentence.tokens[verb].text.as_str();
                let (object, rel_end) = match find_object(&tiers, verb, verb_text) {
                    Some(selection) => (selection.span.clone(), selection.boundary),
                    None => {
                        stats.carried_objects += 1;
                        (assembler.previous_object().clone(), verb + 1)
                    }
                };

                let relation = build_relation(&sentence, rel_start, rel_end, verb);
                let outcome = assembler.push(&subject, &relation, &object);
                trace!(
                    sentence = index,
                    verb = verb_text,
                    subject = %subject.text,
                    relation = %relation,
                    object = %object.text,
                    ?outcome,
                    "Verb processed"
                );

                match outcome {
                    Outcome::Accepted => stats.accepted += 1,
                    Outcome::Collapsed => stats.collapsed += 1,
                    Outcome::Rejected(_) => stats.rejected += 1,
                }
            }
        }

        if let (Some((sentence, token)), false) = (first_untitled, found_subject) {
            return Err(SroError::MissingTitle { sentence, token });
        }

        let triplets = assembler.into_triplets();
        info!(
            sentences = stats.sentences,
            verbs = stats.verbs,
            triplets = triplets.len(),
            "Extracted triplets"
        );

        Ok(Extraction { triplets, stats })
    }
}

impl TripletExtractor for RuleBasedSro {
    fn extract(&self, document: &Document) -> Result<Extraction> {
        let mut extraction = self.extract_raw(document)?;
        extraction.stats.postprocess = self.postprocessor.run(&mut extraction.triplets);
        Ok(extraction)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sro_core::{PartOfSpeech, Sentence, Title, Token};

    fn napoleon_sentence() -> Sentence {
        Sentence::new(vec![
            Token::new("Napoleon", "napoleon", PartOfSpeech::Propn),
            Token::new("was", "be", PartOfSpeech::Aux).stop(),
            Token::new("born", "born", PartOfSpeech::Verb),
            Token::new("in", "in", PartOfSpeech::Adp).stop(),
            Token::new("Corsica", "corsica", PartOfSpeech::Propn),
            Token::new(".", ".", PartOfSpeech::Punct),
        ])
        .with_entity(0, 1, "PERSON")
        .with_entity(4, 5, "GPE")
    }

    #[test]
    fn test_napoleon_born_corsica() {
        let doc = Document::new("Napoleon").with_sentence(napoleon_sentence());
        let extraction = RuleBasedSro::new().extract_raw(&doc).unwrap();

        assert_eq!(
            extraction.triplets,
            vec![Triplet::new("napoleon", "born", "corsica")]
        );
        assert_eq!(extraction.stats.accepted, 1);
        assert_eq!(extraction.stats.title_subjects, 0);
    }

    #[test]
    fn test_empty_document_is_error() {
        let err = RuleBasedSro::new().extract(&Document::new("x")).unwrap_err();
        assert!(matches!(err, SroError::EmptyDocument));
    }

    #[test]
    fn test_sentence_without_verbs_yields_nothing() {
        let sentence = Sentence::new(vec![
            Token::new("Paris", "paris", PartOfSpeech::Propn),
            Token::new(".", ".", PartOfSpeech::Punct),
        ])
        .with_entity(0, 1, "GPE");
        let doc = Document::untitled().with_sentence(sentence);

        let extraction = RuleBasedSro::new().extract(&doc).unwrap();
        assert!(extraction.is_empty());
        assert_eq!(extraction.stats.verbs, 0);
    }

    #[test]
    fn test_title_fallback_subject() {
        // "Founded in Leverkusen ."
        let sentence = Sentence::new(vec![
            Token::new("Founded", "found", PartOfSpeech::Verb),
            Token::new("in", "in", PartOfSpeech::Adp).stop(),
            Token::new("Leverkusen", "leverkusen", PartOfSpeech::Propn),
        ])
        .with_entity(2, 3, "GPE");
        let doc = Document::new("Bayer").with_sentence(sentence);

        let extraction = RuleBasedSro::new().extract_raw(&doc).unwrap();
        assert_eq!(
            extraction.triplets,
            vec![Triplet::new("bayer", "found", "leverkusen")]
        );
        assert_eq!(extraction.stats.title_subjects, 1);
    }

    #[test]
    fn test_missing_title_is_error() {
        let sentence = Sentence::new(vec![
            Token::new("Founded", "found", PartOfSpeech::Verb),
            Token::new("Leverkusen", "leverkusen", PartOfSpeech::Propn),
        ])
        .with_entity(1, 2, "GPE");
        let doc = Document::untitled().with_sentence(sentence);

        let err = RuleBasedSro::new().extract_raw(&doc).unwrap_err();
        assert!(matches!(err, SroError::MissingTitle { sentence: 0, token: 0 }));
    }

    #[test]
    fn test_untitled_document_keeps_found_triplets() {
        // "Napoleon was born in Corsica . Died Helena ."
        let second = Sentence::new(vec![
            Token::new("Died", "die", PartOfSpeech::Verb),
            Token::new("Helena", "helena", PartOfSpeech::Propn),
        ])
        .with_entity(1, 2, "GPE");
        let doc = Document::untitled()
            .with_sentence(napoleon_sentence())
            .with_sentence(second);

        let extraction = RuleBasedSro::new().extract_raw(&doc).unwrap();
        assert_eq!(
            extraction.triplets,
            vec![Triplet::new("napoleon", "born", "corsica")]
        );
        assert_eq!(extraction.stats.accepted, 1);
        assert_eq!(extraction.stats.rejected, 1);
        assert_eq!(extraction.stats.title_subjects, 0);
    }

    #[test]
    fn test_annotated_title_drops_stop_words() {
        // "Formed in Liverpool ." under the title "The Beatles"
        let sentence = Sentence::new(vec![
            Token::new("Formed", "form", PartOfSpeech::Verb),
            Token::new("in", "in", PartOfSpeech::Adp).stop(),
            Token::new("Liverpool", "liverpool", PartOfSpeech::Propn),
        ])
        .with_entity(2, 3, "GPE");
        let mut doc = Document::untitled().with_sentence(sentence);
        doc.title = Some(Title::annotated(vec![
            Token::new("The", "the", PartOfSpeech::Det).stop(),
            Token::new("Beatles", "beatles", PartOfSpeech::Propn),
        ]));

        let extraction = RuleBasedSro::new().extract_raw(&doc).unwrap();
        assert_eq!(
            extraction.triplets,
            vec![Triplet::new("beatles", "form", "liverpool")]
        );
    }

    #[test]
    fn test_plain_title_drops_punctuation() {
        let sentence = Sentence::new(vec![
            Token::new("Founded", "found", PartOfSpeech::Verb),
            Token::new("Leverkusen", "leverkusen", PartOfSpeech::Propn),
        ])
        .with_entity(1, 2, "GPE");
        let doc = Document::new("Bayer, Inc.").with_sentence(sentence);

        let extraction = RuleBasedSro::new().extract_raw(&doc).unwrap();
        assert_eq!(extraction.triplets[0].subject, "bayer inc");
    }

    #[test]
    fn test_first_verb_without_object_is_rejected() {
        let sentence = Sentence::new(vec![
            Token::new("Napoleon", "napoleon", PartOfSpeech::Propn),
            Token::new("died", "die", PartOfSpeech::Verb),
        ])
        .with_entity(0, 1, "PERSON");
        let doc = Document::new("Napoleon").with_sentence(sentence);

        let extraction = RuleBasedSro::new().extract_raw(&doc).unwrap();
        assert!(extraction.is_empty());
        assert_eq!(extraction.stats.rejected, 1);
        assert_eq!(extraction.stats.carried_objects, 1);
    }

    #[test]
    fn test_previous_object_carried_into_next_sentence() {
        // "Napoleon was born in Corsica . Paris welcomed ."
        let second = Sentence::new(vec![
            Token::new("Paris", "paris", PartOfSpeech::Propn),
            Token::new("welcomed", "welcome", PartOfSpeech::Verb),
            Token::new(".", ".", PartOfSpeech::Punct),
        ])
        .with_entity(0, 1, "GPE");
        let doc = Document::new("Napoleon")
            .with_sentence(napoleon_sentence())
            .with_sentence(second);

        let extraction = RuleBasedSro::new().extract_raw(&doc).unwrap();
        assert_eq!(
            extraction.triplets,
            vec![
                Triplet::new("napoleon", "born", "corsica"),
                Triplet::new("paris", "welcome", "corsica"),
            ]
        );
    }

    #[test]
    fn test_domain_terms_from_config_and_document() {
        // "Bayer synthesized aspirin ."
        let sentence = Sentence::new(vec![
            Token::new("Bayer", "bayer", PartOfSpeech::Propn),
            Token::new("synthesized", "synthesize", PartOfSpeech::Verb),
            Token::new("aspirin", "aspirin", PartOfSpeech::Noun),
            Token::new(".", ".", PartOfSpeech::Punct),
        ])
        .with_entity(0, 1, "ORG");
        let doc = Document::new("Bayer").with_sentence(sentence.clone());

        let without = RuleBasedSro::new().extract_raw(&doc).unwrap();
        assert!(without.is_empty());

        let with_config = RuleBasedSro::new()
            .with_domain_terms(["Aspirin"])
            .extract_raw(&doc)
            .unwrap();
        assert_eq!(
            with_config.triplets,
            vec![Triplet::new("bayer", "synthesize", "aspirin")]
        );

        let doc = doc.with_domain_terms(["aspirin"]);
        let with_doc = RuleBasedSro::new().extract_raw(&doc).unwrap();
        assert_eq!(with_doc.triplets, with_config.triplets);
    }

    #[test]
    fn test_retokenize_toggle() {
        // "Bayer AG bought Monsanto" with a nested entity inside "Bayer AG"
        let sentence = Sentence::new(vec![
            Token::new("Bayer", "bayer", PartOfSpeech::Propn),
            Token::new("AG", "ag", PartOfSpeech::Propn),
            Token::new("bought", "buy", PartOfSpeech::Verb),
            Token::new("Monsanto", "monsanto", PartOfSpeech::Propn),
        ])
        .with_entity(0, 2, "ORG")
        .with_entity(1, 2, "GPE")
        .with_entity(3, 4, "ORG");
        let doc = Document::new("Bayer").with_sentence(sentence);

        let merged = RuleBasedSro::new().extract_raw(&doc).unwrap();
        assert_eq!(
            merged.triplets,
            vec![Triplet::new("bayer ag", "buy", "monsanto")]
        );

        let config = ExtractionConfig {
            retokenize: false,
            ..Default::default()
        };
        let unmerged = RuleBasedSro::with_config(config, PostProcessConfig::default())
            .extract_raw(&doc)
            .unwrap();
        // Without the span filter the nested entity is the closest subject
        assert_eq!(unmerged.triplets[0].subject, "ag");
    }
}
