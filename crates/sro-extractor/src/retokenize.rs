//! Retokenization
//!
//! Collapses overlapping entity spans to the longest non-overlapping cover
//! and merges each kept entity into a single token, so every entity is an
//! atomic unit for the span selector.

use sro_core::{AnnotatedSpan, PartOfSpeech, Sentence, Token};

/// Keep the longest spans that do not overlap, earliest first on ties.
///
/// The result is in document order. Empty spans are dropped.
pub fn filter_spans(spans: &[AnnotatedSpan]) -> Vec<AnnotatedSpan> {
    let mut by_length: Vec<&AnnotatedSpan> = spans.iter().filter(|s| !s.is_empty()).collect();
    by_length.sort_by(|a, b| b.len().cmp(&a.len()).then(a.start.cmp(&b.start)));

    let mut kept: Vec<AnnotatedSpan> = Vec::new();
    for span in by_length {
        if kept.iter().all(|k| !k.overlaps(span)) {
            kept.push(span.clone());
        }
    }

    kept.sort_by_key(|s| s.start);
    kept
}

/// Merge every filtered entity into one token and remap noun chunks.
///
/// Spans that do not fit the sentence are dropped. A sentence whose
/// entities are already single tokens comes back unchanged.
pub fn retokenize(sentence: &Sentence) -> Sentence {
    let len = sentence.len();
    let in_range: Vec<AnnotatedSpan> = sentence
        .entities
        .iter()
        .filter(|e| e.is_within(len))
        .cloned()
        .collect();
    let entities = filter_spans(&in_range);

    let mut tokens = Vec::with_capacity(len);
    let mut merged_entities = Vec::with_capacity(entities.len());
    // new_index[i] is the merged position of old token i; new_index[len] is the new length
    let mut new_index = vec![0; len + 1];
    let mut pending = entities.iter().peekable();

    let mut i = 0;
    while i < len {
        match pending.next_if(|e| e.start == i) {
            Some(entity) => {
                for slot in &mut new_index[entity.start..entity.end] {
                    *slot = tokens.len();
                }
                merged_entities.push(AnnotatedSpan {
                    start: tokens.len(),
                    end: tokens.len() + 1,
                    label: entity.label.clone(),
                });
                tokens.push(merge_tokens(&sentence.tokens[entity.start..entity.end]));
                i = entity.end;
            }
            None => {
                new_index[i] = tokens.len();
                tokens.push(sentence.tokens[i].clone());
                i += 1;
            }
        }
    }
    new_index[len] = tokens.len();

    let noun_chunks = sentence
        .noun_chunks
        .iter()
        .filter(|c| c.is_within(len))
        .map(|c| AnnotatedSpan {
            start: new_index[c.start],
            end: new_index[c.end - 1] + 1,
            label: c.label.clone(),
        })
        .collect();

    Sentence {
        tokens,
        entities: merged_entities,
        noun_chunks,
    }
}

/// One token standing for `parts`; takes the tag of the last part
fn merge_tokens(parts: &[Token]) -> Token {
    let pos = match parts {
        [single] => return single.clone(),
        [.., last] => last.pos,
        [] => PartOfSpeech::X,
    };

    let text: Vec<&str> = parts.iter().map(|t| t.text.as_str()).collect();
    let lemma: Vec<&str> = parts.iter().map(|t| t.lemma.as_str()).collect();
    Token {
        text: text.join(" "),
        lemma: lemma.join(" ").to_lowercase(),
        pos,
        is_stop: parts.iter().all(|t| t.is_stop),
        is_punct: parts.iter().all(|t| t.is_punct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sro_core::EntityLabel;

    fn tok(text: &str, pos: PartOfSpeech) -> Token {
        Token::new(text, text, pos)
    }

    #[test]
    fn test_filter_spans_prefers_longer() {
        let spans = vec![
            AnnotatedSpan::entity(0, 1, "ORG"),
            AnnotatedSpan::entity(0, 2, "ORG"),
            AnnotatedSpan::entity(1, 3, "GPE"),
            AnnotatedSpan::entity(4, 5, "DATE"),
        ];
        let kept = filter_spans(&spans);
        assert_eq!(kept.len(), 2);
        // (0,2) and (1,3) tie on length; the earlier one wins
        assert_eq!((kept[0].start, kept[0].end), (0, 2));
        assert_eq!((kept[1].start, kept[1].end), (4, 5));
    }

    #[test]
    fn test_filter_spans_first_occurrence_on_identical_range() {
        let spans = vec![
            AnnotatedSpan::entity(2, 4, "ORG"),
            AnnotatedSpan::entity(2, 4, "GPE"),
        ];
        let kept = filter_spans(&spans);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label, Some(EntityLabel::Org));
    }

    #[test]
    fn test_retokenize_merges_entities_and_remaps_chunks() {
        // "The Bayer AG was founded in Barmen"
        let sentence = Sentence::new(vec![
            tok("The", PartOfSpeech::Det).stop(),
            tok("Bayer", PartOfSpeech::Propn),
            tok("AG", PartOfSpeech::Propn),
            tok("was", PartOfSpeech::Aux).stop(),
            tok("founded", PartOfSpeech::Verb),
            tok("in", PartOfSpeech::Adp).stop(),
            tok("Barmen", PartOfSpeech::Propn),
        ])
        .with_entity(1, 3, "ORG")
        .with_entity(1, 2, "ORG")
        .with_entity(6, 7, "GPE")
        .with_noun_chunk(0, 3)
        .with_noun_chunk(6, 7);

        let merged = retokenize(&sentence);

        assert_eq!(merged.len(), 6);
        assert_eq!(merged.tokens[1].text, "Bayer AG");
        assert_eq!(merged.tokens[1].lemma, "bayer ag");
        assert_eq!(merged.tokens[1].pos, PartOfSpeech::Propn);
        assert_eq!(merged.verbs(), vec![3]);
        assert_eq!(merged.entities.len(), 2);
        assert_eq!((merged.entities[0].start, merged.entities[0].end), (1, 2));
        assert_eq!((merged.entities[1].start, merged.entities[1].end), (5, 6));
        assert_eq!((merged.noun_chunks[0].start, merged.noun_chunks[0].end), (0, 2));
        assert_eq!((merged.noun_chunks[1].start, merged.noun_chunks[1].end), (5, 6));
    }

    #[test]
    fn test_retokenize_is_noop_on_atomic_entities() {
        let sentence = Sentence::new(vec![
            tok("Napoleon", PartOfSpeech::Propn),
            tok("born", PartOfSpeech::Verb),
            tok("Corsica", PartOfSpeech::Propn),
        ])
        .with_entity(0, 1, "PERSON")
        .with_entity(2, 3, "GPE")
        .with_noun_chunk(0, 1);

        assert_eq!(retokenize(&sentence), sentence);
        assert_eq!(retokenize(&retokenize(&sentence)), sentence);
    }

    #[test]
    fn test_retokenize_chunk_cut_by_entity_expands() {
        let sentence = Sentence::new(vec![
            tok("big", PartOfSpeech::Adj),
            tok("New", PartOfSpeech::Propn),
            tok("York", PartOfSpeech::Propn),
        ])
        .with_entity(1, 3, "GPE")
        .with_noun_chunk(0, 2);

        let merged = retokenize(&sentence);
        assert_eq!((merged.noun_chunks[0].start, merged.noun_chunks[0].end), (0, 2));
        assert_eq!(merged.tokens[1].text, "New York");
    }
}
