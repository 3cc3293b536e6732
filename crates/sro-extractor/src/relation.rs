//! Relation Builder module
//!
//! Builds the relation text from the tokens between a subject and an object.

use sro_core::Sentence;

use crate::span::collapse_whitespace;

/// Lemmatized relation text for the token range `[rel_start, rel_end)`.
///
/// Keeps the verb itself and every token that is neither a stop word nor
/// punctuation. A reversed range yields an empty relation.
pub fn build_relation(sentence: &Sentence, rel_start: usize, rel_end: usize, verb: usize) -> String {
    let end = rel_end.min(sentence.len());
    if rel_start >= end {
        return String::new();
    }

    collapse_whitespace(
        sentence.tokens[rel_start..end]
            .iter()
            .enumerate()
            .filter(|(offset, token)| rel_start + offset == verb || token.is_content())
            .map(|(_, token)| token.lemma.to_lowercase()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sro_core::{PartOfSpeech, Token};

    fn napoleon() -> Sentence {
        Sentence::new(vec![
            Token::new("Napoleon", "napoleon", PartOfSpeech::Propn),
            Token::new("was", "be", PartOfSpeech::Aux).stop(),
            Token::new("born", "bear", PartOfSpeech::Verb),
            Token::new("in", "in", PartOfSpeech::Adp).stop(),
            Token::new("Corsica", "corsica", PartOfSpeech::Propn),
            Token::new(".", ".", PartOfSpeech::Punct),
        ])
    }

    #[test]
    fn test_relation_filters_stop_words() {
        assert_eq!(build_relation(&napoleon(), 1, 4, 2), "bear");
    }

    #[test]
    fn test_relation_keeps_verb_even_if_stop_word() {
        let mut sentence = napoleon();
        sentence.tokens[2].is_stop = true;
        assert_eq!(build_relation(&sentence, 1, 4, 2), "bear");
    }

    #[test]
    fn test_relation_reversed_range_is_empty() {
        assert_eq!(build_relation(&napoleon(), 4, 1, 2), "");
        assert_eq!(build_relation(&napoleon(), 2, 2, 2), "");
    }

    #[test]
    fn test_relation_range_clamped_to_sentence() {
        assert_eq!(build_relation(&napoleon(), 2, 99, 2), "bear corsica");
    }

    #[test]
    fn test_relation_multiword_lemma_collapsed() {
        let sentence = Sentence::new(vec![
            Token::new("took", "take", PartOfSpeech::Verb),
            Token::new("part  in", "part  in", PartOfSpeech::Noun),
        ]);
        assert_eq!(build_relation(&sentence, 0, 2, 0), "take part in");
    }
}
