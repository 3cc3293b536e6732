//! SRO Core - Domain models, errors, and shared types
//!
//! This crate defines the core abstractions used throughout the SRO system:
//! - Annotated input model (tokens, entity and noun-chunk spans, sentences, documents)
//! - Subject-Relation-Object triplets
//! - Common error types
//! - The annotation collaborator trait
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, ExtractionConfig, LoggingConfig, OutputConfig, OutputFormat,
    PostProcessConfig,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for SRO operations
#[derive(Error, Debug)]
pub enum SroError {
    #[error("Document has no sentences")]
    EmptyDocument,

    #[error("Document has no title to fall back on (sentence {sentence}, verb token {token})")]
    MissingTitle { sentence: usize, token: usize },

    #[error("Annotation error: {0}")]
    Annotation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for SroError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<ConfigError> for SroError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SroError>;

// ============================================================================
// Tokens
// ============================================================================

/// Coarse (universal) part-of-speech tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartOfSpeech {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    Space,
    #[serde(other)]
    X,
}

/// A single annotated token.
///
/// The token's position index is its offset in [`Sentence::tokens`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text
    pub text: String,

    /// Lowercased lemma
    pub lemma: String,

    /// Coarse part-of-speech tag
    pub pos: PartOfSpeech,

    /// Stop-word flag
    #[serde(default)]
    pub is_stop: bool,

    /// Punctuation flag
    #[serde(default)]
    pub is_punct: bool,
}

impl Token {
    /// Create a content token; the lemma is lowercased
    pub fn new(text: impl Into<String>, lemma: impl Into<String>, pos: PartOfSpeech) -> Self {
        Self {
            text: text.into(),
            lemma: lemma.into().to_lowercase(),
            pos,
            is_stop: false,
            is_punct: pos == PartOfSpeech::Punct,
        }
    }

    /// Mark as stop word
    pub fn stop(mut self) -> Self {
        self.is_stop = true;
        self
    }

    /// Mark as punctuation
    pub fn punct(mut self) -> Self {
        self.is_punct = true;
        self
    }

    /// Neither a stop word nor punctuation
    pub fn is_content(&self) -> bool {
        !self.is_stop && !self.is_punct
    }

    pub fn is_verb(&self) -> bool {
        self.pos == PartOfSpeech::Verb
    }
}

// ============================================================================
// Entity Labels and Spans
// ============================================================================

/// Named-entity category assigned by the annotation adapter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityLabel {
    Person,
    Norp,
    Fac,
    Org,
    Gpe,
    Loc,
    Product,
    Event,
    WorkOfArt,
    Law,
    Language,
    Date,
    Time,
    Percent,
    Money,
    Quantity,
    Ordinal,
    Cardinal,
    Other(String),
}

impl EntityLabel {
    /// Get the string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Person => "PERSON",
            Self::Norp => "NORP",
            Self::Fac => "FAC",
            Self::Org => "ORG",
            Self::Gpe => "GPE",
            Self::Loc => "LOC",
            Self::Product => "PRODUCT",
            Self::Event => "EVENT",
            Self::WorkOfArt => "WORK_OF_ART",
            Self::Law => "LAW",
            Self::Language => "LANGUAGE",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Percent => "PERCENT",
            Self::Money => "MONEY",
            Self::Quantity => "QUANTITY",
            Self::Ordinal => "ORDINAL",
            Self::Cardinal => "CARDINAL",
            Self::Other(label) => label,
        }
    }
}

impl From<&str> for EntityLabel {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PERSON" => Self::Person,
            "NORP" => Self::Norp,
            "FAC" => Self::Fac,
            "ORG" => Self::Org,
            "GPE" => Self::Gpe,
            "LOC" => Self::Loc,
            "PRODUCT" => Self::Product,
            "EVENT" => Self::Event,
            "WORK_OF_ART" => Self::WorkOfArt,
            "LAW" => Self::Law,
            "LANGUAGE" => Self::Language,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "PERCENT" => Self::Percent,
            "MONEY" => Self::Money,
            "QUANTITY" => Self::Quantity,
            "ORDINAL" => Self::Ordinal,
            "CARDINAL" => Self::Cardinal,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl From<String> for EntityLabel {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<EntityLabel> for String {
    fn from(label: EntityLabel) -> Self {
        label.as_str().to_string()
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Half-open token range `[start, end)` produced by the annotation adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedSpan {
    pub start: usize,
    pub end: usize,

    /// Entity category (None for noun chunks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<EntityLabel>,
}

impl AnnotatedSpan {
    /// Create an unlabelled span
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            label: None,
        }
    }

    /// Create an entity span
    pub fn entity(start: usize, end: usize, label: impl Into<EntityLabel>) -> Self {
        Self {
            start,
            end,
            label: Some(label.into()),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether two ranges share at least one token
    pub fn overlaps(&self, other: &AnnotatedSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check the range against a sentence of `len` tokens
    pub fn is_within(&self, len: usize) -> bool {
        self.start < self.end && self.end <= len
    }
}

// ============================================================================
// Sentences and Documents
// ============================================================================

/// One annotated sentence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Ordered tokens
    pub tokens: Vec<Token>,

    /// Named-entity spans with labels
    #[serde(default)]
    pub entities: Vec<AnnotatedSpan>,

    /// Noun-chunk spans
    #[serde(default)]
    pub noun_chunks: Vec<AnnotatedSpan>,
}

impl Sentence {
    /// Create a sentence without spans
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            entities: Vec::new(),
            noun_chunks: Vec::new(),
        }
    }

    /// Add an entity span
    pub fn with_entity(mut self, start: usize, end: usize, label: impl Into<EntityLabel>) -> Self {
        self.entities.push(AnnotatedSpan::entity(start, end, label));
        self
    }

    /// Add a noun-chunk span
    pub fn with_noun_chunk(mut self, start: usize, end: usize) -> Self {
        self.noun_chunks.push(AnnotatedSpan::new(start, end));
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Indices of tokens tagged as verbs, in order
    pub fn verbs(&self) -> Vec<usize> {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_verb())
            .map(|(i, _)| i)
            .collect()
    }

    /// Surface text joined by single spaces
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Document title, the fallback subject.
///
/// Deserializes from a plain string or from an annotated token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TitleRepr")]
pub struct Title {
    pub text: String,
    pub tokens: Vec<Token>,
}

impl Title {
    /// Create a title from plain text.
    ///
    /// Each word becomes a PROPN token. Punctuation at word edges is split
    /// off into PUNCT tokens. Stop words are only known for annotated titles.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut tokens = Vec::new();
        for word in text.split_whitespace() {
            let core = word.trim_matches(|c: char| c.is_ascii_punctuation());
            if core.is_empty() {
                tokens.extend(word.chars().map(punct_token));
                continue;
            }
            let start = word.len() - word.trim_start_matches(|c: char| c.is_ascii_punctuation()).len();
            tokens.extend(word[..start].chars().map(punct_token));
            tokens.push(Token::new(core, core, PartOfSpeech::Propn));
            tokens.extend(word[start + core.len()..].chars().map(punct_token));
        }
        Self { text, tokens }
    }

    /// Create a title from adapter tokens
    pub fn annotated(tokens: Vec<Token>) -> Self {
        let text = tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self { text, tokens }
    }

    /// No content token to stand in as a subject
    pub fn is_empty(&self) -> bool {
        !self.tokens.iter().any(Token::is_content)
    }
}

fn punct_token(c: char) -> Token {
    let text = c.to_string();
    Token::new(text.clone(), text, PartOfSpeech::Punct)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TitleRepr {
    Plain(String),
    Annotated {
        #[serde(default)]
        text: Option<String>,
        tokens: Vec<Token>,
    },
}

impl From<TitleRepr> for Title {
    fn from(repr: TitleRepr) -> Self {
        match repr {
            TitleRepr::Plain(text) => Title::new(text),
            TitleRepr::Annotated { text, tokens } => {
                let mut title = Title::annotated(tokens);
                if let Some(text) = text {
                    title.text = text;
                }
                title
            }
        }
    }
}

/// An annotated document: the annotation adapter's output contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Fallback default subject
    #[serde(default)]
    pub title: Option<Title>,

    /// Lowercase domain terms not recognized by the adapter
    #[serde(default)]
    pub domain_terms: Vec<String>,

    /// Sentences in document order
    #[serde(default)]
    pub sentences: Vec<Sentence>,
}

impl Document {
    /// Create a titled document
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(Title::new(title)),
            ..Default::default()
        }
    }

    /// Create a document without a title
    pub fn untitled() -> Self {
        Self::default()
    }

    /// Add a sentence
    pub fn with_sentence(mut self, sentence: Sentence) -> Self {
        self.sentences.push(sentence);
        self
    }

    /// Add domain terms
    pub fn with_domain_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domain_terms.extend(terms.into_iter().map(Into::into));
        self
    }

    /// Parse a pre-annotated document from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Triplets
// ============================================================================

/// A (subject, relation, object) row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triplet {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

impl Triplet {
    /// Create a new triplet
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }

    /// Subject and object are the same text
    pub fn is_self_loop(&self) -> bool {
        self.subject == self.object
    }
}

impl std::fmt::Display for Triplet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.relation, self.object)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// NLP annotation pipeline.
///
/// Initialized once per process and read-only afterwards; the extractor
/// only consumes its [`Document`] output.
pub trait Annotator: Send + Sync {
    /// Annotate raw text into sentences of tokens and spans
    fn annotate(&self, title: &str, text: &str) -> Result<Document>;

    /// Get annotator name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
