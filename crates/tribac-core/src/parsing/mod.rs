pub mod language;
pub mod normalize;
pub mod stopwords;

use crate::model::Language;
use normalize::{clean_term, split_compound, split_segments, strip_language_prefix};
use serde::Serialize;
use stopwords::StopwordSets;

pub use language::detect_language;

/// A whitespace-delimited term, with its hyphen-separated parts.
///
/// `parts` holds at least one entry; for a plain word it is the word itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Term {
    pub text: String,
    pub parts: Vec<String>,
}

impl Term {
    pub fn is_compound(&self) -> bool {
        self.parts.len() > 1
    }
}

/// One comma-separated segment of an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phrase {
    /// Lowercased, prefix-stripped segment text before stopword removal.
    pub raw: String,
    pub terms: Vec<Term>,
}

impl Phrase {
    /// Flat token stream used for keyword matching.
    pub fn tokens(&self) -> Vec<&str> {
        self.terms
            .iter()
            .flat_map(|t| t.parts.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedText {
    pub phrases: Vec<Phrase>,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.phrases.iter().all(|p| p.terms.is_empty())
    }

    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.phrases.iter().flat_map(|p| p.terms.iter())
    }

    /// Space-joined tokens, for diagnostics.
    pub fn joined(&self) -> String {
        self.phrases
            .iter()
            .flat_map(|p| p.tokens())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Lowercases, strips tag prefixes, tokenizes and filters stopwords.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stopwords: StopwordSets,
}

impl TextNormalizer {
    pub fn new(stopwords: StopwordSets) -> Self {
        TextNormalizer { stopwords }
    }

    /// Normalize free text or a single tag for the given language.
    pub fn normalize(&self, text: &str, lang: Language) -> NormalizedText {
        let lower = text.to_lowercase();
        let mut phrases = Vec::new();

        for segment in split_segments(&lower) {
            let raw = segment
                .iter()
                .map(|t| strip_language_prefix(t))
                .collect::<Vec<_>>()
                .join(" ");

            let terms: Vec<Term> = segment
                .iter()
                .filter_map(|raw_term| self.make_term(raw_term, lang))
                .collect();

            phrases.push(Phrase { raw, terms });
        }

        NormalizedText { phrases }
    }

    fn make_term(&self, raw_term: &str, lang: Language) -> Option<Term> {
        let text = clean_term(raw_term);
        if text.is_empty() || self.stopwords.is_stopword(lang, &text) {
            return None;
        }

        let parts: Vec<String> = split_compound(&text)
            .into_iter()
            .filter(|p| !self.stopwords.is_stopword(lang, p))
            .collect();
        if parts.is_empty() {
            return None;
        }

        Some(Term { text, parts })
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        TextNormalizer::new(StopwordSets::builtin())
    }
}
