use crate::model::CanonicalMaterial;
use crate::parsing::{NormalizedText, Phrase, Term};
use crate::rules::schema::CompositeScope;
use crate::rules::{CompositeRule, Tables};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Terms shorter than this never name a material.
const MIN_TERM_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Composite,
    Dictionary,
}

/// A term resolved to a canonical material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialHit {
    /// The term (or phrase, for phrase rules) that matched.
    pub term: String,
    pub material: CanonicalMaterial,
    pub kind: MatchKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

/// Exact resolution of one or more inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub hits: Vec<MaterialHit>,
    /// Terms left for the semantic fallback.
    pub unresolved: Vec<String>,
    /// Terms dropped as meaning "no material".
    pub ignored: Vec<String>,
}

impl Resolution {
    pub fn materials(&self) -> BTreeSet<CanonicalMaterial> {
        self.hits.iter().map(|h| h.material).collect()
    }

    /// Hit count per material, indexed by `CanonicalMaterial::index`.
    pub fn counts(&self) -> [usize; 6] {
        let mut counts = [0; 6];
        for hit in &self.hits {
            counts[hit.material.index()] += 1;
        }
        counts
    }

    pub fn merge(&mut self, other: Resolution) {
        self.hits.extend(other.hits);
        for term in other.unresolved {
            if !self.unresolved.contains(&term) {
                self.unresolved.push(term);
            }
        }
        self.ignored.extend(other.ignored);
    }
}

/// Maps raw terms to canonical materials by exact lookup.
///
/// Order per term: token-level composite rules, then the dictionary. Phrase
/// rules run first over a whole phrase and consume the terms they matched.
#[derive(Debug, Clone)]
pub struct SynonymResolver {
    synonyms: HashMap<String, CanonicalMaterial>,
    composites: Vec<CompositeRule>,
    ignore: HashSet<String>,
}

impl SynonymResolver {
    pub fn new(
        synonyms: HashMap<String, CanonicalMaterial>,
        composites: Vec<CompositeRule>,
        ignore: HashSet<String>,
    ) -> Self {
        SynonymResolver {
            synonyms,
            composites,
            ignore,
        }
    }

    pub fn from_tables(tables: &Tables) -> Self {
        SynonymResolver::new(
            tables.synonyms().clone(),
            tables.composites().to_vec(),
            tables.ignore().clone(),
        )
    }

    /// Resolve a single cleaned term.
    pub fn resolve_term(&self, term: &str) -> Option<(CanonicalMaterial, MatchKind, Option<&str>)> {
        for rule in self.token_rules() {
            if rule.all_of.iter().all(|t| term.contains(t.as_str())) {
                return Some((rule.material, MatchKind::Composite, Some(rule.name.as_str())));
            }
        }
        self.synonyms
            .get(term)
            .map(|m| (*m, MatchKind::Dictionary, None))
    }

    /// True for values that mean "no material": too short, no letters, or listed.
    pub fn is_ignored(&self, term: &str) -> bool {
        term.chars().count() < MIN_TERM_CHARS
            || !term.chars().any(char::is_alphabetic)
            || self.ignore.contains(term)
    }

    pub fn resolve(&self, text: &NormalizedText) -> Resolution {
        let mut resolution = Resolution::default();
        for phrase in &text.phrases {
            self.resolve_phrase(phrase, &mut resolution);
        }
        resolution
    }

    fn resolve_phrase(&self, phrase: &Phrase, out: &mut Resolution) {
        if self.ignore.contains(phrase.raw.trim()) {
            tracing::trace!(phrase = %phrase.raw, "phrase ignored");
            out.ignored.push(phrase.raw.clone());
            return;
        }

        let mut consumed = vec![false; phrase.terms.len()];
        for rule in self.phrase_rules() {
            if let Some(indices) = match_phrase_rule(rule, &phrase.terms, &consumed) {
                tracing::trace!(phrase = %phrase.raw, rule = %rule.name, "phrase rule matched");
                for i in indices {
                    consumed[i] = true;
                }
                out.hits.push(MaterialHit {
                    term: phrase.raw.clone(),
                    material: rule.material,
                    kind: MatchKind::Composite,
                    rule: Some(rule.name.clone()),
                });
            }
        }

        for (term, _) in phrase
            .terms
            .iter()
            .zip(consumed.iter())
            .filter(|(_, used)| !**used)
        {
            self.resolve_single(term, out);
        }
    }

    fn resolve_single(&self, term: &Term, out: &mut Resolution) {
        if self.is_ignored(&term.text) {
            out.ignored.push(term.text.clone());
            return;
        }

        // Compound parts are offered before the whole term
        let candidates = term
            .parts
            .iter()
            .filter(|_| term.is_compound())
            .filter(|p| !self.is_ignored(p))
            .chain(std::iter::once(&term.text));

        for candidate in candidates {
            if let Some((material, kind, rule)) = self.resolve_term(candidate) {
                tracing::trace!(term = %term.text, via = %candidate, %material, "resolved");
                out.hits.push(MaterialHit {
                    term: candidate.clone(),
                    material,
                    kind,
                    rule: rule.map(str::to_string),
                });
                return;
            }
        }

        if !out.unresolved.contains(&term.text) {
            out.unresolved.push(term.text.clone());
        }
    }

    fn token_rules(&self) -> impl Iterator<Item = &CompositeRule> {
        self.composites
            .iter()
            .filter(|r| r.scope == CompositeScope::Token)
    }

    fn phrase_rules(&self) -> impl Iterator<Item = &CompositeRule> {
        self.composites
            .iter()
            .filter(|r| r.scope == CompositeScope::Phrase)
    }
}

/// Indices of the unconsumed terms satisfying every trigger, if all are found.
fn match_phrase_rule(rule: &CompositeRule, terms: &[Term], consumed: &[bool]) -> Option<Vec<usize>> {
    let mut indices = Vec::with_capacity(rule.all_of.len());
    for trigger in &rule.all_of {
        let found = terms.iter().enumerate().position(|(i, t)| {
            !consumed[i] && !indices.contains(&i) && t.text.contains(trigger.as_str())
        })?;
        indices.push(found);
    }
    Some(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Language;
    use crate::parsing::TextNormalizer;
    use crate::rules::builtin::load_builtin;

    fn resolve(text: &str, lang: Language) -> Resolution {
        let tables = load_builtin().unwrap();
        let resolver = SynonymResolver::from_tables(&tables);
        let normalized = TextNormalizer::default().normalize(text, lang);
        resolver.resolve(&normalized)
    }

    #[test]
    fn test_dictionary_hit() {
        let r = resolve("verre", Language::Fr);
        assert_eq!(r.hits.len(), 1);
        assert_eq!(r.hits[0].material, CanonicalMaterial::Glass);
        assert_eq!(r.hits[0].kind, MatchKind::Dictionary);
    }

    #[test]
    fn test_prefixed_tag_hit() {
        let r = resolve("en:aluminium", Language::En);
        assert_eq!(r.materials(), BTreeSet::from([CanonicalMaterial::Metal]));
    }

    #[test]
    fn test_tetra_composite_on_compound() {
        let r = resolve("tetra-pak", Language::En);
        assert_eq!(r.hits.len(), 1);
        assert_eq!(r.hits[0].material, CanonicalMaterial::Paper);
        assert_eq!(r.hits[0].kind, MatchKind::Composite);
        assert_eq!(r.hits[0].term, "tetra");
    }

    #[test]
    fn test_phrase_rule_consumes_terms() {
        let r = resolve("bouteille en verre", Language::Fr);
        // The phrase rule fires and "verre" is not counted a second time
        assert_eq!(r.hits.len(), 1);
        assert_eq!(r.hits[0].material, CanonicalMaterial::Glass);
        assert_eq!(r.hits[0].rule.as_deref(), Some("bouteille-en-verre"));
        assert!(r.unresolved.is_empty());
    }

    #[test]
    fn test_compound_part_before_whole() {
        let r = resolve("en:pet-1-polyethylene-terephthalate", Language::En);
        assert_eq!(r.hits.len(), 1);
        assert_eq!(r.hits[0].term, "pet");
        assert_eq!(r.hits[0].material, CanonicalMaterial::Plastic);
    }

    #[test]
    fn test_ignore_list() {
        let r = resolve("Non spécifié", Language::Fr);
        assert!(r.hits.is_empty());
        assert!(r.unresolved.is_empty());
        assert_eq!(r.ignored, vec!["non spécifié"]);

        let r = resolve("unknown", Language::En);
        assert!(r.hits.is_empty());
        assert!(r.unresolved.is_empty());
    }

    #[test]
    fn test_short_and_numeric_terms_ignored() {
        let r = resolve("x 33", Language::En);
        assert!(r.unresolved.is_empty());
        assert_eq!(r.ignored.len(), 2);
    }

    #[test]
    fn test_unresolved_terms_collected_once() {
        let r = resolve("yaourt, yaourt", Language::Fr);
        assert!(r.hits.is_empty());
        assert_eq!(r.unresolved, vec!["yaourt"]);
    }

    #[test]
    fn test_counts_and_merge() {
        let mut r = resolve("plastic bottle", Language::En);
        r.merge(resolve("plastic", Language::En));
        r.merge(resolve("metal", Language::En));
        let counts = r.counts();
        assert_eq!(counts[CanonicalMaterial::Plastic.index()], 2);
        assert_eq!(counts[CanonicalMaterial::Metal.index()], 1);
        assert_eq!(r.unresolved, vec!["bottle"]);
    }
}
