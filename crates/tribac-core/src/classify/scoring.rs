use crate::classify::outcome::{Adjustment, AdjustmentRule, CategoryScore};
use crate::model::{BinCategory, CanonicalMaterial, Language};
use crate::parsing::{NormalizedText, TextNormalizer};
use crate::rules::Tables;
use std::collections::BTreeSet;

const MIXED_WITH_METAL_BOOST: f64 = 1.5;
const METAL_WITH_PLASTIC_PENALTY: f64 = 0.5;
const GLASS_WITH_OTHER_PENALTY: f64 = 0.3;
const GENERAL_WITH_GLASS_BOOST: f64 = 1.5;
const INCOMPATIBLE_PENALTY: f64 = 0.1;
const DOMINANT_BOOST: f64 = 3.0;
const NON_DOMINANT_PENALTY: f64 = 0.3;

/// Inputs to keyword scoring for one classification call.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub texts: &'a [&'a NormalizedText],
    pub language: Language,
    /// Canonical materials resolved exactly, including the main material.
    pub materials: &'a BTreeSet<CanonicalMaterial>,
    pub main_material: Option<CanonicalMaterial>,
}

#[derive(Debug, Clone)]
struct BinKeywords {
    bin: BinCategory,
    weight: f64,
    incompatible: BTreeSet<CanonicalMaterial>,
    /// Keyword token sequences, normalized per detected language: [en, fr].
    sequences: [Vec<Vec<String>>; 2],
}

/// Weighted keyword scoring with material adjustments.
#[derive(Debug, Clone)]
pub struct CategoryScorer {
    bins: Vec<BinKeywords>,
}

impl CategoryScorer {
    /// Pre-normalize every keyword of both languages once per text language.
    pub fn new(tables: &Tables, normalizer: &TextNormalizer) -> Self {
        let bins = tables
            .bins()
            .iter()
            .map(|profile| {
                let all: Vec<&String> = profile
                    .keywords
                    .en
                    .iter()
                    .chain(profile.keywords.fr.iter())
                    .collect();
                BinKeywords {
                    bin: profile.bin,
                    weight: profile.weight,
                    incompatible: profile.incompatible.clone(),
                    sequences: [
                        keyword_sequences(&all, normalizer, Language::En),
                        keyword_sequences(&all, normalizer, Language::Fr),
                    ],
                }
            })
            .collect();
        CategoryScorer { bins }
    }

    /// Score every bin, in the fixed bin order.
    pub fn score(&self, input: &ScoringInput<'_>) -> Vec<CategoryScore> {
        let lang_idx = match input.language {
            Language::En => 0,
            Language::Fr => 1,
        };

        let token_streams: Vec<Vec<&str>> = input
            .texts
            .iter()
            .flat_map(|t| t.phrases.iter().map(|p| p.tokens()))
            .collect();

        let mut scores: Vec<CategoryScore> = self
            .bins
            .iter()
            .map(|bk| {
                let matches: usize = bk.sequences[lang_idx]
                    .iter()
                    .map(|seq| {
                        token_streams
                            .iter()
                            .map(|tokens| count_occurrences(tokens, seq))
                            .sum::<usize>()
                    })
                    .sum();
                let unadjusted = matches as f64 * bk.weight;
                CategoryScore {
                    bin: bk.bin,
                    matches,
                    unadjusted,
                    score: unadjusted,
                    adjustments: Vec::new(),
                }
            })
            .collect();

        if input.main_material.is_none() {
            apply_combinations(&mut scores, input.materials);
        }
        self.apply_incompatibilities(&mut scores, input.materials);
        if let Some(main) = input.main_material {
            apply_dominance(&mut scores, main.bin());
        }

        scores
    }

    fn apply_incompatibilities(&self, scores: &mut [CategoryScore], materials: &BTreeSet<CanonicalMaterial>) {
        for bk in &self.bins {
            if !bk.incompatible.is_disjoint(materials) {
                adjust(scores, bk.bin, AdjustmentRule::Incompatibility, INCOMPATIBLE_PENALTY);
            }
        }
    }
}

fn apply_combinations(scores: &mut [CategoryScore], materials: &BTreeSet<CanonicalMaterial>) {
    if materials.contains(&CanonicalMaterial::Plastic) && materials.contains(&CanonicalMaterial::Metal) {
        adjust(scores, BinCategory::MixedRecyclable, AdjustmentRule::Combination, MIXED_WITH_METAL_BOOST);
        adjust(scores, BinCategory::Metal, AdjustmentRule::Combination, METAL_WITH_PLASTIC_PENALTY);
    }
    if materials.contains(&CanonicalMaterial::Glass) && materials.len() > 1 {
        adjust(scores, BinCategory::Glass, AdjustmentRule::Combination, GLASS_WITH_OTHER_PENALTY);
        adjust(scores, BinCategory::GeneralWaste, AdjustmentRule::Combination, GENERAL_WITH_GLASS_BOOST);
    }
}

fn apply_dominance(scores: &mut [CategoryScore], dominant: BinCategory) {
    for bin in BinCategory::ALL {
        let factor = if bin == dominant {
            DOMINANT_BOOST
        } else {
            NON_DOMINANT_PENALTY
        };
        adjust(scores, bin, AdjustmentRule::Dominance, factor);
    }
}

fn adjust(scores: &mut [CategoryScore], bin: BinCategory, rule: AdjustmentRule, factor: f64) {
    if let Some(s) = scores.iter_mut().find(|s| s.bin == bin) {
        s.score *= factor;
        s.adjustments.push(Adjustment { rule, factor });
    }
}

/// Highest score; ties go to the earliest bin in the fixed order.
pub fn best(scores: &[CategoryScore]) -> Option<&CategoryScore> {
    let mut best: Option<&CategoryScore> = None;
    for s in scores {
        match best {
            Some(b) if s.score <= b.score => {}
            _ => best = Some(s),
        }
    }
    best
}

/// All scores sorted descending; stable, so ties keep the fixed order.
pub fn ranked(scores: &[CategoryScore]) -> Vec<&CategoryScore> {
    let mut sorted: Vec<&CategoryScore> = scores.iter().collect();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
    sorted
}

fn keyword_sequences(
    keywords: &[&String],
    normalizer: &TextNormalizer,
    lang: Language,
) -> Vec<Vec<String>> {
    let mut seen = BTreeSet::new();
    let mut sequences = Vec::new();
    for keyword in keywords {
        let normalized = normalizer.normalize(keyword, lang);
        let seq: Vec<String> = normalized
            .phrases
            .iter()
            .flat_map(|p| p.tokens())
            .map(str::to_string)
            .collect();
        if !seq.is_empty() && seen.insert(seq.clone()) {
            sequences.push(seq);
        }
    }
    sequences
}

/// Occurrences of `seq` as consecutive tokens.
fn count_occurrences(tokens: &[&str], seq: &[String]) -> usize {
    if seq.is_empty() || tokens.len() < seq.len() {
        return 0;
    }
    tokens
        .windows(seq.len())
        .filter(|w| w.iter().zip(seq).all(|(a, b)| *a == b.as_str()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin::load_builtin;

    struct Fixture {
        scorer: CategoryScorer,
        normalizer: TextNormalizer,
    }

    impl Fixture {
        fn new() -> Self {
            let tables = load_builtin().unwrap();
            let normalizer = TextNormalizer::default();
            Fixture {
                scorer: CategoryScorer::new(&tables, &normalizer),
                normalizer,
            }
        }

        fn score(
            &self,
            texts: &[&str],
            lang: Language,
            materials: &[CanonicalMaterial],
            main: Option<CanonicalMaterial>,
        ) -> Vec<CategoryScore> {
            let normalized: Vec<NormalizedText> =
                texts.iter().map(|t| self.normalizer.normalize(t, lang)).collect();
            let refs: Vec<&NormalizedText> = normalized.iter().collect();
            let materials: BTreeSet<CanonicalMaterial> = materials.iter().copied().collect();
            self.scorer.score(&ScoringInput {
                texts: &refs,
                language: lang,
                materials: &materials,
                main_material: main,
            })
        }
    }

    fn get(scores: &[CategoryScore], bin: BinCategory) -> &CategoryScore {
        scores.iter().find(|s| s.bin == bin).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_keyword_counts_and_weights() {
        let f = Fixture::new();
        let scores = f.score(&["glass bottle"], Language::En, &[], None);
        // glass, glass bottle
        assert_eq!(get(&scores, BinCategory::Glass).matches, 2);
        assert!(approx(get(&scores, BinCategory::Glass).score, 2.0));
        // bottle
        assert!(approx(get(&scores, BinCategory::MixedRecyclable).score, 0.8));
    }

    #[test]
    fn test_french_multiword_keyword() {
        let f = Fixture::new();
        let scores = f.score(&["bouteille en verre"], Language::Fr, &[], None);
        // verre, bouteille en verre
        assert_eq!(get(&scores, BinCategory::Glass).matches, 2);
        // bouteille
        assert_eq!(get(&scores, BinCategory::MixedRecyclable).matches, 1);
    }

    #[test]
    fn test_plastic_metal_combination() {
        let f = Fixture::new();
        let scores = f.score(
            &["plastic bottle", "plastic", "metal"],
            Language::En,
            &[CanonicalMaterial::Plastic, CanonicalMaterial::Metal],
            None,
        );
        let mixed = get(&scores, BinCategory::MixedRecyclable);
        // plastic x2, bottle x1 at 0.8
        assert!(approx(mixed.unadjusted, 2.4));
        assert!(approx(mixed.score, 3.6));
        let metal = get(&scores, BinCategory::Metal);
        assert!(approx(metal.unadjusted, 0.9));
        assert!(approx(metal.score, 0.45));
        assert_eq!(best(&scores).unwrap().bin, BinCategory::MixedRecyclable);
    }

    #[test]
    fn test_glass_with_other_material() {
        let f = Fixture::new();
        let scores = f.score(
            &["verre", "plastique"],
            Language::Fr,
            &[CanonicalMaterial::Glass, CanonicalMaterial::Plastic],
            None,
        );
        let glass = get(&scores, BinCategory::Glass);
        // x0.3 combination, x0.1 incompatible with plastic
        assert!(approx(glass.score, 1.0 * 0.3 * 0.1));
        assert_eq!(glass.adjustments.len(), 2);
        assert_eq!(get(&scores, BinCategory::GeneralWaste).adjustments[0].factor, 1.5);
    }

    #[test]
    fn test_incompatibility_reduces_organic() {
        let f = Fixture::new();
        let scores = f.score(
            &["compost bag", "organic", "plastic"],
            Language::En,
            &[CanonicalMaterial::Organic, CanonicalMaterial::Plastic],
            None,
        );
        let organic = get(&scores, BinCategory::Organic);
        assert!(organic.unadjusted > 0.0);
        assert!(organic.score <= organic.unadjusted * 0.1 + 1e-12);
    }

    #[test]
    fn test_main_material_dominance_skips_combinations() {
        let f = Fixture::new();
        let scores = f.score(
            &["plastic bottle", "metal"],
            Language::En,
            &[CanonicalMaterial::Plastic, CanonicalMaterial::Metal],
            Some(CanonicalMaterial::Metal),
        );
        let mixed = get(&scores, BinCategory::MixedRecyclable);
        assert!(mixed.score <= mixed.unadjusted * 0.3 + 1e-12);
        assert!(mixed
            .adjustments
            .iter()
            .all(|a| a.rule != AdjustmentRule::Combination));
        let metal = get(&scores, BinCategory::Metal);
        assert!(approx(metal.score, 0.9 * 3.0));
        assert_eq!(best(&scores).unwrap().bin, BinCategory::Metal);
    }

    #[test]
    fn test_ties_follow_fixed_order() {
        let f = Fixture::new();
        let scores = f.score(&["nothing relevant"], Language::En, &[], None);
        assert!(scores.iter().all(|s| s.score == 0.0));
        assert_eq!(best(&scores).unwrap().bin, BinCategory::Glass);

        let order: Vec<BinCategory> = ranked(&scores).iter().map(|s| s.bin).collect();
        assert_eq!(order, BinCategory::ALL.to_vec());
    }

    #[test]
    fn test_duplicate_keywords_counted_once() {
        let f = Fixture::new();
        let scores = f.score(&["magazine"], Language::En, &[], None);
        assert_eq!(get(&scores, BinCategory::Paper).matches, 1);
    }

    #[test]
    fn test_count_occurrences() {
        let seq = vec!["glass".to_string(), "bottle".to_string()];
        assert_eq!(count_occurrences(&["glass", "bottle", "glass", "bottle"], &seq), 2);
        assert_eq!(count_occurrences(&["glass"], &seq), 0);
    }
}
