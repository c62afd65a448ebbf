use crate::classify::confidence::ConfidenceNormalizer;
use crate::classify::outcome::{
    CategoryScore, ClassificationResult, Explanation, ProductOutcome, RankedScore, Strategy,
};
use crate::classify::resolver::{Resolution, SynonymResolver};
use crate::classify::scoring::{self, CategoryScorer, ScoringInput};
use crate::classify::semantic::{Embedder, HashedNgramEmbedder, SemanticScorer};
use crate::config::{validate_config, EngineConfig};
use crate::error::TribacError;
use crate::model::{BinCategory, CanonicalMaterial, Language, ProductInput};
use crate::parsing::stopwords::StopwordSets;
use crate::parsing::{detect_language, NormalizedText, TextNormalizer};
use crate::rules::builtin::load_builtin;
use crate::rules::Tables;
use crate::trace::{Trace, TraceStepType};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Packaging classifier. Build once, share by reference across threads.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    tables: Tables,
    normalizer: TextNormalizer,
    resolver: SynonymResolver,
    scorer: CategoryScorer,
    semantic: SemanticScorer,
    confidence: ConfidenceNormalizer,
}

/// Everything one classification run produced, before it is narrowed down
/// to a result or an explanation.
struct RunOutput {
    result: ClassificationResult,
    resolution: Resolution,
    scores: Vec<CategoryScore>,
}

impl Engine {
    /// Engine with the built-in tables and the hashed trigram embedder.
    pub fn new(config: EngineConfig) -> Result<Self, TribacError> {
        let tables = load_builtin()?;
        Engine::with_tables(config, tables)
    }

    pub fn with_tables(config: EngineConfig, tables: Tables) -> Result<Self, TribacError> {
        let embedder = Arc::new(HashedNgramEmbedder::new(config.embedding_dimension));
        Engine::with_components(config, tables, embedder)
    }

    pub fn with_components(
        config: EngineConfig,
        tables: Tables,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, TribacError> {
        validate_config(&config)?;

        let stopwords = match &config.stopwords_dir {
            Some(dir) => StopwordSets::from_dir(dir),
            None => StopwordSets::builtin(),
        };
        let normalizer = TextNormalizer::new(stopwords);
        let resolver = SynonymResolver::from_tables(&tables);
        let scorer = CategoryScorer::new(&tables, &normalizer);
        let semantic = SemanticScorer::new(embedder, config.cache_capacity)?;
        let confidence = ConfidenceNormalizer::from_config(&config);

        tracing::info!(
            tables = %tables.name,
            version = %tables.version,
            embedder = semantic.backend_name(),
            "classification engine ready"
        );

        Ok(Engine {
            config,
            tables,
            normalizer,
            resolver,
            scorer,
            semantic,
            confidence,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn embedder_name(&self) -> &str {
        self.semantic.backend_name()
    }

    /// Classify one product from its packaging text, material tags and
    /// optional main material. Never fails; degenerate input is unknown.
    pub fn classify<S: AsRef<str>>(
        &self,
        packaging: &str,
        materials: &[S],
        main_material: Option<&str>,
    ) -> ClassificationResult {
        self.run(packaging, materials, main_material, &mut Trace::disabled())
            .result
    }

    /// Same inputs as `classify`, with the full ranking and decision steps.
    pub fn explain<S: AsRef<str>>(
        &self,
        packaging: &str,
        materials: &[S],
        main_material: Option<&str>,
    ) -> Explanation {
        let mut trace = Trace::enabled();
        let out = self.run(packaging, materials, main_material, &mut trace);

        let ranking = scoring::ranked(&out.scores)
            .into_iter()
            .map(|s| RankedScore {
                bin: s.bin,
                score: s.score,
                unadjusted: s.unadjusted,
            })
            .collect();

        Explanation {
            result: out.result,
            ranking,
            resolution: out.resolution,
            steps: trace.into_steps(),
        }
    }

    pub fn classify_product(&self, product: &ProductInput) -> ProductOutcome {
        let result = self.classify(
            &product.packaging,
            &product.materials,
            product.main_material.as_deref(),
        );
        ProductOutcome::new(product.name.clone(), result, product.has_recycling_label())
    }

    pub fn classify_products(&self, products: &[ProductInput]) -> Vec<ProductOutcome> {
        products.iter().map(|p| self.classify_product(p)).collect()
    }

    fn run<S: AsRef<str>>(
        &self,
        packaging: &str,
        materials: &[S],
        main_material: Option<&str>,
        trace: &mut Trace,
    ) -> RunOutput {
        let packaging = packaging.trim();
        let materials: Vec<&str> = materials
            .iter()
            .map(|m| m.as_ref().trim())
            .filter(|m| !m.is_empty())
            .collect();
        let main_material = main_material.map(str::trim).filter(|m| !m.is_empty());

        let language = pick_language(packaging, &materials, main_material);
        trace.push(TraceStepType::DetectLanguage, || {
            format!("Detected language '{}'", language)
        });

        let packaging_text = self.normalizer.normalize(packaging, language);
        let material_texts: Vec<NormalizedText> = materials
            .iter()
            .map(|m| self.normalizer.normalize(m, language))
            .collect();
        let main_text = main_material
            .map(|m| self.normalizer.normalize(m, language))
            .unwrap_or_default();

        let mut all_texts: Vec<&NormalizedText> = vec![&packaging_text];
        all_texts.extend(material_texts.iter());
        all_texts.push(&main_text);
        trace.push(TraceStepType::Normalize, || {
            let joined: Vec<String> = all_texts
                .iter()
                .map(|t| t.joined())
                .filter(|j| !j.is_empty())
                .collect();
            format!("Normalized tokens: [{}]", joined.join(" | "))
        });

        let main_resolution = self.resolver.resolve(&main_text);
        let main_hit = main_resolution.hits.first().map(|h| h.material);
        let mut resolution = self.resolver.resolve(&packaging_text);
        for text in &material_texts {
            resolution.merge(self.resolver.resolve(text));
        }
        resolution.merge(main_resolution);
        for hit in &resolution.hits {
            trace.push(TraceStepType::ResolveMaterial, || match &hit.rule {
                Some(rule) => format!("'{}' -> {} (rule '{}')", hit.term, hit.material, rule),
                None => format!("'{}' -> {}", hit.term, hit.material),
            });
        }

        let resolved: BTreeSet<CanonicalMaterial> = resolution.materials();
        let scores = self.scorer.score(&ScoringInput {
            texts: &all_texts,
            language,
            materials: &resolved,
            main_material: main_hit,
        });
        for s in scores.iter().filter(|s| s.matches > 0) {
            trace.push(TraceStepType::KeywordScore, || {
                format!("{}: {} match(es), raw score {:.2}", s.bin, s.matches, s.unadjusted)
            });
        }
        for s in scores.iter().filter(|s| !s.adjustments.is_empty()) {
            trace.push(TraceStepType::Adjustment, || {
                let factors: Vec<String> = s
                    .adjustments
                    .iter()
                    .map(|a| format!("{:?} x{}", a.rule, a.factor))
                    .collect();
                format!("{}: {} -> {:.3}", s.bin, factors.join(", "), s.score)
            });
        }

        let empty = all_texts.iter().all(|t| t.is_empty());
        let result = if empty {
            tracing::debug!("empty input, nothing to classify");
            ClassificationResult::unknown(language)
        } else {
            let mut result = self.decide(language, main_hit, &resolution, &scores, trace);
            result.breakdown = Some(scores.clone());
            result
        };

        trace.push(TraceStepType::Decision, || match result.strategy {
            Some(strategy) => format!(
                "{} with confidence {:.2} via {}",
                result.label(),
                result.confidence,
                strategy.as_str()
            ),
            None => format!("{} (no strategy applied)", result.label()),
        });

        RunOutput {
            result,
            resolution,
            scores,
        }
    }

    /// Strategies in priority order: exact match, keyword scores, semantic.
    fn decide(
        &self,
        language: Language,
        main_hit: Option<CanonicalMaterial>,
        resolution: &Resolution,
        scores: &[CategoryScore],
        trace: &mut Trace,
    ) -> ClassificationResult {
        if let Some(material) = main_hit {
            tracing::debug!(%material, "main material decides");
            return decided(
                language,
                material.bin(),
                self.confidence.exact(),
                Strategy::ExactDictionary,
            );
        }

        if let Some(material) = majority_material(resolution, scores) {
            tracing::debug!(%material, hits = resolution.hits.len(), "exact match decides");
            return decided(
                language,
                material.bin(),
                self.confidence.exact(),
                Strategy::ExactDictionary,
            );
        }

        if let Some(top) = scoring::best(scores).filter(|s| s.score > 0.0) {
            tracing::debug!(bin = %top.bin, score = top.score, "keyword scoring decides");
            return decided(
                language,
                top.bin,
                self.confidence.keyword(top.score),
                Strategy::KeywordScoring,
            );
        }

        if resolution.unresolved.is_empty() {
            tracing::debug!("no keyword evidence and no unresolved terms");
            return ClassificationResult::unknown(language);
        }

        let mut result = ClassificationResult::unknown(language);
        result.strategy = Some(Strategy::SemanticSimilarity);
        match self.semantic.best_match(&resolution.unresolved) {
            Ok(Some(found)) => {
                trace.push(TraceStepType::SemanticMatch, || {
                    format!(
                        "'{}' closest to {} via '{}' (similarity {:.3})",
                        found.token, found.material, found.reference, found.similarity
                    )
                });
                match self.confidence.semantic(found.similarity) {
                    Some(confidence) => {
                        tracing::debug!(
                            token = %found.token,
                            material = %found.material,
                            confidence,
                            "semantic match decides"
                        );
                        result.bin = Some(found.bin);
                        result.confidence = confidence;
                    }
                    None => {
                        tracing::debug!(
                            similarity = found.similarity,
                            threshold = self.confidence.min_semantic_confidence,
                            "semantic match below threshold"
                        );
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, backend = self.embedder_name(), "semantic scoring failed");
                trace.push(TraceStepType::SemanticMatch, || format!("Embedding failed: {}", e));
                result.error = Some(e.to_string());
            }
        }
        result
    }
}

fn decided(
    language: Language,
    bin: BinCategory,
    confidence: f64,
    strategy: Strategy,
) -> ClassificationResult {
    ClassificationResult {
        bin: Some(bin),
        confidence,
        language,
        strategy: Some(strategy),
        breakdown: None,
        error: None,
    }
}

/// Language of the packaging text, falling back to the material tags and
/// then the main material when packaging is blank.
fn pick_language(packaging: &str, materials: &[&str], main_material: Option<&str>) -> Language {
    if !packaging.is_empty() {
        return detect_language(packaging);
    }
    if !materials.is_empty() {
        return detect_language(&materials.join(" "));
    }
    detect_language(main_material.unwrap_or_default())
}

/// Most frequent resolved material. Count ties go to the candidate whose bin
/// has the higher adjusted keyword score, then to the earlier material.
fn majority_material(resolution: &Resolution, scores: &[CategoryScore]) -> Option<CanonicalMaterial> {
    let counts = resolution.counts();
    let top = counts.iter().copied().max().filter(|&c| c > 0)?;

    let score_of = |bin: BinCategory| {
        scores
            .iter()
            .find(|s| s.bin == bin)
            .map(|s| s.score)
            .unwrap_or(0.0)
    };

    let mut best: Option<(CanonicalMaterial, f64)> = None;
    for material in CanonicalMaterial::ALL {
        if counts[material.index()] != top {
            continue;
        }
        let score = score_of(material.bin());
        match best {
            Some((_, s)) if score <= s => {}
            _ => best = Some((material, score)),
        }
    }
    best.map(|(m, _)| m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;

    const NO_TAGS: &[&str] = &[];

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).unwrap()
    }

    struct FailingEmbedder {
        fail_after: std::sync::atomic::AtomicUsize,
    }

    impl Embedder for FailingEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            use std::sync::atomic::Ordering;
            // Reference embeddings succeed; later calls fail
            if self.fail_after.fetch_sub(1, Ordering::SeqCst) == 0 {
                self.fail_after.store(0, Ordering::SeqCst);
                return Err(EmbeddingError::Backend("model offline".into()));
            }
            Ok(vec![1.0; 8])
        }

        fn dimension(&self) -> usize {
            8
        }

        fn backend_name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn test_main_material_is_authoritative() {
        let result = engine().classify("plastic bottle", &["plastic"], Some("en:glass"));
        assert_eq!(result.bin, Some(BinCategory::Glass));
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.strategy, Some(Strategy::ExactDictionary));
    }

    #[test]
    fn test_majority_material_wins() {
        let result = engine().classify("", &["en:glass", "verre", "en:aluminium"], None);
        assert_eq!(result.bin, Some(BinCategory::Glass));
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_majority_tie_broken_by_keyword_score() {
        // One plastic hit, one metal hit; plastic + metal boosts mixed-recyclable
        let result = engine().classify("", &["plastic", "metal"], None);
        assert_eq!(result.bin, Some(BinCategory::MixedRecyclable));
    }

    #[test]
    fn test_keyword_path_without_exact_hits() {
        let result = engine().classify("bottle", NO_TAGS, None);
        assert_eq!(result.bin, Some(BinCategory::MixedRecyclable));
        assert_eq!(result.strategy, Some(Strategy::KeywordScoring));
        // 0.8 / 5.0
        assert!((result.confidence - 0.16).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_is_unknown() {
        let result = engine().classify("   ", &["", " "], Some(""));
        assert!(result.is_unknown());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.language, Language::En);
        assert!(result.breakdown.is_none());
        assert!(result.strategy.is_none());
    }

    #[test]
    fn test_ignored_only_is_unknown() {
        let result = engine().classify("", &["unknown", "n/a"], None);
        assert!(result.is_unknown());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_embedder_failure_reports_error() {
        let embedder = Arc::new(FailingEmbedder {
            fail_after: std::sync::atomic::AtomicUsize::new(6),
        });
        let engine =
            Engine::with_components(EngineConfig::default(), load_builtin().unwrap(), embedder).unwrap();
        let result = engine.classify("", &["zzqx"], None);
        assert!(result.is_unknown());
        assert_eq!(result.confidence, 0.0);
        assert!(result.error.as_deref().unwrap().contains("model offline"));
    }

    #[test]
    fn test_majority_material_none_without_hits() {
        assert_eq!(majority_material(&Resolution::default(), &[]), None);
    }

    #[test]
    fn test_pick_language_falls_back_to_tags() {
        assert_eq!(pick_language("", &["fr:bouteille", "fr:verre"], None), Language::Fr);
        assert_eq!(pick_language("the bottle", &["fr:bouteille"], None), Language::En);
    }
}
