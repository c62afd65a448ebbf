use crate::error::{EmbeddingError, TribacError};
use crate::model::{BinCategory, CanonicalMaterial};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use serde::Serialize;
use std::sync::Arc;

const FNV_OFFSET: u64 = 1469598103934665603;
const FNV_PRIME: u64 = 1099511628211;

/// Words embedded one by one as each material's reference vectors.
pub const REFERENCE_WORDS: [(CanonicalMaterial, &[&str]); 6] = [
    (
        CanonicalMaterial::Plastic,
        &[
            "plastic", "plastique", "polymer", "polymère", "bag", "sachet", "film", "wrap",
        ],
    ),
    (
        CanonicalMaterial::Metal,
        &[
            "metal", "métal", "aluminium", "aluminum", "steel", "acier", "tin", "can",
            "canette", "foil",
        ],
    ),
    (
        CanonicalMaterial::Glass,
        &["glass", "verre", "jar", "bocal", "flask"],
    ),
    (
        CanonicalMaterial::Paper,
        &[
            "paper", "papier", "cardboard", "carton", "paperboard", "newspaper", "journal",
            "kraft",
        ],
    ),
    (
        CanonicalMaterial::Organic,
        &[
            "organic", "organique", "food", "aliment", "compost", "vegetable", "légume",
            "fruit", "peel",
        ],
    ),
    (
        CanonicalMaterial::Hazardous,
        &[
            "hazardous", "dangereux", "battery", "pile", "chemical", "chimique", "toxic",
            "toxique", "electronic",
        ],
    ),
];

/// Text embedding backend.
///
/// Implementations must return vectors of exactly `dimension()` entries.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn dimension(&self) -> usize;

    /// Name shown in logs and CLI output.
    fn backend_name(&self) -> &str;
}

/// Character-trigram feature hashing. Deterministic and dependency-free.
///
/// Each whitespace-separated word is padded as `<word>` so prefixes and
/// suffixes hash differently from word-internal trigrams.
#[derive(Debug, Clone)]
pub struct HashedNgramEmbedder {
    dimension: usize,
}

impl HashedNgramEmbedder {
    pub fn new(dimension: usize) -> Self {
        HashedNgramEmbedder {
            dimension: dimension.max(1),
        }
    }
}

impl Embedder for HashedNgramEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dimension];
        let mut features = 0usize;

        for word in text.to_lowercase().split_whitespace() {
            let padded: Vec<char> = format!("<{}>", word).chars().collect();
            for gram in padded.windows(3) {
                let idx = (fnv1a(gram) % self.dimension as u64) as usize;
                vector[idx] += 1.0;
                features += 1;
            }
        }

        if features == 0 {
            return Err(EmbeddingError::EmptyInput);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        for x in &mut vector {
            *x /= norm;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn backend_name(&self) -> &str {
        "hashed-trigram"
    }
}

fn fnv1a(chars: &[char]) -> u64 {
    let mut hash = FNV_OFFSET;
    let mut buf = [0u8; 4];
    for c in chars {
        for byte in c.encode_utf8(&mut buf).bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

/// Cosine similarity; 0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        0.0
    } else {
        dot / (magnitude_a * magnitude_b)
    }
}

/// Bounded memo of token embeddings, safe to share between threads.
///
/// Least recently used entries are evicted once `capacity` is reached.
pub struct EmbeddingCache {
    inner: Cache<String, Arc<[f32]>>,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity as u64)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        EmbeddingCache { inner }
    }

    pub fn get(&self, key: &str) -> Option<Arc<[f32]>> {
        self.inner.get(key)
    }

    /// Return the cached vector for `key`, computing it with `f` on a miss.
    ///
    /// Concurrent misses on one key run `f` once. Errors are returned and
    /// nothing is stored.
    pub fn get_or_try_insert_with<F>(&self, key: &str, f: F) -> Result<Arc<[f32]>, EmbeddingError>
    where
        F: FnOnce() -> Result<Vec<f32>, EmbeddingError>,
    {
        self.inner
            .try_get_with_by_ref(key, || f().map(Arc::from))
            .map_err(|e| EmbeddingError::clone(&e))
    }

    /// Number of stored entries, after pending evictions are applied.
    pub fn len(&self) -> usize {
        self.inner.run_pending_tasks();
        self.inner.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for EmbeddingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCache")
            .field("capacity", &self.inner.policy().max_capacity())
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceEmbedding {
    pub material: CanonicalMaterial,
    pub word: &'static str,
    pub vector: Vec<f32>,
}

/// Best (token, material) pair found by the semantic fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticMatch {
    pub token: String,
    pub material: CanonicalMaterial,
    /// Reference word the token came closest to.
    pub reference: String,
    pub bin: BinCategory,
    pub similarity: f64,
}

/// Nearest-reference lookup for terms the dictionary cannot resolve.
pub struct SemanticScorer {
    embedder: Arc<dyn Embedder>,
    references: Vec<ReferenceEmbedding>,
    cache: EmbeddingCache,
}

impl SemanticScorer {
    /// Embed every reference word up front.
    pub fn new(embedder: Arc<dyn Embedder>, cache_capacity: usize) -> Result<Self, TribacError> {
        let mut references = Vec::new();
        for (material, words) in REFERENCE_WORDS {
            for &word in words {
                let vector = embed_checked(embedder.as_ref(), word)?;
                references.push(ReferenceEmbedding {
                    material,
                    word,
                    vector,
                });
            }
        }

        Ok(SemanticScorer {
            embedder,
            references,
            cache: EmbeddingCache::new(cache_capacity),
        })
    }

    pub fn backend_name(&self) -> &str {
        self.embedder.backend_name()
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// Highest-similarity (token, material) pair over all tokens.
    ///
    /// A material's similarity is its best reference word. Ties keep the
    /// earlier token, then the earlier material.
    pub fn best_match(&self, tokens: &[String]) -> Result<Option<SemanticMatch>, EmbeddingError> {
        let mut best: Option<SemanticMatch> = None;

        for token in tokens {
            let vector = self
                .cache
                .get_or_try_insert_with(token, || embed_checked(self.embedder.as_ref(), token))?;

            for reference in &self.references {
                let similarity = cosine_similarity(&vector, &reference.vector) as f64;
                tracing::trace!(
                    %token,
                    material = %reference.material,
                    reference = reference.word,
                    similarity,
                    "semantic candidate"
                );
                let better = match &best {
                    Some(b) => similarity > b.similarity,
                    None => true,
                };
                if better {
                    best = Some(SemanticMatch {
                        token: token.clone(),
                        material: reference.material,
                        reference: reference.word.to_string(),
                        bin: reference.material.bin(),
                        similarity,
                    });
                }
            }
        }

        Ok(best)
    }
}

impl std::fmt::Debug for SemanticScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticScorer")
            .field("backend", &self.embedder.backend_name())
            .field("references", &self.references.len())
            .field("cache", &self.cache)
            .finish()
    }
}

fn embed_checked(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    let vector = embedder.embed(text)?;
    if vector.len() != embedder.dimension() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: embedder.dimension(),
            actual: vector.len(),
        });
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ShortEmbedder;

    impl Embedder for ShortEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0; 4])
        }

        fn dimension(&self) -> usize {
            8
        }

        fn backend_name(&self) -> &str {
            "short"
        }
    }

    #[test]
    fn test_hashed_embedding_is_deterministic_unit_vector() {
        let embedder = HashedNgramEmbedder::new(64);
        let a = embedder.embed("polystyrène").unwrap();
        let b = embedder.embed("polystyrène").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashed_embedding_case_insensitive() {
        let embedder = HashedNgramEmbedder::new(64);
        assert_eq!(embedder.embed("Verre").unwrap(), embedder.embed("verre").unwrap());
    }

    #[test]
    fn test_empty_text_rejected() {
        let embedder = HashedNgramEmbedder::new(64);
        assert_eq!(embedder.embed("   "), Err(EmbeddingError::EmptyInput));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_full_cache_evicts_oldest() {
        let cache = EmbeddingCache::new(1);
        cache.get_or_try_insert_with("a", || Ok(vec![1.0])).unwrap();
        let b = cache.get_or_try_insert_with("b", || Ok(vec![2.0])).unwrap();
        assert_eq!(b.to_vec(), vec![2.0]);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_none());

        let again = cache
            .get_or_try_insert_with("b", || Err(EmbeddingError::Backend("called".into())))
            .unwrap();
        assert_eq!(again.to_vec(), vec![2.0]);
    }

    #[test]
    fn test_cache_hit_skips_compute() {
        let cache = EmbeddingCache::new(4);
        cache.get_or_try_insert_with("a", || Ok(vec![1.0])).unwrap();
        let hit = cache
            .get_or_try_insert_with("a", || Err(EmbeddingError::Backend("called".into())))
            .unwrap();
        assert_eq!(hit.to_vec(), vec![1.0]);
    }

    #[test]
    fn test_cache_does_not_store_errors() {
        let cache = EmbeddingCache::new(4);
        let err = cache.get_or_try_insert_with("a", || Err(EmbeddingError::EmptyInput));
        assert!(err.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reference_dimension_checked() {
        let err = SemanticScorer::new(Arc::new(ShortEmbedder), 16).unwrap_err();
        assert!(matches!(
            err,
            TribacError::Embedding(EmbeddingError::DimensionMismatch { expected: 8, actual: 4 })
        ));
    }

    #[test]
    fn test_best_match_prefers_shared_trigrams() {
        let scorer = SemanticScorer::new(Arc::new(HashedNgramEmbedder::new(256)), 16).unwrap();
        let found = scorer.best_match(&["plastique".to_string()]).unwrap().unwrap();
        assert_eq!(found.material, CanonicalMaterial::Plastic);
        assert_eq!(found.bin, BinCategory::MixedRecyclable);
        assert!(found.similarity > 0.0 && found.similarity <= 1.0 + 1e-6);
        assert_eq!(scorer.cache().len(), 1);
    }

    #[test]
    fn test_reference_words_match_exactly() {
        let scorer = SemanticScorer::new(Arc::new(HashedNgramEmbedder::new(256)), 16).unwrap();
        for (token, material) in [
            ("sachet", CanonicalMaterial::Plastic),
            ("foil", CanonicalMaterial::Metal),
            ("kraft", CanonicalMaterial::Paper),
        ] {
            let found = scorer.best_match(&[token.to_string()]).unwrap().unwrap();
            assert_eq!(found.material, material, "{}", token);
            assert_eq!(found.reference, token);
            assert!((found.similarity - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_best_match_no_tokens() {
        let scorer = SemanticScorer::new(Arc::new(HashedNgramEmbedder::new(64)), 16).unwrap();
        assert!(scorer.best_match(&[]).unwrap().is_none());
    }
}
