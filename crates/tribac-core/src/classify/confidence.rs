use crate::config::EngineConfig;

/// Maps raw strategy scores onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceNormalizer {
    pub max_possible_score: f64,
    pub min_semantic_confidence: f64,
}

impl ConfidenceNormalizer {
    pub fn from_config(config: &EngineConfig) -> Self {
        ConfidenceNormalizer {
            max_possible_score: config.max_possible_score,
            min_semantic_confidence: config.min_semantic_confidence,
        }
    }

    pub fn exact(&self) -> f64 {
        1.0
    }

    pub fn keyword(&self, score: f64) -> f64 {
        clamp_unit(score / self.max_possible_score)
    }

    /// `None` when the similarity is too weak to report a bin.
    pub fn semantic(&self, similarity: f64) -> Option<f64> {
        let confidence = clamp_unit(similarity);
        (confidence >= self.min_semantic_confidence).then_some(confidence)
    }
}

impl Default for ConfidenceNormalizer {
    fn default() -> Self {
        ConfidenceNormalizer::from_config(&EngineConfig::default())
    }
}

fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
