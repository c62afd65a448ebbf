use crate::classify::resolver::Resolution;
use crate::model::{points_for, product_type_for, BinCategory, Language};
use crate::trace::TraceStep;
use serde::{Deserialize, Serialize};

/// Which resolution strategy produced a result, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ExactDictionary,
    KeywordScoring,
    SemanticSimilarity,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::ExactDictionary => "exact_dictionary",
            Strategy::KeywordScoring => "keyword_scoring",
            Strategy::SemanticSimilarity => "semantic_similarity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentRule {
    /// Material combination (plastic + metal, glass + other).
    Combination,
    /// Bin incompatible with a resolved material.
    Incompatibility,
    /// Authoritative main material.
    Dominance,
}

/// A multiplicative adjustment applied to a bin's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub rule: AdjustmentRule,
    pub factor: f64,
}

/// Keyword score for one bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub bin: BinCategory,
    /// Keyword occurrences found in the combined text.
    pub matches: usize,
    /// `matches * weight`, before adjustments.
    pub unadjusted: f64,
    /// Score after all adjustments.
    pub score: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adjustments: Vec<Adjustment>,
}

/// Outcome of a single classification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// The chosen bin; `None` is reported as "unknown".
    #[serde(with = "bin_or_unknown")]
    pub bin: Option<BinCategory>,
    /// Confidence in [0, 1]; always 0 for unknown results.
    pub confidence: f64,
    pub language: Language,
    /// Strategy that decided the result, if any ran.
    pub strategy: Option<Strategy>,
    /// Per-bin keyword scores in the fixed bin order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Vec<CategoryScore>>,
    /// Set when the semantic backend failed and the result fell back to unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClassificationResult {
    pub fn unknown(language: Language) -> Self {
        ClassificationResult {
            bin: None,
            confidence: 0.0,
            language,
            strategy: None,
            breakdown: None,
            error: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.bin.is_none()
    }

    /// Bin label, or "unknown".
    pub fn label(&self) -> &'static str {
        self.bin.map(BinCategory::as_str).unwrap_or("unknown")
    }

    pub fn points(&self) -> u32 {
        points_for(self.bin)
    }

    /// Adjusted score of one bin, if a breakdown was computed.
    pub fn score_of(&self, bin: BinCategory) -> Option<&CategoryScore> {
        self.breakdown
            .as_ref()
            .and_then(|scores| scores.iter().find(|s| s.bin == bin))
    }
}

/// One row of the diagnostic ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedScore {
    pub bin: BinCategory,
    pub score: f64,
    pub unadjusted: f64,
}

/// Diagnostic view of a classification. Never consulted by `classify`.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub result: ClassificationResult,
    /// Every bin, descending by adjusted score; ties in the fixed bin order.
    pub ranking: Vec<RankedScore>,
    pub resolution: Resolution,
    pub steps: Vec<TraceStep>,
}

/// Classification of one product record, with the values the activity ledger needs.
#[derive(Debug, Clone, Serialize)]
pub struct ProductOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub result: ClassificationResult,
    pub points: u32,
    pub product_type: String,
    pub has_recycling_label: bool,
}

impl ProductOutcome {
    pub fn new(name: Option<String>, result: ClassificationResult, has_recycling_label: bool) -> Self {
        ProductOutcome {
            name,
            points: result.points(),
            product_type: product_type_for(result.bin).to_string(),
            result,
            has_recycling_label,
        }
    }
}

mod bin_or_unknown {
    use crate::model::BinCategory;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bin: &Option<BinCategory>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(bin.map(BinCategory::as_str).unwrap_or("unknown"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<BinCategory>, D::Error> {
        let label = String::deserialize(d)?;
        if label == "unknown" {
            return Ok(None);
        }
        BinCategory::from_str_loose(&label)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown bin '{}'", label)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_serializes_as_label() {
        let result = ClassificationResult::unknown(Language::Fr);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["bin"], "unknown");
        assert_eq!(json["confidence"], 0.0);
        assert_eq!(json["language"], "fr");
        assert!(json.get("breakdown").is_none());
    }

    #[test]
    fn test_result_deserializes_bin_label() {
        let json = r#"{ "bin": "mixed-recyclable", "confidence": 0.5,
                        "language": "en", "strategy": "keyword_scoring" }"#;
        let result: ClassificationResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.bin, Some(BinCategory::MixedRecyclable));
        assert_eq!(result.strategy, Some(Strategy::KeywordScoring));
    }

    #[test]
    fn test_product_outcome_points() {
        let mut result = ClassificationResult::unknown(Language::En);
        result.bin = Some(BinCategory::Metal);
        let outcome = ProductOutcome::new(None, result, false);
        assert_eq!(outcome.points, 6);
        assert_eq!(outcome.product_type, "Metal Product");

        let unknown = ProductOutcome::new(None, ClassificationResult::unknown(Language::En), true);
        assert_eq!(unknown.points, 1);
        assert_eq!(unknown.product_type, "Unknown Product Type");
    }
}
