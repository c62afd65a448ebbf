use crate::error::TribacError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_POSSIBLE_SCORE: f64 = 5.0;
pub const DEFAULT_MIN_SEMANTIC_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 256;
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

const MIN_EMBEDDING_DIMENSION: usize = 8;

/// Engine tuning, loadable from a JSON file. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Divisor mapping keyword scores onto [0, 1].
    pub max_possible_score: f64,
    /// Similarities below this yield unknown. Semantic path only.
    pub min_semantic_confidence: f64,
    pub embedding_dimension: usize,
    /// Maximum number of memoized token embeddings.
    pub cache_capacity: usize,
    /// Directory with `en.txt` / `fr.txt`; built-in lists when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopwords_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_possible_score: DEFAULT_MAX_POSSIBLE_SCORE,
            min_semantic_confidence: DEFAULT_MIN_SEMANTIC_CONFIDENCE,
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            stopwords_dir: None,
        }
    }
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<EngineConfig, TribacError> {
    let content = std::fs::read_to_string(path).map_err(|e| TribacError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let config: EngineConfig =
        serde_json::from_str(&content).map_err(|e| TribacError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

pub fn parse_config_str(json: &str) -> Result<EngineConfig, TribacError> {
    let config: EngineConfig = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &EngineConfig) -> Result<(), TribacError> {
    if !(config.max_possible_score > 0.0 && config.max_possible_score.is_finite()) {
        return Err(TribacError::ConfigInvalid(format!(
            "max_possible_score must be a positive number, got {}",
            config.max_possible_score
        )));
    }

    if !(0.0..=1.0).contains(&config.min_semantic_confidence) {
        return Err(TribacError::ConfigInvalid(format!(
            "min_semantic_confidence must be within [0, 1], got {}",
            config.min_semantic_confidence
        )));
    }

    if config.embedding_dimension < MIN_EMBEDDING_DIMENSION {
        return Err(TribacError::ConfigInvalid(format!(
            "embedding_dimension must be at least {}, got {}",
            MIN_EMBEDDING_DIMENSION, config.embedding_dimension
        )));
    }

    if config.cache_capacity == 0 {
        return Err(TribacError::ConfigInvalid(
            "cache_capacity must be at least 1".into(),
        ));
    }

    Ok(())
}
