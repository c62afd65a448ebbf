pub mod classify;
pub mod config;
pub mod error;
pub mod model;
pub mod parsing;
pub mod rules;
pub mod trace;

pub use classify::{ClassificationResult, Embedder, Engine, Explanation, ProductOutcome};
pub use config::EngineConfig;
pub use error::{EmbeddingError, TribacError};
pub use model::{BinCategory, CanonicalMaterial, Language, ProductInput};

use serde::Deserialize;

/// A product file holds either one product or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProductBatch {
    Many(Vec<ProductInput>),
    One(Box<ProductInput>),
}

/// Parse product records from JSON bytes.
pub fn parse_products(json: &[u8]) -> Result<Vec<ProductInput>, TribacError> {
    let batch: ProductBatch = serde_json::from_slice(json)?;
    Ok(match batch {
        ProductBatch::Many(products) => products,
        ProductBatch::One(product) => vec![*product],
    })
}

/// Main API entry point for files: classify every product in a JSON document.
pub fn classify_json(engine: &Engine, json: &[u8]) -> Result<Vec<ProductOutcome>, TribacError> {
    let products = parse_products(json)?;
    tracing::debug!(count = products.len(), "classifying products");
    Ok(engine.classify_products(&products))
}
