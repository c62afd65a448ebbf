pub mod confidence;
pub mod engine;
pub mod outcome;
pub mod resolver;
pub mod scoring;
pub mod semantic;

pub use engine::Engine;
pub use outcome::{ClassificationResult, Explanation, ProductOutcome, Strategy};
pub use semantic::{Embedder, HashedNgramEmbedder};
