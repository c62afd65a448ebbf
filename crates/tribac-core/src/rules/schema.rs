use crate::model::{BinCategory, CanonicalMaterial, Language};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classification tables: bin definitions, material synonyms and special cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    /// One entry per bin category, each exactly once.
    pub bins: Vec<BinDef>,
    /// Raw lowercase term -> canonical material.
    pub synonyms: BTreeMap<String, CanonicalMaterial>,
    /// Rules checked before dictionary lookup.
    #[serde(default)]
    pub composites: Vec<CompositeRuleDef>,
    /// Values that mean "no material".
    #[serde(default)]
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinDef {
    pub bin: BinCategory,
    pub description: Localized<String>,
    pub keywords: Localized<Vec<String>>,
    /// Multiplier applied to the keyword count, in (0, 1].
    pub weight: f64,
    #[serde(default)]
    pub incompatible_materials: Vec<CanonicalMaterial>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Localized<T> {
    pub en: T,
    pub fr: T,
}

impl<T> Localized<T> {
    pub fn get(&self, lang: Language) -> &T {
        match lang {
            Language::En => &self.en,
            Language::Fr => &self.fr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeScope {
    /// A single token containing every trigger as a substring.
    Token,
    /// A phrase with every trigger contained in some token.
    Phrase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeRuleDef {
    pub name: String,
    pub scope: CompositeScope,
    pub all_of: Vec<String>,
    pub material: CanonicalMaterial,
}
