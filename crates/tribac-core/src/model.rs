use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical waste-sorting destination.
///
/// Declaration order is the tie-break order used everywhere a ranking has
/// equal scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinCategory {
    Glass,
    MixedRecyclable,
    Paper,
    Metal,
    GeneralWaste,
    Organic,
    SpecialHazardous,
}

impl BinCategory {
    pub const ALL: [BinCategory; 7] = [
        BinCategory::Glass,
        BinCategory::MixedRecyclable,
        BinCategory::Paper,
        BinCategory::Metal,
        BinCategory::GeneralWaste,
        BinCategory::Organic,
        BinCategory::SpecialHazardous,
    ];

    /// Position in the fixed enumeration order.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinCategory::Glass => "glass",
            BinCategory::MixedRecyclable => "mixed-recyclable",
            BinCategory::Paper => "paper",
            BinCategory::Metal => "metal",
            BinCategory::GeneralWaste => "general-waste",
            BinCategory::Organic => "organic",
            BinCategory::SpecialHazardous => "special-hazardous",
        }
    }

    /// Points awarded by the recycling-activity ledger for sorting into this bin.
    pub fn points(self) -> u32 {
        match self {
            BinCategory::Glass => 4,
            BinCategory::MixedRecyclable => 2,
            BinCategory::Paper => 3,
            BinCategory::Metal => 6,
            BinCategory::GeneralWaste => 3,
            BinCategory::Organic => 6,
            BinCategory::SpecialHazardous => 10,
        }
    }

    /// Bin color as shown in the consumer app.
    pub fn color(self) -> &'static str {
        match self {
            BinCategory::Glass => "green",
            BinCategory::MixedRecyclable => "yellow",
            BinCategory::Paper => "blue",
            BinCategory::Metal => "red",
            BinCategory::GeneralWaste => "black",
            BinCategory::Organic => "brown",
            BinCategory::SpecialHazardous => "special",
        }
    }

    pub fn product_type(self) -> &'static str {
        match self {
            BinCategory::Glass => "Glass Product",
            BinCategory::MixedRecyclable => "Mixed Recyclable Product",
            BinCategory::Paper => "Paper Product",
            BinCategory::Metal => "Metal Product",
            BinCategory::GeneralWaste => "Non-Recyclable Product",
            BinCategory::Organic => "Organic Product",
            BinCategory::SpecialHazardous => "Hazardous/Special Product",
        }
    }

    /// Parse a bin name, accepting the kebab-case label or the color name.
    pub fn from_str_loose(s: &str) -> Option<BinCategory> {
        let lower = s.trim().to_lowercase().replace('_', "-");
        BinCategory::ALL
            .into_iter()
            .find(|bin| bin.as_str() == lower || bin.color() == lower)
    }
}

impl fmt::Display for BinCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points for a classification outcome; unknown results still earn one point.
pub fn points_for(bin: Option<BinCategory>) -> u32 {
    bin.map(BinCategory::points).unwrap_or(1)
}

pub fn product_type_for(bin: Option<BinCategory>) -> &'static str {
    bin.map(BinCategory::product_type)
        .unwrap_or("Unknown Product Type")
}

/// Normalized material class sitting between raw vocabulary and bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalMaterial {
    Plastic,
    Metal,
    Glass,
    Paper,
    Organic,
    Hazardous,
}

impl CanonicalMaterial {
    pub const ALL: [CanonicalMaterial; 6] = [
        CanonicalMaterial::Plastic,
        CanonicalMaterial::Metal,
        CanonicalMaterial::Glass,
        CanonicalMaterial::Paper,
        CanonicalMaterial::Organic,
        CanonicalMaterial::Hazardous,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalMaterial::Plastic => "plastic",
            CanonicalMaterial::Metal => "metal",
            CanonicalMaterial::Glass => "glass",
            CanonicalMaterial::Paper => "paper",
            CanonicalMaterial::Organic => "organic",
            CanonicalMaterial::Hazardous => "hazardous",
        }
    }

    /// The bin this material belongs in when it is the deciding material.
    pub fn bin(self) -> BinCategory {
        match self {
            CanonicalMaterial::Plastic => BinCategory::MixedRecyclable,
            CanonicalMaterial::Metal => BinCategory::Metal,
            CanonicalMaterial::Glass => BinCategory::Glass,
            CanonicalMaterial::Paper => BinCategory::Paper,
            CanonicalMaterial::Organic => BinCategory::Organic,
            CanonicalMaterial::Hazardous => BinCategory::SpecialHazardous,
        }
    }
}

impl fmt::Display for CanonicalMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product record as supplied by the product-lookup service.
///
/// Field aliases accept the tag names used by the open product-data API so
/// exported product files can be classified directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductInput {
    #[serde(default, alias = "product_name")]
    pub name: Option<String>,
    #[serde(default)]
    pub packaging: String,
    #[serde(default, alias = "packaging_materials_tags")]
    pub materials: Vec<String>,
    #[serde(default)]
    pub main_material: Option<String>,
    #[serde(default, alias = "packaging_recycling_tags")]
    pub recycling_tags: Vec<String>,
    #[serde(default, alias = "labels_tags")]
    pub labels: Vec<String>,
}

impl ProductInput {
    pub fn new(packaging: impl Into<String>, materials: &[&str]) -> Self {
        ProductInput {
            packaging: packaging.into(),
            materials: materials.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    /// True when the product carries an explicit recycling mark.
    pub fn has_recycling_label(&self) -> bool {
        self.recycling_tags.iter().any(|t| t == "en:recycle")
            || self
                .labels
                .iter()
                .any(|l| l == "en:green-dot" || l == "fr:triman")
    }
}
