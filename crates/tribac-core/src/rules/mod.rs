pub mod builtin;
pub mod schema;

use crate::error::TribacError;
use crate::model::{BinCategory, CanonicalMaterial, Language};
use schema::{CompositeRuleDef, CompositeScope, Localized, TablesDef};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

/// Immutable, validated bin profile.
#[derive(Debug, Clone)]
pub struct BinProfile {
    pub bin: BinCategory,
    pub description: Localized<String>,
    pub keywords: Localized<Vec<String>>,
    pub weight: f64,
    pub incompatible: BTreeSet<CanonicalMaterial>,
}

impl BinProfile {
    pub fn description(&self, lang: Language) -> &str {
        self.description.get(lang)
    }
}

#[derive(Debug, Clone)]
pub struct CompositeRule {
    pub name: String,
    pub scope: CompositeScope,
    pub all_of: Vec<String>,
    pub material: CanonicalMaterial,
}

/// Validated classification tables, indexed by the fixed bin order.
#[derive(Debug, Clone)]
pub struct Tables {
    pub name: String,
    pub version: String,
    bins: Vec<BinProfile>,
    synonyms: HashMap<String, CanonicalMaterial>,
    composites: Vec<CompositeRule>,
    ignore: HashSet<String>,
}

impl Tables {
    /// Validate a definition and freeze it into lookup structures.
    pub fn from_def(def: TablesDef) -> Result<Tables, TribacError> {
        validate_tables(&def)?;

        let mut bins = def.bins;
        bins.sort_by_key(|b| b.bin);
        let bins = bins
            .into_iter()
            .map(|b| BinProfile {
                bin: b.bin,
                description: b.description,
                keywords: Localized {
                    en: lowercase_all(b.keywords.en),
                    fr: lowercase_all(b.keywords.fr),
                },
                weight: b.weight,
                incompatible: b.incompatible_materials.into_iter().collect(),
            })
            .collect();

        let synonyms = def
            .synonyms
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();

        let composites = def
            .composites
            .into_iter()
            .map(|c: CompositeRuleDef| CompositeRule {
                name: c.name,
                scope: c.scope,
                all_of: lowercase_all(c.all_of),
                material: c.material,
            })
            .collect();

        let ignore = def
            .ignore
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .collect();

        Ok(Tables {
            name: def.name,
            version: def.version,
            bins,
            synonyms,
            composites,
            ignore,
        })
    }

    pub fn bin(&self, bin: BinCategory) -> &BinProfile {
        &self.bins[bin.index()]
    }

    /// Profiles in the fixed bin order.
    pub fn bins(&self) -> &[BinProfile] {
        &self.bins
    }

    pub fn synonyms(&self) -> &HashMap<String, CanonicalMaterial> {
        &self.synonyms
    }

    pub fn composites(&self) -> &[CompositeRule] {
        &self.composites
    }

    pub fn ignore(&self) -> &HashSet<String> {
        &self.ignore
    }

    /// Synonyms resolving to a material, sorted, for display.
    pub fn synonyms_for(&self, material: CanonicalMaterial) -> Vec<&str> {
        let mut terms: Vec<&str> = self
            .synonyms
            .iter()
            .filter(|(_, m)| **m == material)
            .map(|(k, _)| k.as_str())
            .collect();
        terms.sort_unstable();
        terms
    }
}

fn lowercase_all(items: Vec<String>) -> Vec<String> {
    items.into_iter().map(|s| s.trim().to_lowercase()).collect()
}

/// Load tables from a JSON file.
pub fn load_tables(path: &Path) -> Result<Tables, TribacError> {
    let content = std::fs::read_to_string(path).map_err(|e| TribacError::TablesLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_tables(&content, path)
}

/// Parse tables from a JSON string.
pub fn parse_tables(json: &str, source: &Path) -> Result<Tables, TribacError> {
    let def: TablesDef = serde_json::from_str(json).map_err(|e| TribacError::TablesLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    Tables::from_def(def)
}

/// Parse tables from a JSON string (no file path context).
pub fn parse_tables_str(json: &str) -> Result<Tables, TribacError> {
    let def: TablesDef = serde_json::from_str(json).map_err(TribacError::Json)?;
    Tables::from_def(def)
}

/// Validate that a table definition is well-formed.
pub fn validate_tables(def: &TablesDef) -> Result<(), TribacError> {
    let mut seen = BTreeSet::new();
    for bin_def in &def.bins {
        if !seen.insert(bin_def.bin) {
            return Err(TribacError::TablesInvalid(format!(
                "bin '{}' is defined more than once",
                bin_def.bin
            )));
        }

        if !(bin_def.weight > 0.0 && bin_def.weight <= 1.0) {
            return Err(TribacError::TablesInvalid(format!(
                "bin '{}' has weight {} (expected 0 < weight <= 1)",
                bin_def.bin, bin_def.weight
            )));
        }

        let all_keywords = bin_def.keywords.en.iter().chain(bin_def.keywords.fr.iter());
        for keyword in all_keywords {
            if keyword.trim().is_empty() {
                return Err(TribacError::TablesInvalid(format!(
                    "bin '{}' has an empty keyword",
                    bin_def.bin
                )));
            }
        }
    }

    let missing: Vec<&str> = BinCategory::ALL
        .iter()
        .filter(|b| !seen.contains(b))
        .map(|b| b.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(TribacError::TablesInvalid(format!(
            "missing bin definitions: {}",
            missing.join(", ")
        )));
    }

    for key in def.synonyms.keys() {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(TribacError::TablesInvalid(
                "synonym key must not be empty".into(),
            ));
        }
        if trimmed.contains(char::is_whitespace) {
            return Err(TribacError::TablesInvalid(format!(
                "synonym '{}' must be a single term",
                key
            )));
        }
        if trimmed.starts_with("en:") || trimmed.starts_with("fr:") {
            return Err(TribacError::TablesInvalid(format!(
                "synonym '{}' must not carry a language prefix",
                key
            )));
        }
    }

    for rule in &def.composites {
        if rule.all_of.is_empty() || rule.all_of.iter().any(|t| t.trim().is_empty()) {
            return Err(TribacError::TablesInvalid(format!(
                "composite rule '{}' needs non-empty triggers",
                rule.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bins_json(skip: Option<&str>) -> String {
        BinCategory::ALL
            .iter()
            .filter(|b| Some(b.as_str()) != skip)
            .map(|b| {
                format!(
                    r#"{{ "bin": "{}", "description": {{ "en": "x", "fr": "x" }},
                         "keywords": {{ "en": ["{}"], "fr": [] }}, "weight": 0.5 }}"#,
                    b, b
                )
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    fn tables_json(bins: &str, synonyms: &str) -> String {
        format!(
            r#"{{ "name": "Test", "version": "1.0", "bins": [{}], "synonyms": {{ {} }} }}"#,
            bins, synonyms
        )
    }

    #[test]
    fn test_parse_valid_tables() {
        let json = tables_json(&bins_json(None), r#""Verre": "glass""#);
        let tables = parse_tables_str(&json).unwrap();
        assert_eq!(tables.name, "Test");
        assert_eq!(tables.bins().len(), 7);
        assert_eq!(tables.bin(BinCategory::Paper).bin, BinCategory::Paper);
        assert_eq!(
            tables.synonyms().get("verre"),
            Some(&CanonicalMaterial::Glass)
        );
    }

    #[test]
    fn test_missing_bin_rejected() {
        let json = tables_json(&bins_json(Some("organic")), "");
        let err = parse_tables_str(&json).unwrap_err();
        assert!(err.to_string().contains("organic"));
    }

    #[test]
    fn test_duplicate_bin_rejected() {
        let bins = format!(
            "{},{}",
            bins_json(None),
            r#"{ "bin": "glass", "description": { "en": "x", "fr": "x" },
                 "keywords": { "en": [], "fr": [] }, "weight": 1.0 }"#
        );
        assert!(parse_tables_str(&tables_json(&bins, "")).is_err());
    }

    #[test]
    fn test_weight_out_of_range_rejected() {
        let bins = bins_json(None).replacen("0.5", "1.5", 1);
        assert!(parse_tables_str(&tables_json(&bins, "")).is_err());
    }

    #[test]
    fn test_unknown_material_rejected() {
        let json = tables_json(&bins_json(None), r#""bois": "wood""#);
        assert!(parse_tables_str(&json).is_err());
    }

    #[test]
    fn test_prefixed_synonym_rejected() {
        let json = tables_json(&bins_json(None), r#""en:glass": "glass""#);
        assert!(parse_tables_str(&json).is_err());
    }

    #[test]
    fn test_load_tables_missing_file() {
        let err = load_tables(Path::new("/nonexistent/tables.json")).unwrap_err();
        assert!(matches!(err, TribacError::TablesLoad { .. }));
    }
}
