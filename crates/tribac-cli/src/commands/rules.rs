use std::path::Path;
use tribac_core::error::TribacError;
use tribac_core::model::{BinCategory, CanonicalMaterial, Language};

use super::{build_engine, EngineArgs};

pub fn list(args: &EngineArgs) -> Result<(), TribacError> {
    let engine = build_engine(args)?;
    let tables = engine.tables();

    println!("{} (version {})\n", tables.name, tables.version);
    for profile in tables.bins() {
        println!(
            "  {:<18} {:<8} weight {:<4} {:>2} pts  {}",
            profile.bin.as_str(),
            profile.bin.color(),
            profile.weight,
            profile.bin.points(),
            profile.description(Language::En)
        );
    }

    let config = engine.config();
    println!(
        "\nKeyword confidence: score / {}; semantic fallback ({}) needs similarity >= {}",
        config.max_possible_score,
        engine.embedder_name(),
        config.min_semantic_confidence
    );
    println!();
    Ok(())
}

pub fn explain(bin: &str, args: &EngineArgs) -> Result<(), TribacError> {
    let bin = BinCategory::from_str_loose(bin).ok_or_else(|| {
        let known: Vec<&str> = BinCategory::ALL.iter().map(|b| b.as_str()).collect();
        TribacError::InvalidInput(format!(
            "unknown bin '{}', expected one of: {}",
            bin,
            known.join(", ")
        ))
    })?;

    let engine = build_engine(args)?;
    let tables = engine.tables();
    let profile = tables.bin(bin);

    println!(
        "{} ({} bin, {} points)\n",
        bin,
        bin.color(),
        bin.points()
    );
    println!("  {}", profile.description(Language::En));
    println!("  {}\n", profile.description(Language::Fr));

    println!("Keyword weight: {}", profile.weight);
    println!("Keywords (en): {}", profile.keywords.en.join(", "));
    println!("Keywords (fr): {}", profile.keywords.fr.join(", "));

    if !profile.incompatible.is_empty() {
        let names: Vec<&str> = profile.incompatible.iter().map(|m| m.as_str()).collect();
        println!(
            "Incompatible materials: {} (score x0.1 when present)",
            names.join(", ")
        );
    }
    println!();

    let materials: Vec<CanonicalMaterial> = CanonicalMaterial::ALL
        .into_iter()
        .filter(|m| m.bin() == bin)
        .collect();
    for material in materials {
        println!("Material '{}' is recognized from:", material);
        println!("  {}", tables.synonyms_for(material).join(", "));
        for rule in tables.composites().iter().filter(|r| r.material == material) {
            println!("  rule '{}': {}", rule.name, rule.all_of.join(" + "));
        }
        println!();
    }

    Ok(())
}

pub fn validate(file: &Path) -> Result<(), TribacError> {
    let tables = tribac_core::rules::load_tables(file)?;

    println!("Tables '{}' (v{}) are valid.", tables.name, tables.version);
    println!("  Bins: {}", tables.bins().len());
    println!("  Synonyms: {}", tables.synonyms().len());
    println!("  Composite rules: {}", tables.composites().len());

    // Warnings, not errors
    let mut warnings = Vec::new();
    for profile in tables.bins() {
        if profile.keywords.en.is_empty() {
            warnings.push(format!("bin '{}' has no English keywords", profile.bin));
        }
        if profile.keywords.fr.is_empty() {
            warnings.push(format!("bin '{}' has no French keywords", profile.bin));
        }
    }
    for material in CanonicalMaterial::ALL {
        if tables.synonyms_for(material).is_empty() {
            warnings.push(format!("no synonym resolves to material '{}'", material));
        }
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}
