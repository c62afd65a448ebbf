pub mod classify;
pub mod explain;
pub mod rules;

use clap::Args;
use std::path::PathBuf;
use tribac_core::error::TribacError;
use tribac_core::{Engine, EngineConfig, ProductInput};

/// Where products come from, and how the engine is set up.
#[derive(Args)]
pub struct InputArgs {
    /// JSON file with one product object or a list of them
    pub input_file: Option<PathBuf>,

    /// Free-text packaging description
    #[arg(short, long)]
    pub packaging: Option<String>,

    /// Packaging material tag (repeatable), e.g. "en:glass"
    #[arg(short, long = "material", value_name = "TAG")]
    pub materials: Vec<String>,

    /// Main packaging material; decides the bin when it is recognized
    #[arg(long, value_name = "MATERIAL")]
    pub main_material: Option<String>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Engine setup shared by every command that builds one.
#[derive(Args)]
pub struct EngineArgs {
    /// Engine config file (JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Custom classification tables (JSON)
    #[arg(long, value_name = "FILE")]
    pub tables: Option<PathBuf>,
}

impl InputArgs {
    fn has_flags(&self) -> bool {
        self.packaging.is_some() || !self.materials.is_empty() || self.main_material.is_some()
    }
}

pub fn build_engine(args: &EngineArgs) -> Result<Engine, TribacError> {
    let config = match &args.config {
        Some(path) => tribac_core::config::load_config(path)?,
        None => EngineConfig::default(),
    };
    match &args.tables {
        Some(path) => {
            let tables = tribac_core::rules::load_tables(path)?;
            Engine::with_tables(config, tables)
        }
        None => Engine::new(config),
    }
}

pub fn load_products(args: &InputArgs) -> Result<Vec<ProductInput>, TribacError> {
    if let Some(path) = &args.input_file {
        if args.has_flags() {
            tracing::warn!("product flags are ignored when an input file is given");
        }
        let bytes = std::fs::read(path)?;
        return tribac_core::parse_products(&bytes);
    }

    if !args.has_flags() {
        return Err(TribacError::InvalidInput(
            "nothing to classify: pass a JSON file or --packaging / --material".into(),
        ));
    }

    Ok(vec![ProductInput {
        packaging: args.packaging.clone().unwrap_or_default(),
        materials: args.materials.clone(),
        main_material: args.main_material.clone(),
        ..Default::default()
    }])
}

/// Row label: product name, or its position in the input.
pub fn product_label(name: Option<&str>, index: usize) -> String {
    name.map(str::to_string)
        .unwrap_or_else(|| format!("#{}", index + 1))
}
