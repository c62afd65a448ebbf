use serde::Serialize;
use tribac_core::error::TribacError;
use tribac_core::Explanation;

use super::{build_engine, load_products, product_label, InputArgs};
use crate::output;

#[derive(Serialize)]
pub struct ProductExplanation {
    pub product: String,
    #[serde(flatten)]
    pub explanation: Explanation,
}

pub fn run(input: &InputArgs, output_format: &str) -> Result<(), TribacError> {
    let engine = build_engine(&input.engine)?;
    let products = load_products(input)?;

    let explained: Vec<ProductExplanation> = products
        .iter()
        .enumerate()
        .map(|(i, p)| ProductExplanation {
            product: product_label(p.name.as_deref(), i),
            explanation: engine.explain(&p.packaging, &p.materials, p.main_material.as_deref()),
        })
        .collect();

    match output_format {
        "json" => output::json::print(&explained)?,
        _ => output::table::print_explanations(&explained),
    }

    Ok(())
}
