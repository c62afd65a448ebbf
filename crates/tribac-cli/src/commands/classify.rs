use tribac_core::error::TribacError;

use super::{build_engine, load_products, InputArgs};
use crate::output;

pub fn run(input: &InputArgs, output_format: &str) -> Result<(), TribacError> {
    let engine = build_engine(&input.engine)?;
    let products = load_products(input)?;
    let outcomes = engine.classify_products(&products);

    match output_format {
        "json" => output::json::print(&outcomes)?,
        _ => output::table::print_outcomes(&outcomes),
    }

    Ok(())
}
