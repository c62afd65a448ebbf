use tribac_core::classify::outcome::ClassificationResult;
use tribac_core::ProductOutcome;

use crate::commands::explain::ProductExplanation;
use crate::commands::product_label;

pub fn print_outcomes(outcomes: &[ProductOutcome]) {
    let labels: Vec<String> = outcomes
        .iter()
        .enumerate()
        .map(|(i, o)| product_label(o.name.as_deref(), i))
        .collect();
    let width = labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max("Product".len());

    println!(
        "  {:<width$}  {:<18}  {:>10}  {:>6}  {:<4}  Strategy",
        "Product",
        "Bin",
        "Confidence",
        "Points",
        "Lang",
        width = width
    );
    println!("  {}", "-".repeat(width + 66));

    for (label, outcome) in labels.iter().zip(outcomes) {
        let result = &outcome.result;
        let marker = if outcome.has_recycling_label { " *" } else { "" };
        println!(
            "  {:<width$}  {:<18}  {:>10.2}  {:>6}  {:<4}  {}{}",
            label,
            result.label(),
            result.confidence,
            outcome.points,
            result.language.as_str(),
            strategy_label(result),
            marker,
            width = width
        );
        if let Some(ref err) = result.error {
            println!("    error: {}", err);
        }
    }

    if outcomes.iter().any(|o| o.has_recycling_label) {
        println!("\n  * carries a recycling label");
    }
}

pub fn print_explanations(explained: &[ProductExplanation]) {
    for (i, item) in explained.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let ex = &item.explanation;
        let result = &ex.result;

        println!("=== {} ===\n", item.product);
        println!(
            "  Result: {} (confidence {:.2}, {}, {})\n",
            result.label(),
            result.confidence,
            strategy_label(result),
            result.language
        );
        if let Some(ref err) = result.error {
            println!("  Error: {}\n", err);
        }

        if !ex.resolution.hits.is_empty() {
            println!("  Materials:");
            for hit in &ex.resolution.hits {
                match hit.rule {
                    Some(ref rule) => {
                        println!("    {:<20} -> {} (rule {})", hit.term, hit.material, rule)
                    }
                    None => println!("    {:<20} -> {}", hit.term, hit.material),
                }
            }
            println!();
        }
        if !ex.resolution.unresolved.is_empty() {
            println!("  Unresolved: {}\n", ex.resolution.unresolved.join(", "));
        }

        println!("  Ranking:");
        for row in &ex.ranking {
            println!(
                "    {:<18} {:>8.3}   (raw {:.3})",
                row.bin.as_str(),
                row.score,
                row.unadjusted
            );
        }
        println!();

        println!("  Steps:");
        for step in &ex.steps {
            println!("    - {}", step.message);
        }
    }
}

fn strategy_label(result: &ClassificationResult) -> &'static str {
    result.strategy.map(|s| s.as_str()).unwrap_or("-")
}
