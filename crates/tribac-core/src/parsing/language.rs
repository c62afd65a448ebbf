use crate::model::Language;

const FR_INDICATORS: &[&str] = &[
    "le", "la", "les", "de", "du", "des", "en", "bouteille", "poubelle",
];

const EN_INDICATORS: &[&str] = &["the", "of", "in", "bottle", "container", "bin", "waste"];

/// Guess whether a text is French or English.
///
/// Each indicator word counts once if it occurs anywhere in the lowercased
/// text (substring match, so "le" also fires inside "bouteille"). French wins
/// only on a strict majority; ties and empty text are English.
pub fn detect_language(text: &str) -> Language {
    let lower = text.to_lowercase();
    let fr_count = count_indicators(&lower, FR_INDICATORS);
    let en_count = count_indicators(&lower, EN_INDICATORS);

    if fr_count > en_count {
        Language::Fr
    } else {
        Language::En
    }
}

fn count_indicators(lower: &str, indicators: &[&str]) -> usize {
    indicators.iter().filter(|w| lower.contains(*w)).count()
}
