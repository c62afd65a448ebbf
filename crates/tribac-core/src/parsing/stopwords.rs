use crate::model::Language;
use std::collections::HashSet;
use std::path::Path;

const EN_STOPWORDS: &str = include_str!("../../../../rules/stopwords/en.txt");
const FR_STOPWORDS: &str = include_str!("../../../../rules/stopwords/fr.txt");

/// Per-language stopword sets.
#[derive(Debug, Clone, Default)]
pub struct StopwordSets {
    en: HashSet<String>,
    fr: HashSet<String>,
}

impl StopwordSets {
    /// Lists compiled into the binary.
    pub fn builtin() -> Self {
        StopwordSets {
            en: parse_list(EN_STOPWORDS),
            fr: parse_list(FR_STOPWORDS),
        }
    }

    /// No filtering at all.
    pub fn empty() -> Self {
        StopwordSets::default()
    }

    /// Load `en.txt` and `fr.txt` from a directory.
    ///
    /// A language whose file cannot be read gets an empty set; tokenization
    /// then proceeds unfiltered for that language.
    pub fn from_dir(dir: &Path) -> Self {
        StopwordSets {
            en: load_or_empty(dir, Language::En),
            fr: load_or_empty(dir, Language::Fr),
        }
    }

    pub fn for_language(&self, lang: Language) -> &HashSet<String> {
        match lang {
            Language::En => &self.en,
            Language::Fr => &self.fr,
        }
    }

    pub fn is_stopword(&self, lang: Language, word: &str) -> bool {
        self.for_language(lang).contains(word)
    }
}

fn load_or_empty(dir: &Path, lang: Language) -> HashSet<String> {
    let path = dir.join(format!("{}.txt", lang));
    match std::fs::read_to_string(&path) {
        Ok(content) => parse_list(&content),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "stopword list unavailable, continuing without stopword filtering"
            );
            HashSet::new()
        }
    }
}

/// One word per line; blank lines and `#` comments are skipped.
fn parse_list(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_lowercase)
        .collect()
}
