/// Language prefixes carried by structured product tags ("en:glass", "fr:verre").
const TAG_PREFIXES: &[&str] = &["en:", "fr:"];

/// Elided French articles and pronouns ("l'emballage", "d'aluminium").
const ELISIONS: &[&str] = &["l", "d", "j", "qu", "n", "s", "c", "m", "t"];

/// Strip a leading two-letter language tag from a lowercased token.
pub fn strip_language_prefix(token: &str) -> &str {
    for prefix in TAG_PREFIXES {
        if let Some(rest) = token.strip_prefix(prefix) {
            return rest;
        }
    }
    token
}

/// Clean a single lowercased term.
///
/// Steps:
/// 1. Strip a language tag prefix
/// 2. Trim surrounding punctuation
/// 3. Drop an elided article ("l'", "d'")
/// 4. Collapse repeated hyphens and trim hyphens at the edges
pub fn clean_term(raw: &str) -> String {
    let s = strip_language_prefix(raw.trim());
    let s = s.trim_matches(|c: char| is_edge_punctuation(c));
    let s = strip_elision(s);

    let mut result = String::with_capacity(s.len());
    let mut prev_hyphen = true; // start true to skip leading hyphens
    for c in s.chars() {
        if c == '-' {
            if !prev_hyphen {
                result.push('-');
            }
            prev_hyphen = true;
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }
    if result.ends_with('-') {
        result.pop();
    }

    // Punctuation can reappear at the edges once hyphens are trimmed
    result
        .trim_matches(|c: char| is_edge_punctuation(c))
        .to_string()
}

/// Split a cleaned term on hyphens into its non-empty parts.
pub fn split_compound(term: &str) -> Vec<String> {
    term.split('-')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split lowercased text into comma-separated segments, then into
/// whitespace-separated raw terms.
pub fn split_segments(text: &str) -> Vec<Vec<&str>> {
    text.split([',', ';'])
        .map(|seg| seg.split_whitespace().collect::<Vec<_>>())
        .filter(|terms| !terms.is_empty())
        .collect()
}

fn strip_elision(s: &str) -> &str {
    for sep in ['\'', '\u{2019}'] {
        if let Some((head, tail)) = s.split_once(sep) {
            if ELISIONS.contains(&head) && !tail.is_empty() {
                return tail;
            }
        }
    }
    s
}

fn is_edge_punctuation(c: char) -> bool {
    matches!(
        c,
        '.' | ':' | '!' | '?' | '(' | ')' | '[' | ']' | '"' | '\'' | '\u{2019}' | '«' | '»' | '*'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_language_prefix("en:glass"), "glass");
        assert_eq!(strip_language_prefix("fr:verre"), "verre");
        assert_eq!(strip_language_prefix("de:glas"), "de:glas");
        assert_eq!(strip_language_prefix("en"), "en");
    }

    #[test]
    fn test_clean_term_punctuation() {
        assert_eq!(clean_term("(plastique)."), "plastique");
        assert_eq!(clean_term("\"verre\""), "verre");
    }

    #[test]
    fn test_clean_term_prefix_then_punctuation() {
        assert_eq!(clean_term("en:pet-bottle."), "pet-bottle");
    }

    #[test]
    fn test_clean_term_elision() {
        assert_eq!(clean_term("l'emballage"), "emballage");
        assert_eq!(clean_term("d\u{2019}aluminium"), "aluminium");
        assert_eq!(clean_term("aujourd'hui"), "aujourd'hui");
    }

    #[test]
    fn test_clean_term_hyphens() {
        assert_eq!(clean_term("--tetra--pak-"), "tetra-pak");
    }

    #[test]
    fn test_split_compound() {
        assert_eq!(
            split_compound("pet-1-polyethylene-terephthalate"),
            vec!["pet", "1", "polyethylene", "terephthalate"]
        );
        assert_eq!(split_compound("verre"), vec!["verre"]);
    }

    #[test]
    fn test_split_segments() {
        let segs = split_segments("bouteille en verre, bouchon  plastique,,");
        assert_eq!(
            segs,
            vec![vec!["bouteille", "en", "verre"], vec!["bouchon", "plastique"]]
        );
    }
}
