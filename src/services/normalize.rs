use crate::model::config::SynonymRules;

/// Key for exact-duplicate detection: trimmed, case-folded, single-spaced.
pub fn headword_key(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Key for comparing definitions.
pub fn definition_key(text: &str) -> String {
    let mut s = headword_key(text);

    for ch in ['“', '”', '’', '‘', '…', '"', '\'', '(', ')'] {
        s = s.replace(ch, "");
    }

    s.trim_end_matches(['.', ';', ':', ',', '!', ' '])
        .trim()
        .to_string()
}

/// Key for synonym detection: the headword with the variant markers of
/// `rules` stripped.
pub fn synonym_key(headword: &str, rules: &SynonymRules) -> String {
    let mut s = fold_possessives(&headword_key(headword), &rules.placeholders);

    if rules.ignore_punctuation {
        s = strip_punctuation(&s);
    }

    for prefix in &rules.strip_prefixes {
        let prefix = headword_key(prefix);
        if prefix.is_empty() {
            continue;
        }
        if let Some(rest) = s.strip_prefix(prefix.as_str()) {
            // Whole words only, and never strip the headword down to nothing.
            if rest.starts_with(' ') && !rest.trim().is_empty() {
                s = rest.trim().to_string();
            }
        }
    }

    s.split(' ')
        .filter(|w| !w.is_empty())
        .map(|w| if rules.fold_plurals { fold_plural(w) } else { w })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rewrites "one's", "somebody's", ... to the first placeholder's possessive.
/// Bare placeholders are left alone: "one" is also a numeral.
fn fold_possessives(s: &str, placeholders: &[String]) -> String {
    let Some(canonical) = placeholders.first().map(|p| headword_key(p)) else {
        return s.to_string();
    };

    s.split(' ')
        .map(|w| {
            let base = w
                .strip_suffix("'s")
                .or_else(|| w.strip_suffix("’s"));
            match base {
                Some(b) if placeholders.iter().any(|p| headword_key(p) == b) => {
                    format!("{canonical}'s")
                }
                _ => w.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_punctuation(s: &str) -> String {
    let mapped: String = s
        .chars()
        .filter_map(|c| match c {
            '-' | '–' | '—' | '/' | '_' => Some(' '),
            c if c.is_alphanumeric() || c.is_whitespace() => Some(c),
            _ => None,
        })
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_plural(word: &str) -> &str {
    let keep = word.chars().count() <= 3
        || !word.ends_with('s')
        || word.ends_with("ss")
        || word.ends_with("us")
        || word.ends_with("is");
    if keep {
        word
    } else {
        &word[..word.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> SynonymRules {
        SynonymRules::default()
    }

    #[test]
    fn headword_key_folds_case_and_spacing() {
        assert_eq!(headword_key("  A Stitch  in\tTime "), "a stitch in time");
    }

    #[test]
    fn definition_key_ignores_quotes_and_final_stop() {
        assert_eq!(
            definition_key("“Prompt” action saves effort."),
            definition_key("prompt action saves effort")
        );
    }

    #[test]
    fn punctuation_variants_share_a_key() {
        assert_eq!(
            synonym_key("Well begun is half done!", &rules()),
            synonym_key("well-begun, is half done", &rules())
        );
    }

    #[test]
    fn to_be_prefix_is_ignored() {
        assert_eq!(
            synonym_key("to be as right as rain", &rules()),
            synonym_key("as right as rain", &rules())
        );
        // but not when nothing would be left
        assert_eq!(synonym_key("to be", &rules()), "to be");
    }

    #[test]
    fn plurals_fold_but_short_words_stay() {
        assert_eq!(
            synonym_key("actions speak louder than words", &rules()),
            synonym_key("action speaks louder than word", &rules())
        );
        assert_eq!(synonym_key("as is", &rules()), "as is");
        assert_eq!(synonym_key("glass houses", &rules()), "glass house");
    }

    #[test]
    fn possessive_placeholders_collapse() {
        assert_eq!(
            synonym_key("mind someone's business", &rules()),
            synonym_key("mind one's business", &rules())
        );
    }

    #[test]
    fn numeral_one_is_not_a_placeholder() {
        assert_eq!(
            synonym_key("one good turn deserves another", &rules()),
            "one good turn deserve another"
        );
        assert_ne!(
            synonym_key("one man's meat is another man's poison", &rules()),
            synonym_key("someone man's meat is another man's poison", &rules())
        );
        assert_eq!(
            synonym_key("pay somebody’s way", &rules()),
            synonym_key("pay one's way", &rules())
        );
    }

    #[test]
    fn rules_can_be_switched_off() {
        let strict = SynonymRules {
            ignore_punctuation: false,
            strip_prefixes: Vec::new(),
            fold_plurals: false,
            placeholders: Vec::new(),
            match_definitions: false,
        };
        assert_ne!(
            synonym_key("actions speak", &strict),
            synonym_key("action speak", &strict)
        );
        assert_eq!(synonym_key("A  Penny, Saved", &strict), "a penny, saved");
    }
}
