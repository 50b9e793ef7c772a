use regex::Regex;
use std::sync::LazyLock;

use super::markup;
use crate::model::config::DefinitionPolicy;

const TARGET_LANGUAGE: &str = "English";

// Level-2 headings only ("==English==", not "===Proverb===").
static LANGUAGE_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^==\s*([^=\n]+?)\s*==\s*$").unwrap());

/// Outcome of looking for a definition on one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Definition text taken from the English section.
    Found(String),
    /// The page has no numbered definitions at all.
    NotFound,
    /// No English definitions, but other sections have some; these are their
    /// candidates in page order.
    Ambiguous(Vec<String>),
}

pub fn extract(wikitext: &str, policy: DefinitionPolicy) -> Extraction {
    let sections = language_sections(wikitext);

    if let Some((_, body)) = sections.iter().find(|(name, _)| *name == TARGET_LANGUAGE) {
        let defs = definitions(body);
        if let Some(text) = join_definitions(&defs, policy) {
            return Extraction::Found(text);
        }
    }

    let candidates: Vec<String> = sections
        .iter()
        .filter(|(name, _)| *name != TARGET_LANGUAGE)
        .flat_map(|(_, body)| definitions(body))
        .collect();

    // Pages without any language heading still get a chance.
    let candidates = if candidates.is_empty() && sections.is_empty() {
        definitions(wikitext)
    } else {
        candidates
    };

    if candidates.is_empty() {
        Extraction::NotFound
    } else {
        Extraction::Ambiguous(candidates)
    }
}

/// Applies `policy` to a list of definitions; `None` when the list is empty.
pub fn join_definitions(defs: &[String], policy: DefinitionPolicy) -> Option<String> {
    match policy {
        DefinitionPolicy::First => defs.first().cloned(),
        DefinitionPolicy::All if defs.is_empty() => None,
        DefinitionPolicy::All => Some(defs.join("; ")),
    }
}

/// Splits the page into `(language, body)` pairs at level-2 headings.
fn language_sections(wikitext: &str) -> Vec<(&str, &str)> {
    let headings: Vec<_> = LANGUAGE_HEADING_RE.captures_iter(wikitext).collect();
    let mut out = Vec::with_capacity(headings.len());

    for (i, caps) in headings.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = headings
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(wikitext.len());
        out.push((name.as_str(), &wikitext[whole.end()..end]));
    }

    out
}

/// Numbered definition lines (`# ...`), skipping quotations (`#*`),
/// usage examples (`#:`) and sub-senses (`##`).
fn definitions(body: &str) -> Vec<String> {
    body.lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter_map(|l| l.strip_prefix('#'))
        .filter(|rest| !rest.starts_with(&[':', '*', '#'][..]))
        .map(markup::clean_definition)
        .filter(|d| !d.is_empty())
        .collect()
}
