//! Cross-reference detection in definitions.

use regex::Regex;
use std::sync::LazyLock;

// Optional leading labels such as "(idiomatic)", then a pointer phrase and
// its target.
static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^
        (?:\([^)]*\)\s*)*
        (?:
            see(?:\s+also)?
          | synonym\s+of
          | (?:alternative|alternate)\s+(?:case\s+form|form|spelling|term)\s+(?:of|for)
          | another\s+(?:form|term)\s+(?:of|for)
          | abbreviation\s+of
          | misspelling\s+of
          | ellipsis\s+of
          | clipping\s+of
          | short\s+for
        )
        \s*:?\s+
        (?P<target>.+)$",
    )
    .unwrap()
});

// "...; see also X." / "... Compare X." / "... (see X)." A bare "see" after
// a clause break is usually the verb, so only the parenthetical form takes it.
static TRAILING_XREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        (?:
            [;.]\s*(?:see\s+also|compare|cf\.?)\s+[^;.()]+\.?
          | \s*\(\s*(?:see\s+also|see|compare|cf\.?)\s+[^()]*\)\.?
        )
        \s*$",
    )
    .unwrap()
});

/// Target headword when the whole definition is a pointer to another entry.
pub fn reference_target(definition: &str) -> Option<String> {
    let caps = REFERENCE_RE.captures(definition.trim())?;
    let raw = caps.name("target")?.as_str();

    // First target only; drop a trailing gloss and the closing stop.
    let first = raw.split([';', ',']).next().unwrap_or(raw);
    let first = match first.find('(') {
        Some(i) => &first[..i],
        None => first,
    };
    let target = first
        .trim()
        .trim_end_matches(['.', ':'])
        .trim_matches(['"', '“', '”', '\''])
        .trim();

    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

/// Removes trailing "see also" style clauses. Returns `None` when there is
/// nothing to strip or stripping would leave no text.
pub fn strip_cross_refs(definition: &str) -> Option<String> {
    let mut s = definition.trim().to_string();
    let ended_with_stop = s.ends_with('.');
    let mut changed = false;

    while let Some(m) = TRAILING_XREF_RE.find(&s) {
        let head = s[..m.start()].trim_end();
        if head.is_empty() {
            break;
        }
        s = head.to_string();
        changed = true;
    }

    if !changed {
        return None;
    }
    if ended_with_stop && !s.ends_with(['.', '!', '?']) {
        s.push('.');
    }
    Some(s)
}
