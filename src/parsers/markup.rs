//! Turns one line of wikitext into plain text.

use regex::Regex;
use std::sync::LazyLock;

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<ref[^>]*/>|<ref[^>]*>.*?</ref>").unwrap());
static TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").unwrap());
static PIPED_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[[^\]|]*\|([^\]]*)\]\]").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[([^\]]*)\]\]").unwrap());
static EXT_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[https?://[^\s\]]+\s*([^\]]*)\]").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static FOOTNOTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\d+\]").unwrap());
static EMPTY_PARENS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\s*\)").unwrap());

// Nested templates are expanded innermost first; real pages nest two or three deep.
const MAX_TEMPLATE_PASSES: usize = 8;

pub fn clean_definition(line: &str) -> String {
    let mut s = COMMENT_RE.replace_all(line, "").into_owned();
    s = REF_RE.replace_all(&s, "").into_owned();

    for _ in 0..MAX_TEMPLATE_PASSES {
        if !TEMPLATE_RE.is_match(&s) {
            break;
        }
        s = TEMPLATE_RE
            .replace_all(&s, |caps: &regex::Captures| render_template(&caps[1]))
            .into_owned();
    }

    s = PIPED_LINK_RE.replace_all(&s, "$1").into_owned();
    s = LINK_RE.replace_all(&s, "$1").into_owned();
    s = EXT_LINK_RE.replace_all(&s, "$1").into_owned();
    s = TAG_RE.replace_all(&s, "").into_owned();
    s = s.replace("'''", "").replace("''", "");
    s = FOOTNOTE_RE.replace_all(&s, "").into_owned();
    s = normalize_entities(&s);
    s = EMPTY_PARENS_RE.replace_all(&s, "").into_owned();

    normalize_ws(&s)
}

fn render_template(inner: &str) -> String {
    let mut parts = inner.split('|').map(str::trim);
    let name = parts.next().unwrap_or("").to_lowercase();

    // Named arguments (`t=...`, `nocap=1`) never carry the text we want.
    let args: Vec<&str> = parts.filter(|p| !p.contains('=')).collect();

    if let Some(phrase) = form_of_phrase(&name) {
        // {{alternative form of|en|target}}; language code first when present.
        let target = if args.len() >= 2 { args[1] } else { args.first().copied().unwrap_or("") };
        if target.is_empty() {
            return String::new();
        }
        return format!("{phrase} {target}");
    }

    match name.as_str() {
        "lb" | "lbl" | "label" | "term-label" | "tlb" => {
            let labels: Vec<&str> = args
                .iter()
                .skip(1)
                .copied()
                .filter(|a| !a.is_empty() && *a != "_" && *a != "and" && *a != "or")
                .collect();
            if labels.is_empty() {
                String::new()
            } else {
                format!("({})", labels.join(", "))
            }
        }
        "gloss" | "gl" | "q" | "qual" | "qualifier" | "i" => match args.first() {
            Some(a) if !a.is_empty() => format!("({a})"),
            _ => String::new(),
        },
        "l" | "m" | "link" | "mention" | "l-self" | "ll" => {
            // {{l|en|target|display}}
            match (args.get(2), args.get(1)) {
                (Some(display), _) if !display.is_empty() => display.to_string(),
                (_, Some(target)) => target.to_string(),
                _ => String::new(),
            }
        }
        "w" | "pedia" => match (args.get(1), args.first()) {
            (Some(display), _) if !display.is_empty() => display.to_string(),
            (_, Some(target)) => target.to_string(),
            _ => String::new(),
        },
        "non-gloss definition" | "non-gloss" | "n-g" | "ngd" | "taxlink" => {
            args.first().map(|a| a.to_string()).unwrap_or_default()
        }
        _ => String::new(),
    }
}

fn form_of_phrase(name: &str) -> Option<&'static str> {
    let phrase = match name {
        "alternative form of" | "alt form" | "alt form of" | "altform" | "alt-form" => {
            "Alternative form of"
        }
        "alternative spelling of" | "alt sp" | "alt spelling" | "alt sp of" => {
            "Alternative spelling of"
        }
        "synonym of" | "syn of" => "Synonym of",
        "abbreviation of" | "abbr of" => "Abbreviation of",
        "misspelling of" | "missp" => "Misspelling of",
        "alternative case form of" | "alt case" | "alt case form" | "alt-case" => {
            "Alternative case form of"
        }
        "ellipsis of" | "ellip of" => "Ellipsis of",
        "short for" => "Short for",
        "clipping of" | "clip of" => "Clipping of",
        _ => return None,
    };
    Some(phrase)
}

fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}
