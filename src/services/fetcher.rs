use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::config::FetchConfig;
use crate::model::entry::{Category, Entry};
use crate::parsers::wikitext::{self, Extraction};
use crate::services::dataset::{self, RecordWriter};
use crate::services::normalize;
use crate::services::wiki::{WikiClient, WikiSource};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    pub categories: usize,
    pub titles_listed: usize,
    pub fetched: usize,
    pub ambiguous_accepted: usize,
    pub skipped_no_definition: usize,
    pub skipped_ambiguous: usize,
    pub skipped_existing: usize,
    pub failed_requests: usize,
    pub listing_errors: usize,
}

impl FetchReport {
    pub fn skipped(&self) -> usize {
        self.skipped_no_definition + self.skipped_ambiguous + self.failed_requests
    }
}

/// Fetches every configured category from the live API.
pub fn run(cfg: &FetchConfig) -> Result<FetchReport> {
    cfg.validate()?;
    let mut client = WikiClient::new(cfg)?;
    run_with(&mut client, cfg)
}

/// Same as [`run`] against any [`WikiSource`].
pub fn run_with<S: WikiSource>(source: &mut S, cfg: &FetchConfig) -> Result<FetchReport> {
    cfg.validate()?;

    let mut report = FetchReport {
        categories: cfg.categories.len(),
        ..FetchReport::default()
    };

    let existing = if cfg.resume { existing_titles(cfg)? } else { HashSet::new() };
    let mut writer = if cfg.resume {
        RecordWriter::append(&cfg.output, cfg.delimiter)?
    } else {
        RecordWriter::create(&cfg.output, cfg.delimiter)?
    };

    for &category in &cfg.categories {
        let titles = list_category(source, category, cfg, &mut report)?;
        info!(%category, titles = titles.len(), "category listed");
        report.titles_listed += titles.len();

        for title in titles {
            if existing.contains(&(category, normalize::headword_key(&title))) {
                report.skipped_existing += 1;
                continue;
            }

            let Some(definition) = fetch_definition(source, &title, cfg, &mut report)? else {
                continue;
            };

            writer.write(&Entry::new(title, definition, category))?;
            report.fetched += 1;
        }
    }

    info!(
        fetched = report.fetched,
        skipped = report.skipped(),
        existing = report.skipped_existing,
        output = %cfg.output.display(),
        "fetch finished"
    );
    debug_assert_eq!(writer.written(), report.fetched);

    Ok(report)
}

fn list_category<S: WikiSource>(
    source: &mut S,
    category: Category,
    cfg: &FetchConfig,
    report: &mut FetchReport,
) -> Result<Vec<String>> {
    let mut titles = Vec::new();
    let mut cont: Option<String> = None;

    loop {
        let page = match source.category_members(category.wiki_title(), cont.as_deref(), cfg.page_limit) {
            Ok(p) => p,
            Err(e) if e.is_transient() => {
                warn!(%category, error = %e, "category listing failed; keeping titles gathered so far");
                report.listing_errors += 1;
                break;
            }
            Err(e) => return Err(e),
        };

        titles.extend(page.titles);

        match page.next {
            // A token that does not advance would loop forever.
            Some(next) if cont.as_deref() != Some(next.as_str()) => cont = Some(next),
            _ => break,
        }
    }

    Ok(titles)
}

/// `Ok(None)` when the page is skipped; the reason is counted in `report`.
fn fetch_definition<S: WikiSource>(
    source: &mut S,
    title: &str,
    cfg: &FetchConfig,
    report: &mut FetchReport,
) -> Result<Option<String>> {
    let text = match source.page_wikitext(title) {
        Ok(t) => t,
        Err(e) if e.is_transient() => {
            warn!(title, error = %e, "page fetch failed; skipping");
            report.failed_requests += 1;
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    match wikitext::extract(&text, cfg.definition_policy) {
        Extraction::Found(d) => {
            debug!(title, "definition found");
            Ok(Some(d))
        }
        Extraction::NotFound => {
            warn!(title, "no definition section; skipping");
            report.skipped_no_definition += 1;
            Ok(None)
        }
        Extraction::Ambiguous(candidates) if cfg.accept_ambiguous => {
            debug!(title, candidates = candidates.len(), "no English definition; using first candidate section");
            report.ambiguous_accepted += 1;
            Ok(wikitext::join_definitions(&candidates, cfg.definition_policy))
        }
        Extraction::Ambiguous(candidates) => {
            warn!(title, candidates = candidates.len(), "no English definition; skipping");
            report.skipped_ambiguous += 1;
            Ok(None)
        }
    }
}

fn existing_titles(cfg: &FetchConfig) -> Result<HashSet<(Category, String)>> {
    if !cfg.output.exists() {
        return Ok(HashSet::new());
    }

    let loaded = dataset::read_entries(&cfg.output, cfg.delimiter)?;
    info!(existing = loaded.entries.len(), "resuming; already fetched titles will be skipped");

    Ok(loaded
        .entries
        .into_iter()
        .map(|e| (e.category, normalize::headword_key(&e.headword)))
        .collect())
}
