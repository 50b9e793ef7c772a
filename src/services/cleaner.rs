use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::config::{CleanConfig, ReferencePolicy, SynonymRules};
use crate::model::entry::Entry;
use crate::services::{dataset, normalize, references};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub total_rows: usize,
    pub malformed: usize,
    pub exact_duplicates: usize,
    pub references_dropped: usize,
    pub references_resolved: usize,
    pub dangling_references: usize,
    pub cross_refs_stripped: usize,
    pub synonyms: usize,
    pub written: usize,
}

impl CleanReport {
    pub fn removed(&self) -> usize {
        self.exact_duplicates + self.references_dropped + self.dangling_references + self.synonyms
    }
}

/// Reads `cfg.input`, cleans it and writes `cfg.output`.
pub fn run(cfg: &CleanConfig) -> Result<CleanReport> {
    cfg.validate()?;

    let loaded = dataset::read_entries(&cfg.input, cfg.delimiter)?;
    info!(
        input = %cfg.input.display(),
        entries = loaded.entries.len(),
        malformed = loaded.malformed,
        "cleaning dataset"
    );

    let total = loaded.entries.len() + loaded.malformed;
    let (entries, mut report) = clean(loaded.entries, cfg);
    report.total_rows = total;
    report.malformed = loaded.malformed;

    dataset::write_entries_atomic(&cfg.output, &entries, cfg.delimiter)?;
    info!(output = %cfg.output.display(), written = report.written, "final dataset written");

    Ok(report)
}

/// The in-memory part of the clean: exact duplicates, then references, then
/// synonyms. Survivors keep their input order.
pub fn clean(entries: Vec<Entry>, cfg: &CleanConfig) -> (Vec<Entry>, CleanReport) {
    let mut report = CleanReport {
        total_rows: entries.len(),
        ..CleanReport::default()
    };

    let entries = dedup_exact(entries, &mut report);
    let entries = resolve_references(entries, cfg.reference_policy, &mut report);
    let entries = dedup_synonyms(entries, &cfg.synonyms, &mut report);

    report.written = entries.len();
    (entries, report)
}

fn dedup_exact(entries: Vec<Entry>, report: &mut CleanReport) -> Vec<Entry> {
    let mut seen: HashSet<String> = HashSet::with_capacity(entries.len());
    let mut out = Vec::with_capacity(entries.len());

    for e in entries {
        if seen.insert(normalize::headword_key(&e.headword)) {
            out.push(e);
        } else {
            debug!(headword = %e.headword, "duplicate headword removed");
            report.exact_duplicates += 1;
        }
    }

    out
}

enum Decision {
    Keep,
    Replace(usize),
    Drop,
    Dangling,
}

fn resolve_references(
    mut entries: Vec<Entry>,
    policy: ReferencePolicy,
    report: &mut CleanReport,
) -> Vec<(Entry, bool)> {
    for e in entries.iter_mut() {
        if references::reference_target(&e.definition).is_some() {
            continue;
        }
        if let Some(stripped) = references::strip_cross_refs(&e.definition) {
            e.definition = stripped;
            report.cross_refs_stripped += 1;
        }
    }

    // Headword keys are unique after the exact pass.
    let index: HashMap<String, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (normalize::headword_key(&e.headword), i))
        .collect();

    let decisions: Vec<Decision> = (0..entries.len())
        .map(|i| match references::reference_target(&entries[i].definition) {
            None => Decision::Keep,
            Some(target) => match (resolve_chain(&entries, &index, i, &target), policy) {
                (None, _) => Decision::Dangling,
                (Some(_), ReferencePolicy::Drop) => Decision::Drop,
                (Some(j), ReferencePolicy::Resolve) => Decision::Replace(j),
            },
        })
        .collect();

    let resolved: Vec<Option<String>> = decisions
        .iter()
        .map(|d| match d {
            Decision::Replace(j) => Some(entries[*j].definition.clone()),
            _ => None,
        })
        .collect();

    let mut out = Vec::with_capacity(entries.len());
    for ((mut e, decision), definition) in entries.into_iter().zip(decisions).zip(resolved) {
        match decision {
            Decision::Keep => out.push((e, false)),
            Decision::Replace(_) => {
                if let Some(d) = definition {
                    debug!(headword = %e.headword, "reference resolved");
                    e.definition = d;
                    report.references_resolved += 1;
                    out.push((e, true));
                }
            }
            Decision::Drop => {
                debug!(headword = %e.headword, definition = %e.definition, "reference dropped");
                report.references_dropped += 1;
            }
            Decision::Dangling => {
                debug!(headword = %e.headword, definition = %e.definition, "unresolvable reference dropped");
                report.dangling_references += 1;
            }
        }
    }

    out
}

/// Follows "see X" pointers from entry `from` until an entry with a real
/// definition is reached. `None` for missing targets and cycles.
fn resolve_chain(
    entries: &[Entry],
    index: &HashMap<String, usize>,
    from: usize,
    target: &str,
) -> Option<usize> {
    let mut visited: HashSet<usize> = HashSet::from([from]);
    let mut target = target.to_string();

    loop {
        let j = *index.get(&normalize::headword_key(&target))?;
        if !visited.insert(j) {
            return None;
        }
        match references::reference_target(&entries[j].definition) {
            Some(next) => target = next,
            None if entries[j].definition.trim().is_empty() => return None,
            None => return Some(j),
        }
    }
}

/// `entries` carry a flag for definitions copied in from a reference target.
/// Those share their target's text, so they never take part in definition
/// matching.
fn dedup_synonyms(
    entries: Vec<(Entry, bool)>,
    rules: &SynonymRules,
    report: &mut CleanReport,
) -> Vec<Entry> {
    let mut heads: HashSet<String> = HashSet::with_capacity(entries.len());
    let mut defs: HashSet<String> = HashSet::with_capacity(entries.len());
    let mut out = Vec::with_capacity(entries.len());

    for (e, resolved) in entries {
        let head = normalize::synonym_key(&e.headword, rules);
        let def = (rules.match_definitions && !resolved).then(|| normalize::definition_key(&e.definition));

        let same_head = heads.contains(&head);
        let same_def = def.as_ref().is_some_and(|d| defs.contains(d));

        if same_head || same_def {
            debug!(headword = %e.headword, same_head, same_def, "synonym removed");
            report.synonyms += 1;
            continue;
        }

        heads.insert(head);
        if let Some(d) = def {
            defs.insert(d);
        }
        out.push(e);
    }

    out
}
