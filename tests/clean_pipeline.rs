use std::fs;
use std::path::Path;

use idiom_core::model::config::ReferencePolicy;
use idiom_core::services::{cleaner, dataset, normalize, references};
use idiom_core::{Category, CleanConfig, Entry};
use tempfile::TempDir;

fn config(dir: &TempDir) -> CleanConfig {
    CleanConfig {
        input: dir.path().join("raw.csv"),
        output: dir.path().join("final.csv"),
        ..CleanConfig::default()
    }
}

fn write_raw(path: &Path, body: &str) {
    fs::write(path, format!("headword,definition,category\n{body}")).unwrap();
}

fn read_final(cfg: &CleanConfig) -> Vec<Entry> {
    let loaded = dataset::read_entries(&cfg.output, cfg.delimiter).unwrap();
    assert_eq!(loaded.malformed, 0);
    loaded.entries
}

const MESSY: &str = "\
A Stitch in Time,Acting early prevents bigger problems.,proverb
a stitch in time,A second copy.,proverb
Foo,see Bar,proverb
Bar,real definition,proverb
to be as right as rain,In good health; see also fit as a fiddle.,simile
as right as rain,Healthy.,simile
actions speak louder than words,What you do matters more than what you say.,aphorism
action speaks louder than words,Deeds count.,aphorism
look before you leap,Alternative form of think before you act,proverb
broken row without definition
cool as a cucumber,\"Calm, composed.\",simile
unknown,Something.,idiom
";

#[test]
fn stitch_in_time_collapses_to_one_entry() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    write_raw(
        &cfg.input,
        "A Stitch in Time,Acting early saves effort.,proverb\na stitch in time,Same thing.,proverb\n",
    );

    let report = cleaner::run(&cfg).unwrap();
    let out = read_final(&cfg);

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].headword, "A Stitch in Time");
    assert_eq!(report.exact_duplicates, 1);
}

#[test]
fn see_reference_is_dropped_and_target_kept() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    write_raw(&cfg.input, "Foo,see Bar,proverb\nBar,real definition,proverb\n");

    cleaner::run(&cfg).unwrap();

    assert_eq!(read_final(&cfg), vec![Entry::new("Bar", "real definition", Category::Proverb)]);
}

#[test]
fn see_reference_resolves_under_resolve_policy() {
    let dir = TempDir::new().unwrap();
    let cfg = CleanConfig {
        reference_policy: ReferencePolicy::Resolve,
        ..config(&dir)
    };
    write_raw(&cfg.input, "Foo,see Bar,proverb\nBar,real definition,proverb\n");

    cleaner::run(&cfg).unwrap();

    assert_eq!(
        read_final(&cfg),
        vec![
            Entry::new("Foo", "real definition", Category::Proverb),
            Entry::new("Bar", "real definition", Category::Proverb),
        ]
    );
}

#[test]
fn wait_and_see_keeps_its_whole_definition() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    write_raw(&cfg.input, "wait and see,To be patient; see how things turn out.,proverb\n");

    let report = cleaner::run(&cfg).unwrap();

    assert_eq!(read_final(&cfg)[0].definition, "To be patient; see how things turn out.");
    assert_eq!(report.cross_refs_stripped, 0);
}

#[test]
fn empty_dataset_gives_empty_output() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    fs::write(&cfg.input, "").unwrap();

    let report = cleaner::run(&cfg).unwrap();

    assert_eq!(report.written, 0);
    assert!(read_final(&cfg).is_empty());
    assert_eq!(fs::read_to_string(&cfg.output).unwrap(), "headword,definition,category\n");
}

#[test]
fn malformed_rows_are_counted_not_fatal() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    write_raw(&cfg.input, MESSY);

    let report = cleaner::run(&cfg).unwrap();

    assert_eq!(report.malformed, 2);
    assert_eq!(report.total_rows, 12);
    assert_eq!(report.written + report.removed(), report.total_rows - report.malformed);
}

#[test]
fn final_dataset_holds_its_invariants() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    write_raw(&cfg.input, MESSY);

    cleaner::run(&cfg).unwrap();
    let out = read_final(&cfg);

    let headwords: Vec<&str> = out.iter().map(|e| e.headword.as_str()).collect();
    assert_eq!(
        headwords,
        vec![
            "A Stitch in Time",
            "Bar",
            "to be as right as rain",
            "actions speak louder than words",
            "cool as a cucumber",
        ]
    );

    let mut keys: Vec<String> = out.iter().map(|e| normalize::headword_key(&e.headword)).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), out.len());

    assert!(out.iter().all(|e| references::reference_target(&e.definition).is_none()));
    assert_eq!(out[2].definition, "In good health.");
    assert_eq!(out[4].definition, "Calm, composed.");
}

#[test]
fn cleaning_twice_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    write_raw(&cfg.input, MESSY);
    cleaner::run(&cfg).unwrap();
    let first = fs::read_to_string(&cfg.output).unwrap();

    let again = CleanConfig {
        input: cfg.output.clone(),
        output: dir.path().join("final2.csv"),
        ..cfg.clone()
    };
    let report = cleaner::run(&again).unwrap();

    assert_eq!(fs::read_to_string(&again.output).unwrap(), first);
    assert_eq!(report.removed(), 0);
    assert_eq!(report.cross_refs_stripped, 0);
}

#[test]
fn missing_input_is_an_error() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    assert!(cleaner::run(&cfg).is_err());
    assert!(!cfg.output.exists());
}
