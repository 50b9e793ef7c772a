use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::entry::Category;
use crate::services::dataset::Delimiter;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "idioms.json";

const MAX_PAGE_LIMIT: u32 = 500;

fn default_api_url() -> String {
    "https://en.wiktionary.org/w/api.php".to_string()
}

fn default_user_agent() -> String {
    format!("idiom-core/{} (idiom dataset builder)", env!("CARGO_PKG_VERSION"))
}

fn default_categories() -> Vec<Category> {
    Category::ALL.to_vec()
}

fn default_raw_path() -> PathBuf {
    PathBuf::from("data/idioms_raw.csv")
}

fn default_final_path() -> PathBuf {
    PathBuf::from("data/idioms.csv")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_max_retries() -> usize {
    3
}

fn default_page_limit() -> u32 {
    MAX_PAGE_LIMIT
}

fn default_true() -> bool {
    true
}

fn default_strip_prefixes() -> Vec<String> {
    vec!["to be ".to_string()]
}

fn default_placeholders() -> Vec<String> {
    ["someone", "somebody", "one"].iter().map(|s| s.to_string()).collect()
}

/// Contents of `idioms.json`. Both binaries read the same file and take
/// their own section.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub clean: CleanConfig,
}

impl AppConfig {
    /// Reads `path`, or `idioms.json` when present, or falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !p.exists() {
                    return Ok(Self::default());
                }
                p
            }
        };

        let data = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("invalid {}: {e}", path.display())))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionPolicy {
    /// Keep the first numbered definition of the English section.
    #[default]
    First,
    /// Keep every numbered definition, joined with "; ".
    All,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,

    #[serde(default = "default_raw_path")]
    pub output: PathBuf,

    #[serde(default)]
    pub delimiter: Delimiter,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// `cmlimit` for category listings.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    #[serde(default)]
    pub definition_policy: DefinitionPolicy,

    /// Take the first definition found outside the English section when the
    /// page has no English section at all.
    #[serde(default = "default_true")]
    pub accept_ambiguous: bool,

    /// Append to an existing output and skip titles it already holds.
    #[serde(default)]
    pub resume: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            categories: default_categories(),
            output: default_raw_path(),
            delimiter: Delimiter::default(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            max_retries: default_max_retries(),
            page_limit: default_page_limit(),
            definition_policy: DefinitionPolicy::default(),
            accept_ambiguous: true,
            resume: false,
        }
    }
}

impl FetchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::Config("category list is empty".into()));
        }
        if self.page_limit == 0 || self.page_limit > MAX_PAGE_LIMIT {
            return Err(Error::Config(format!(
                "page_limit must be between 1 and {MAX_PAGE_LIMIT}, got {}",
                self.page_limit
            )));
        }
        if self.api_url.trim().is_empty() {
            return Err(Error::Config("api_url is empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// Drop entries whose definition only points at another headword.
    #[default]
    Drop,
    /// Replace the pointer with the target's definition.
    Resolve,
}

/// Which variant markers are ignored when comparing headwords.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SynonymRules {
    /// Drop punctuation and apostrophes, treat hyphens and slashes as spaces.
    #[serde(default = "default_true")]
    pub ignore_punctuation: bool,

    /// Leading phrases removed from the headword ("to be ").
    #[serde(default = "default_strip_prefixes")]
    pub strip_prefixes: Vec<String>,

    /// Trailing plural "s" folded off each word.
    #[serde(default = "default_true")]
    pub fold_plurals: bool,

    /// Indefinite pronouns whose possessives stand in for each other
    /// ("someone's", "one's"). Bare forms are not folded.
    #[serde(default = "default_placeholders")]
    pub placeholders: Vec<String>,

    /// Entries with the same normalized definition are synonyms too.
    #[serde(default = "default_true")]
    pub match_definitions: bool,
}

impl Default for SynonymRules {
    fn default() -> Self {
        Self {
            ignore_punctuation: true,
            strip_prefixes: default_strip_prefixes(),
            fold_plurals: true,
            placeholders: default_placeholders(),
            match_definitions: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CleanConfig {
    #[serde(default = "default_raw_path")]
    pub input: PathBuf,

    #[serde(default = "default_final_path")]
    pub output: PathBuf,

    #[serde(default)]
    pub delimiter: Delimiter,

    #[serde(default)]
    pub reference_policy: ReferencePolicy,

    #[serde(default)]
    pub synonyms: SynonymRules,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            input: default_raw_path(),
            output: default_final_path(),
            delimiter: Delimiter::default(),
            reference_policy: ReferencePolicy::default(),
            synonyms: SynonymRules::default(),
        }
    }
}

impl CleanConfig {
    pub fn validate(&self) -> Result<()> {
        if self.input == self.output {
            return Err(Error::Config(format!(
                "input and output are the same file: {}",
                self.input.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.fetch.categories, Category::ALL.to_vec());
        assert_eq!(cfg.fetch.definition_policy, DefinitionPolicy::First);
        assert_eq!(cfg.clean.reference_policy, ReferencePolicy::Drop);
        assert_eq!(cfg.clean.synonyms, SynonymRules::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{ "fetch": { "categories": ["proverb"], "definition_policy": "all" },
                 "clean": { "reference_policy": "resolve", "synonyms": { "fold_plurals": false } } }"#,
        )
        .unwrap();

        assert_eq!(cfg.fetch.categories, vec![Category::Proverb]);
        assert_eq!(cfg.fetch.definition_policy, DefinitionPolicy::All);
        assert_eq!(cfg.fetch.page_limit, 500);
        assert!(cfg.fetch.accept_ambiguous);
        assert_eq!(cfg.clean.reference_policy, ReferencePolicy::Resolve);
        assert!(!cfg.clean.synonyms.fold_plurals);
        assert!(cfg.clean.synonyms.ignore_punctuation);
    }

    #[test]
    fn empty_category_list_is_rejected() {
        let cfg = FetchConfig {
            categories: Vec::new(),
            ..FetchConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn page_limit_out_of_range_is_rejected() {
        let cfg = FetchConfig {
            page_limit: 0,
            ..FetchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn clean_in_place_is_rejected() {
        let cfg = CleanConfig {
            output: default_raw_path(),
            ..CleanConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(&path, r#"{ "fetch": { "resume": true } }"#).unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert!(cfg.fetch.resume);
    }

    #[test]
    fn load_reports_invalid_json_as_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(AppConfig::load(Some(&path)), Err(Error::Config(_))));
    }
}
