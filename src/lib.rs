//! Builds an idiom dataset from Wiktionary.
//!
//! Two batch jobs run in order: [`services::fetcher`] lists the configured
//! categories, extracts a definition from each page's wikitext and writes the
//! intermediate dataset; [`services::cleaner`] removes duplicates, pointer
//! definitions and synonyms and writes the final dataset.

pub mod error;
pub mod logging;
pub mod model;
pub mod parsers;
pub mod services;

pub use error::{Error, Result};
pub use model::config::{AppConfig, CleanConfig, FetchConfig};
pub use model::entry::{Category, Entry};
