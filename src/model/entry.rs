use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One dataset record: a headword, its definition and the category it came from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Entry {
    pub headword: String,

    #[serde(default)]
    pub definition: String,

    pub category: Category,
}

impl Entry {
    pub fn new(headword: impl Into<String>, definition: impl Into<String>, category: Category) -> Self {
        Self {
            headword: headword.into(),
            definition: definition.into(),
            category,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Aphorism,
    Simile,
    Proverb,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Aphorism, Category::Simile, Category::Proverb];

    /// Title of the wiki category page listing this kind of entry.
    pub fn wiki_title(self) -> &'static str {
        match self {
            Category::Aphorism => "Category:English aphorisms",
            Category::Simile => "Category:English similes",
            Category::Proverb => "Category:English proverbs",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Aphorism => "aphorism",
            Category::Simile => "simile",
            Category::Proverb => "proverb",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aphorism" | "aphorisms" => Ok(Category::Aphorism),
            "simile" | "similes" => Ok(Category::Simile),
            "proverb" | "proverbs" => Ok(Category::Proverb),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}
