pub mod markup;
pub mod wikitext;
