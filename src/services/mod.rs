pub mod cleaner;
pub mod dataset;
pub mod encoding;
pub mod fetcher;
pub mod normalize;
pub mod references;
pub mod wiki;
