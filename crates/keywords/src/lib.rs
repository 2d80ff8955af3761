pub mod cached;
pub mod source;

pub use cached::{CachedKeywords, KeywordSet};
pub use source::{FetchError, KeywordSource, RemoteSource, Retrying};
