pub mod extractor;

pub use extractor::{ExtractError, UnitExtractor};
