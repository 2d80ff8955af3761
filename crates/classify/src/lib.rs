pub mod pipeline;
pub mod stages;
pub mod text;

pub use pipeline::ClassifierPipeline;
pub use stages::{ThumbnailModel, ThumbnailUrlKeywords, TitleKeywords, UnitClassifier};
pub use text::TextClassifier;
