pub mod config;
pub mod error;
pub mod unit;
pub mod verdict;

pub use config::{
  ClassifyConfig, Config, ExtractConfig, KeywordConfig, PipelineOrder, VisionConfig, WatchConfig,
};
pub use error::{Error, Result};
pub use unit::{ImageRef, Unit, UnitId, UnitState};
pub use verdict::{MatchReason, Verdict};
