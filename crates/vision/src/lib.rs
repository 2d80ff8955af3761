pub mod detector;
pub mod fetch;
pub mod preprocess;
pub mod provider;
pub mod service;

pub use detector::{CategoryRule, ImageDetector};
pub use fetch::{HttpThumbnailLoader, ThumbnailLoader};
pub use preprocess::ImageData;
pub use provider::{ImageClassifier, LabelScore, VisionError};
pub use service::ServiceClassifier;
