use crate::preprocess::ImageData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One scored label from the model, ordered by score in responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
  pub label: String,
  pub score: f32,
}

impl LabelScore {
  pub fn new(label: impl Into<String>, score: f32) -> Self {
    Self {
      label: label.into(),
      score,
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
  #[error("Model load failed: {0}")]
  Load(String),
  #[error("Inference failed: {0}")]
  Inference(String),
  #[error("Request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("Image decode failed: {0}")]
  Decode(String),
}

/// A learned-model image classifier
#[async_trait]
pub trait ImageClassifier: Send + Sync {
  fn name(&self) -> &str;

  /// Classify a decoded image, returning scored labels
  async fn classify(&self, image: &ImageData) -> Result<Vec<LabelScore>, VisionError>;

  async fn is_available(&self) -> bool;
}
