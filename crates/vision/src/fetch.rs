use crate::preprocess::ImageData;
use crate::provider::VisionError;
use async_trait::async_trait;
use feedveil_core::ImageRef;
use tracing::debug;

/// Resolves a unit's thumbnail reference to decoded image data
#[async_trait]
pub trait ThumbnailLoader: Send + Sync {
  async fn load(&self, reference: &ImageRef) -> Result<ImageData, VisionError>;
}

/// Loader fetching thumbnail bytes over HTTP
#[derive(Debug, Clone, Default)]
pub struct HttpThumbnailLoader {
  client: reqwest::Client,
}

impl HttpThumbnailLoader {
  pub fn new() -> Self {
    Self {
      client: reqwest::Client::new(),
    }
  }
}

#[async_trait]
impl ThumbnailLoader for HttpThumbnailLoader {
  async fn load(&self, reference: &ImageRef) -> Result<ImageData, VisionError> {
    let response = self.client.get(reference.as_str()).send().await?;

    if !response.status().is_success() {
      return Err(VisionError::Decode(format!(
        "thumbnail fetch returned {}",
        response.status()
      )));
    }

    let bytes = response.bytes().await?;
    debug!("Fetched thumbnail {} ({} bytes)", reference, bytes.len());
    ImageData::decode(&bytes)
  }
}
