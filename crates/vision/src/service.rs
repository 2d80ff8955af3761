use crate::preprocess::{self, ImageData};
use crate::provider::{ImageClassifier, LabelScore, VisionError};
use async_trait::async_trait;
use feedveil_core::VisionConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const DEFAULT_SERVICE_URL: &str = "http://localhost:8590";
const DEFAULT_MODEL: &str = "mobilenet-v2";
const DEFAULT_INPUT_SIZE: u32 = 224;

/// HTTP inference service classifier
///
/// The remote model loads lazily, at most once per process: concurrent
/// first callers coalesce onto the same in-flight load instead of issuing
/// parallel loads. A failed load is not latched, so a later unit may try
/// again.
pub struct ServiceClassifier {
  client: reqwest::Client,
  base_url: String,
  model: String,
  input_size: u32,
  loaded: OnceCell<()>,
}

impl Default for ServiceClassifier {
  fn default() -> Self {
    Self::new()
  }
}

impl ServiceClassifier {
  pub fn new() -> Self {
    Self {
      client: reqwest::Client::new(),
      base_url: DEFAULT_SERVICE_URL.to_string(),
      model: DEFAULT_MODEL.to_string(),
      input_size: DEFAULT_INPUT_SIZE,
      loaded: OnceCell::new(),
    }
  }

  pub fn from_config(config: &VisionConfig) -> Self {
    Self {
      client: reqwest::Client::new(),
      base_url: config.service_url.clone(),
      model: config.model.clone(),
      input_size: config.input_size,
      loaded: OnceCell::new(),
    }
  }

  pub fn with_url(mut self, url: impl Into<String>) -> Self {
    self.base_url = url.into();
    self
  }

  pub fn with_model(mut self, model: impl Into<String>) -> Self {
    self.model = model.into();
    self
  }

  pub fn model_id(&self) -> &str {
    &self.model
  }

  fn load_url(&self) -> String {
    format!("{}/models/load", self.base_url)
  }

  fn classify_url(&self) -> String {
    format!("{}/classify", self.base_url)
  }

  async fn ensure_loaded(&self) -> Result<(), VisionError> {
    self
      .loaded
      .get_or_try_init(|| async {
        info!("Loading model {} on {}", self.model, self.base_url);

        let request = LoadRequest { model: &self.model };
        let response = self
          .client
          .post(self.load_url())
          .json(&request)
          .send()
          .await
          .map_err(|e| VisionError::Load(e.to_string()))?;

        if !response.status().is_success() {
          let status = response.status();
          let body = response.text().await.unwrap_or_default();
          return Err(VisionError::Load(format!("service returned {}: {}", status, body)));
        }

        debug!("Model {} loaded", self.model);
        Ok(())
      })
      .await
      .map(|_| ())
  }
}

#[derive(Debug, Serialize)]
struct LoadRequest<'a> {
  model: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
  predictions: Vec<LabelScore>,
}

#[async_trait]
impl ImageClassifier for ServiceClassifier {
  fn name(&self) -> &str {
    "service"
  }

  async fn classify(&self, image: &ImageData) -> Result<Vec<LabelScore>, VisionError> {
    self.ensure_loaded().await?;

    // Transient buffers live only in this scope and are released on every
    // exit path
    let body = {
      let input = preprocess::to_model_input(image, self.input_size)?;
      preprocess::encode_png(&input)?
    };

    debug!("Classifying {}x{} image ({} bytes encoded)", image.width(), image.height(), body.len());

    let response = self
      .client
      .post(self.classify_url())
      .header(reqwest::header::CONTENT_TYPE, "image/png")
      .body(body)
      .send()
      .await?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      warn!("Inference failed: {} - {}", status, body);
      return Err(VisionError::Inference(format!("service returned {}: {}", status, body)));
    }

    let result: ClassifyResponse = response.json().await?;
    Ok(result.predictions)
  }

  async fn is_available(&self) -> bool {
    match self.client.get(&self.base_url).send().await {
      Ok(response) => response.status().is_success(),
      Err(_) => false,
    }
  }
}
