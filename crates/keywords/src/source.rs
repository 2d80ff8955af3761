use async_trait::async_trait;
use feedveil_core::KeywordConfig;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum FetchError {
  #[error("Request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("Source returned {status}")]
  Status { status: u16 },
  #[error("Malformed response: {0}")]
  Malformed(String),
}

impl FetchError {
  /// Transient failures worth one more attempt
  pub fn is_retryable(&self) -> bool {
    match self {
      FetchError::Request(_) => true,
      FetchError::Status { status } => matches!(status, 429 | 502 | 503 | 504),
      FetchError::Malformed(_) => false,
    }
  }
}

/// Produces the category keyword list
#[async_trait]
pub trait KeywordSource: Send + Sync {
  fn name(&self) -> &str;
  async fn fetch(&self) -> Result<Vec<String>, FetchError>;
}

/// One element of the remote response: word objects or bare strings,
/// depending on the backend
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseItem {
  Entry { word: String },
  Plain(String),
}

impl ResponseItem {
  fn into_word(self) -> String {
    match self {
      ResponseItem::Entry { word } => word,
      ResponseItem::Plain(word) => word,
    }
  }
}

/// Remote keyword source hitting a Datamuse-style word endpoint
#[derive(Debug, Clone)]
pub struct RemoteSource {
  client: reqwest::Client,
  endpoint: String,
  max_words: usize,
}

impl RemoteSource {
  pub fn new(endpoint: impl Into<String>, max_words: usize) -> Self {
    Self {
      client: reqwest::Client::new(),
      endpoint: endpoint.into(),
      max_words,
    }
  }

  pub fn from_config(config: &KeywordConfig) -> Self {
    Self::new(config.endpoint.clone(), config.max_words)
  }

  fn request_url(&self) -> String {
    if self.endpoint.contains('?') {
      format!("{}&max={}", self.endpoint, self.max_words)
    } else {
      format!("{}?max={}", self.endpoint, self.max_words)
    }
  }
}

#[async_trait]
impl KeywordSource for RemoteSource {
  fn name(&self) -> &str {
    "remote"
  }

  async fn fetch(&self) -> Result<Vec<String>, FetchError> {
    let response = self.client.get(self.request_url()).send().await?;

    if !response.status().is_success() {
      let status = response.status().as_u16();
      warn!("Keyword fetch returned {}", status);
      return Err(FetchError::Status { status });
    }

    let body = response.text().await?;
    let items: Vec<ResponseItem> =
      serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let words: Vec<String> = items
      .into_iter()
      .map(|item| item.into_word().to_lowercase())
      .filter(|word| !word.is_empty())
      .take(self.max_words)
      .collect();

    debug!("Fetched {} keywords from {}", words.len(), self.endpoint);
    Ok(words)
  }
}

/// Retry wrapper absorbing transient network noise
pub struct Retrying<S> {
  inner: S,
  max_retries: u32,
  backoff: Duration,
}

impl<S: KeywordSource> Retrying<S> {
  pub fn new(inner: S) -> Self {
    Self {
      inner,
      max_retries: 2,
      backoff: Duration::from_millis(500),
    }
  }

  pub fn with_policy(inner: S, max_retries: u32, backoff: Duration) -> Self {
    Self {
      inner,
      max_retries,
      backoff,
    }
  }
}

#[async_trait]
impl<S: KeywordSource> KeywordSource for Retrying<S> {
  fn name(&self) -> &str {
    self.inner.name()
  }

  async fn fetch(&self) -> Result<Vec<String>, FetchError> {
    let mut last_error = None;

    for attempt in 0..=self.max_retries {
      if attempt > 0 {
        let backoff = self.backoff * attempt;
        debug!("Keyword fetch retry {} after {:?}", attempt, backoff);
        sleep(backoff).await;
      }

      match self.inner.fetch().await {
        Ok(words) => return Ok(words),
        Err(e) if e.is_retryable() && attempt < self.max_retries => {
          warn!("Retryable keyword fetch error on attempt {}: {}", attempt + 1, e);
          last_error = Some(e);
        }
        Err(e) => return Err(e),
      }
    }

    Err(last_error.unwrap_or(FetchError::Malformed("retries exhausted".to_string())))
  }
}
