use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("Remote fetch: {0}")]
  RemoteFetch(String),

  #[error("Model load: {0}")]
  ModelLoad(String),

  #[error("Inference: {0}")]
  Inference(String),

  #[error("Extraction: {0}")]
  Extraction(String),

  #[error("Storage: {0}")]
  Storage(String),

  #[error("IO: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
