use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable identity for a classifiable unit (newtype for type safety)
///
/// Either taken from a marker attribute the host wrote onto the node once,
/// or derived from the unit's content so that re-extraction of an unchanged
/// container yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(String);

impl UnitId {
  /// Id from a host-assigned marker attribute
  pub fn from_marker(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  /// Content-derived id for nodes carrying no marker attribute
  pub fn from_content(title: &str, image_ref: Option<&str>) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    if let Some(image_ref) = image_ref {
      hasher.update(b"\0");
      hasher.update(image_ref.as_bytes());
    }
    let digest = hasher.finalize();
    Self(hex::encode(&digest[..8])) // First 16 hex chars
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for UnitId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Opaque handle to the image data a unit references
///
/// Carries the reference string found in the markup; decoding is the
/// host's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef(String);

impl ImageRef {
  pub fn new(reference: impl Into<String>) -> Self {
    Self(reference.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for ImageRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Lifecycle state of a unit
///
/// Unseen -> Pending happens exactly once, before any classifier runs;
/// Pending -> Matched/NotMatched happens exactly once. Terminal units are
/// never classified again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
  Unseen,
  Pending,
  Matched,
  NotMatched,
}

impl UnitState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, UnitState::Matched | UnitState::NotMatched)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      UnitState::Unseen => "unseen",
      UnitState::Pending => "pending",
      UnitState::Matched => "matched",
      UnitState::NotMatched => "not_matched",
    }
  }
}

/// One classifiable content item: a title and an optional thumbnail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
  pub id: UnitId,
  pub title: String,
  pub thumbnail: Option<ImageRef>,
}

impl Unit {
  pub fn new(id: UnitId, title: impl Into<String>, thumbnail: Option<ImageRef>) -> Self {
    Self {
      id,
      title: title.into(),
      thumbnail,
    }
  }
}
