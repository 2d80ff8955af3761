use serde::{Deserialize, Serialize};

/// Why a unit matched (or did not)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
  /// A keyword was found in the unit's text
  KeywordMatch,
  /// The image model scored a category label above threshold
  ModelMatch,
  /// No strategy matched
  NoMatch,
  /// A classifier failed; the unit is treated as non-matching
  ClassifierError,
}

impl MatchReason {
  pub fn as_str(&self) -> &'static str {
    match self {
      MatchReason::KeywordMatch => "keyword_match",
      MatchReason::ModelMatch => "model_match",
      MatchReason::NoMatch => "no_match",
      MatchReason::ClassifierError => "classifier_error",
    }
  }
}

/// Outcome of classifying one unit; produced once, immutable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
  pub matched: bool,
  pub reason: MatchReason,
}

impl Verdict {
  pub fn keyword() -> Self {
    Self {
      matched: true,
      reason: MatchReason::KeywordMatch,
    }
  }

  pub fn model() -> Self {
    Self {
      matched: true,
      reason: MatchReason::ModelMatch,
    }
  }

  pub fn no_match() -> Self {
    Self {
      matched: false,
      reason: MatchReason::NoMatch,
    }
  }

  pub fn classifier_error() -> Self {
    Self {
      matched: false,
      reason: MatchReason::ClassifierError,
    }
  }
}
