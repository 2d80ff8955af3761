// Category decision over model output, with a per-image memo
//
// Errors stop here: a failed load or inference becomes a ClassifierError
// verdict, never an Err, and is not memoized so a later pass may succeed.

use crate::preprocess::ImageData;
use crate::provider::{ImageClassifier, LabelScore};
use cache::Cache;
use feedveil_core::{Verdict, VisionConfig};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const MEMO_NAMESPACE: &str = "image_results";

/// Which labels count as the target category, above which score
#[derive(Debug, Clone)]
pub struct CategoryRule {
  labels: HashSet<String>,
  threshold: f32,
}

impl CategoryRule {
  pub fn new(labels: impl IntoIterator<Item = String>, threshold: f32) -> Self {
    Self {
      labels: labels.into_iter().map(|l| l.to_lowercase()).collect(),
      threshold,
    }
  }

  pub fn from_config(config: &VisionConfig) -> Self {
    Self::new(config.category_labels.iter().cloned(), config.confidence_threshold)
  }

  /// A prediction matches when its label names a category entry and its
  /// score clears the threshold
  pub fn matches(&self, predictions: &[LabelScore]) -> bool {
    predictions
      .iter()
      .any(|p| p.score > self.threshold && self.matches_label(&p.label))
  }

  /// Model labels often bundle synonyms ("ice cream, icecream"), so
  /// containment is checked, not equality
  fn matches_label(&self, label: &str) -> bool {
    let label = label.to_lowercase();
    self.labels.iter().any(|entry| label.contains(entry.as_str()))
  }
}

/// Image classification with memoized per-input verdicts
pub struct ImageDetector {
  classifier: Arc<dyn ImageClassifier>,
  rule: CategoryRule,
  cache: Arc<Cache>,
  memo_ttl: Duration,
}

impl ImageDetector {
  pub fn new(classifier: Arc<dyn ImageClassifier>, rule: CategoryRule, cache: Arc<Cache>, memo_ttl: Duration) -> Self {
    Self {
      classifier,
      rule,
      cache,
      memo_ttl,
    }
  }

  /// Decide whether the image matches the category
  ///
  /// Never returns an error: failures yield a ClassifierError verdict.
  pub async fn detect(&self, image: &ImageData) -> Verdict {
    let fingerprint = image.fingerprint();

    if let Some(matched) = self.cache.get::<bool>(MEMO_NAMESPACE, &fingerprint) {
      debug!("Image {} verdict from memo: {}", fingerprint, matched);
      return if matched { Verdict::model() } else { Verdict::no_match() };
    }

    match self.classifier.classify(image).await {
      Ok(predictions) => {
        let matched = self.rule.matches(&predictions);
        self.cache.set(MEMO_NAMESPACE, &fingerprint, &matched, Some(self.memo_ttl));
        if matched { Verdict::model() } else { Verdict::no_match() }
      }
      Err(e) => {
        warn!("Image classification failed: {}", e);
        Verdict::classifier_error()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::provider::VisionError;
  use async_trait::async_trait;
  use feedveil_core::MatchReason;
  use std::sync::atomic::{AtomicU32, Ordering};
  use tempfile::TempDir;

  fn rule() -> CategoryRule {
    CategoryRule::new(vec!["pizza".to_string(), "cheeseburger".to_string()], 0.5)
  }

  #[test]
  fn test_rule_requires_threshold() {
    let rule = rule();
    assert!(rule.matches(&[LabelScore::new("pizza", 0.8)]));
    assert!(!rule.matches(&[LabelScore::new("pizza", 0.4)]));
    assert!(!rule.matches(&[LabelScore::new("pizza", 0.5)]), "threshold is exclusive");
  }

  #[test]
  fn test_rule_requires_category_label() {
    let rule = rule();
    assert!(!rule.matches(&[LabelScore::new("sports car", 0.9)]));
    assert!(rule.matches(&[
      LabelScore::new("sports car", 0.9),
      LabelScore::new("pizza, pizza pie", 0.6),
    ]));
  }

  #[test]
  fn test_rule_is_case_insensitive() {
    let rule = rule();
    assert!(rule.matches(&[LabelScore::new("Cheeseburger", 0.7)]));
  }

  struct FixedClassifier {
    calls: AtomicU32,
    predictions: Result<Vec<LabelScore>, ()>,
  }

  impl FixedClassifier {
    fn ok(predictions: Vec<LabelScore>) -> Self {
      Self {
        calls: AtomicU32::new(0),
        predictions: Ok(predictions),
      }
    }

    fn failing() -> Self {
      Self {
        calls: AtomicU32::new(0),
        predictions: Err(()),
      }
    }
  }

  #[async_trait]
  impl ImageClassifier for FixedClassifier {
    fn name(&self) -> &str {
      "fixed"
    }

    async fn classify(&self, _image: &ImageData) -> Result<Vec<LabelScore>, VisionError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      match &self.predictions {
        Ok(predictions) => Ok(predictions.clone()),
        Err(()) => Err(VisionError::Inference("model exploded".to_string())),
      }
    }

    async fn is_available(&self) -> bool {
      true
    }
  }

  fn test_image(value: u8) -> ImageData {
    ImageData::from_rgba(8, 8, vec![value; 8 * 8 * 4]).unwrap()
  }

  fn detector(classifier: Arc<FixedClassifier>, dir: &TempDir) -> ImageDetector {
    ImageDetector::new(
      classifier,
      rule(),
      Arc::new(Cache::open(dir.path())),
      Duration::from_secs(3600),
    )
  }

  #[tokio::test]
  async fn test_match_verdict() {
    let dir = TempDir::new().unwrap();
    let classifier = Arc::new(FixedClassifier::ok(vec![LabelScore::new("pizza", 0.8)]));
    let detector = detector(Arc::clone(&classifier), &dir);

    let verdict = detector.detect(&test_image(10)).await;
    assert!(verdict.matched);
    assert_eq!(verdict.reason, MatchReason::ModelMatch);
  }

  #[tokio::test]
  async fn test_no_match_verdict() {
    let dir = TempDir::new().unwrap();
    let classifier = Arc::new(FixedClassifier::ok(vec![LabelScore::new("car", 0.9)]));
    let detector = detector(Arc::clone(&classifier), &dir);

    let verdict = detector.detect(&test_image(10)).await;
    assert!(!verdict.matched);
    assert_eq!(verdict.reason, MatchReason::NoMatch);
  }

  #[tokio::test]
  async fn test_error_becomes_classifier_error_verdict() {
    let dir = TempDir::new().unwrap();
    let classifier = Arc::new(FixedClassifier::failing());
    let detector = detector(Arc::clone(&classifier), &dir);

    let verdict = detector.detect(&test_image(10)).await;
    assert!(!verdict.matched);
    assert_eq!(verdict.reason, MatchReason::ClassifierError);
  }

  #[tokio::test]
  async fn test_memo_skips_second_inference() {
    let dir = TempDir::new().unwrap();
    let classifier = Arc::new(FixedClassifier::ok(vec![LabelScore::new("pizza", 0.8)]));
    let detector = detector(Arc::clone(&classifier), &dir);

    let image = test_image(10);
    let first = detector.detect(&image).await;
    let second = detector.detect(&image).await;

    assert_eq!(first, second);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_errors_are_not_memoized() {
    let dir = TempDir::new().unwrap();
    let classifier = Arc::new(FixedClassifier::failing());
    let detector = detector(Arc::clone(&classifier), &dir);

    let image = test_image(10);
    let _ = detector.detect(&image).await;
    let _ = detector.detect(&image).await;

    assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_distinct_images_classified_separately() {
    let dir = TempDir::new().unwrap();
    let classifier = Arc::new(FixedClassifier::ok(vec![LabelScore::new("pizza", 0.8)]));
    let detector = detector(Arc::clone(&classifier), &dir);

    let _ = detector.detect(&test_image(10)).await;
    let _ = detector.detect(&test_image(20)).await;

    assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
  }
}
