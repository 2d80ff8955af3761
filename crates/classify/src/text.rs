use keywords::KeywordSet;

/// Case-insensitive substring matcher over a keyword set
///
/// Deterministic, synchronous, no side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextClassifier;

impl TextClassifier {
  pub fn new() -> Self {
    Self
  }

  /// True when any keyword occurs in the normalized text
  pub fn classify(&self, text: &str, keywords: &KeywordSet) -> bool {
    if text.is_empty() || keywords.is_empty() {
      return false;
    }

    // Lowercase once, then scan the whole set
    let lower = text.to_lowercase();
    keywords.words().any(|word| lower.contains(word))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn set(words: &[&str]) -> KeywordSet {
    KeywordSet::new(words.iter().map(|w| w.to_string()), Utc::now())
  }

  #[test]
  fn test_matches_contained_keyword() {
    let classifier = TextClassifier::new();
    assert!(classifier.classify("Best Pizza Recipe 2024", &set(&["pizza", "cake"])));
  }

  #[test]
  fn test_case_insensitive() {
    let classifier = TextClassifier::new();
    assert!(classifier.classify("PIZZA NIGHT", &set(&["pizza"])));
    assert!(classifier.classify("pizza night", &set(&["PIZZA"])));
  }

  #[test]
  fn test_substring_containment() {
    let classifier = TextClassifier::new();
    // "pizzas" contains "pizza"
    assert!(classifier.classify("Rating frozen pizzas", &set(&["pizza"])));
  }

  #[test]
  fn test_no_match() {
    let classifier = TextClassifier::new();
    assert!(!classifier.classify("Top 10 Travel Destinations", &set(&["pizza", "cake"])));
  }

  #[test]
  fn test_empty_text_is_false() {
    let classifier = TextClassifier::new();
    assert!(!classifier.classify("", &set(&["pizza"])));
  }

  #[test]
  fn test_empty_set_is_false() {
    let classifier = TextClassifier::new();
    assert!(!classifier.classify("Best Pizza Recipe", &set(&[])));
  }
}
