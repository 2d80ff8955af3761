// Unit extraction from markup subtrees
//
// The rule set is three CSS selectors: an item container, a title element
// and a thumbnail image inside it. Containers carrying neither a title nor
// a thumbnail are skipped; a malformed container never fails the pass.

use feedveil_core::{ExtractConfig, ImageRef, Unit, UnitId};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug)]
pub enum ExtractError {
  #[error("Invalid selector: {selector}")]
  InvalidSelector { selector: String },
}

/// Selector-driven unit extractor
pub struct UnitExtractor {
  items: Selector,
  title: Selector,
  thumbnail: Selector,
  marker_attr: String,
}

impl UnitExtractor {
  pub fn new(config: &ExtractConfig) -> Result<Self, ExtractError> {
    Ok(Self {
      items: parse_selector(&config.item_selector)?,
      title: parse_selector(&config.title_selector)?,
      thumbnail: parse_selector(&config.thumbnail_selector)?,
      marker_attr: config.marker_attr.clone(),
    })
  }

  /// Extract all classifiable units from a subtree
  ///
  /// Each call reflects the markup at call time.
  pub fn extract(&self, subtree_html: &str) -> Vec<Unit> {
    let fragment = Html::parse_fragment(subtree_html);

    let mut units = Vec::new();
    for container in fragment.select(&self.items) {
      match self.extract_one(container) {
        Some(unit) => {
          trace!("Extracted unit {} ({:?})", unit.id, unit.title);
          units.push(unit);
        }
        None => debug!("Skipping container with no title and no thumbnail"),
      }
    }

    units
  }

  fn extract_one(&self, container: ElementRef<'_>) -> Option<Unit> {
    let title = container
      .select(&self.title)
      .next()
      .map(|el| normalize_whitespace(&el.text().collect::<String>()))
      .unwrap_or_default();

    let thumbnail = container
      .select(&self.thumbnail)
      .next()
      .and_then(|el| el.value().attr("src").or_else(|| el.value().attr("data-src")))
      .filter(|src| !src.is_empty())
      .map(ImageRef::new);

    if title.is_empty() && thumbnail.is_none() {
      return None;
    }

    // The marker attribute is written once by the host; without it the id
    // derives from content so re-extraction cannot mint a duplicate
    let id = match container.value().attr(&self.marker_attr) {
      Some(marker) if !marker.is_empty() => UnitId::from_marker(marker),
      _ => UnitId::from_content(&title, thumbnail.as_ref().map(|t| t.as_str())),
    };

    Some(Unit::new(id, title, thumbnail))
  }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
  Selector::parse(selector).map_err(|_| ExtractError::InvalidSelector {
    selector: selector.to_string(),
  })
}

fn normalize_whitespace(text: &str) -> String {
  text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn extractor() -> UnitExtractor {
    UnitExtractor::new(&ExtractConfig::default()).unwrap()
  }

  const LISTING: &str = r#"
    <div id="contents">
      <ytd-rich-item-renderer>
        <ytd-thumbnail><img src="https://cdn/thumb1.jpg"></ytd-thumbnail>
        <a id="video-title">  Best Pizza
          Recipe 2024 </a>
      </ytd-rich-item-renderer>
      <ytd-rich-item-renderer>
        <ytd-thumbnail><img src="https://cdn/thumb2.jpg"></ytd-thumbnail>
        <a id="video-title">Top 10 Travel Destinations</a>
      </ytd-rich-item-renderer>
    </div>
  "#;

  #[test]
  fn test_extracts_units_from_listing() {
    let units = extractor().extract(LISTING);

    assert_eq!(units.len(), 2);
    assert_eq!(units[0].title, "Best Pizza Recipe 2024");
    assert_eq!(units[0].thumbnail.as_ref().unwrap().as_str(), "https://cdn/thumb1.jpg");
    assert_eq!(units[1].title, "Top 10 Travel Destinations");
  }

  #[test]
  fn test_identity_stable_across_reextraction() {
    let first = extractor().extract(LISTING);
    let second = extractor().extract(LISTING);

    assert_eq!(first[0].id, second[0].id);
    assert_eq!(first[1].id, second[1].id);
    assert_ne!(first[0].id, first[1].id);
  }

  #[test]
  fn test_marker_attribute_wins() {
    let html = r#"
      <ytd-video-renderer data-feedveil-id="vid-7">
        <a id="video-title">Anything</a>
      </ytd-video-renderer>
    "#;

    let units = extractor().extract(html);
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].id.as_str(), "vid-7");
  }

  #[test]
  fn test_container_without_title_or_thumbnail_skipped() {
    let html = r#"
      <ytd-rich-item-renderer><span>no content here</span></ytd-rich-item-renderer>
    "#;

    assert!(extractor().extract(html).is_empty());
  }

  #[test]
  fn test_thumbnail_only_container_kept() {
    let html = r#"
      <ytd-grid-video-renderer>
        <ytd-thumbnail><img src="https://cdn/only-thumb.jpg"></ytd-thumbnail>
      </ytd-grid-video-renderer>
    "#;

    let units = extractor().extract(html);
    assert_eq!(units.len(), 1);
    assert!(units[0].title.is_empty());
    assert!(units[0].thumbnail.is_some());
  }

  #[test]
  fn test_lazy_loaded_thumbnail_src() {
    let html = r#"
      <ytd-video-renderer>
        <a id="video-title">Lazy thumb</a>
        <ytd-thumbnail><img data-src="https://cdn/lazy.jpg"></ytd-thumbnail>
      </ytd-video-renderer>
    "#;

    let units = extractor().extract(html);
    assert_eq!(units[0].thumbnail.as_ref().unwrap().as_str(), "https://cdn/lazy.jpg");
  }

  #[test]
  fn test_unrelated_markup_yields_nothing() {
    let html = "<div><p>Just a paragraph</p></div>";
    assert!(extractor().extract(html).is_empty());
  }

  #[test]
  fn test_invalid_selector_is_an_error() {
    let config = ExtractConfig {
      item_selector: ":::".to_string(),
      ..Default::default()
    };

    assert!(UnitExtractor::new(&config).is_err());
  }

  #[test]
  fn test_custom_rule_set() {
    let config = ExtractConfig {
      item_selector: "article.card".to_string(),
      title_selector: "h3".to_string(),
      thumbnail_selector: "img.cover".to_string(),
      marker_attr: "data-card-id".to_string(),
    };
    let extractor = UnitExtractor::new(&config).unwrap();

    let html = r#"
      <section>
        <article class="card" data-card-id="c-1">
          <img class="cover" src="https://cdn/cover.jpg">
          <h3>Chocolate Cake Tutorial</h3>
        </article>
      </section>
    "#;

    let units = extractor.extract(html);
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].id.as_str(), "c-1");
    assert_eq!(units[0].title, "Chocolate Cake Tutorial");
  }
}
