//! Configuration for the feedveil pipeline with per-project overrides.
//!
//! Config priority: project-relative (feedveil.toml) > user (~/.config/feedveil/config.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Keyword Source Configuration
// ============================================================================

/// Remote keyword source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
  /// Remote endpoint returning category words
  pub endpoint: String,

  /// Keyword list time-to-live in hours (default: 24)
  pub ttl_hours: u64,

  /// Maximum words requested from the endpoint (default: 1000)
  pub max_words: usize,
}

impl Default for KeywordConfig {
  fn default() -> Self {
    Self {
      endpoint: "https://api.datamuse.com/words?ml=food&topics=food".to_string(),
      ttl_hours: 24,
      max_words: 1000,
    }
  }
}

// ============================================================================
// Vision Configuration
// ============================================================================

/// Image classification service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
  /// Inference service URL
  pub service_url: String,

  /// Model identifier to load on the service
  pub model: String,

  /// Side length of the model's square input (default: 224)
  pub input_size: u32,

  /// Minimum score for a label to count as a match (default: 0.5)
  pub confidence_threshold: f32,

  /// Labels that count as the target category
  pub category_labels: Vec<String>,

  /// Result memo time-to-live in hours (default: 168 = 7 days)
  pub memo_ttl_hours: u64,
}

impl Default for VisionConfig {
  fn default() -> Self {
    Self {
      service_url: "http://localhost:8590".to_string(),
      model: "mobilenet-v2".to_string(),
      input_size: 224,
      confidence_threshold: 0.5,
      category_labels: vec![
        "pizza".to_string(),
        "cheeseburger".to_string(),
        "hotdog".to_string(),
        "ice cream".to_string(),
        "french loaf".to_string(),
        "bagel".to_string(),
        "pretzel".to_string(),
        "carbonara".to_string(),
        "guacamole".to_string(),
        "plate".to_string(),
        "soup".to_string(),
        "burrito".to_string(),
        "food".to_string(),
      ],
      memo_ttl_hours: 168,
    }
  }
}

// ============================================================================
// Classification Pipeline Configuration
// ============================================================================

/// Stage ordering for the classifier pipeline
///
/// Which strategy runs first is a precision/recall tradeoff, not a fixed
/// requirement; text-first keeps inference off the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOrder {
  #[default]
  TextFirst,
  ImageFirst,
}

/// Classifier pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
  /// Stage ordering (default: text_first)
  pub order: PipelineOrder,

  /// Also run the keyword check against thumbnail URLs (default: true)
  pub check_thumbnail_urls: bool,

  /// Per-title verdict memo time-to-live in hours (default: 168)
  pub memo_ttl_hours: u64,
}

impl Default for ClassifyConfig {
  fn default() -> Self {
    Self {
      order: PipelineOrder::TextFirst,
      check_thumbnail_urls: true,
      memo_ttl_hours: 168,
    }
  }
}

// ============================================================================
// Extraction Configuration
// ============================================================================

/// CSS selector rule set for pulling units out of markup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
  /// Selector matching one item container
  pub item_selector: String,

  /// Selector for the title element inside a container
  pub title_selector: String,

  /// Selector for the thumbnail image inside a container
  pub thumbnail_selector: String,

  /// Attribute carrying a host-assigned stable id, written once
  pub marker_attr: String,
}

impl Default for ExtractConfig {
  fn default() -> Self {
    Self {
      item_selector: "ytd-rich-item-renderer, ytd-video-renderer, ytd-grid-video-renderer".to_string(),
      title_selector: "#video-title".to_string(),
      thumbnail_selector: "ytd-thumbnail img".to_string(),
      marker_attr: "data-feedveil-id".to_string(),
    }
  }
}

// ============================================================================
// Change Watcher Configuration
// ============================================================================

/// Mutation debounce settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
  /// Debounce window for mutation bursts in milliseconds (default: 500)
  pub debounce_ms: u64,

  /// Maximum buffered mutation events before forcing a pass (default: 100)
  pub max_pending_events: usize,
}

impl Default for WatchConfig {
  fn default() -> Self {
    Self {
      debounce_ms: 500,
      max_pending_events: 100,
    }
  }
}

// ============================================================================
// Main Configuration
// ============================================================================

/// Feedveil configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Remote keyword source settings
  #[serde(default)]
  pub keywords: KeywordConfig,

  /// Image classification settings
  #[serde(default)]
  pub vision: VisionConfig,

  /// Pipeline composition settings
  #[serde(default)]
  pub classify: ClassifyConfig,

  /// Unit extraction rule set
  #[serde(default)]
  pub extract: ExtractConfig,

  /// Mutation debounce settings
  #[serde(default)]
  pub watch: WatchConfig,
}

impl Config {
  /// Load config for a project, with fallback to user config
  pub fn load_for_project(project_path: &Path) -> Self {
    let project_config = Self::project_config_path(project_path);
    if project_config.exists()
      && let Ok(content) = std::fs::read_to_string(&project_config)
      && let Ok(config) = toml::from_str(&content)
    {
      return config;
    }

    if let Some(user_config_path) = Self::user_config_path()
      && user_config_path.exists()
      && let Ok(content) = std::fs::read_to_string(&user_config_path)
      && let Ok(config) = toml::from_str(&content)
    {
      return config;
    }

    Self::default()
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("FEEDVEIL_CONFIG_DIR") {
      return Some(PathBuf::from(path).join("config.toml"));
    }

    dirs::config_dir().map(|p: PathBuf| p.join("feedveil").join("config.toml"))
  }

  /// Get the project-relative config path
  pub fn project_config_path(project_path: &Path) -> PathBuf {
    project_path.join("feedveil.toml")
  }

  /// Debounce window as a Duration
  pub fn debounce_window(&self) -> std::time::Duration {
    std::time::Duration::from_millis(self.watch.debounce_ms)
  }

  /// Keyword TTL as a Duration
  pub fn keyword_ttl(&self) -> std::time::Duration {
    std::time::Duration::from_secs(self.keywords.ttl_hours * 3600)
  }

  /// Generate a default config file as a string
  pub fn generate_template() -> String {
    format!(
      r##"# Feedveil Configuration
# Place as feedveil.toml (project) or ~/.config/feedveil/config.toml (user)

[keywords]
# Remote endpoint returning category words
endpoint = "https://api.datamuse.com/words?ml=food&topics=food"

# Keyword list time-to-live (hours)
ttl_hours = 24

# Maximum words requested from the endpoint
max_words = 1000

[vision]
# Inference service URL
service_url = "http://localhost:8590"

# Model identifier to load on the service
model = "mobilenet-v2"

# Model input side length (pixels)
input_size = 224

# Minimum score for a label to count as a match
confidence_threshold = 0.5

[classify]
# Stage ordering: text_first or image_first
order = "text_first"

# Also run the keyword check against thumbnail URLs
check_thumbnail_urls = true

[extract]
# Item container selector
item_selector = "{item_selector}"

# Title element selector (inside a container)
title_selector = "#video-title"

# Thumbnail image selector (inside a container)
thumbnail_selector = "ytd-thumbnail img"

# Host-assigned stable id attribute
marker_attr = "data-feedveil-id"

[watch]
# Debounce window for mutation bursts (milliseconds)
debounce_ms = 500

# Maximum buffered mutation events before forcing a pass
max_pending_events = 100
"##,
      item_selector = ExtractConfig::default().item_selector,
    )
  }
}
