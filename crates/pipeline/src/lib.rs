pub mod controller;
pub mod mutation;
pub mod redactor;
pub mod registry;
pub mod watcher;

pub use controller::{PipelineController, ScanStats, build_classifier_pipeline};
pub use mutation::MutationEvent;
pub use redactor::Redactor;
pub use registry::UnitRegistry;
pub use watcher::{ChangeWatcher, WatchState};
