pub mod store;

pub use store::{Cache, default_data_dir};
