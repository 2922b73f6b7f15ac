pub mod defaults;
pub mod settings;

pub use settings::{CompressOptions, DrawSettings, ServerSettings};
