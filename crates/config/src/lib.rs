// Configuration loading

pub mod settings;

pub use settings::{ConfigError, DataSettings, DisplaySettings, Settings};
