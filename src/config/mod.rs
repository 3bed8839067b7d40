//! Configuration for revision defaulting

pub mod defaults;

pub use defaults::{ConfigError, Defaults, DEFAULTS_CONFIG_NAME};
