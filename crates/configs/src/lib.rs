//! # blogit-configs
//!
//! Loads the engine configuration for a host application and installs its
//! tracing subscriber.

pub mod settings;
pub mod telemetry;

pub use settings::{Settings, SettingsError};
pub use telemetry::{init_tracing, LogFormat, LogSettings};
