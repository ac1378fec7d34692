//! Layered configuration: defaults, then an optional `blogit.toml`, then
//! `BLOGIT__*` environment variables (`BLOGIT__BLOG__POSTS_PER_PAGE=10`).

use blogit_core::{BlogitConfig, BlogitError};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::telemetry::LogSettings;

pub const ENV_PREFIX: &str = "BLOGIT";
pub const DEFAULT_CONFIG_FILE: &str = "blogit";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("invalid blogit configuration: {0}")]
    Invalid(#[source] BlogitError),

    #[error("failed to install tracing subscriber: {0}")]
    Telemetry(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub blog: BlogitConfig,
    pub log: LogSettings,
}

impl Settings {
    /// Reads `.env`, `blogit.{toml,json,yaml}` from the working directory and
    /// the environment.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Like [`Settings::load`] with an explicit file name; the file may be absent.
    pub fn load_from(file: &str) -> Result<Self, SettingsError> {
        let builder = Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(environment());
        Self::build(builder)
    }

    /// Parses settings from TOML text only. Handy for hosts that embed their config.
    pub fn from_toml(text: &str) -> Result<Self, SettingsError> {
        Self::build(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.blog.check().map_err(SettingsError::Invalid)?;
        tracing::debug!(
            posts_per_page = settings.blog.posts_per_page,
            include_comments = ?settings.blog.include_comments,
            "blogit configuration loaded"
        );
        Ok(settings)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("blog.hidden_states")
        .with_list_parse_key("blog.active_states")
}
