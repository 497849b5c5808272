//! # configs
//!
//! Layered settings for the notice writer: built-in defaults, then an
//! optional TOML file, then `NOTICE_*` environment variables.
//!
//! `NOTICE_API__BASE_URL=https://api.example.com` sets `api.base_url`.
//! The older `REACT_APP_FASTAPI` variable is still read when it is the only
//! base URL given.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "notice-writer.toml";
const ENV_PREFIX: &str = "NOTICE";
const LEGACY_BASE_URL_VAR: &str = "REACT_APP_FASTAPI";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub image: ImageSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiSettings {
    /// Backend root, without trailing slash
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageSettings {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: f32,
    /// Run a lossless PNG optimisation pass on the re-encoded image
    pub optimize_png: bool,
    pub decode_timeout_secs: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ImageSettings {
    pub fn decode_timeout(&self) -> Duration {
        Duration::from_secs(self.decode_timeout_secs)
    }
}

impl Settings {
    /// Loads `.env` if present, then reads the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_sources(file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE)), env)
    }

    /// Builds settings from an explicit file path and environment map.
    ///
    /// A missing file is not an error; a present but unreadable one is.
    pub fn from_sources(file: &Path, env: HashMap<String, String>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("api.base_url", "")?
            .set_default("api.timeout_secs", 30)?
            .set_default("image.max_width", 800)?
            .set_default("image.max_height", 600)?
            .set_default("image.quality", 0.7)?
            .set_default("image.optimize_png", false)?
            .set_default("image.decode_timeout_secs", 10)?;

        if let Some(legacy) = env.get(LEGACY_BASE_URL_VAR) {
            builder = builder.set_default("api.base_url", legacy.as_str())?;
        }

        let settings: Settings = builder
            .add_source(config::File::from(file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env.into_iter().collect())),
            )
            .build()?
            .try_deserialize()?;

        settings.validated()
    }

    fn validated(mut self) -> Result<Self> {
        let base = self.api.base_url.trim().trim_end_matches('/').to_string();
        if base.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "api.base_url is required (set {}_API__BASE_URL)",
                ENV_PREFIX
            )));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must be an http(s) URL, got {:?}",
                base
            )));
        }
        if self.image.max_width == 0 || self.image.max_height == 0 {
            return Err(ConfigError::Invalid("image bounds must be non-zero".into()));
        }
        if self.image.decode_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "image.decode_timeout_secs must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.image.quality) {
            return Err(ConfigError::Invalid(format!(
                "image.quality must be within 0.0..=1.0, got {}",
                self.image.quality
            )));
        }
        self.api.base_url = base;
        Ok(self)
    }
}
