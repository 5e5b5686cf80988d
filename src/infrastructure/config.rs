//! Application configuration
//!
//! Defaults overlaid with `QUIZQUEST_*` environment variables. Nested battle
//! settings use a double underscore, e.g. `QUIZQUEST_BATTLE__TOTAL_LIFE=7`.

use std::collections::HashMap;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

use crate::domain::value_objects::BattleSettings;

const ENV_PREFIX: &str = "QUIZQUEST";

/// Application configuration loaded from environment
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// SQLite connection URL
    pub database_url: String,

    /// HTTP server port
    pub server_port: u16,

    /// JSON catalog imported into the store at startup
    #[serde(default)]
    pub catalog_path: Option<String>,

    #[serde(default)]
    pub battle: BattleSettings,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::build(None)
    }

    fn build(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(vars);

        Config::builder()
            .set_default("database_url", "sqlite://quizquest.db?mode=rwc")?
            .set_default("server_port", 3000_i64)?
            .add_source(environment)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}
