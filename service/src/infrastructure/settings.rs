use std::env;
use std::time::Duration;

use anyhow::Context;
use config::{Config, Environment, File};
use dotenvy::dotenv;
use folio_common::database::DatabaseSettings;
use serde::Deserialize;

use crate::domain::autosave::DelayPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_port: String,
    pub autosave: AutosaveSettings,
    #[serde(default)]
    pub sessions: SessionSettings,
    pub gateway: GatewaySettings,
    /// required when the postgres gateway is selected
    pub database: Option<DatabaseSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutosaveSettings {
    pub create_delay_ms: u64,
    pub update_delay_ms: u64,
}

impl From<&AutosaveSettings> for DelayPolicy {
    fn from(value: &AutosaveSettings) -> Self {
        Self {
            create_delay: Duration::from_millis(value.create_delay_ms),
            update_delay: Duration::from_millis(value.update_delay_ms),
        }
    }
}

/// Expiry of sessions whose client went away without closing them
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub idle_timeout_seconds: u64,
    pub sweep_interval_seconds: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: 1800,
            sweep_interval_seconds: 60,
        }
    }
}

impl SessionSettings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

/// Where drafts are persisted
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GatewaySettings {
    /// write straight into the `articles` table
    Postgres,
    /// talk to the portfolio REST API
    Http(HttpGatewaySettings),
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpGatewaySettings {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        let run_mode = load_env("RUN_MODE", "development");

        let s = Config::builder()
            .add_source(File::with_name("./config/default"))
            .add_source(File::with_name(&format!("./config/{run_mode}")).required(false))
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        s.try_deserialize().with_context(|| "failed to read config")
    }
}

fn load_env(key: &str, default_value: &'static str) -> String {
    env::var(key).unwrap_or_else(|_| default_value.into())
}
