//! Lightweight configuration loader.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env
//! vars, plus a typed accessor for the analytics tunables.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The `[analytics]` section, falling back to defaults when absent.
    pub fn analytics(&self) -> AnalyticsConfig {
        self.figment
            .extract_inner("analytics")
            .unwrap_or_else(|_| AnalyticsConfig::default())
    }
}

/// Tunables for the analytics core.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Search index the compiled queries run against.
    pub index: String,
    /// Per-bucket document cap for the time-series views.
    pub bucket_doc_limit: usize,
    /// Concurrent per-bucket fetches in flight at once.
    pub fetch_concurrency: usize,
    /// Timeout applied at the search-engine-call boundary.
    pub search_timeout_secs: u64,
    /// Sample documents attached per leaderboard category.
    pub sample_size: usize,
    /// Documents scanned per request by the views that parse per-document
    /// analytic fields.
    pub scan_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            index: "social_documents".to_string(),
            bucket_doc_limit: 30,
            fetch_concurrency: 4,
            search_timeout_secs: 20,
            sample_size: 5,
            scan_limit: 500,
        }
    }
}
