use serde::{Deserialize, Serialize};

use crate::resolver::funnel::FunnelConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub funnel: FunnelConfig,

    #[serde(default)]
    pub episodes: EpisodeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    9090
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// API key for the retrieval backend (overridden by THEMOVIEDB_API)
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the retrieval backend API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Language tag sent with every request
    #[serde(default = "default_language")]
    pub language: String,

    /// Candidates whose original language is not in this list are discarded
    /// at the retrieval boundary (empty = allow all)
    #[serde(default = "default_allowed_languages")]
    pub allowed_languages: Vec<String>,

    /// Maximum number of candidates fetched per request
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_language() -> String {
    "en-US".to_string()
}
fn default_allowed_languages() -> Vec<String> {
    vec!["en".to_string()]
}
fn default_page_limit() -> usize {
    20
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            language: default_language(),
            allowed_languages: default_allowed_languages(),
            page_limit: default_page_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Path to the SQLite cache file (overridden by REELID_DB)
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "./reelid.db".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EpisodeConfig {
    /// Days a cached season record stays fresh before it is re-fetched
    #[serde(default = "default_freshness_days")]
    pub freshness_days: i64,
}

fn default_freshness_days() -> i64 {
    7
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            freshness_days: default_freshness_days(),
        }
    }
}
