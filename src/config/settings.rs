//! Settings structures for trendscope configuration

use crate::engines::{Credentials, BING_API_KEY, SEARCH_API_KEY, SEARCH_ENGINE_ID};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    pub search: SearchSettings,
    pub trends: TrendsSettings,
    pub history: HistorySettings,
    pub engines: Vec<EngineConfig>,
    #[serde(skip_serializing)]
    pub credentials: CredentialSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            server: ServerSettings::default(),
            outgoing: OutgoingSettings::default(),
            search: SearchSettings::default(),
            trends: TrendsSettings::default(),
            history: HistorySettings::default(),
            engines: default_engines(),
            credentials: CredentialSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("TRENDSCOPE_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("TRENDSCOPE_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("TRENDSCOPE_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("TRENDSCOPE_DATABASE_URL") {
            self.history.database_url = val;
        }
        if let Ok(val) = std::env::var("GOOGLE_API_KEY") {
            self.credentials.search_api_key = Some(val);
        }
        if let Ok(val) = std::env::var("SEARCH_ENGINE_ID") {
            self.credentials.search_engine_id = Some(val);
        }
        if let Ok(val) = std::env::var("BING_API_KEY") {
            self.credentials.bing_api_key = Some(val);
        }
    }

    /// Get all enabled engines
    pub fn enabled_engines(&self) -> Vec<&EngineConfig> {
        self.engines.iter().filter(|e| !e.disabled).collect()
    }

    /// Snapshot of the settings that shaped one search.
    ///
    /// Credentials are included as configured; the history store strips them
    /// before anything is written.
    pub fn snapshot(
        &self,
        country: &str,
        timeframe: &str,
        backends: &[String],
    ) -> Map<String, Value> {
        let mut snapshot = Map::new();
        snapshot.insert("country".into(), json!(country));
        snapshot.insert("timeframe".into(), json!(timeframe));
        snapshot.insert("max_results".into(), json!(self.search.max_results));
        snapshot.insert("search_providers".into(), json!(backends));
        snapshot.insert("show_trends".into(), json!(self.trends.show_trends));
        snapshot.insert("show_geo".into(), json!(self.trends.show_geo));
        snapshot.insert("show_topics".into(), json!(self.trends.show_topics));
        for (key, value) in self.credentials.to_credentials().iter() {
            snapshot.insert(key.to_string(), json!(value));
        }
        snapshot
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by the API
    pub instance_name: String,
    /// Collect per-backend metrics
    pub enable_metrics: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "trendscope".to_string(),
            enable_metrics: true,
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8888,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Upper bound for any per-engine timeout
    pub max_request_timeout: f64,
    /// Idle connections kept per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 5.0,
            max_request_timeout: 30.0,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Search behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Results requested from each backend
    pub max_results: u32,
    /// Backends used when a request names none
    pub default_backends: Vec<String>,
    /// Country recorded when a request names none
    pub default_country: String,
    /// Result cache TTL in seconds (0 disables the cache)
    pub cache_ttl: u64,
    /// Maximum cached responses
    pub cache_capacity: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            default_backends: vec![
                "Google".to_string(),
                "DuckDuckGo".to_string(),
                "Bing".to_string(),
            ],
            default_country: "ES".to_string(),
            cache_ttl: 300,
            cache_capacity: 1000,
        }
    }
}

/// Trend service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendsSettings {
    pub enabled: bool,
    /// Session attempts before giving up
    pub retries: u32,
    /// Fixed wait between attempts in seconds
    pub retry_delay: f64,
    pub default_timeframe: String,
    pub base_url: String,
    /// Interface language sent to the service
    pub language: String,
    /// Timezone offset in minutes sent to the service
    pub tz_offset: i32,
    pub show_trends: bool,
    pub show_geo: bool,
    pub show_topics: bool,
}

impl Default for TrendsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            retries: 3,
            retry_delay: 2.0,
            default_timeframe: "today 5-y".to_string(),
            base_url: "https://trends.google.com".to_string(),
            language: "es".to_string(),
            tz_offset: 360,
            show_trends: true,
            show_geo: true,
            show_topics: true,
        }
    }
}

/// History store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub database_url: String,
    pub max_connections: u32,
    /// Seconds a writer waits on a locked database
    pub busy_timeout: u64,
    pub default_limit: u32,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://searches.db".to_string(),
            max_connections: 5,
            busy_timeout: 5,
            default_limit: 10,
        }
    }
}

/// Server-side credentials, never serialized
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub bing_api_key: Option<String>,
}

impl CredentialSettings {
    pub fn to_credentials(&self) -> Credentials {
        let mut credentials = Credentials::new();
        if let Some(ref key) = self.search_api_key {
            credentials.insert(SEARCH_API_KEY, key.clone());
        }
        if let Some(ref id) = self.search_engine_id {
            credentials.insert(SEARCH_ENGINE_ID, id.clone());
        }
        if let Some(ref key) = self.bing_api_key {
            credentials.insert(BING_API_KEY, key.clone());
        }
        credentials
    }
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("search_api_key", &self.search_api_key.as_ref().map(|_| "***"))
            .field("search_engine_id", &self.search_engine_id.as_ref().map(|_| "***"))
            .field("bing_api_key", &self.bing_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Individual engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Backend name as requested by callers (e.g. "Google")
    pub name: String,
    /// Engine implementation to use
    pub engine: String,
    /// Whether engine is disabled
    pub disabled: bool,
    /// Custom timeout for this engine in seconds
    pub timeout: Option<f64>,
    /// Override of the engine's endpoint
    pub base_url: Option<String>,
    /// Additional engine-specific settings
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            engine: String::new(),
            disabled: false,
            timeout: None,
            base_url: None,
            extra: HashMap::new(),
        }
    }
}

/// Default engine configurations
fn default_engines() -> Vec<EngineConfig> {
    vec![
        EngineConfig {
            name: "Google".to_string(),
            engine: "google".to_string(),
            ..Default::default()
        },
        EngineConfig {
            name: "DuckDuckGo".to_string(),
            engine: "duckduckgo".to_string(),
            ..Default::default()
        },
        EngineConfig {
            name: "Bing".to_string(),
            engine: "bing".to_string(),
            ..Default::default()
        },
    ]
}
