//! Engine loader for initializing engines from configuration

use super::registry::EngineRegistry;
use super::traits::Engine;
use super::{bing, duckduckgo, google};
use crate::config::{EngineConfig, Settings};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing engines from configuration
pub struct EngineLoader;

impl EngineLoader {
    /// Load all enabled engines from settings
    pub fn load(settings: &Settings) -> Result<EngineRegistry> {
        let mut registry = EngineRegistry::new();

        for config in settings.enabled_engines() {
            match Self::create_engine(&config.engine, config) {
                Ok(engine) => {
                    info!("Loaded engine: {} ({})", config.name, config.engine);
                    registry.register_as(config.name.clone(), engine, config.clone());
                }
                Err(e) => {
                    warn!("Failed to load engine {}: {}", config.name, e);
                }
            }
        }

        info!("Loaded {} engines", registry.len());
        Ok(registry)
    }

    /// Create an engine instance by implementation name
    fn create_engine(engine_type: &str, config: &EngineConfig) -> Result<Arc<dyn Engine>> {
        let mut engine: Box<dyn Engine> = match engine_type {
            "google" => Box::new(google::Google::new()),
            "bing" => Box::new(bing::Bing::new()),
            "duckduckgo" => Box::new(duckduckgo::DuckDuckGo::new()),
            _ => {
                return Err(anyhow::anyhow!("Unknown engine type: {}", engine_type));
            }
        };

        engine.init(config)?;

        Ok(Arc::from(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let registry = EngineLoader::load(&Settings::default()).unwrap();
        assert_eq!(registry.names(), vec!["Bing", "DuckDuckGo", "Google"]);
    }

    #[test]
    fn test_skips_disabled_and_unknown() {
        let mut settings = Settings::default();
        settings.engines[0].disabled = true;
        settings.engines.push(EngineConfig {
            name: "Yahoo".to_string(),
            engine: "yahoo".to_string(),
            ..Default::default()
        });

        let registry = EngineLoader::load(&settings).unwrap();
        assert!(!registry.contains("Google"));
        assert!(!registry.contains("Yahoo"));
        assert_eq!(registry.len(), 2);
    }
}
