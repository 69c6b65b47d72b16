//! Engine registry mapping backend names to engines

use super::traits::Engine;
use crate::config::EngineConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of all available search engines
pub struct EngineRegistry {
    /// Engines by backend name
    engines: HashMap<String, Arc<dyn Engine>>,
    /// Engine configurations
    configs: HashMap<String, EngineConfig>,
}

impl EngineRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            engines: HashMap::new(),
            configs: HashMap::new(),
        }
    }

    /// Register an engine under its own name
    pub fn register(&mut self, engine: Arc<dyn Engine>, config: EngineConfig) {
        let name = engine.name().to_string();
        self.register_as(name, engine, config);
    }

    /// Register an engine under an explicit backend name
    pub fn register_as(
        &mut self,
        name: impl Into<String>,
        engine: Arc<dyn Engine>,
        config: EngineConfig,
    ) {
        let name = name.into();
        self.engines.insert(name.clone(), engine);
        self.configs.insert(name, config);
    }

    /// Get an engine by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Engine>> {
        self.engines.get(name)
    }

    /// Get engine config
    pub fn get_config(&self, name: &str) -> Option<&EngineConfig> {
        self.configs.get(name)
    }

    /// Get all engine names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.engines.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Check if an engine exists
    pub fn contains(&self, name: &str) -> bool {
        self.engines.contains_key(name)
    }

    /// Get number of registered engines
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Get effective timeout for an engine in seconds
    pub fn get_timeout(&self, name: &str, default: f64) -> f64 {
        self.configs
            .get(name)
            .and_then(|c| c.timeout)
            .or_else(|| self.engines.get(name).map(|e| e.timeout()))
            .unwrap_or(default)
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}
