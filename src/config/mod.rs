//! Configuration module for trendscope
//!
//! Loads settings from YAML files and applies environment overrides.
//! Settings are passed explicitly to whatever needs them; there is no global
//! instance.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_ENV: &str = "TRENDSCOPE_SETTINGS_PATH";

/// Candidate settings locations, in lookup order
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
        paths.push(PathBuf::from(path));
    }
    paths.push(PathBuf::from("settings.yml"));
    paths.push(PathBuf::from("config/settings.yml"));
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("trendscope/settings.yml"));
    }
    paths
}

/// Load settings from the first existing file, or use defaults
pub fn load() -> Result<Settings> {
    for path in search_paths() {
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    info!("No settings file found, using defaults");
    let mut settings = Settings::default();
    settings.merge_env();
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 9000\ntrends:\n  retries: 5").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.trends.retries, 5);
        assert_eq!(settings.trends.retry_delay, 2.0);
        assert_eq!(settings.engines.len(), 3);
    }

    #[test]
    fn test_search_paths_include_defaults() {
        let paths = search_paths();
        assert!(paths.contains(&PathBuf::from("settings.yml")));
        assert!(paths.contains(&PathBuf::from("config/settings.yml")));
    }
}
