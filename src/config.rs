use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PantryConfig {
    pub storage: StorageConfig,
    pub seeding: SeedingConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// `"sqlite"` or `"memory"`.
    pub backend: String,
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SeedingConfig {
    pub enabled: bool,
    pub seed: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueryConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_pantry_dir()
            .join("store.db")
            .to_string_lossy()
            .into_owned();
        Self {
            backend: "sqlite".into(),
            db_path,
        }
    }
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: 42,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

/// Returns `~/.pantry/`, or `./.pantry/` when no home directory is known.
pub fn default_pantry_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pantry")
}

/// Returns the default config file path: `~/.pantry/config.toml`
pub fn default_config_path() -> PathBuf {
    default_pantry_dir().join("config.toml")
}

impl PantryConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            PantryConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (PANTRY_DB, PANTRY_BACKEND, PANTRY_SEED, PANTRY_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PANTRY_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("PANTRY_BACKEND") {
            self.storage.backend = val;
        }
        if let Ok(val) = std::env::var("PANTRY_SEED") {
            match val.parse() {
                Ok(seed) => self.seeding.seed = seed,
                Err(_) => tracing::warn!(value = %val, "ignoring non-numeric PANTRY_SEED"),
            }
        }
        if let Ok(val) = std::env::var("PANTRY_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Clamp a caller-supplied page size into `[1, max_page_size]`,
    /// substituting the default when none is given.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.query.default_page_size)
            .clamp(1, self.query.max_page_size.max(1))
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PantryConfig::default();
        assert_eq!(config.storage.backend, "sqlite");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.seeding.seed, 42);
        assert!(config.seeding.enabled);
        assert_eq!(config.query.default_page_size, 10);
        assert!(config.storage.db_path.ends_with("store.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[storage]
backend = "memory"
db_path = "/tmp/test.db"

[seeding]
seed = 7

[query]
max_page_size = 25
"#;
        let config: PantryConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.seeding.seed, 7);
        assert_eq!(config.query.max_page_size, 25);
        // defaults still apply for unset fields
        assert!(config.seeding.enabled);
        assert_eq!(config.query.default_page_size, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = PantryConfig::default();
        std::env::set_var("PANTRY_DB", "/tmp/override.db");
        std::env::set_var("PANTRY_BACKEND", "memory");
        std::env::set_var("PANTRY_SEED", "1234");
        std::env::set_var("PANTRY_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.seeding.seed, 1234);
        assert_eq!(config.logging.level, "trace");

        // Clean up
        std::env::remove_var("PANTRY_DB");
        std::env::remove_var("PANTRY_BACKEND");
        std::env::remove_var("PANTRY_SEED");
        std::env::remove_var("PANTRY_LOG_LEVEL");
    }

    #[test]
    fn page_size_is_clamped() {
        let config = PantryConfig::default();
        assert_eq!(config.page_size(None), 10);
        assert_eq!(config.page_size(Some(0)), 1);
        assert_eq!(config.page_size(Some(500)), 100);
        assert_eq!(config.page_size(Some(40)), 40);
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/var/data/x.db"), PathBuf::from("/var/data/x.db"));
    }
}
