//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `verdant.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use verdant_domain::error::ValidationError;
use verdant_domain::metric::TemperatureUnit;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Job scheduler settings.
    pub scheduler: SchedulerConfig,
    /// Metric recording settings.
    pub metrics: MetricsConfig,
    /// Grow recipe settings.
    pub recipe: RecipeConfig,
    /// Integration toggles.
    pub integrations: IntegrationsConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Job scheduler configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minutes between two bound controller passes. Also the freshness
    /// window of the logs it looks at.
    pub bound_check_minutes: u64,
}

/// Metric recording configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Unit temperature readings arrive in (`c` or `f`). Stored values are
    /// always Celsius.
    pub temperature_unit: TemperatureUnit,
}

/// Recipe configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecipeConfig {
    /// TOML recipe file. Without one no grow is tracked and triggers stay idle.
    pub path: Option<PathBuf>,
}

/// Per-integration toggles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    /// Register the virtual plugins.
    pub virtual_enabled: bool,
}

impl Config {
    /// Load configuration from `verdant.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("verdant.toml")?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("VERDANT_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("VERDANT_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("VERDANT_RECIPE") {
            self.recipe.path = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("VERDANT_TEMPERATURE_UNIT") {
            self.metrics.temperature_unit = val
                .parse()
                .map_err(|err: ValidationError| ConfigError::Validation(err.to_string()))?;
        }
        if let Ok(val) = std::env::var("VERDANT_BOUND_CHECK_MINUTES") {
            self.scheduler.bound_check_minutes = val.parse().map_err(|_| {
                ConfigError::Validation(format!(
                    "VERDANT_BOUND_CHECK_MINUTES must be a whole number of minutes, got `{val}`"
                ))
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.bound_check_minutes == 0 {
            return Err(ConfigError::Validation(
                "bound_check_minutes must be non-zero".to_string(),
            ));
        }
        if self.database.url.is_empty() {
            return Err(ConfigError::Validation(
                "database url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Period of the bound controller job.
    #[must_use]
    pub fn bound_check_period(&self) -> Duration {
        Duration::from_secs(self.scheduler.bound_check_minutes * 60)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:verdant.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "verdantd=info,verdant=info".to_string(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            bound_check_minutes: 5,
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            virtual_enabled: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
