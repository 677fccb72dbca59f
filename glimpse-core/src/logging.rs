//! Structured logging setup for embedding applications.
//!
//! The core itself only emits `tracing` events; hosts call [`init_logging`]
//! once at startup to install a subscriber. Reconciliation failures are
//! reported at `warn` level, so any subscriber at the default level makes
//! the self-healing loop's failures observable.

use tracing::Level;

/// Configuration for the tracing subscriber.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for the host application.
    pub level: Level,
    /// Log level for glimpse components specifically.
    pub core_level: Level,
    /// Whether to emit JSON-formatted output.
    pub json_format: bool,
    /// Environment-filter override; when set it replaces the derived filter.
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            core_level: Level::DEBUG,
            json_format: false,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Creates a configuration for development use.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            core_level: Level::DEBUG,
            json_format: false,
            env_filter: None,
        }
    }

    /// Creates a configuration for production use.
    pub fn production() -> Self {
        Self {
            level: Level::WARN,
            core_level: Level::INFO,
            json_format: true,
            env_filter: None,
        }
    }

    /// Sets the host application log level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the log level for glimpse components.
    pub fn with_core_level(mut self, level: Level) -> Self {
        self.core_level = level;
        self
    }

    /// Sets whether to emit JSON output.
    pub fn with_json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    /// Sets a custom environment filter.
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Builds the environment-filter string.
    pub fn env_filter(&self) -> String {
        if let Some(ref filter) = self.env_filter {
            filter.clone()
        } else {
            format!(
                "{},glimpse_core={}",
                self.level.as_str().to_lowercase(),
                self.core_level.as_str().to_lowercase()
            )
        }
    }
}

/// Installs a global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter when set.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

    let fmt_layer = if config.json_format {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_names_the_crate() {
        let config = LoggingConfig::default();
        assert_eq!(config.env_filter(), "info,glimpse_core=debug");
    }

    #[test]
    fn production_preset_quiets_the_host() {
        let config = LoggingConfig::production();
        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.core_level, Level::INFO);
        assert!(config.json_format);
    }

    #[test]
    fn explicit_filter_wins() {
        let config = LoggingConfig::default().with_env_filter("trace");
        assert_eq!(config.env_filter(), "trace");
    }
}
