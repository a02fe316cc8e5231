//! Client Configuration
//!
//! `stockview.toml` settings for the native client. Every field has a
//! default, and `STOCKVIEW_*` environment variables win over the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::markdown::FallbackPolicy;

/// Native client settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analysis server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Applies to task creation and report download, never to the stream
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Report rendering configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub markdown_fallback: FallbackPolicy,
}

/// Log output of the CLI; `RUST_LOG` still takes precedence
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Parse a config file without environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Parse a config file, then apply environment overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// First readable file of `<config_dir>/stockview/config.toml` and
    /// `./stockview.toml`, else defaults. Environment overrides always apply.
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("stockview").join("config.toml")),
            Some(PathBuf::from("./stockview.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Override fields from `lookup`; unparsable values are logged and skipped
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("STOCKVIEW_BASE_URL") {
            self.server.base_url = url;
        }
        if let Some(timeout) = lookup("STOCKVIEW_REQUEST_TIMEOUT") {
            match timeout.parse() {
                Ok(secs) => self.server.request_timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring STOCKVIEW_REQUEST_TIMEOUT={:?}", timeout),
            }
        }
        if let Some(name) = lookup("STOCKVIEW_MARKDOWN_FALLBACK") {
            match FallbackPolicy::from_name(&name) {
                Some(policy) => self.render.markdown_fallback = policy,
                None => tracing::warn!("Ignoring STOCKVIEW_MARKDOWN_FALLBACK={:?}", name),
            }
        }
        if let Some(level) = lookup("STOCKVIEW_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("STOCKVIEW_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Invalid config in {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Commented template with every setting at its default
pub fn generate_default_config() -> String {
    r#"# Stockview Configuration
#
# Overridden by STOCKVIEW_BASE_URL, STOCKVIEW_REQUEST_TIMEOUT,
# STOCKVIEW_MARKDOWN_FALLBACK, STOCKVIEW_LOG_LEVEL and STOCKVIEW_LOG_FORMAT.

[server]
# Analysis server URL
base_url = "http://localhost:8080"

# Timeout for task creation and report download (seconds).
# The progress stream itself has no timeout.
request_timeout_secs = 30

[render]
# How reports are wrapped when no markdown renderer is available:
# "escape" escapes HTML characters, "verbatim" inserts the text as-is
markdown_fallback = "escape"

[logging]
# trace, debug, info, warn or error
level = "info"

# "pretty" or "json", written to stderr
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://localhost:8080");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.render.markdown_fallback, FallbackPolicy::Escape);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.server.base_url, "http://localhost:8080");
        assert_eq!(config.render.markdown_fallback, FallbackPolicy::Escape);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nbase_url = \"https://charts.example.com\"\n\n[render]\nmarkdown_fallback = \"verbatim\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.base_url, "https://charts.example.com");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.render.markdown_fallback, FallbackPolicy::Verbatim);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|name| match name {
            "STOCKVIEW_BASE_URL" => Some("http://charts.internal:9000".to_string()),
            "STOCKVIEW_REQUEST_TIMEOUT" => Some("soon".to_string()),
            "STOCKVIEW_MARKDOWN_FALLBACK" => Some("Verbatim".to_string()),
            "STOCKVIEW_LOG_FORMAT" => Some("json".to_string()),
            _ => None,
        });

        assert_eq!(config.server.base_url, "http://charts.internal:9000");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.render.markdown_fallback, FallbackPolicy::Verbatim);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Io { .. })));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[render]\nmarkdown_fallback = \"raw\"\n").unwrap();
        assert!(matches!(Config::load(&bad), Err(ConfigError::Parse { .. })));
    }
}
