//! Centralized configuration management for the DrTransfer console

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_USER_AGENT: &str = "drtransfer/0.1.0";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the DrTransfer REST API
    pub api_url: String,
    /// HTTP client configuration
    pub http: HttpConfig,
    /// Console timing configuration
    pub ui: UiConfig,
    /// Log file written while the console owns the terminal
    pub log_file: PathBuf,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds, `None` waits for the backend indefinitely
    pub timeout_seconds: Option<u64>,
    /// User agent string
    pub user_agent: String,
}

/// Timing knobs for widgets and the event loop
#[derive(Debug, Clone)]
pub struct UiConfig {
    /// How long a toast stays on screen (milliseconds)
    pub toast_life_ms: u64,
    /// Delay before an unbound autocomplete clears its text after losing focus (milliseconds)
    pub blur_delay_ms: u64,
    /// Event loop tick (milliseconds)
    pub tick_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            toast_life_ms: 3000,
            blur_delay_ms: 200,
            tick_ms: 100,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            http: HttpConfig::default(),
            ui: UiConfig::default(),
            log_file: PathBuf::from("drtransfer.log"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = UiConfig::default();

        let api_url =
            std::env::var("DRTRANSFER_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let http = HttpConfig {
            timeout_seconds: parse_env_var("DRTRANSFER_HTTP_TIMEOUT_SECONDS")?,
            user_agent: std::env::var("DRTRANSFER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        };

        let ui = UiConfig {
            toast_life_ms: parse_env_var("DRTRANSFER_TOAST_LIFE_MS")?
                .unwrap_or(defaults.toast_life_ms),
            blur_delay_ms: parse_env_var("DRTRANSFER_BLUR_DELAY_MS")?
                .unwrap_or(defaults.blur_delay_ms),
            tick_ms: parse_env_var("DRTRANSFER_TICK_MS")?.unwrap_or(defaults.tick_ms),
        };

        let log_file = std::env::var("DRTRANSFER_LOG_FILE")
            .unwrap_or_else(|_| "drtransfer.log".to_string())
            .into();

        Ok(Config {
            api_url,
            http,
            ui,
            log_file,
        })
    }

    /// Override the API base URL (CLI flag)
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        self
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Option<Duration> {
        self.http.timeout_seconds.map(Duration::from_secs)
    }

    pub fn toast_life(&self) -> Duration {
        Duration::from_millis(self.ui.toast_life_ms)
    }

    pub fn blur_delay(&self) -> Duration {
        Duration::from_millis(self.ui.blur_delay_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.ui.tick_ms.max(1))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_url)
            .with_context(|| format!("Invalid DRTRANSFER_API_URL: {}", self.api_url))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!(
                "API URL must use http or https, got '{}'",
                url.scheme()
            ));
        }

        if self.ui.toast_life_ms == 0 {
            return Err(anyhow::anyhow!("Toast life must be greater than zero"));
        }

        if let Some(parent) = self.log_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(anyhow::anyhow!(
                    "Log directory does not exist: {}",
                    parent.display()
                ));
            }
        }

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.ui.toast_life_ms, 3000);
        assert_eq!(config.ui.blur_delay_ms, 200);
        assert!(config.http_timeout().is_none());
    }

    #[test]
    fn test_config_validation() {
        Config::default().validate().unwrap();

        let bad_scheme = Config::default().with_api_url(Some("ftp://localhost".to_string()));
        assert!(bad_scheme.validate().is_err());

        let not_a_url = Config::default().with_api_url(Some("localhost:3000 x".to_string()));
        assert!(not_a_url.validate().is_err());
    }

    #[test]
    fn test_cli_override_keeps_default_when_absent() {
        let config = Config::default().with_api_url(None);
        assert_eq!(config.api_url, "http://localhost:3000");
    }

    #[test]
    fn test_parse_env_var_reports_bad_values() {
        std::env::set_var("DRTRANSFER_TEST_BAD_NUMBER", "abc");
        let parsed: Result<Option<u64>> = parse_env_var("DRTRANSFER_TEST_BAD_NUMBER");
        assert!(parsed.is_err());

        let missing: Option<u64> = parse_env_var("DRTRANSFER_TEST_UNSET_VARIABLE").unwrap();
        assert!(missing.is_none());
    }
}
