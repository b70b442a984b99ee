//! Service configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `8000` |
//! | `KUMORFM_API_KEY` | unset (synthetic scoring) |
//! | `KUMORFM_BASE_URL` | `https://api.kumo.ai` |
//! | `KUMORFM_TIMEOUT_MS` | `5000` |
//! | `RISKWATCH_ALERT_INTERVAL_SECS` | `30` |
//! | `RISKWATCH_LOG_MODE` | `stdout` (`file` to write to `RISKWATCH_LOG_FILE`) |
//! | `RISKWATCH_LOG_FILE` | `riskwatch.log` |
//!
//! Parsing is best-effort: malformed or out-of-range values keep the default.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_BASE_URL: &str = "https://api.kumo.ai";
const DEFAULT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_ALERT_INTERVAL_SECS: u64 = 30;
const DEFAULT_LOG_FILE: &str = "riskwatch.log";

/// Connection settings of the external model.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Bound on each model call
    pub timeout: Duration,
}

impl ModelSettings {
    /// Whether an API key is present, i.e. the external strategy is wanted.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    File(PathBuf),
}

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub model: ModelSettings,
    pub alert_interval: Duration,
    pub log_target: LogTarget,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model: ModelSettings::default(),
            alert_interval: Duration::from_secs(DEFAULT_ALERT_INTERVAL_SECS),
            log_target: LogTarget::Stdout,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(host) = get("HOST") {
            cfg.host = host;
        }
        if let Some(port) = get("PORT").and_then(|v| v.parse::<u16>().ok()) {
            cfg.port = port;
        }

        cfg.model.api_key = get("KUMORFM_API_KEY");
        if let Some(url) = get("KUMORFM_BASE_URL") {
            cfg.model.base_url = url;
        }
        if let Some(ms) = get("KUMORFM_TIMEOUT_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&ms| ms > 0)
        {
            cfg.model.timeout = Duration::from_millis(ms);
        }

        if let Some(secs) = get("RISKWATCH_ALERT_INTERVAL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&s| s > 0)
        {
            cfg.alert_interval = Duration::from_secs(secs);
        }

        if get("RISKWATCH_LOG_MODE").is_some_and(|m| m.eq_ignore_ascii_case("file")) {
            let path = get("RISKWATCH_LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
            cfg.log_target = LogTarget::File(PathBuf::from(path));
        }

        cfg
    }

    /// `host:port` for binding the listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8000");
        assert!(!cfg.model.is_configured());
        assert_eq!(cfg.model.base_url, "https://api.kumo.ai");
        assert_eq!(cfg.model.timeout, Duration::from_millis(5000));
        assert_eq!(cfg.alert_interval, Duration::from_secs(30));
        assert_eq!(cfg.log_target, LogTarget::Stdout);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9001"),
            ("KUMORFM_API_KEY", "abc"),
            ("KUMORFM_TIMEOUT_MS", "750"),
            ("RISKWATCH_ALERT_INTERVAL_SECS", "5"),
            ("RISKWATCH_LOG_MODE", "file"),
            ("RISKWATCH_LOG_FILE", "/tmp/rw.log"),
        ]);
        assert_eq!(cfg.bind_addr(), "127.0.0.1:9001");
        assert!(cfg.model.is_configured());
        assert_eq!(cfg.model.timeout, Duration::from_millis(750));
        assert_eq!(cfg.alert_interval, Duration::from_secs(5));
        assert_eq!(cfg.log_target, LogTarget::File(PathBuf::from("/tmp/rw.log")));
    }

    #[test]
    fn test_malformed_values_keep_defaults() {
        let cfg = config(&[
            ("PORT", "eighty"),
            ("KUMORFM_API_KEY", "   "),
            ("KUMORFM_TIMEOUT_MS", "0"),
            ("RISKWATCH_ALERT_INTERVAL_SECS", "-1"),
        ]);
        assert_eq!(cfg.port, 8000);
        assert!(!cfg.model.is_configured());
        assert_eq!(cfg.model.timeout, Duration::from_millis(5000));
        assert_eq!(cfg.alert_interval, Duration::from_secs(30));
    }
}
