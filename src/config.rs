use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::structuring::{RetryPolicy, DEFAULT_MAX_RETRIES};

/// Application-level constants
pub const APP_NAME: &str = "FinSight";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_API_BASE: &str = "https://api.novita.ai/openai";
pub const DEFAULT_MODEL: &str = "baidu/ernie-4.5-vl-28b-a3b-thinking";
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "finsight=info,finsight_lib=info,tower_http=info"
}

/// Get the application data directory
/// ~/FinSight/ on all platforms, or the working directory when no home
/// directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default directory for uploaded whitepapers awaiting analysis.
pub fn uploads_dir() -> PathBuf {
    app_data_dir().join("uploads")
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `None` disables analysis; tasks then fail with a configuration error.
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub max_file_size_mb: u64,
    pub upload_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub max_retries: usize,
    pub llm_timeout: Duration,
    pub retry_backoff: Duration,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset and
    /// unparseable numbers fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("FINSIGHT_API_KEY").or_else(|| get("NOVITA_API_KEY"));
        let bind_addr = get("FINSIGHT_BIND")
            .and_then(|v| parse_or_warn("FINSIGHT_BIND", &v))
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

        Self {
            api_key,
            api_base: get("FINSIGHT_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: get("FINSIGHT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_file_size_mb: get("MAX_FILE_SIZE_MB")
                .and_then(|v| parse_or_warn("MAX_FILE_SIZE_MB", &v))
                .filter(|mb| *mb > 0)
                .unwrap_or(DEFAULT_MAX_FILE_SIZE_MB),
            upload_dir: get("UPLOAD_DIR").map(PathBuf::from).unwrap_or_else(uploads_dir),
            bind_addr,
            max_retries: get("FINSIGHT_MAX_RETRIES")
                .and_then(|v| parse_or_warn("FINSIGHT_MAX_RETRIES", &v))
                .unwrap_or(DEFAULT_MAX_RETRIES),
            llm_timeout: Duration::from_secs(
                get("FINSIGHT_LLM_TIMEOUT_SECS")
                    .and_then(|v| parse_or_warn("FINSIGHT_LLM_TIMEOUT_SECS", &v))
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
            ),
            retry_backoff: Duration::from_millis(
                get("FINSIGHT_RETRY_BACKOFF_MS")
                    .and_then(|v| parse_or_warn("FINSIGHT_RETRY_BACKOFF_MS", &v))
                    .unwrap_or(DEFAULT_RETRY_BACKOFF_MS),
            ),
            cors_origins: get("FINSIGHT_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_backoff)
    }

    pub fn llm_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value, "Ignoring invalid configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("FinSight"));
        assert!(uploads_dir().starts_with(app_data_dir()));
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let c = config(&[]);
        assert_eq!(c.api_key, None);
        assert!(!c.llm_configured());
        assert_eq!(c.api_base, DEFAULT_API_BASE);
        assert_eq!(c.max_file_size_mb, 10);
        assert_eq!(c.bind_addr.to_string(), DEFAULT_BIND);
        assert_eq!(c.max_retries, 2);
        assert_eq!(c.llm_timeout, Duration::from_secs(180));
        assert_eq!(c.retry_backoff, Duration::from_millis(1000));
        assert!(c.cors_origins.is_empty());
        assert_eq!(c, AppConfig::default());
    }

    #[test]
    fn primary_api_key_wins_over_fallback() {
        let c = config(&[("FINSIGHT_API_KEY", "primary"), ("NOVITA_API_KEY", "legacy")]);
        assert_eq!(c.api_key.as_deref(), Some("primary"));

        let c = config(&[("FINSIGHT_API_KEY", "  "), ("NOVITA_API_KEY", "legacy")]);
        assert_eq!(c.api_key.as_deref(), Some("legacy"));
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let c = config(&[
            ("MAX_FILE_SIZE_MB", "lots"),
            ("FINSIGHT_MAX_RETRIES", "-1"),
            ("FINSIGHT_LLM_TIMEOUT_SECS", "0"),
            ("FINSIGHT_BIND", "localhost"),
        ]);
        assert_eq!(c.max_file_size_mb, DEFAULT_MAX_FILE_SIZE_MB);
        assert_eq!(c.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(c.llm_timeout, Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS));
        assert_eq!(c.bind_addr.to_string(), DEFAULT_BIND);
    }

    #[test]
    fn overrides_are_applied() {
        let c = config(&[
            ("MAX_FILE_SIZE_MB", "25"),
            ("UPLOAD_DIR", "/srv/uploads"),
            ("FINSIGHT_BIND", "127.0.0.1:9000"),
            ("FINSIGHT_MAX_RETRIES", "4"),
            ("FINSIGHT_RETRY_BACKOFF_MS", "0"),
            ("FINSIGHT_CORS_ORIGINS", "http://localhost:3000, ,https://finsight.app"),
        ]);
        assert_eq!(c.max_file_size_bytes(), 25 * 1024 * 1024);
        assert_eq!(c.upload_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.retry_policy(), RetryPolicy::new(4, Duration::ZERO));
        assert_eq!(c.cors_origins, vec!["http://localhost:3000", "https://finsight.app"]);
    }

    #[test]
    fn app_name_is_finsight() {
        assert_eq!(APP_NAME, "FinSight");
    }
}
