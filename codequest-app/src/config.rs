use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://codequest-backend-2025.onrender.com";
pub const DEFAULT_API_VERSION: &str = "v1";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub version: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Reads `CODEQUEST_API_BASE_URL`, `CODEQUEST_API_VERSION` and
    /// `CODEQUEST_HTTP_TIMEOUT_SECS`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = non_empty_var("CODEQUEST_API_BASE_URL").unwrap_or(defaults.base_url);
        let version = non_empty_var("CODEQUEST_API_VERSION").unwrap_or(defaults.version);
        let timeout = match non_empty_var("CODEQUEST_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!("Ignoring invalid CODEQUEST_HTTP_TIMEOUT_SECS={}", raw);
                    defaults.timeout
                }
            },
            None => defaults.timeout,
        };

        Self {
            base_url,
            version,
            timeout,
        }
    }
}

/// `CODEQUEST_SESSION_FILE`, else `$HOME/.codequest/session.json`, else a
/// file in the working directory.
pub fn session_file_from_env() -> PathBuf {
    if let Some(path) = non_empty_var("CODEQUEST_SESSION_FILE") {
        return PathBuf::from(path);
    }
    match non_empty_var("HOME") {
        Some(home) => PathBuf::from(home).join(".codequest").join(SESSION_FILE_NAME),
        None => PathBuf::from(".codequest-session.json"),
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
