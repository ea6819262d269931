use crate::prelude::*;
use std::time::Duration;

/// Directory backend configuration from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Option<Duration>,
}

impl DirectoryConfig {
    /// Default admin backend
    pub const DEFAULT_BASE_URL: &'static str = "https://admin-backend-1sev.onrender.com";

    /// Load configuration from environment variables
    ///
    /// - DIRECTORY_BASE_URL (defaults to the hosted admin backend)
    /// - DIRECTORY_USERNAME / DIRECTORY_PASSWORD for Basic auth (optional)
    /// - DIRECTORY_TIMEOUT_SECS request deadline (optional)
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let timeout = match lookup("DIRECTORY_TIMEOUT_SECS") {
            Some(raw) => Some(parse_timeout(&raw)?),
            None => None,
        };

        Ok(Self {
            base_url: lookup("DIRECTORY_BASE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            username: lookup("DIRECTORY_USERNAME").filter(|u| !u.is_empty()),
            password: lookup("DIRECTORY_PASSWORD"),
            timeout,
        })
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        username: Option<String>,
        password: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(username) = username {
            self.username = Some(username);
        }
        if let Some(password) = password {
            self.password = Some(password);
        }
        if let Some(secs) = timeout_secs {
            self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        self
    }

    /// Base URL without a trailing slash
    pub fn api_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, Error> {
    let secs = raw.trim().parse::<u64>().map_err(|_| {
        Error::Config(format!(
            "DIRECTORY_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
        ))
    })?;
    Ok(Duration::from_secs(secs))
}

/// Create an HTTP client, attaching Basic Auth when credentials are configured
pub fn create_authenticated_client(config: &DirectoryConfig) -> Result<reqwest::Client> {
    use base64::Engine;
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    if let Some(username) = &config.username {
        let auth_string = format!(
            "{}:{}",
            username,
            config.password.as_deref().unwrap_or_default()
        );
        let auth_encoded = base64::engine::general_purpose::STANDARD.encode(&auth_string);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {auth_encoded}"))
                .map_err(|e| eyre!("Invalid header value: {}", e))?,
        );
    }

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DirectoryConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DirectoryConfig::DEFAULT_BASE_URL);
        assert_eq!(config.username, None);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_reads_credentials_and_timeout() {
        let config = DirectoryConfig::from_lookup(lookup(&[
            ("DIRECTORY_BASE_URL", "http://localhost:8000/"),
            ("DIRECTORY_USERNAME", "admin"),
            ("DIRECTORY_PASSWORD", "password"),
            ("DIRECTORY_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();

        assert_eq!(config.api_base(), "http://localhost:8000");
        assert_eq!(config.username.as_deref(), Some("admin"));
        assert_eq!(config.password.as_deref(), Some("password"));
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_invalid_timeout_is_a_config_error() {
        let err = DirectoryConfig::from_lookup(lookup(&[("DIRECTORY_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_overrides_win() {
        let config = DirectoryConfig::from_lookup(lookup(&[("DIRECTORY_USERNAME", "admin")]))
            .unwrap()
            .with_overrides(
                Some("http://127.0.0.1:9000".to_string()),
                Some("ops".to_string()),
                None,
                Some(0),
            );

        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.username.as_deref(), Some("ops"));
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_client_builds_with_and_without_credentials() {
        let anonymous = DirectoryConfig::from_lookup(lookup(&[])).unwrap();
        assert!(create_authenticated_client(&anonymous).is_ok());

        let authed = anonymous.with_overrides(
            None,
            Some("admin".to_string()),
            Some("password".to_string()),
            Some(5),
        );
        assert!(create_authenticated_client(&authed).is_ok());
    }
}
