use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root; endpoints live under `{base_url}/api`.
    pub base_url: String,
    pub timeout: Duration,
    /// Extra attempts for idempotent reads.
    pub read_retries: u32,
    /// Grows linearly with the attempt number.
    pub retry_backoff: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_read_retries(mut self, retries: u32) -> Self {
        self.read_retries = retries;
        self
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(10),
            read_retries: 2,
            retry_backoff: Duration::from_millis(250),
            user_agent: format!("matchups-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_strips_trailing_slash() {
        let config = ClientConfig::new("http://campus.local:8080/");
        assert_eq!(
            config.api_url("/matchups/3/close"),
            "http://campus.local:8080/api/matchups/3/close"
        );
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.read_retries, 2);
    }
}
