use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use reqwest::header::HeaderValue;

use crate::ConfigError;

/// Source key for the API base URL.
pub const BASE_URL_KEY: &str = "API_BASE_URL";
/// Source key for the API credential.
pub const API_KEY_KEY: &str = "API_KEY";
/// Source key for the per-attempt timeout, in (fractional) seconds.
pub const TIMEOUT_KEY: &str = "API_TIMEOUT";

/// Per-attempt timeout used when neither the caller nor the source sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Backoff unit; the n-th retry waits `n * unit`.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

/// Named key/value lookup used to fill settings the caller did not supply.
///
/// Blank values are treated as absent.
pub trait ConfigSource {
    /// Returns the raw value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads settings from the process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl<F> ConfigSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Resolved, validated executor settings.
///
/// Built through [`ExecutorBuilder`]; immutable afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    base_url: String,
    authorization: HeaderValue,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl fmt::Debug for ExecutorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorConfig")
            .field("base_url", &self.base_url)
            .field("authorization", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl ExecutorConfig {
    /// Starts a builder with no explicit settings.
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::default()
    }

    /// Base URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full `Authorization` header value.
    pub fn authorization(&self) -> &HeaderValue {
        &self.authorization
    }

    /// Timeout applied to every individual attempt.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retries allowed after the initial attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Backoff unit between attempts.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Joins `path` onto the base URL.
    ///
    /// Example: base `"https://api.test"` and path `"/users"` →
    /// `"https://api.test/users"`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Delay before the retry numbered `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

/// Collects explicit settings and resolves the rest from a [`ConfigSource`].
///
/// Precedence is explicit value, then source, then built-in default. Base URL
/// and API key have no default.
#[derive(Clone, Default)]
pub struct ExecutorBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    backoff: Option<Duration>,
}

impl fmt::Debug for ExecutorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorBuilder")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl ExecutorBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the credential. A leading `Bearer ` is accepted and not repeated.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the per-attempt timeout. Zero counts as unset.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Resolves missing settings from the process environment.
    pub fn resolve_env(self) -> Result<ExecutorConfig, ConfigError> {
        self.resolve(&EnvSource)
    }

    /// Resolves missing settings from `source` and validates the result.
    pub fn resolve<S>(self, source: &S) -> Result<ExecutorConfig, ConfigError>
    where
        S: ConfigSource + ?Sized,
    {
        let lookup = |key: &str| source.get(key).filter(|value| !value.trim().is_empty());

        let base_url = non_blank(self.base_url)
            .or_else(|| lookup(BASE_URL_KEY))
            .map(|url| url.trim().trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing { key: BASE_URL_KEY })?;

        let api_key = non_blank(self.api_key)
            .or_else(|| lookup(API_KEY_KEY))
            .ok_or(ConfigError::Missing { key: API_KEY_KEY })?;
        let mut authorization =
            HeaderValue::from_str(&normalize_bearer_authorization(&api_key))
                .map_err(|_| ConfigError::InvalidApiKey)?;
        authorization.set_sensitive(true);

        let timeout = match self.timeout.filter(|timeout| !timeout.is_zero()) {
            Some(timeout) => timeout,
            None => match lookup(TIMEOUT_KEY) {
                Some(raw) => parse_timeout(&raw)?,
                None => DEFAULT_TIMEOUT,
            },
        };

        Ok(ExecutorConfig {
            base_url,
            authorization,
            timeout,
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            backoff: self.backoff.unwrap_or(DEFAULT_BACKOFF),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidTimeout {
        value: raw.to_owned(),
    };
    let seconds: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if seconds <= 0.0 {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| invalid())
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{normalize_bearer_authorization, ExecutorConfig, DEFAULT_TIMEOUT};
    use crate::ConfigError;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    fn empty(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn normalize_bearer_adds_prefix_when_missing() {
        assert_eq!(normalize_bearer_authorization("abc123"), "Bearer abc123");
    }

    #[test]
    fn normalize_bearer_keeps_existing_prefix() {
        assert_eq!(
            normalize_bearer_authorization("bEaReR abc123"),
            "bEaReR abc123"
        );
    }

    #[test]
    fn resolves_everything_from_source() {
        let config = ExecutorConfig::builder()
            .resolve(&source(&[
                ("API_BASE_URL", "https://api.example.test/"),
                ("API_KEY", "test_key"),
                ("API_TIMEOUT", "3"),
            ]))
            .expect("config must resolve");

        assert_eq!(config.base_url(), "https://api.example.test");
        assert_eq!(config.authorization(), "Bearer test_key");
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.max_retries(), 2);
        assert_eq!(config.backoff(), Duration::from_millis(200));
    }

    #[test]
    fn explicit_values_win_over_source() {
        let config = ExecutorConfig::builder()
            .base_url("https://explicit.test")
            .api_key("explicit-key")
            .timeout(Duration::from_millis(750))
            .max_retries(0)
            .backoff(Duration::from_millis(1))
            .resolve(&source(&[
                ("API_BASE_URL", "https://env.test"),
                ("API_KEY", "env-key"),
                ("API_TIMEOUT", "9"),
            ]))
            .expect("config must resolve");

        assert_eq!(config.base_url(), "https://explicit.test");
        assert_eq!(config.authorization(), "Bearer explicit-key");
        assert_eq!(config.timeout(), Duration::from_millis(750));
        assert_eq!(config.max_retries(), 0);
        assert_eq!(config.backoff(), Duration::from_millis(1));
    }

    #[test]
    fn timeout_falls_back_to_default() {
        let config = ExecutorConfig::builder()
            .base_url("https://api.test")
            .api_key("k")
            .resolve(&empty)
            .expect("config must resolve");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn fractional_timeout_is_accepted() {
        let config = ExecutorConfig::builder()
            .resolve(&source(&[
                ("API_BASE_URL", "https://api.test"),
                ("API_KEY", "k"),
                ("API_TIMEOUT", "0.5"),
            ]))
            .expect("config must resolve");
        assert_eq!(config.timeout(), Duration::from_millis(500));
    }

    #[test]
    fn missing_base_url_fails() {
        let err = ExecutorConfig::builder()
            .api_key("k")
            .resolve(&empty)
            .expect_err("base url is required");
        assert!(matches!(err, ConfigError::Missing { key: "API_BASE_URL" }));
    }

    #[test]
    fn slash_only_base_url_counts_as_missing() {
        let err = ExecutorConfig::builder()
            .base_url("///")
            .api_key("k")
            .resolve(&empty)
            .expect_err("base url is required");
        assert!(matches!(err, ConfigError::Missing { key: "API_BASE_URL" }));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let err = ExecutorConfig::builder()
            .base_url("https://api.test")
            .resolve(&source(&[("API_KEY", "   ")]))
            .expect_err("api key is required");
        assert!(matches!(err, ConfigError::Missing { key: "API_KEY" }));
    }

    #[test]
    fn garbage_timeout_is_rejected() {
        for raw in ["soon", "0", "-2"] {
            let err = ExecutorConfig::builder()
                .base_url("https://api.test")
                .api_key("k")
                .resolve(&source(&[("API_TIMEOUT", raw)]))
                .expect_err("timeout must be rejected");
            assert!(matches!(err, ConfigError::InvalidTimeout { .. }), "{raw}");
        }
    }

    #[test]
    fn zero_timeout_falls_through_to_source_then_default() {
        let from_source = ExecutorConfig::builder()
            .base_url("https://api.test")
            .api_key("k")
            .timeout(Duration::ZERO)
            .resolve(&source(&[("API_TIMEOUT", "2")]))
            .expect("config must resolve");
        assert_eq!(from_source.timeout(), Duration::from_secs(2));

        let defaulted = ExecutorConfig::builder()
            .base_url("https://api.test")
            .api_key("k")
            .timeout(Duration::ZERO)
            .resolve(&empty)
            .expect("config must resolve");
        assert_eq!(defaulted.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn header_breaking_api_key_is_rejected() {
        let err = ExecutorConfig::builder()
            .base_url("https://api.test")
            .api_key("line\nbreak")
            .resolve(&empty)
            .expect_err("newline cannot go in a header");
        assert!(matches!(err, ConfigError::InvalidApiKey));
    }

    #[test]
    fn endpoint_strips_leading_slashes_from_path() {
        let config = ExecutorConfig::builder()
            .base_url("https://api.test/v1/")
            .api_key("k")
            .resolve(&empty)
            .expect("config must resolve");
        assert_eq!(config.endpoint("/users"), "https://api.test/v1/users");
        assert_eq!(config.endpoint("//users/1"), "https://api.test/v1/users/1");
        assert_eq!(config.endpoint("users"), "https://api.test/v1/users");
    }

    #[test]
    fn backoff_grows_linearly_with_attempt() {
        let config = ExecutorConfig::builder()
            .base_url("https://api.test")
            .api_key("k")
            .backoff(Duration::from_millis(10))
            .resolve(&empty)
            .expect("config must resolve");
        assert_eq!(config.backoff_for(1), Duration::from_millis(10));
        assert_eq!(config.backoff_for(2), Duration::from_millis(20));
        assert_eq!(config.backoff_for(3), Duration::from_millis(30));
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let config = ExecutorConfig::builder()
            .base_url("https://api.test")
            .api_key("secret-token")
            .resolve(&empty)
            .expect("config must resolve");
        let debug = format!("{config:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }
}
