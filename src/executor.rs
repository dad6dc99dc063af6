use std::fmt;

use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Method,
};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::{
    ApiError, ConfigError, ExecutorConfig, HttpRequest, HttpResponse, QueryParams,
    ReqwestTransport, Result, Sleeper, TokioSleeper, Transport,
};

/// How a received status code is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StatusClass {
    Success,
    Auth,
    Transient,
    Permanent,
}

fn classify_status(status: u16) -> StatusClass {
    match status {
        401 | 403 => StatusClass::Auth,
        502..=504 => StatusClass::Transient,
        200..=299 => StatusClass::Success,
        _ => StatusClass::Permanent,
    }
}

/// Authenticated JSON client that retries gateway errors and network failures.
///
/// Retries use linear backoff: the n-th retry waits `backoff * n`. Every
/// attempt gets the full configured timeout; there is no overall deadline.
#[derive(Clone)]
pub struct RequestExecutor<T = ReqwestTransport, S = TokioSleeper> {
    transport: T,
    sleeper: S,
    config: ExecutorConfig,
}

impl<T, S> fmt::Debug for RequestExecutor<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    /// Creates an executor over a fresh `reqwest` client and tokio sleeps.
    pub fn new(config: ExecutorConfig) -> Self {
        Self::with_parts(config, ReqwestTransport::default(), TokioSleeper)
    }

    /// Creates an executor configured from environment variables.
    ///
    /// Reads:
    /// - `API_BASE_URL`: base URL, required
    /// - `API_KEY`: credential (Bearer prefix optional), required
    /// - `API_TIMEOUT`: per-attempt timeout in seconds, defaults to 5
    ///
    /// # Example
    ///
    /// ```no_run
    /// use retrying_api_client::RequestExecutor;
    ///
    /// let api = RequestExecutor::from_env().expect("missing API_* env vars");
    /// ```
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(ExecutorConfig::builder().resolve_env()?))
    }
}

impl<T, S> RequestExecutor<T, S>
where
    T: Transport,
    S: Sleeper,
{
    /// Creates an executor with an injected transport and sleeper.
    pub fn with_parts(config: ExecutorConfig, transport: T, sleeper: S) -> Self {
        Self {
            transport,
            sleeper,
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Sends `GET {base_url}/{path}` with optional query parameters.
    ///
    /// Returns `Ok(None)` when the success response has an empty body.
    pub async fn get<Q: Into<QueryParams>>(
        &self,
        path: &str,
        params: Q,
    ) -> Result<Option<JsonValue>> {
        self.execute(Method::GET, path, None, params.into().into_option())
            .await
    }

    /// Sends `POST {base_url}/{path}` with `body` serialized as JSON.
    pub async fn post<B>(&self, path: &str, body: &B) -> Result<Option<JsonValue>>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.execute(Method::POST, path, Some(body), None).await
    }

    /// Sends `POST {base_url}/{path}` without a body.
    pub async fn post_empty(&self, path: &str) -> Result<Option<JsonValue>> {
        self.execute(Method::POST, path, None, None).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<JsonValue>,
        query: Option<Vec<(String, String)>>,
    ) -> Result<Option<JsonValue>> {
        let request = HttpRequest {
            method,
            url: self.config.endpoint(path),
            headers: self.headers(),
            body,
            query,
            timeout: self.config.timeout(),
        };
        let max_retries = self.config.max_retries();
        let mut attempt = 0u32;

        loop {
            match self.transport.dispatch(request.clone()).await {
                Ok(response) => match classify_status(response.status) {
                    StatusClass::Success => return decode_body(response),
                    StatusClass::Auth => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            status = response.status,
                            url = %request.url,
                            "request rejected as unauthorized"
                        );
                        return Err(ApiError::Auth {
                            status: response.status,
                            body: response.body,
                        });
                    }
                    StatusClass::Transient => {
                        attempt += 1;
                        if attempt > max_retries {
                            #[cfg(feature = "tracing")]
                            tracing::warn!(
                                status = response.status,
                                attempts = attempt,
                                url = %request.url,
                                "retry budget exhausted on transient status"
                            );
                            return Err(ApiError::TransientExhausted {
                                status: response.status,
                                attempts: attempt,
                            });
                        }
                        self.wait_before_retry(attempt).await;
                    }
                    StatusClass::Permanent => {
                        return Err(ApiError::Http {
                            status: response.status,
                            body: response.body,
                        });
                    }
                },
                Err(err) if err.is_retryable() => {
                    attempt += 1;
                    if attempt > max_retries {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            attempts = attempt,
                            url = %request.url,
                            error = %err,
                            "retry budget exhausted on network failure"
                        );
                        return Err(ApiError::Network {
                            attempts: attempt,
                            source: err,
                        });
                    }
                    self.wait_before_retry(attempt).await;
                }
                Err(err) => return Err(ApiError::Transport(err)),
            }
        }
    }

    fn headers(&self) -> HeaderMap {
        let json = HeaderValue::from_static("application/json");
        let mut headers = HeaderMap::with_capacity(3);
        headers.insert(header::AUTHORIZATION, self.config.authorization().clone());
        headers.insert(header::CONTENT_TYPE, json.clone());
        headers.insert(header::ACCEPT, json);
        headers
    }

    /// Waits `backoff * attempt` before the next dispatch.
    async fn wait_before_retry(&self, attempt: u32) {
        let delay = self.config.backoff_for(attempt);

        #[cfg(feature = "tracing")]
        tracing::debug!("retry {} after {} ms", attempt, delay.as_millis());

        self.sleeper.sleep(delay).await;
    }
}

fn decode_body(response: HttpResponse) -> Result<Option<JsonValue>> {
    if response.body.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&response.body)
        .map(Some)
        .map_err(ApiError::Decode)
}
