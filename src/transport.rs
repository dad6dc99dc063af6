use std::future::Future;
use std::time::Duration;

use reqwest::{header::HeaderMap, Method};
use serde_json::Value as JsonValue;

use crate::TransportError;

/// One fully-built attempt handed to a [`Transport`].
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL, without query string.
    pub url: String,
    pub headers: HeaderMap,
    /// JSON body; only ever set for POST.
    pub body: Option<JsonValue>,
    /// Query pairs; only ever set for GET.
    pub query: Option<Vec<(String, String)>>,
    /// Timeout for this attempt alone.
    pub timeout: Duration,
}

/// Status and raw body of a received HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends requests on behalf of [`RequestExecutor`](crate::RequestExecutor).
///
/// Any received response, whatever its status, is `Ok`. Errors are reserved
/// for attempts that produced no response at all.
pub trait Transport {
    fn dispatch(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method, &request.url)
            .headers(request.headers)
            .timeout(request.timeout);
        if let Some(query) = &request.query {
            builder = builder.query(query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify_send_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_body_error)?;
        Ok(HttpResponse { status, body })
    }
}

/// No response arrived, so anything but a timeout or a request that could
/// not be built means the connection failed or was dropped.
fn classify_send_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::timeout(err)
    } else if err.is_connect() || err.is_request() || err.is_body() {
        TransportError::connect(err)
    } else {
        TransportError::request(err)
    }
}

/// Headers arrived but the body did not; the connection went away mid-read.
fn classify_body_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::timeout(err)
    } else if err.is_body() || err.is_request() || err.is_decode() {
        TransportError::connect(err)
    } else {
        TransportError::request(err)
    }
}
