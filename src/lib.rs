//! `retrying-api-client` is an async client for authenticated JSON APIs.
//!
//! [`RequestExecutor`] exposes two operations:
//! - [`RequestExecutor::get`]
//! - [`RequestExecutor::post`]
//!
//! Responses are classified into a closed [`ApiError`] taxonomy. Gateway
//! errors (502/503/504) and network failures are retried with linear backoff;
//! 401/403 surface immediately as [`ApiError::Auth`].
//!
//! Transport and sleep are injected through the [`Transport`] and
//! [`Sleeper`] traits, so retry behavior can be tested without a network or
//! real delays.

mod config;
mod error;
mod executor;
mod query;
mod sleep;
mod transport;

pub use config::{
    ConfigSource, EnvSource, ExecutorBuilder, ExecutorConfig, API_KEY_KEY, BASE_URL_KEY,
    DEFAULT_BACKOFF, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, TIMEOUT_KEY,
};
pub use error::{ApiError, BoxError, ConfigError, TransportError};
pub use executor::RequestExecutor;
pub use query::QueryParams;
pub use sleep::{Sleeper, TokioSleeper};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

pub type Result<T> = std::result::Result<T, ApiError>;
