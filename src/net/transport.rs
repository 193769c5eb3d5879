//! The transport port and its reqwest adapter.

use async_trait::async_trait;
use reqwest::Client;

use super::{HttpRequest, HttpResponse};
use crate::config::ProviderConfig;
use crate::error::Result;

/// Performs a single HTTP exchange.
///
/// Implementations return whatever status the server sent; classifying it is
/// the [`Fetcher`](super::Fetcher)'s job. Failures to obtain a response at all
/// are reported as [`Error::Network`](crate::Error::Network).
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use goctruyen::net::{HttpRequest, HttpResponse, Transport};
///
/// struct AlwaysEmpty;
///
/// #[async_trait]
/// impl Transport for AlwaysEmpty {
///     async fn execute(&self, _request: HttpRequest) -> goctruyen::Result<HttpResponse> {
///         Ok(HttpResponse::new(200, "{}"))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Production [`Transport`] backed by a pooled `reqwest::Client`.
///
/// The client is configured with:
/// - the configured request timeout
/// - connection pooling (10 idle connections per host)
/// - compression support (gzip, brotli)
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds the transport from the timeout in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`](crate::Error::Network) if the TLS backend
    /// cannot be initialised.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(10)
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an already configured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
