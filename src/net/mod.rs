//! Network pipeline: request types, challenge classification, rate limiting and fetching.
//!
//! This module provides the request/response plumbing every catalog call goes through:
//!
//! - **Transport**: an injected port that performs one HTTP exchange ([`Transport`])
//! - **Rate Limiting**: a shared, FIFO-fair request budget ([`RateLimiter`])
//! - **Augmentation**: default headers and challenge cookies ([`RequestAugmenter`])
//! - **Classification**: anti-bot block detection ([`classify`])
//! - **Fetching**: the composition of all of the above ([`Fetcher`])
//!
//! Nothing here retries. A failed call surfaces its [`Error`](crate::Error)
//! and the caller decides what to do; [`retry`] offers an opt-in helper.
//!
//! # Examples
//!
//! ```rust,no_run
//! use goctruyen::config::ProviderConfig;
//! use goctruyen::net::{Fetcher, HttpRequest, MemoryCookieStore, ReqwestTransport};
//! use std::sync::Arc;
//!
//! # async fn example() -> goctruyen::Result<()> {
//! let config = ProviderConfig::default();
//! let fetcher = Fetcher::from_config(
//!     &config,
//!     Arc::new(ReqwestTransport::new(&config)?),
//!     Arc::new(MemoryCookieStore::new()),
//! );
//!
//! let categories: serde_json::Value = fetcher
//!     .fetch_json(HttpRequest::get(config.endpoint("/api/category")))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, SET_COOKIE};
use scraper::Html;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::{ProviderConfig, RateLimitConfig};
use crate::error::{Error, Result};

pub mod html;
pub mod intercept;
pub mod json;
pub mod retry;
pub mod transport;

pub use intercept::{Cookie, CookieStore, MemoryCookieStore, RequestAugmenter};
pub use transport::{ReqwestTransport, Transport};

/// What a request fetches. Image requests may bypass the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestKind {
    #[default]
    Document,
    Image,
}

/// An outbound HTTP request handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub kind: RequestKind,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            kind: RequestKind::Document,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    /// A GET for an image, subject to the limiter's image exemption.
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::Image,
            ..Self::get(url)
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a header on this request. Invalid names or values are skipped.
    ///
    /// Headers set here take precedence over the augmenter's defaults.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<HeaderName>(),
            value.parse::<HeaderValue>(),
        ) {
            self.headers.insert(name, value);
        }
        self
    }
}

/// The raw outcome of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<HeaderName>(),
            value.parse::<HeaderValue>(),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Cookies set by this response, one per `Set-Cookie` header.
    pub fn cookies(&self) -> Vec<Cookie> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(Cookie::parse_set_cookie)
            .collect()
    }
}

/// Checks a response status for an anti-bot challenge.
///
/// 403 and 503 become [`Error::Challenge`] carrying the request's URL and
/// method. Every other status, errors included, passes through.
///
/// # Examples
///
/// ```rust
/// use goctruyen::net::classify;
/// use reqwest::Method;
///
/// assert!(classify(200, "https://example.com", &Method::GET).is_ok());
/// assert!(classify(404, "https://example.com", &Method::GET).is_ok());
/// assert!(classify(503, "https://example.com", &Method::GET).is_err());
/// ```
pub fn classify(status: u16, url: &str, method: &Method) -> Result<()> {
    match status {
        403 | 503 => {
            warn!(status, %url, %method, "provider answered with a Cloudflare challenge");
            Err(Error::challenge(url, method.as_str()))
        }
        _ => Ok(()),
    }
}

/// Request budget shared by every call of a client.
///
/// At most `requests_per_window` requests start within any window. Callers
/// that find the budget spent wait their turn; the internal lock is fair, so
/// slots are handed out first-requested, first-served.
///
/// # Thread Safety
///
/// The limiter holds its state behind an async mutex and can be shared across
/// tasks through an `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    issued: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            issued: Mutex::new(VecDeque::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Waits until a request of the given kind may start.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use goctruyen::config::RateLimitConfig;
    /// use goctruyen::net::{RateLimiter, RequestKind};
    ///
    /// # async fn example() {
    /// let limiter = RateLimiter::new(RateLimitConfig::default());
    /// limiter.acquire(RequestKind::Document).await;
    /// # }
    /// ```
    pub async fn acquire(&self, kind: RequestKind) {
        if kind == RequestKind::Image && self.config.ignore_images {
            return;
        }

        let window = self.config.window();
        let limit = self.config.requests_per_window.max(1);
        let mut issued = self.issued.lock().await;

        loop {
            let now = Instant::now();
            while issued
                .front()
                .is_some_and(|&started| now.duration_since(started) >= window)
            {
                issued.pop_front();
            }

            if issued.len() < limit {
                issued.push_back(now);
                return;
            }

            if let Some(&oldest) = issued.front() {
                debug!(
                    wait_ms = (oldest + window - now).as_millis() as u64,
                    "request budget spent, waiting for a slot"
                );
                tokio::time::sleep_until(oldest + window).await;
            }
        }
    }
}

/// Runs requests through the full pipeline.
///
/// Each call acquires a limiter slot, lets the [`RequestAugmenter`] fill in
/// headers, executes the request on the [`Transport`], stores challenge
/// cookies, classifies the status and finally decodes the body.
///
/// A 404 status is reported as [`Error::NotFound`]; other non-challenge
/// statuses are decoded like successes.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    augmenter: RequestAugmenter,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
        augmenter: RequestAugmenter,
    ) -> Self {
        Self {
            transport,
            limiter,
            augmenter,
        }
    }

    /// Builds a fetcher with a fresh limiter and augmenter from `config`.
    pub fn from_config(
        config: &ProviderConfig,
        transport: Arc<dyn Transport>,
        cookies: Arc<dyn CookieStore>,
    ) -> Self {
        Self::new(
            transport,
            Arc::new(RateLimiter::new(config.rate_limit.clone())),
            RequestAugmenter::new(config, cookies),
        )
    }

    pub fn augmenter(&self) -> &RequestAugmenter {
        &self.augmenter
    }

    /// Sends a request and returns the classified response.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.limiter.acquire(request.kind).await;

        let request = self.augmenter.augment(request);
        let url = request.url.clone();
        let method = request.method.clone();

        debug!(%method, %url, "dispatching request");
        let response = self.transport.execute(request).await?;
        debug!(status = response.status, bytes = response.body.len(), %url, "received response");

        self.augmenter.capture_cookies(&response);
        classify(response.status, &url, &method)?;

        if response.status == 404 {
            return Err(Error::not_found(url));
        }

        Ok(response)
    }

    /// Sends a request and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// * [`Error::Challenge`] - The provider blocked the request
    /// * [`Error::NotFound`] - The provider answered 404
    /// * [`Error::Network`] - The transport failed
    /// * [`Error::Parse`] - The body is not valid JSON for `T`
    pub async fn fetch_json<T>(&self, request: HttpRequest) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = request.url.clone();
        let response = self.send(request).await?;
        serde_json::from_slice(&response.body)
            .map_err(|e| Error::parse(format!("Invalid JSON from {}: {}", url, e)))
    }

    /// GETs a page and parses it as an HTML document.
    pub async fn fetch_html(&self, url: &str) -> Result<Html> {
        let response = self.send(HttpRequest::get(url)).await?;
        let text = String::from_utf8(response.body.to_vec())
            .map_err(|e| Error::parse(format!("Invalid UTF-8 from {}: {}", url, e)))?;
        Ok(html::parse(&text))
    }

    /// Sends a request and returns the raw body.
    pub async fn fetch_bytes(&self, request: HttpRequest) -> Result<Bytes> {
        Ok(self.send(request).await?.body)
    }
}
