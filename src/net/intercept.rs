//! Request decoration and Cloudflare cookie handling.
//!
//! Every outbound request passes through [`RequestAugmenter::augment`], which
//! fills in the headers the provider expects. Every response passes through
//! [`RequestAugmenter::capture_cookies`], which keeps the cookies Cloudflare
//! hands out after a challenge (`cf*`, `_cf*`, `__cf*`) and ignores the rest.

use parking_lot::Mutex;
use reqwest::header::{
    CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER, USER_AGENT,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use super::{HttpRequest, HttpResponse};
use crate::config::ProviderConfig;

const CHALLENGE_COOKIE_PREFIXES: [&str; 3] = ["cf", "_cf", "__cf"];

/// A cookie as received in a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }

    /// Parses a `Set-Cookie` header value. Attributes other than `Domain`
    /// and `Path` are dropped, and a quoted value is unquoted.
    ///
    /// ```rust
    /// use goctruyen::net::Cookie;
    ///
    /// let cookie = Cookie::parse_set_cookie(
    ///     "cf_clearance=abc; Path=/; Domain=.example.com; HttpOnly",
    /// )
    /// .unwrap();
    /// assert_eq!(cookie.name, "cf_clearance");
    /// assert_eq!(cookie.value, "abc");
    /// assert_eq!(cookie.path.as_deref(), Some("/"));
    /// assert_eq!(cookie.domain.as_deref(), Some("example.com"));
    /// ```
    pub fn parse_set_cookie(header: &str) -> Option<Self> {
        let parsed = cookie::Cookie::parse(header).ok()?;
        if parsed.name().is_empty() {
            return None;
        }
        Some(Self {
            name: parsed.name().to_string(),
            value: parsed.value_trimmed().to_string(),
            domain: parsed.domain().map(String::from),
            path: parsed.path().map(String::from),
        })
    }

    /// Whether this cookie belongs to Cloudflare's challenge state.
    pub fn is_challenge(&self) -> bool {
        CHALLENGE_COOKIE_PREFIXES
            .iter()
            .any(|prefix| self.name.starts_with(prefix))
    }
}

/// Persistence port for challenge cookies.
///
/// The host application owns where cookies live and when they are cleared;
/// the augmenter only writes to and reads from this interface.
pub trait CookieStore: Send + Sync {
    /// Stores a cookie, replacing any cookie with the same name.
    fn set_cookie(&self, cookie: Cookie);

    /// All stored cookies.
    fn cookies(&self) -> Vec<Cookie>;
}

/// In-process [`CookieStore`].
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    cookies: Mutex<Vec<Cookie>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.cookies.lock().clear();
    }
}

impl CookieStore for MemoryCookieStore {
    fn set_cookie(&self, cookie: Cookie) {
        let mut cookies = self.cookies.lock();
        match cookies.iter_mut().find(|stored| stored.name == cookie.name) {
            Some(stored) => *stored = cookie,
            None => cookies.push(cookie),
        }
    }

    fn cookies(&self) -> Vec<Cookie> {
        self.cookies.lock().clone()
    }
}

/// Adds provider defaults to requests and keeps challenge cookies from responses.
///
/// Defaults never overwrite a header the caller already set.
#[derive(Clone)]
pub struct RequestAugmenter {
    base_url: String,
    user_agent: String,
    store: Arc<dyn CookieStore>,
}

impl fmt::Debug for RequestAugmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestAugmenter")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl RequestAugmenter {
    pub fn new(config: &ProviderConfig, store: Arc<dyn CookieStore>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn CookieStore> {
        &self.store
    }

    /// Fills in `referer`, `origin`, `content-type`, `user-agent` and the
    /// stored challenge cookies, keeping any value the caller set.
    pub fn augment(&self, mut request: HttpRequest) -> HttpRequest {
        let mut defaults = vec![
            (REFERER, self.base_url.clone()),
            (ORIGIN, self.base_url.clone()),
            (CONTENT_TYPE, "application/json".to_string()),
            (USER_AGENT, self.user_agent.clone()),
        ];

        let cookie_header = self
            .store
            .cookies()
            .into_iter()
            .filter(Cookie::is_challenge)
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");
        if !cookie_header.is_empty() {
            defaults.push((COOKIE, cookie_header));
        }

        fill_missing(&mut request.headers, defaults);
        trace!(url = %request.url, headers = request.headers.len(), "augmented request");
        request
    }

    /// Stores the challenge cookies a response set. Returns how many were kept.
    pub fn capture_cookies(&self, response: &HttpResponse) -> usize {
        self.save_cookies(response.cookies())
    }

    /// Stores the challenge cookies among `cookies`, ignoring all others.
    pub fn save_cookies(&self, cookies: impl IntoIterator<Item = Cookie>) -> usize {
        let mut kept = 0;
        for cookie in cookies.into_iter().filter(Cookie::is_challenge) {
            debug!(name = %cookie.name, "storing Cloudflare cookie");
            self.store.set_cookie(cookie);
            kept += 1;
        }
        kept
    }
}

fn fill_missing(headers: &mut HeaderMap, defaults: Vec<(HeaderName, String)>) {
    for (name, value) in defaults {
        if headers.contains_key(&name) {
            continue;
        }
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }
}
