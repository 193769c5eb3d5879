//! Error types and result handling for catalog operations.
//!
//! This module defines the error handling system used throughout the crate.
//! All operations return a [`Result<T>`] which is a type alias for `std::result::Result<T, Error>`.
//!
//! # Error Categories
//!
//! Errors fall into four provider-facing kinds plus a configuration kind:
//!
//! - **Challenge**: the provider answered with an anti-bot block (HTTP 403/503)
//! - **Parse**: the response did not have the expected shape
//! - **Not Found**: the requested title or chapter does not exist
//! - **Network**: the transport failed before a response was received
//! - **Config**: the client was constructed with an unusable configuration
//!
//! None of these are retried internally. Use [`Error::kind`] to branch on the
//! category and [`Error::user_message`] to get a string suitable for display.
//!
//! # Examples
//!
//! ```rust
//! use goctruyen::{Error, ErrorKind};
//!
//! let error = Error::challenge("https://goctruyentranhvui7.com/api/category", "GET");
//! assert_eq!(error.kind(), ErrorKind::Challenge);
//! assert!(!error.is_retryable());
//! ```

use thiserror::Error;

/// Boxed error produced by a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Type alias for Results with this crate's [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// User-displayable strings for each error kind.
pub mod messages {
    pub const CHAPTER_NOT_FOUND: &str = "No chapter data found!";
    pub const MANGA_NOT_FOUND: &str = "Manga not found!";
    pub const NOT_FOUND: &str = "Not found!";
    pub const NETWORK_ERROR: &str = "Network error occurred!";
    pub const INVALID_RESPONSE: &str = "Invalid response from server!";
}

/// Error type for all catalog operations.
///
/// # Variants
///
/// * [`Challenge`](Error::Challenge) - Anti-bot block, needs a browser pass
/// * [`Parse`](Error::Parse) - Response shape mismatch
/// * [`NotFound`](Error::NotFound) - Missing title, chapter or other resource
/// * [`Network`](Error::Network) - Transport failure, surfaced unchanged
/// * [`Config`](Error::Config) - Invalid client configuration
#[derive(Error, Debug)]
pub enum Error {
    /// The provider served a Cloudflare challenge instead of content.
    ///
    /// Carries the URL and HTTP method of the blocked request. Clearing the
    /// block requires the user to open the provider's site in a browser.
    #[error("Cloudflare challenge on {method} {url}")]
    Challenge { url: String, method: String },

    /// HTML/JSON decoding or shape errors.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The requested resource does not exist on the provider.
    #[error("Not found: {detail}")]
    NotFound { resource: Resource, detail: String },

    /// Transport-level failures such as timeouts or refused connections.
    #[error("Network error: {0}")]
    Network(#[source] BoxError),

    /// The client configuration cannot be used.
    #[error("Config error: {0}")]
    Config(String),
}

/// What a [`Error::NotFound`] was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Title,
    Chapter,
    Other,
}

/// Coarse classification of an [`enum@Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Challenge,
    Parse,
    NotFound,
    Network,
    Config,
}

impl Error {
    /// Creates a parse error with the given message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use goctruyen::Error;
    ///
    /// let error = Error::parse("Missing result.data in chapter response");
    /// assert!(error.to_string().contains("result.data"));
    /// ```
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Creates a not found error for an unspecified resource.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound {
            resource: Resource::Other,
            detail: msg.into(),
        }
    }

    pub fn title_not_found(msg: impl Into<String>) -> Self {
        Error::NotFound {
            resource: Resource::Title,
            detail: msg.into(),
        }
    }

    pub fn chapter_not_found(msg: impl Into<String>) -> Self {
        Error::NotFound {
            resource: Resource::Chapter,
            detail: msg.into(),
        }
    }

    /// Narrows a not found error to `resource`; other errors pass through.
    pub fn for_resource(self, resource: Resource) -> Self {
        match self {
            Error::NotFound { detail, .. } => Error::NotFound { resource, detail },
            other => other,
        }
    }

    /// Creates a challenge error for a blocked request.
    pub fn challenge(url: impl Into<String>, method: impl Into<String>) -> Self {
        Error::Challenge {
            url: url.into(),
            method: method.into(),
        }
    }

    /// Wraps an arbitrary transport failure.
    ///
    /// Custom [`Transport`](crate::net::Transport) implementations use this to
    /// surface their own errors without losing the source chain.
    pub fn network(err: impl Into<BoxError>) -> Self {
        Error::Network(err.into())
    }

    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Challenge { .. } => ErrorKind::Challenge,
            Error::Parse(_) => ErrorKind::Parse,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Network(_) => ErrorKind::Network,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether an outer retry layer may repeat the failed call.
    ///
    /// Only network failures qualify. Challenges need user action, and parse
    /// or not-found errors would fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    /// Returns the string shown to a user for this error.
    ///
    /// Challenges get actionable guidance pointing at the blocked site. Other
    /// kinds get the fixed catalog message followed by the error itself.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use goctruyen::Error;
    ///
    /// let url = "https://goctruyentranhvui7.com/truyen/abc";
    /// assert!(Error::challenge(url, "GET").user_message().contains(url));
    ///
    /// let error = Error::parse("bad json");
    /// assert_eq!(
    ///     error.user_message(),
    ///     "Invalid response from server! (Parse error: bad json)"
    /// );
    ///
    /// let error = Error::chapter_not_found("chuong-3");
    /// assert!(error.user_message().starts_with("No chapter data found!"));
    /// ```
    pub fn user_message(&self) -> String {
        match self {
            Error::Challenge { url, .. } => format!(
                "Cloudflare is blocking requests. Open {} in the browser, \
                 complete the check, then try again.",
                url
            ),
            Error::Parse(_) => format!("{} ({})", messages::INVALID_RESPONSE, self),
            Error::NotFound { resource, .. } => {
                let message = match resource {
                    Resource::Title => messages::MANGA_NOT_FOUND,
                    Resource::Chapter => messages::CHAPTER_NOT_FOUND,
                    Resource::Other => messages::NOT_FOUND,
                };
                format!("{} ({})", message, self)
            }
            Error::Network(_) => format!("{} ({})", messages::NETWORK_ERROR, self),
            Error::Config(_) => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(format!("Invalid JSON: {}", err))
    }
}
