//! # goctruyen - Async catalog client for the GocTruyenTranh manga provider
//!
//! `goctruyen` retrieves titles, chapters, page images, categories and
//! discover feeds from GocTruyenTranh and normalizes the provider's HTML and
//! JSON responses into a small, stable domain model.
//!
//! ## Features
//!
//! - **Typed Catalog API**: discover feeds, search, title details, chapters and pages
//! - **Rate Limiting**: a shared FIFO request budget, with optional image exemption
//! - **Challenge Detection**: Cloudflare blocks surface as a distinct error, and
//!   the challenge cookies are kept and replayed
//! - **Pluggable Transport**: the HTTP layer is a trait, reqwest by default
//! - **Parallel Parsing**: uses rayon to map result records before de-duplication
//! - **Robust Error Handling**: inspectable error kinds plus user-facing messages
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use goctruyen::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> goctruyen::Result<()> {
//!     let client = CatalogClient::new()?;
//!
//!     let results = client.search("doraemon", None).await?;
//!     for summary in &results.items {
//!         println!("{} ({})", summary.title, summary.id);
//!     }
//!
//!     let id: TitleId = "Doraemon::123".parse()?;
//!     let chapters = client.get_chapter_list(&id).await?;
//!     println!("{} chapters", chapters.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`client`]: the [`CatalogClient`] entry point
//! - [`net`]: transport port, rate limiter, request augmentation, fetching
//! - [`parser`]: response-shape mappers
//! - [`types`]: domain entities and identifiers
//! - [`search`]: search queries and result processing
//! - [`util`]: URL building, time parsing and response validation
//! - [`config`]: provider configuration
//! - [`error`]: error handling
//!
//! ## Handling Challenges
//!
//! ```rust,no_run
//! use goctruyen::prelude::*;
//!
//! # async fn example(client: CatalogClient) {
//! match client.list_categories().await {
//!     Ok(groups) => println!("{} categories", groups[0].tags.len()),
//!     Err(err) if err.kind() == ErrorKind::Challenge => {
//!         eprintln!("{}", err.user_message());
//!         // After the user passes the check in a browser:
//!         client.save_challenge_cookies([Cookie::new("cf_clearance", "...")]);
//!     }
//!     Err(err) => eprintln!("{}", err.user_message()),
//! }
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod net;
pub mod parser;
pub mod search;
pub mod types;
pub mod util;

/// Prelude module for convenient imports.
///
/// ```rust
/// use goctruyen::prelude::*;
///
/// let id: TitleId = "Doraemon::123".parse().unwrap();
/// assert_eq!(id.slug(), "Doraemon");
/// ```
pub mod prelude {
    pub use crate::{
        client::CatalogClient,
        config::{ProviderConfig, ProviderConfigBuilder, RateLimitConfig},
        error::{Error, ErrorKind, Resource, Result},
        net::{Cookie, CookieStore, MemoryCookieStore, Transport},
        search::{SearchQuery, SearchResultExt},
        types::{
            Chapter, ChapterDetails, ChapterId, DiscoverItem, DiscoverItemKind, DiscoverSection,
            DiscoverSectionId, PageCursor, PagedResults, Tag, TagGroup, TitleDetails, TitleId,
            TitleSummary,
        },
    };
}

// Re-export main types at crate root for direct access
pub use client::CatalogClient;
pub use config::ProviderConfig;
pub use error::{Error, ErrorKind, Resource, Result};
pub use search::{SearchQuery, SearchResultExt};
pub use types::{
    Chapter, ChapterDetails, ChapterId, DiscoverItem, DiscoverSection, DiscoverSectionId,
    PageCursor, PagedResults, TagGroup, TitleDetails, TitleId, TitleSummary,
};
