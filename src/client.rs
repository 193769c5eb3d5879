//! The catalog client.
//!
//! [`CatalogClient`] is the entry point of the crate. It owns an immutable
//! [`ProviderConfig`], a [`Fetcher`] and the challenge cookie store, and maps
//! each catalog operation onto an endpoint, a request and a parser function.
//!
//! # Examples
//!
//! ```rust,no_run
//! use goctruyen::prelude::*;
//!
//! # async fn example() -> goctruyen::Result<()> {
//! let client = CatalogClient::new()?;
//!
//! let hot = client
//!     .get_discover_section_page(DiscoverSectionId::Hot, None)
//!     .await?;
//! let first = &hot.items[0].summary;
//!
//! let details = client.get_title_details(&first.id).await?;
//! let chapters = client.get_chapter_list(&first.id).await?;
//! let pages = client.get_chapter_pages(&first.id, &chapters[0].id).await?;
//!
//! println!("{} has {} chapters", details.primary_title, chapters.len());
//! println!("first chapter has {} pages", pages.pages.len());
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::form_urlencoded;

use crate::config::{ProviderConfig, endpoints};
use crate::error::{Error, Resource, Result};
use crate::net::{
    Cookie, CookieStore, Fetcher, HttpRequest, MemoryCookieStore, ReqwestTransport, Transport,
};
use crate::parser;
use crate::search::SearchQuery;
use crate::types::{
    Chapter, ChapterDetails, ChapterId, DiscoverItem, DiscoverSection, DiscoverSectionId,
    PageCursor, PagedResults, TagGroup, TitleDetails, TitleId, TitleSummary,
};
use crate::util::build_url;

type SectionParser = fn(&Value, &str) -> Result<Vec<DiscoverItem>>;

/// Client for the GocTruyenTranh catalog.
///
/// Cloning is cheap and clones share the rate limiter and cookie store.
#[derive(Clone)]
pub struct CatalogClient {
    config: Arc<ProviderConfig>,
    fetcher: Fetcher,
    cookies: Arc<dyn CookieStore>,
}

impl CatalogClient {
    /// Creates a client with the default configuration, a reqwest transport
    /// and an in-memory cookie store.
    pub fn new() -> Result<Self> {
        Self::with_config(ProviderConfig::default())
    }

    /// Creates a client for `config` with the production transport.
    ///
    /// # Errors
    ///
    /// * [`Error::Config`] - The configuration is invalid
    /// * [`Error::Network`] - The HTTP client could not be built
    pub fn with_config(config: ProviderConfig) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Self::with_parts(config, transport, Arc::new(MemoryCookieStore::new()))
    }

    /// Creates a client from explicit collaborators.
    ///
    /// This is the seam for tests and for hosts that bring their own
    /// transport or persist cookies elsewhere.
    pub fn with_parts(
        config: ProviderConfig,
        transport: Arc<dyn Transport>,
        cookies: Arc<dyn CookieStore>,
    ) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::from_config(&config, transport, Arc::clone(&cookies));
        Ok(Self {
            config: Arc::new(config),
            fetcher,
            cookies,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn cookie_store(&self) -> &Arc<dyn CookieStore> {
        &self.cookies
    }

    /// The fixed discover feeds, in display order.
    pub fn list_discover_sections(&self) -> Vec<DiscoverSection> {
        DiscoverSectionId::ALL
            .iter()
            .copied()
            .map(DiscoverSection::from)
            .collect()
    }

    fn section_route(section: DiscoverSectionId) -> (&'static str, SectionParser) {
        match section {
            DiscoverSectionId::Hot => (
                endpoints::SEARCH_VIEW,
                parser::parse_hot_section as SectionParser,
            ),
            DiscoverSectionId::NewAdded => (
                endpoints::SEARCH_NEW,
                parser::parse_new_section as SectionParser,
            ),
            DiscoverSectionId::NewUpdated => (
                endpoints::SEARCH_RECENT,
                parser::parse_updated_section as SectionParser,
            ),
        }
    }

    /// Fetches one page of a discover feed.
    ///
    /// A `None` cursor starts at the first page. The returned cursor points at
    /// the next page, or is `None` once the feed runs dry.
    pub async fn get_discover_section_page(
        &self,
        section: DiscoverSectionId,
        cursor: Option<PageCursor>,
    ) -> Result<PagedResults<DiscoverItem>> {
        let cursor = cursor.unwrap_or_default();
        let (path, parse) = Self::section_route(section);
        let url = build_url(
            &self.config.endpoint(path),
            [("p", cursor.page.to_string())],
        );

        let body: Value = self.fetcher.fetch_json(HttpRequest::get(url)).await?;
        let items = parse(&body, &self.config.base_url)?;
        debug!(
            section = %section,
            page = cursor.page,
            items = items.len(),
            "fetched discover page"
        );

        Ok(PagedResults::paged(items, cursor))
    }

    /// Fetches and parses the title's web page.
    ///
    /// # Errors
    ///
    /// * [`Error::NotFound`] - The provider has no page for the slug, reported
    ///   as [`Resource::Title`]
    pub async fn get_title_details(&self, id: &TitleId) -> Result<TitleDetails> {
        let url = format!(
            "{}/{}",
            self.config.endpoint(endpoints::TITLE_PAGE),
            urlencoding::encode(id.slug())
        );
        let document = self
            .fetcher
            .fetch_html(&url)
            .await
            .map_err(|e| e.for_resource(Resource::Title))?;
        parser::parse_title_details(&document, id, &self.config.base_url)
    }

    /// Fetches every chapter of a title in the provider's order.
    pub async fn get_chapter_list(&self, id: &TitleId) -> Result<Vec<Chapter>> {
        let url = build_url(
            &format!(
                "{}/{}/chapter",
                self.config.endpoint(endpoints::COMIC),
                urlencoding::encode(id.remote_id())
            ),
            [("offset", "0"), ("limit", "-1")],
        );

        let body: Value = self
            .fetcher
            .fetch_json(HttpRequest::get(url))
            .await
            .map_err(|e| e.for_resource(Resource::Chapter))?;
        let chapters = parser::parse_chapter_list(&body, id)?;
        debug!(title = %id, chapters = chapters.len(), "fetched chapter list");
        Ok(chapters)
    }

    /// Fetches the page image URLs of a chapter.
    ///
    /// This is the only authenticated call; it carries the configured bearer
    /// token.
    ///
    /// # Errors
    ///
    /// * [`Error::Parse`] - The response has no image list
    /// * [`Error::NotFound`] - The provider answered 404, reported as
    ///   [`Resource::Chapter`]
    pub async fn get_chapter_pages(
        &self,
        title_id: &TitleId,
        chapter_id: &ChapterId,
    ) -> Result<ChapterDetails> {
        let form = form_urlencoded::Serializer::new(String::new())
            .append_pair("comicId", title_id.remote_id())
            .append_pair("chapterNumber", chapter_id.number_str())
            .finish();

        let request = HttpRequest::post(self.config.endpoint(endpoints::CHAPTER), form)
            .with_header("authorization", &self.config.bearer())
            .with_header("content-type", "application/x-www-form-urlencoded");

        let body: Value = self
            .fetcher
            .fetch_json(request)
            .await
            .map_err(|e| e.for_resource(Resource::Chapter))?;
        let pages = parser::parse_chapter_pages(&body, &self.config.base_url)?;
        debug!(
            title = %title_id,
            chapter = %chapter_id,
            pages = pages.len(),
            "fetched chapter pages"
        );

        Ok(ChapterDetails {
            chapter_id: chapter_id.clone(),
            title_id: title_id.clone(),
            pages,
        })
    }

    /// Searches the catalog.
    ///
    /// A [`SearchQuery::Title`] lookup returns everything at once and never
    /// yields a cursor; `cursor` is ignored. A [`SearchQuery::Category`]
    /// browse is paginated like the discover feeds.
    pub async fn search(
        &self,
        query: impl Into<SearchQuery>,
        cursor: Option<PageCursor>,
    ) -> Result<PagedResults<TitleSummary>> {
        match query.into() {
            SearchQuery::Title(name) => {
                let url = build_url(
                    &self.config.endpoint(endpoints::SEARCH),
                    [("name", name.as_str())],
                );
                let body: Value = self.fetcher.fetch_json(HttpRequest::get(url)).await?;
                let items = parser::parse_search_results(&body, &self.config.base_url)?;
                debug!(query = %name, items = items.len(), "text search");
                Ok(PagedResults::single(items))
            }
            SearchQuery::Category(category) => {
                let cursor = cursor.unwrap_or_default();
                let url = build_url(
                    &self.config.endpoint(endpoints::SEARCH_CATEGORY),
                    [
                        ("p", cursor.page.to_string()),
                        ("value", category.clone()),
                    ],
                );
                let body: Value = self.fetcher.fetch_json(HttpRequest::get(url)).await?;
                let items = parser::parse_search_results(&body, &self.config.base_url)?;
                debug!(%category, page = cursor.page, items = items.len(), "category browse");
                Ok(PagedResults::paged(items, cursor))
            }
        }
    }

    /// Lists the provider's categories as a single tag group.
    pub async fn list_categories(&self) -> Result<Vec<TagGroup>> {
        let body: Value = self
            .fetcher
            .fetch_json(HttpRequest::get(self.config.endpoint(endpoints::CATEGORY)))
            .await?;
        parser::parse_categories(&body)
    }

    /// Stores cookies obtained by clearing a challenge in a browser.
    ///
    /// Only Cloudflare cookies are kept. Returns how many were stored.
    pub fn save_challenge_cookies(&self, cookies: impl IntoIterator<Item = Cookie>) -> usize {
        self.fetcher.augmenter().save_cookies(cookies)
    }

    /// Downloads a page image.
    ///
    /// Image requests are exempt from the rate limit when
    /// [`RateLimitConfig::ignore_images`](crate::config::RateLimitConfig::ignore_images)
    /// is set.
    pub async fn fetch_page_image(&self, url: &str) -> Result<Bytes> {
        if url.trim().is_empty() {
            return Err(Error::parse("Empty page image URL"));
        }
        self.fetcher.fetch_bytes(HttpRequest::image(url)).await
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}
