//! Search queries and result post-processing.
//!
//! The provider offers two search modes that never overlap: a free-text
//! lookup by title, which returns everything in one response, and a category
//! browse, which is paginated. [`SearchQuery`] makes the choice explicit.
//!
//! # Examples
//!
//! ```rust,no_run
//! use goctruyen::prelude::*;
//!
//! # async fn example() -> goctruyen::Result<()> {
//! let client = CatalogClient::new()?;
//!
//! // Free-text search, never paginated
//! let query = "doraemon";
//! let results = client
//!     .search(query, None)
//!     .await?
//!     .items
//!     .dedupe_by_id()
//!     .sort_by_query_relevance(query);
//!
//! // Category browse, first page
//! let page = client.search(SearchQuery::category("category:5"), None).await?;
//! assert!(page.cursor.is_some() || page.items.is_empty());
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;

use crate::types::{Tag, TitleSummary};

const CATEGORY_PREFIX: &str = "category:";

/// What to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Free-text lookup by title name.
    Title(String),
    /// Browse a single category by its provider id, without the `category:`
    /// namespace.
    Category(String),
}

impl SearchQuery {
    /// Free-text lookup.
    pub fn title(query: impl Into<String>) -> Self {
        Self::Title(query.into())
    }

    /// Category browse. Accepts either a bare provider id or a namespaced tag
    /// id such as `category:5`.
    pub fn category(id: impl AsRef<str>) -> Self {
        let id = id.as_ref().trim();
        Self::Category(id.strip_prefix(CATEGORY_PREFIX).unwrap_or(id).to_string())
    }

    /// Whether results for this query come in pages.
    pub fn is_paginated(&self) -> bool {
        matches!(self, Self::Category(_))
    }
}

impl From<&str> for SearchQuery {
    fn from(query: &str) -> Self {
        Self::title(query)
    }
}

impl From<String> for SearchQuery {
    fn from(query: String) -> Self {
        Self::Title(query)
    }
}

impl From<&Tag> for SearchQuery {
    fn from(tag: &Tag) -> Self {
        Self::category(&tag.id)
    }
}

/// Extension trait for processing search results.
///
/// Implemented for `Vec<TitleSummary>` so calls chain directly on the
/// `items` of a page.
pub trait SearchResultExt {
    /// Keeps the first occurrence of each title id.
    ///
    /// Responses are already de-duplicated per page; this is for callers
    /// that concatenate several pages.
    fn dedupe_by_id(self) -> Self;

    /// Sorts results by how well their title matches `query`.
    ///
    /// Exact matches rank first, then titles containing the query, then
    /// partial word overlap. Ties prefer shorter titles and otherwise keep
    /// the provider's order.
    fn sort_by_query_relevance(self, query: &str) -> Self;
}

impl SearchResultExt for Vec<TitleSummary> {
    fn dedupe_by_id(mut self) -> Self {
        let mut seen = HashSet::new();
        self.retain(|summary| seen.insert(summary.id.clone()));
        self
    }

    fn sort_by_query_relevance(mut self, query: &str) -> Self {
        let query_lower = query.trim().to_lowercase();
        self.sort_by(|a, b| {
            let score_a = query_relevance_score(a, &query_lower);
            let score_b = query_relevance_score(b, &query_lower);

            score_b
                .cmp(&score_a)
                .then_with(|| a.title.chars().count().cmp(&b.title.chars().count()))
        });
        self
    }
}

fn query_relevance_score(summary: &TitleSummary, query: &str) -> u32 {
    if query.is_empty() {
        return 0;
    }

    let title_lower = summary.title.to_lowercase();
    let slug_lower = summary.id.slug().to_lowercase();

    let mut score = if title_lower == query || slug_lower == query {
        100
    } else if title_lower.contains(query) || slug_lower.contains(query) {
        50
    } else {
        let query_words: Vec<&str> = query.split_whitespace().collect();
        let title_words: Vec<&str> = title_lower.split_whitespace().collect();

        let matches = query_words
            .iter()
            .filter(|query_word| {
                title_words.iter().any(|title_word| {
                    title_word.contains(*query_word) || query_word.contains(title_word)
                })
            })
            .count() as u32;

        if query_words.is_empty() {
            0
        } else {
            (matches * 25) / query_words.len() as u32
        }
    };

    // Titles with a known latest chapter are live entries
    if !summary.subtitle.is_empty() {
        score += 2;
    }

    score
}
