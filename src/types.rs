//! Core data types for titles, chapters, tags and discover sections.
//!
//! This module defines the domain model every provider response is normalized into:
//!
//! - [`TitleId`] / [`ChapterId`] - Stable identifiers in the provider's wire format
//! - [`TitleSummary`] - A search or discover entry
//! - [`TitleDetails`] - Full metadata for one title
//! - [`Chapter`] / [`ChapterDetails`] - Chapter listing entries and their pages
//! - [`TagGroup`] / [`Tag`] - Namespaced genres and categories
//! - [`DiscoverSection`] / [`DiscoverItem`] - The fixed browsing feeds
//! - [`PageCursor`] / [`PagedResults`] - Pagination state
//!
//! # Examples
//!
//! ```rust
//! use goctruyen::types::{ChapterId, TitleId};
//!
//! let id: TitleId = "Doraemon::123".parse().unwrap();
//! assert_eq!(id.slug(), "Doraemon");
//! assert_eq!(id.remote_id(), "123");
//! assert_eq!(id.to_string(), "Doraemon::123");
//!
//! let chapter = ChapterId::from_number(10.5);
//! assert_eq!(chapter.to_string(), "chuong-10.5");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Separator between the two halves of a composite title id.
pub const TITLE_ID_SEPARATOR: &str = "::";

/// Prefix of every chapter id.
pub const CHAPTER_ID_PREFIX: &str = "chuong-";

/// Language tag attached to every chapter of this provider.
pub const CHAPTER_LANGUAGE: &str = "🇻🇳";

/// Composite identifier of a title: `{nameEn}::{remoteId}`.
///
/// `nameEn` is the slug of the title's web page and `remoteId` is the numeric
/// id used by the JSON API. Both are needed, so both travel together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TitleId {
    name_en: String,
    remote_id: String,
}

impl TitleId {
    pub fn new(name_en: impl Into<String>, remote_id: impl Into<String>) -> Self {
        Self {
            name_en: name_en.into(),
            remote_id: remote_id.into(),
        }
    }

    /// The page slug, the portion before `::`.
    pub fn slug(&self) -> &str {
        &self.name_en
    }

    /// The API id, the portion after `::`.
    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    /// The id with its slug percent-encoded, safe to embed in a URL.
    ///
    /// ```rust
    /// use goctruyen::types::TitleId;
    ///
    /// let id = TitleId::new("Đảo hải tặc", "42");
    /// let encoded = id.encoded();
    /// assert!(!encoded.contains(' '));
    /// assert_eq!(TitleId::from_encoded(&encoded).unwrap(), id);
    /// ```
    pub fn encoded(&self) -> String {
        format!(
            "{}{}{}",
            urlencoding::encode(&self.name_en),
            TITLE_ID_SEPARATOR,
            self.remote_id
        )
    }

    /// Parses an id produced by [`TitleId::encoded`].
    pub fn from_encoded(encoded: &str) -> Result<Self> {
        let id: TitleId = encoded.parse()?;
        let name_en = urlencoding::decode(&id.name_en)
            .map_err(|e| Error::parse(format!("Invalid title slug encoding: {}", e)))?
            .into_owned();
        Ok(Self {
            name_en,
            remote_id: id.remote_id,
        })
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name_en, TITLE_ID_SEPARATOR, self.remote_id)
    }
}

impl FromStr for TitleId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(TITLE_ID_SEPARATOR) {
            Some((name_en, remote_id)) if !name_en.is_empty() && !remote_id.is_empty() => {
                Ok(Self::new(name_en, remote_id))
            }
            _ => Err(Error::parse(format!(
                "Malformed title id '{}', expected 'nameEn::id'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for TitleId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TitleId> for String {
    fn from(id: TitleId) -> Self {
        id.to_string()
    }
}

/// Chapter identifier, always `chuong-{number}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChapterId(String);

impl ChapterId {
    /// Derives the id from a chapter number. Whole numbers print without a
    /// fractional part, so chapter `10.0` becomes `chuong-10`.
    pub fn from_number(number: f64) -> Self {
        Self(number.to_string())
    }

    /// Builds an id from the provider's raw number text.
    pub fn from_raw(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// The number part, exactly as sent in the `chapterNumber` form field.
    pub fn number_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CHAPTER_ID_PREFIX, self.0)
    }
}

impl FromStr for ChapterId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.strip_prefix(CHAPTER_ID_PREFIX) {
            Some(number) if !number.is_empty() => Ok(Self(number.to_string())),
            _ => Err(Error::parse(format!(
                "Malformed chapter id '{}', expected 'chuong-<number>'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for ChapterId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ChapterId> for String {
    fn from(id: ChapterId) -> Self {
        id.to_string()
    }
}

/// A title as listed by search and discover feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleSummary {
    pub id: TitleId,

    /// Display title, HTML entities decoded
    pub title: String,

    /// Latest chapter label, empty when the provider sent none
    pub subtitle: String,

    /// Absolute cover image URL
    pub image_url: String,
}

/// Audience rating of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentRating {
    #[default]
    Everyone,
    Mature,
    Adult,
}

/// A single namespaced tag. The id carries a `genres:` or `category:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub title: String,
}

/// A titled group of tags with unique ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagGroup {
    pub id: String,
    pub title: String,
    pub tags: Vec<Tag>,
}

/// Full metadata for one title.
///
/// # Fields
///
/// * `rating` - `None` when the page shows no parsable score
/// * `tag_groups` - A single `genres` group for this provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleDetails {
    pub id: TitleId,
    pub primary_title: String,
    #[serde(default)]
    pub secondary_titles: Vec<String>,
    pub thumbnail_url: String,
    pub synopsis: String,
    pub author: String,
    pub artist: String,
    pub status: String,
    pub rating: Option<f32>,
    pub content_rating: ContentRating,
    #[serde(default)]
    pub tag_groups: Vec<TagGroup>,
}

impl TitleDetails {
    /// Rating with missing scores treated as zero.
    pub fn rating_or_zero(&self) -> f32 {
        self.rating.unwrap_or(0.0)
    }
}

/// One entry of a title's chapter list.
///
/// The chapter number can be decimal to support special chapters like "Chương 10.5".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,

    /// Title this chapter belongs to
    pub title_id: TitleId,

    pub number: f64,

    pub title: String,

    /// Always [`CHAPTER_LANGUAGE`]
    pub language: String,

    /// `None` when the provider's time string could not be interpreted
    pub publish_date: Option<DateTime<Utc>>,

    /// View count label, e.g. `1200 lượt xem`
    pub view_metadata: String,
}

/// Page image URLs of one chapter, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterDetails {
    pub chapter_id: ChapterId,
    pub title_id: TitleId,
    pub pages: Vec<String>,
}

/// The fixed discover feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverSectionId {
    Hot,
    NewAdded,
    NewUpdated,
}

impl DiscoverSectionId {
    pub const ALL: [DiscoverSectionId; 3] = [
        DiscoverSectionId::Hot,
        DiscoverSectionId::NewAdded,
        DiscoverSectionId::NewUpdated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoverSectionId::Hot => "hot",
            DiscoverSectionId::NewAdded => "new_added",
            DiscoverSectionId::NewUpdated => "new_updated",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DiscoverSectionId::Hot => "TRUYỆN HOT NHẤT",
            DiscoverSectionId::NewAdded => "TRUYỆN MỚI",
            DiscoverSectionId::NewUpdated => "TRUYỆN CẬP NHẬT GẦN ĐÂY",
        }
    }

    pub fn section_type(&self) -> DiscoverSectionType {
        match self {
            DiscoverSectionId::Hot => DiscoverSectionType::ProminentCarousel,
            DiscoverSectionId::NewAdded => DiscoverSectionType::SimpleCarousel,
            DiscoverSectionId::NewUpdated => DiscoverSectionType::ChapterUpdates,
        }
    }
}

impl fmt::Display for DiscoverSectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscoverSectionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| Error::not_found(format!("Discover section: {}", s)))
    }
}

/// How a discover section presents its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverSectionType {
    ProminentCarousel,
    SimpleCarousel,
    ChapterUpdates,
}

/// Descriptor of one discover feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverSection {
    pub id: DiscoverSectionId,
    pub title: String,
    pub section_type: DiscoverSectionType,
}

impl From<DiscoverSectionId> for DiscoverSection {
    fn from(id: DiscoverSectionId) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            section_type: id.section_type(),
        }
    }
}

/// Shape tag of a discover entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscoverItemKind {
    ProminentCarousel,
    SimpleCarousel,
    /// Points at the latest chapter of the title
    ChapterUpdate { chapter_id: ChapterId },
}

/// A discover feed entry: a summary plus its shape tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverItem {
    pub summary: TitleSummary,
    pub kind: DiscoverItemKind,
}

/// Opaque pagination position. Starts at page 0 and only moves forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct PageCursor {
    pub page: u32,
}

impl PageCursor {
    pub fn new(page: u32) -> Self {
        Self { page }
    }

    /// The cursor for the page after this one.
    pub fn next(self) -> Self {
        Self {
            page: self.page.saturating_add(1),
        }
    }
}

/// One page of results and the cursor for the following page.
///
/// `cursor` is `None` when there is nothing more to fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResults<T> {
    pub items: Vec<T>,
    pub cursor: Option<PageCursor>,
}

impl<T> PagedResults<T> {
    /// Results that cannot be continued.
    pub fn single(items: Vec<T>) -> Self {
        Self {
            items,
            cursor: None,
        }
    }

    /// Results fetched at `current`. The cursor advances by one unless the
    /// page came back empty.
    pub fn paged(items: Vec<T>, current: PageCursor) -> Self {
        let cursor = if items.is_empty() {
            None
        } else {
            Some(current.next())
        };
        Self { items, cursor }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
