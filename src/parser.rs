//! Mapping of provider responses into domain types.
//!
//! One function per response shape. All of them are pure: they take a decoded
//! body plus the base origin needed to absolutize image paths, and either
//! return domain values or a [`Error::Parse`](crate::Error::Parse).
//!
//! Shared rules:
//!
//! - free-text fields have their HTML entities decoded
//! - image paths without `https` are prefixed with the base origin
//! - summaries are de-duplicated by [`TitleId`], first occurrence wins

use rayon::prelude::*;
use scraper::{Html, Selector};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{Error, Result};
use crate::net::{html, json};
use crate::types::{
    CHAPTER_LANGUAGE, Chapter, ChapterId, ContentRating, DiscoverItem, DiscoverItemKind,
    TITLE_ID_SEPARATOR, Tag, TagGroup, TitleDetails, TitleId, TitleSummary,
};
use crate::util::{FieldType, ValidationRule, parse_time, resolve_image_url, validate_response};

const AUTHOR_LABEL: &str = "Tác giả:";
const STATUS_LABEL: &str = "Trạng thái:";
const GENRE_GROUP_TITLE: &str = "genres";
const CATEGORY_GROUP_TITLE: &str = "Thể loại";

/// Title record shared by search and discover responses.
#[derive(Debug, Deserialize)]
struct WireTitle {
    #[serde(deserialize_with = "lenient_string")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "nameEn")]
    name_en: String,
    #[serde(default)]
    photo: Option<String>,
    #[serde(rename = "chapterLatest", default, deserialize_with = "lenient_strings")]
    chapter_latest: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireChapter {
    #[serde(rename = "numberChapter", deserialize_with = "lenient_string")]
    number_chapter: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "viewCount", default, deserialize_with = "lenient_string")]
    view_count: String,
    #[serde(rename = "stringUpdateTime", default)]
    string_update_time: String,
}

#[derive(Debug, Deserialize)]
struct WireCategory {
    #[serde(deserialize_with = "lenient_string")]
    id: String,
    name: String,
}

/// Accepts a JSON string or number and yields its text.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

fn lenient_strings<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|value| match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

/// Parses the title detail page.
///
/// # Errors
///
/// * [`Error::NotFound`] - The page has no title heading, which the provider
///   serves for unknown slugs
pub fn parse_title_details(
    document: &Html,
    id: &TitleId,
    base_url: &str,
) -> Result<TitleDetails> {
    let primary_title = html::select_text(document, ".v-card-title")
        .map(|title| html::decode_entities(&title))
        .filter(|title| !title.is_empty())
        .ok_or_else(|| Error::title_not_found(format!("Title {}", id)))?;

    let mut author = String::new();
    let mut status = String::new();
    if let Ok(selector) = Selector::parse(".information-section > div") {
        for row in document.select(&selector) {
            let text = row.text().collect::<String>();
            let label = text.trim().split('\n').next().unwrap_or_default().trim();
            let value = text.split('\n').nth(1).map(str::trim).unwrap_or_default();
            match label {
                AUTHOR_LABEL => author = value.to_string(),
                STATUS_LABEL => status = value.to_string(),
                _ => {}
            }
        }
    }

    let thumbnail_url = resolve_image_url(
        base_url,
        html::select_attr(document, ".v-image > img", "src").as_deref(),
    );
    let synopsis = html::select_text(
        document,
        ".v-card-text.pt-1.px-4.pb-4.text-secondary.font-weight-medium",
    )
    .map(|text| html::decode_entities(&text))
    .unwrap_or_default();
    let rating = html::select_text(document, ".pr-3 > b").and_then(|text| parse_rating(&text));

    let genres = TagGroup {
        id: "0".to_string(),
        title: GENRE_GROUP_TITLE.to_string(),
        tags: parse_genre_tags(document),
    };

    Ok(TitleDetails {
        id: id.clone(),
        primary_title,
        secondary_titles: Vec::new(),
        thumbnail_url,
        synopsis,
        artist: author.clone(),
        author,
        status,
        rating,
        content_rating: ContentRating::Everyone,
        tag_groups: vec![genres],
    })
}

/// Reads the leading decimal of a score like `4.5` or `4.5/5`.
fn parse_rating(text: &str) -> Option<f32> {
    let number: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    number.parse::<f32>().ok().filter(|rating| rating.is_finite())
}

fn parse_genre_tags(document: &Html) -> Vec<Tag> {
    let (Ok(links), Ok(label)) = (
        Selector::parse(".group-content a"),
        Selector::parse("span:nth-child(2)"),
    ) else {
        return Vec::new();
    };

    let tags = document.select(&links).map(|link| {
        let title = link
            .select(&label)
            .next()
            .map(|span| span.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        let key = link
            .value()
            .attr("href")
            .and_then(|href| href.trim().split('=').nth(1))
            .map(String::from)
            .unwrap_or_else(|| title.clone());
        Tag {
            id: format!("genres:{}", key),
            title,
        }
    });
    dedupe_tags(tags)
}

fn dedupe_tags(tags: impl IntoIterator<Item = Tag>) -> Vec<Tag> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter(|tag| seen.insert(tag.id.clone()))
        .collect()
}

/// Parses the chapter list of `title_id`.
///
/// Chapters keep the provider's order. Numbers may be fractional; the id is
/// derived from the parsed number.
pub fn parse_chapter_list(value: &Value, title_id: &TitleId) -> Result<Vec<Chapter>> {
    validate_response(
        value,
        &[
            ValidationRule::required("result", FieldType::Object),
            ValidationRule::required("result.chapters", FieldType::Array),
        ],
    )
    .into_result("chapter list")?;

    let chapters: Vec<WireChapter> = json::extract_as(value, "result.chapters")?;
    chapters
        .into_iter()
        .map(|chapter| {
            let number: f64 = chapter.number_chapter.trim().parse().map_err(|_| {
                Error::parse(format!(
                    "Invalid chapter number '{}' for {}",
                    chapter.number_chapter, title_id
                ))
            })?;
            let name = chapter
                .name
                .map(|name| html::decode_entities(name.trim()))
                .filter(|name| !name.is_empty() && name != "N/A");
            let title = match name {
                Some(name) => format!("Chương {}", name),
                None => format!("Chương {}", number),
            };

            Ok(Chapter {
                id: ChapterId::from_number(number),
                title_id: title_id.clone(),
                number,
                title,
                language: CHAPTER_LANGUAGE.to_string(),
                publish_date: parse_time(&chapter.string_update_time),
                view_metadata: format!("{} lượt xem", chapter.view_count),
            })
        })
        .collect()
}

/// Parses the page image list of a chapter.
///
/// # Errors
///
/// * [`Error::Parse`] - `result.data` is missing or not a list of strings
pub fn parse_chapter_pages(value: &Value, base_url: &str) -> Result<Vec<String>> {
    validate_response(
        value,
        &[
            ValidationRule::required("result", FieldType::Object),
            ValidationRule::required("result.data", FieldType::Array),
        ],
    )
    .into_result("chapter pages")?;

    let images: Vec<String> = json::extract_as(value, "result.data")?;
    Ok(images
        .iter()
        .map(|image| resolve_image_url(base_url, Some(image)))
        .collect())
}

/// Parses a search or browse response into de-duplicated summaries.
///
/// `result` may be either `{ "data": [...] }` or the list itself; a missing
/// `data` list means no results.
pub fn parse_search_results(value: &Value, base_url: &str) -> Result<Vec<TitleSummary>> {
    let records = match value.get("result") {
        Some(Value::Array(records)) => records.as_slice(),
        Some(Value::Object(_)) => json::extract_array(value, "result.data"),
        _ => return Err(Error::parse("Search response has no result")),
    };

    let unique: Vec<TitleSummary> = summarize_all(records, base_url)?
        .into_iter()
        .map(|(summary, _)| summary)
        .collect();
    debug!(records = records.len(), unique = unique.len(), "parsed title summaries");
    Ok(unique)
}

/// Maps records in order, drops those without a usable id, then
/// de-duplicates.
fn summarize_all(
    records: &[Value],
    base_url: &str,
) -> Result<Vec<(TitleSummary, Option<String>)>> {
    let summaries = records
        .par_iter()
        .map(|record| summarize(record, base_url))
        .collect::<Result<Vec<_>>>()?;
    Ok(dedupe_summaries(summaries.into_iter().flatten().collect()))
}

fn summarize(
    record: &Value,
    base_url: &str,
) -> Result<Option<(TitleSummary, Option<String>)>> {
    let title = WireTitle::deserialize(record)
        .map_err(|e| Error::parse(format!("Invalid title record: {}", e)))?;
    let slug = title.name_en.trim();
    let remote_id = title.id.trim();
    if slug.is_empty() || remote_id.is_empty() || slug.contains(TITLE_ID_SEPARATOR) {
        debug!(slug, remote_id, "skipping title record without a usable id");
        return Ok(None);
    }
    let latest = title
        .chapter_latest
        .iter()
        .map(|chapter| chapter.trim())
        .find(|chapter| !chapter.is_empty())
        .map(String::from);

    let summary = TitleSummary {
        id: TitleId::new(slug, remote_id),
        title: html::decode_entities(&title.name),
        subtitle: latest
            .as_ref()
            .map(|chapter| format!("Chapter {}", chapter))
            .unwrap_or_default(),
        image_url: resolve_image_url(base_url, title.photo.as_deref()),
    };
    Ok(Some((summary, latest)))
}

fn dedupe_summaries(
    summaries: Vec<(TitleSummary, Option<String>)>,
) -> Vec<(TitleSummary, Option<String>)> {
    let mut seen = HashSet::new();
    summaries
        .into_iter()
        .filter(|(summary, _)| seen.insert(summary.id.clone()))
        .collect()
}

fn parse_section(
    value: &Value,
    base_url: &str,
    kind: impl Fn(Option<String>) -> DiscoverItemKind,
) -> Result<Vec<DiscoverItem>> {
    let records = match value.get("result") {
        Some(Value::Array(records)) => records.as_slice(),
        Some(Value::Object(_)) => json::extract_array(value, "result.data"),
        _ => return Err(Error::parse("Discover response has no result")),
    };

    Ok(summarize_all(records, base_url)?
        .into_iter()
        .map(|(summary, latest)| DiscoverItem {
            summary,
            kind: kind(latest),
        })
        .collect())
}

/// Parses the `hot` feed into prominent carousel items.
pub fn parse_hot_section(value: &Value, base_url: &str) -> Result<Vec<DiscoverItem>> {
    parse_section(value, base_url, |_| DiscoverItemKind::ProminentCarousel)
}

/// Parses the `new_added` feed into simple carousel items.
pub fn parse_new_section(value: &Value, base_url: &str) -> Result<Vec<DiscoverItem>> {
    parse_section(value, base_url, |_| DiscoverItemKind::SimpleCarousel)
}

/// Parses the `new_updated` feed into chapter update items pointing at each
/// title's latest chapter. Titles without a latest chapter fall back to simple
/// carousel items.
pub fn parse_updated_section(value: &Value, base_url: &str) -> Result<Vec<DiscoverItem>> {
    parse_section(value, base_url, |latest| match latest {
        Some(number) => DiscoverItemKind::ChapterUpdate {
            chapter_id: ChapterId::from_raw(number),
        },
        None => DiscoverItemKind::SimpleCarousel,
    })
}

/// Parses the category list into a single `Thể loại` tag group.
pub fn parse_categories(value: &Value) -> Result<Vec<TagGroup>> {
    validate_response(value, &[ValidationRule::required("result", FieldType::Array)])
        .into_result("category")?;

    let categories: Vec<WireCategory> = json::extract_as(value, "result")?;
    let tags = categories.into_iter().map(|category| Tag {
        id: format!("category:{}", category.id),
        title: html::decode_entities(category.name.trim()),
    });

    Ok(vec![TagGroup {
        id: "0".to_string(),
        title: CATEGORY_GROUP_TITLE.to_string(),
        tags: dedupe_tags(tags),
    }])
}
