//! HTML parsing utilities.
//!
//! Thin helpers over the `scraper` crate for CSS selector-based extraction,
//! plus entity decoding (via `html-escape`) for free text that arrives inside
//! JSON.
//!
//! # Examples
//!
//! ```rust
//! use goctruyen::net::html;
//!
//! let document = html::parse(r#"
//!     <div class="v-card-title">Doraemon</div>
//!     <div class="v-image"><img src="/image/doraemon.jpg"></div>
//! "#);
//! assert_eq!(html::select_text(&document, ".v-card-title"), Some("Doraemon".to_string()));
//! assert_eq!(
//!     html::select_attr(&document, ".v-image > img", "src"),
//!     Some("/image/doraemon.jpg".to_string())
//! );
//! ```

use scraper::{Html, Selector};

/// Parses an HTML document from a string.
pub fn parse(html: &str) -> Html {
    Html::parse_document(html)
}

/// Extracts trimmed text content from the first element matching a CSS selector.
///
/// Returns `None` if no element matches or the selector is invalid.
pub fn select_text(html: &Html, selector: &str) -> Option<String> {
    Selector::parse(selector).ok().and_then(|sel| {
        html.select(&sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    })
}

/// Extracts an attribute value from the first element matching a CSS selector.
///
/// Returns `None` if no element matches, the selector is invalid, or the
/// attribute doesn't exist.
pub fn select_attr(html: &Html, selector: &str, attr: &str) -> Option<String> {
    Selector::parse(selector).ok().and_then(|sel| {
        html.select(&sel)
            .next()
            .and_then(|el| el.value().attr(attr).map(String::from))
    })
}

/// Decodes HTML entities in a text fragment.
///
/// Only entities are touched; anything that looks like markup is kept as
/// text.
///
/// ```rust
/// use goctruyen::net::html::decode_entities;
///
/// assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
/// assert_eq!(
///     decode_entities("Thám tử lừng danh &#39;Conan&#39;"),
///     "Thám tử lừng danh 'Conan'"
/// );
/// assert_eq!(decode_entities("Tom &amp; <Jerry> show"), "Tom & <Jerry> show");
/// ```
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
