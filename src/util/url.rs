//! URL helpers.

use url::{Url, form_urlencoded};

/// Appends query parameters to `base` in iteration order.
///
/// Values are form-encoded, so spaces become `+` and reserved characters are
/// percent-escaped. An empty parameter list returns `base` untouched.
///
/// # Examples
///
/// ```rust
/// use goctruyen::util::build_url;
///
/// let url = build_url("https://example.com/api/comic/search", [("name", "one piece")]);
/// assert_eq!(url, "https://example.com/api/comic/search?name=one+piece");
///
/// let unchanged = build_url("https://example.com", Vec::<(&str, &str)>::new());
/// assert_eq!(unchanged, "https://example.com");
/// ```
pub fn build_url<I, K, V>(base: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let params: Vec<(K, V)> = params.into_iter().collect();
    if params.is_empty() {
        return base.to_string();
    }

    match Url::parse(base) {
        Ok(mut url) => {
            {
                let mut query = url.query_pairs_mut();
                for (key, value) in &params {
                    query.append_pair(key.as_ref(), value.as_ref());
                }
            }
            url.into()
        }
        // Relative bases still get a well-formed query string
        Err(_) => {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
                .finish();
            let separator = if base.contains('?') { '&' } else { '?' };
            format!("{}{}{}", base, separator, query)
        }
    }
}

/// Resolves a provider image path against `base_url`.
///
/// Anything that does not contain `https` is treated as relative and gets the
/// base origin prepended. Missing or empty input yields an empty string.
///
/// ```rust
/// use goctruyen::util::resolve_image_url;
///
/// let base = "https://goctruyentranhvui7.com";
/// assert_eq!(
///     resolve_image_url(base, Some("/image/a.jpg")),
///     "https://goctruyentranhvui7.com/image/a.jpg"
/// );
/// assert_eq!(
///     resolve_image_url(base, Some("https://cdn.example/a.jpg")),
///     "https://cdn.example/a.jpg"
/// );
/// assert_eq!(resolve_image_url(base, None), "");
/// ```
pub fn resolve_image_url(base_url: &str, url: Option<&str>) -> String {
    match url.map(str::trim) {
        None | Some("") => String::new(),
        Some(url) if url.contains("https") => url.to_string(),
        Some(url) => format!("{}{}", base_url, url),
    }
}
