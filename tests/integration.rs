//! End-to-end tests of `CatalogClient` over a recording fake transport
//!
//! Every test drives the full pipeline: rate limiter, request augmentation,
//! challenge classification, decoding and parsing.

use async_trait::async_trait;
use goctruyen::net::retry::with_retries;
use goctruyen::net::{HttpRequest, HttpResponse, Transport};
use goctruyen::prelude::*;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, ORIGIN, REFERER, USER_AGENT};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

mod common;
use common::{
    RecordingTransport, TEST_BASE_URL, TITLE_PAGE_FIXTURE, categories_fixture,
    chapter_list_fixture, chapter_pages_fixture, client_with, search_fixture, test_config,
};

fn header<'a>(request: &'a HttpRequest, name: reqwest::header::HeaderName) -> Option<&'a str> {
    request.headers.get(name).and_then(|value| value.to_str().ok())
}

/// Fails the first `failures` calls with a network error, then answers `{}`-like bodies.
struct FlakyTransport {
    failures: usize,
    calls: AtomicUsize,
    body: String,
}

#[async_trait]
impl Transport for FlakyTransport {
    async fn execute(&self, _request: HttpRequest) -> goctruyen::Result<HttpResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(Error::network(std::io::Error::other("connection reset by peer")));
        }
        Ok(HttpResponse::new(200, self.body.clone()))
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_title_details_uses_slug_path() {
        let transport =
            Arc::new(RecordingTransport::new().route_html("/truyen/Doraemon", TITLE_PAGE_FIXTURE));
        let (client, _) = client_with(transport.clone());

        let id: TitleId = "Doraemon::123".parse().unwrap();
        let details = client.get_title_details(&id).await.unwrap();

        assert_eq!(details.id.to_string(), "Doraemon::123");
        assert_eq!(details.primary_title, "Doraemon & Nobita");

        let request = transport.last_request();
        assert_eq!(request.method, reqwest::Method::GET);
        assert_eq!(request.url, format!("{}/truyen/Doraemon", TEST_BASE_URL));
        assert_eq!(header(&request, REFERER), Some(TEST_BASE_URL));
        assert_eq!(header(&request, ORIGIN), Some(TEST_BASE_URL));
        assert!(header(&request, USER_AGENT).is_some());
    }

    #[tokio::test]
    async fn test_title_details_not_found() {
        let transport = Arc::new(RecordingTransport::new());
        let (client, _) = client_with(transport);

        let err = client
            .get_title_details(&TitleId::new("missing", "1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.user_message().starts_with("Manga not found!"));
    }

    #[tokio::test]
    async fn test_missing_chapter_reports_chapter_not_found() {
        let transport = Arc::new(RecordingTransport::new());
        let (client, _) = client_with(transport);
        let title_id = TitleId::new("missing", "1");

        let err = client
            .get_chapter_pages(&title_id, &ChapterId::from_number(3.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound {
                resource: Resource::Chapter,
                ..
            }
        ));
        assert!(err.user_message().starts_with("No chapter data found!"));

        let err = client.get_chapter_list(&title_id).await.unwrap_err();
        assert!(err.user_message().starts_with("No chapter data found!"));
    }

    #[tokio::test]
    async fn test_chapter_pages_request() {
        let transport = Arc::new(
            RecordingTransport::new()
                .route_json("/api/chapter/limitation", chapter_pages_fixture()),
        );
        let (client, _) = client_with(transport.clone());

        let title_id: TitleId = "Doraemon::123".parse().unwrap();
        let chapter_id: ChapterId = "chuong-10".parse().unwrap();
        let details = client.get_chapter_pages(&title_id, &chapter_id).await.unwrap();

        assert_eq!(details.title_id, title_id);
        assert_eq!(details.chapter_id, chapter_id);
        assert_eq!(details.pages.len(), 2);
        assert_eq!(details.pages[0], "https://goctruyen.test/image/doraemon/10/1.jpg");

        let request = transport.last_request();
        assert_eq!(request.method, reqwest::Method::POST);
        assert_eq!(request.url, format!("{}/api/chapter/limitation", TEST_BASE_URL));
        assert_eq!(
            request.body.as_deref(),
            Some("comicId=123&chapterNumber=10".as_bytes())
        );
        assert_eq!(header(&request, AUTHORIZATION), Some("Bearer test-token"));
        // The caller's content type wins over the augmenter's JSON default
        assert_eq!(
            header(&request, CONTENT_TYPE),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[tokio::test]
    async fn test_chapter_pages_missing_image_list() {
        let transport = Arc::new(RecordingTransport::new().route_json(
            "/api/chapter/limitation",
            serde_json::json!({ "result": { "message": "locked" } }),
        ));
        let (client, _) = client_with(transport);

        let err = client
            .get_chapter_pages(&TitleId::new("Doraemon", "123"), &ChapterId::from_number(10.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_chapter_list_request() {
        let transport = Arc::new(
            RecordingTransport::new().route_json("/api/comic/123/chapter", chapter_list_fixture()),
        );
        let (client, _) = client_with(transport.clone());

        let chapters = client
            .get_chapter_list(&TitleId::new("Doraemon", "123"))
            .await
            .unwrap();
        assert_eq!(chapters.len(), 3);

        assert_eq!(
            transport.last_request().url,
            format!("{}/api/comic/123/chapter?offset=0&limit=-1", TEST_BASE_URL)
        );
    }

    #[tokio::test]
    async fn test_discover_cursor_advances() {
        let transport = Arc::new(
            RecordingTransport::new().route_json("/api/comic/search/view", search_fixture()),
        );
        let (client, _) = client_with(transport.clone());

        let first = client
            .get_discover_section_page(DiscoverSectionId::Hot, None)
            .await
            .unwrap();
        assert_eq!(first.cursor, Some(PageCursor::new(1)));
        assert_eq!(first.items.len(), 2);

        let second = client
            .get_discover_section_page(DiscoverSectionId::Hot, first.cursor)
            .await
            .unwrap();
        assert_eq!(second.cursor, Some(PageCursor::new(2)));

        let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                format!("{}/api/comic/search/view?p=0", TEST_BASE_URL),
                format!("{}/api/comic/search/view?p=1", TEST_BASE_URL),
            ]
        );
    }

    #[tokio::test]
    async fn test_discover_sections_route_to_endpoints() {
        let transport = Arc::new(
            RecordingTransport::new()
                .route_json("/api/comic/search/new", search_fixture())
                .route_json("/api/comic/search/recent", search_fixture()),
        );
        let (client, _) = client_with(transport.clone());

        let sections = client.list_discover_sections();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[2].title, "TRUYỆN CẬP NHẬT GẦN ĐÂY");

        let new = client
            .get_discover_section_page(DiscoverSectionId::NewAdded, None)
            .await
            .unwrap();
        assert_eq!(new.items[0].kind, DiscoverItemKind::SimpleCarousel);

        let updated = client
            .get_discover_section_page(DiscoverSectionId::NewUpdated, None)
            .await
            .unwrap();
        assert!(matches!(
            updated.items[0].kind,
            DiscoverItemKind::ChapterUpdate { .. }
        ));
    }

    #[tokio::test]
    async fn test_empty_discover_page_ends_paging() {
        let transport = Arc::new(RecordingTransport::new().route_json(
            "/api/comic/search/view",
            serde_json::json!({ "result": { "data": [] } }),
        ));
        let (client, _) = client_with(transport);

        let page = client
            .get_discover_section_page(DiscoverSectionId::Hot, Some(PageCursor::new(7)))
            .await
            .unwrap();
        assert!(page.is_empty());
        assert!(page.cursor.is_none());
    }

    #[tokio::test]
    async fn test_text_search_is_not_paginated() {
        let transport =
            Arc::new(RecordingTransport::new().route_json("/api/comic/search", search_fixture()));
        let (client, _) = client_with(transport.clone());

        let results = client
            .search("đô rê mon", Some(PageCursor::new(3)))
            .await
            .unwrap();
        assert_eq!(results.items.len(), 2);
        assert!(results.cursor.is_none());

        let request = transport.last_request();
        let url = url::Url::parse(&request.url).unwrap();
        assert_eq!(url.path(), "/api/comic/search");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs, vec![("name".to_string(), "đô rê mon".to_string())]);
    }

    #[tokio::test]
    async fn test_category_browse_is_paginated() {
        let transport = Arc::new(
            RecordingTransport::new().route_json("/api/comic/search/category", search_fixture()),
        );
        let (client, _) = client_with(transport.clone());

        let first = client
            .search(SearchQuery::category("category:5"), None)
            .await
            .unwrap();
        assert_eq!(first.cursor, Some(PageCursor::new(1)));

        let second = client
            .search(SearchQuery::category("category:5"), first.cursor)
            .await
            .unwrap();
        assert_eq!(second.cursor, Some(PageCursor::new(2)));

        assert_eq!(
            transport.last_request().url,
            format!("{}/api/comic/search/category?p=1&value=5", TEST_BASE_URL)
        );
    }

    #[tokio::test]
    async fn test_list_categories() {
        let transport =
            Arc::new(RecordingTransport::new().route_json("/api/category", categories_fixture()));
        let (client, _) = client_with(transport);

        let groups = client.list_categories().await.unwrap();
        assert_eq!(groups[0].title, "Thể loại");
        assert_eq!(groups[0].tags.len(), 2);
    }

    #[tokio::test]
    async fn test_challenge_surfaces_and_keeps_cookies() {
        let blocked = HttpResponse::new(403, "<html>Just a moment...</html>")
            .with_header("set-cookie", "cf_clearance=abc123; Path=/; HttpOnly")
            .with_header("set-cookie", "__cf_bm=bm456; Path=/")
            .with_header("set-cookie", "session=ignored; Path=/");
        let transport = Arc::new(
            RecordingTransport::new()
                .route("/api/category", blocked)
                .route_json("/api/comic/search", search_fixture()),
        );
        let (client, cookies) = client_with(transport.clone());

        let err = client.list_categories().await.unwrap_err();
        match &err {
            Error::Challenge { url, method } => {
                assert_eq!(url, &format!("{}/api/category", TEST_BASE_URL));
                assert_eq!(method, "GET");
            }
            other => panic!("expected challenge, got {:?}", other),
        }
        assert!(err.user_message().contains("/api/category"));

        let names: Vec<String> = cookies.cookies().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["cf_clearance", "__cf_bm"]);

        client.search("doraemon", None).await.unwrap();
        assert_eq!(
            header(&transport.last_request(), COOKIE),
            Some("cf_clearance=abc123; __cf_bm=bm456")
        );
    }

    #[tokio::test]
    async fn test_service_unavailable_is_challenge() {
        let transport = Arc::new(
            RecordingTransport::new().route("/api/comic/search/view", HttpResponse::new(503, "")),
        );
        let (client, _) = client_with(transport);

        let err = client
            .get_discover_section_page(DiscoverSectionId::Hot, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Challenge);
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let transport = Arc::new(
            RecordingTransport::new()
                .route("/api/category", HttpResponse::new(200, "<html></html>")),
        );
        let (client, _) = client_with(transport);

        let err = client.list_categories().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_save_challenge_cookies_filters() {
        let transport = Arc::new(RecordingTransport::new());
        let (client, cookies) = client_with(transport);

        let stored = client.save_challenge_cookies([
            Cookie::new("cf_clearance", "browser"),
            Cookie::new("_ga", "analytics"),
            Cookie::new("_cfuvid", "visitor"),
        ]);
        assert_eq!(stored, 2);

        // Same name replaces the earlier value
        client.save_challenge_cookies([Cookie::new("cf_clearance", "fresh")]);
        let stored = cookies.cookies();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().any(|c| c.name == "cf_clearance" && c.value == "fresh"));
    }

    #[tokio::test]
    async fn test_fetch_page_image() {
        let transport = Arc::new(
            RecordingTransport::new()
                .route("/image/1.jpg", HttpResponse::new(200, vec![0xFFu8, 0xD8, 0xFF])),
        );
        let (client, _) = client_with(transport.clone());

        let bytes = client
            .fetch_page_image(&format!("{}/image/1.jpg", TEST_BASE_URL))
            .await
            .unwrap();
        assert_eq!(&bytes[..], &[0xFF, 0xD8, 0xFF]);
        assert_eq!(
            transport.last_request().kind,
            goctruyen::net::RequestKind::Image
        );

        let err = client.fetch_page_image("  ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_network_errors_propagate_unchanged() {
        let transport = Arc::new(FlakyTransport {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
            body: String::new(),
        });
        let client = CatalogClient::with_parts(
            test_config(),
            transport,
            Arc::new(MemoryCookieStore::new()),
        )
        .unwrap();

        let err = client.list_categories().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("connection reset by peer"));
    }

    #[tokio::test]
    async fn test_retry_helper_recovers_from_network_errors() {
        let transport = Arc::new(FlakyTransport {
            failures: 2,
            calls: AtomicUsize::new(0),
            body: categories_fixture().to_string(),
        });
        let client = CatalogClient::with_parts(
            test_config(),
            transport.clone(),
            Arc::new(MemoryCookieStore::new()),
        )
        .unwrap();

        let groups = with_retries(3, Duration::from_millis(1), || client.list_categories())
            .await
            .unwrap();
        assert_eq!(groups[0].tags.len(), 2);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_helper_gives_up() {
        let transport = Arc::new(FlakyTransport {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
            body: String::new(),
        });
        let client = CatalogClient::with_parts(
            test_config(),
            transport.clone(),
            Arc::new(MemoryCookieStore::new()),
        )
        .unwrap();

        let err = with_retries(2, Duration::from_millis(1), || client.list_categories())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_helper_does_not_retry_challenges() {
        let transport = Arc::new(
            RecordingTransport::new().route("/api/category", HttpResponse::new(403, "")),
        );
        let (client, _) = client_with(transport.clone());

        let err = with_retries(5, Duration::from_millis(1), || client.list_categories())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Challenge);
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = test_config();
        config.base_url = "not a url".to_string();
        let err = CatalogClient::with_parts(
            config,
            Arc::new(RecordingTransport::new()),
            Arc::new(MemoryCookieStore::new()),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
