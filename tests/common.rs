//! Common test utilities and fixtures
//!
//! Shared functionality used across all test modules.

use async_trait::async_trait;
use goctruyen::config::ProviderConfig;
use goctruyen::net::{HttpRequest, HttpResponse, MemoryCookieStore, Transport};
use goctruyen::CatalogClient;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;

#[allow(dead_code)]
pub const TEST_BASE_URL: &str = "https://goctruyen.test";

/// Transport fake that answers from a route table and records every request.
///
/// Routes match on the URL path, ignoring the query string. Unrouted paths
/// answer 404 with an empty body.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingTransport {
    routes: Mutex<Vec<(String, HttpResponse)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, path: &str, response: HttpResponse) -> Self {
        self.routes.lock().push((path.to_string(), response));
        self
    }

    pub fn route_json(self, path: &str, body: Value) -> Self {
        self.route(path, HttpResponse::new(200, body.to_string()))
    }

    pub fn route_html(self, path: &str, body: &str) -> Self {
        self.route(path, HttpResponse::new(200, body.to_string()))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("at least one request was sent")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: HttpRequest) -> goctruyen::Result<HttpResponse> {
        let path = url::Url::parse(&request.url)
            .map(|url| url.path().to_string())
            .unwrap_or_else(|_| request.url.clone());
        self.requests.lock().push(request);

        let response = self
            .routes
            .lock()
            .iter()
            .find(|(route, _)| *route == path)
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| HttpResponse::new(404, ""));
        Ok(response)
    }
}

/// Configuration pointing at the fake origin with a generous rate limit.
#[allow(dead_code)]
pub fn test_config() -> ProviderConfig {
    let mut config = ProviderConfig::with_base_url(TEST_BASE_URL);
    config.auth_token = "test-token".to_string();
    config.rate_limit.requests_per_window = 1000;
    config
}

/// Builds a client over `transport` with a fresh in-memory cookie store.
#[allow(dead_code)]
pub fn client_with(transport: Arc<RecordingTransport>) -> (CatalogClient, Arc<MemoryCookieStore>) {
    let cookies = Arc::new(MemoryCookieStore::new());
    let client = CatalogClient::with_parts(test_config(), transport, cookies.clone())
        .expect("test config is valid");
    (client, cookies)
}

/// A search/discover response with a duplicated entry and a relative image.
#[allow(dead_code)]
pub fn search_fixture() -> Value {
    json!({
        "result": {
            "data": [
                {
                    "id": 123,
                    "name": "Doraemon",
                    "nameEn": "Doraemon",
                    "photo": "/image/doraemon.jpg",
                    "chapterLatest": ["1502"]
                },
                {
                    "id": "77",
                    "name": "Tom &amp; Jerry",
                    "nameEn": "tom-and-jerry",
                    "photo": "https://cdn.goctruyen.test/tom.jpg",
                    "chapterLatest": []
                },
                {
                    "id": "123",
                    "name": "Doraemon (duplicate)",
                    "nameEn": "Doraemon",
                    "photo": "/image/other.jpg",
                    "chapterLatest": ["1"]
                }
            ]
        }
    })
}

#[allow(dead_code)]
pub fn chapter_list_fixture() -> Value {
    json!({
        "result": {
            "chapters": [
                {
                    "numberChapter": "10.5",
                    "name": "Bảo bối mới",
                    "viewCount": 1200,
                    "stringUpdateTime": "5 phút trước"
                },
                {
                    "numberChapter": "10",
                    "name": "N/A",
                    "viewCount": "980",
                    "stringUpdateTime": "20-10-2024"
                },
                {
                    "numberChapter": 9,
                    "name": "",
                    "viewCount": 15,
                    "stringUpdateTime": "không rõ"
                }
            ]
        }
    })
}

#[allow(dead_code)]
pub fn chapter_pages_fixture() -> Value {
    json!({
        "result": {
            "data": [
                "/image/doraemon/10/1.jpg",
                "https://cdn.goctruyen.test/doraemon/10/2.jpg"
            ]
        }
    })
}

#[allow(dead_code)]
pub fn categories_fixture() -> Value {
    json!({
        "result": [
            { "id": 1, "name": "Hành động" },
            { "id": "5", "name": "Hài &amp; Vui" },
            { "id": 1, "name": "Hành động" }
        ]
    })
}

/// Title detail page with the provider's markup.
#[allow(dead_code)]
pub const TITLE_PAGE_FIXTURE: &str = r#"<!DOCTYPE html>
<html>
<body>
  <div class="v-card-title">Doraemon &amp; Nobita</div>
  <div class="v-image"><img src="/image/doraemon.jpg"></div>
  <div class="information-section">
    <div>Tác giả:
<span>Fujiko F. Fujio</span></div>
    <div>Trạng thái:
<span>Đang cập nhật</span></div>
    <div>Lượt xem:
<span>1.000.000</span></div>
  </div>
  <div class="v-card-text pt-1 px-4 pb-4 text-secondary font-weight-medium">
    Chú mèo máy đến từ tương lai.
  </div>
  <div class="pr-3"><b>4.5</b></div>
  <div class="group-content">
    <a href="/search?category=1"><span>#</span><span>Hài hước</span></a>
    <a href="/search?category=2"><span>#</span><span>Khoa học viễn tưởng</span></a>
    <a href="/search?category=1"><span>#</span><span>Hài hước</span></a>
  </div>
</body>
</html>"#;
