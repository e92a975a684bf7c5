//! Flickr photo search client.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::dto::{PhotosPage, decode_search_page, page_into_metadata};
use crate::domain::entities::{PhotoMetadata, SearchRegion};
use crate::domain::errors::SearchError;
use crate::domain::ports::{HttpTransport, PhotoSearchPort};

/// Flickr REST endpoint.
pub const FLICKR_API_BASE: &str = "https://api.flickr.com/services/rest";

const SEARCH_METHOD: &str = "flickr.photos.search";
const MEDIUM_URL_EXTRA: &str = "url_m";
const RESPONSE_FORMAT: &str = "json";
const NO_JSON_CALLBACK: &str = "1";

/// Photo search against the Flickr REST API.
pub struct FlickrClient {
    transport: Arc<dyn HttpTransport>,
    api_key: String,
    base_url: String,
    safe_search: bool,
}

impl FlickrClient {
    /// Creates a client for the public endpoint with safe search enabled.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            base_url: FLICKR_API_BASE.to_string(),
            safe_search: true,
        }
    }

    /// Points the client at a different endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Toggles provider-side safe search filtering.
    #[must_use]
    pub const fn with_safe_search(mut self, enabled: bool) -> Self {
        self.safe_search = enabled;
        self
    }

    /// Builds the query string for a search request.
    #[must_use]
    pub fn search_params(
        &self,
        region: &SearchRegion,
        page: Option<u32>,
        per_page: u32,
    ) -> Vec<(String, String)> {
        let safe_search = if self.safe_search { "1" } else { "0" };
        let mut params = vec![
            ("method", SEARCH_METHOD.to_string()),
            ("api_key", self.api_key.clone()),
            ("bbox", region.to_bbox_param()),
            ("safe_search", safe_search.to_string()),
            ("extras", MEDIUM_URL_EXTRA.to_string()),
            ("format", RESPONSE_FORMAT.to_string()),
            ("nojsoncallback", NO_JSON_CALLBACK.to_string()),
            ("per_page", per_page.to_string()),
        ];
        if let Some(page) = page {
            params.push(("page", page.to_string()));
        }

        params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    async fn request_page(
        &self,
        region: &SearchRegion,
        page: Option<u32>,
        per_page: u32,
    ) -> Result<PhotosPage, SearchError> {
        let params = self.search_params(region, page, per_page);

        let response = self
            .transport
            .get(&self.base_url, &params)
            .await
            .map_err(|e| {
                warn!(error = %e, "Photo search request failed");
                SearchError::from(e)
            })?;

        if !response.is_success() {
            warn!(status = response.status, "Photo search returned non-success status");
            return Err(SearchError::BadStatus(response.status));
        }

        if response.body.is_empty() {
            return Err(SearchError::MalformedResponse("empty body".to_string()));
        }

        decode_search_page(&response.body).inspect_err(|e| {
            if !e.is_user_facing() {
                warn!(error = %e, "Failed to decode photo search response");
            }
        })
    }
}

impl std::fmt::Debug for FlickrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlickrClient")
            .field("base_url", &self.base_url)
            .field("safe_search", &self.safe_search)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PhotoSearchPort for FlickrClient {
    async fn page_count(
        &self,
        region: &SearchRegion,
        per_page: u32,
    ) -> Result<Option<u32>, SearchError> {
        debug!(bbox = %region, per_page = per_page, "Probing photo count");

        let page = self.request_page(region, None, per_page).await?;

        debug!(pages = ?page.pages, total = ?page.total, "Photo count received");
        Ok(page.pages)
    }

    async fn search(
        &self,
        region: &SearchRegion,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<PhotoMetadata>, SearchError> {
        debug!(bbox = %region, page = page, per_page = per_page, "Searching photos");

        let result = self.request_page(region, Some(page), per_page).await?;
        let photos = page_into_metadata(result).inspect_err(|_| {
            info!(bbox = %region, page = page, "Search page contained no photos");
        })?;

        debug!(count = photos.len(), page = page, "Photo search succeeded");
        Ok(photos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::GeoPoint;
    use crate::domain::errors::TransportError;
    use crate::domain::ports::HttpResponse;
    use crate::domain::ports::mocks::{MockHttpTransport, ScriptedTransport};
    use crate::domain::services::compute_region;

    fn region() -> SearchRegion {
        compute_region(GeoPoint::new(0.0, 0.0).unwrap(), 1.0, 1.0)
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    const PAGE_BODY: &str = r#"{"stat":"ok","photos":{"page":3,"pages":9,"total":"180","photo":[
        {"id":"b","url_m":"https://img/b.jpg"},
        {"id":"a","url_m":"https://img/a.jpg"},
        {"id":"c","url_m":"https://img/c.jpg"}
    ]}}"#;

    #[test]
    fn test_search_params() {
        let client = FlickrClient::new(Arc::new(ScriptedTransport::new()), "key123");
        let params = client.search_params(&region(), Some(4), 21);

        assert_eq!(param(&params, "method"), Some("flickr.photos.search"));
        assert_eq!(param(&params, "api_key"), Some("key123"));
        assert_eq!(param(&params, "bbox"), Some("-1,-1,1,1"));
        assert_eq!(param(&params, "safe_search"), Some("1"));
        assert_eq!(param(&params, "extras"), Some("url_m"));
        assert_eq!(param(&params, "format"), Some("json"));
        assert_eq!(param(&params, "nojsoncallback"), Some("1"));
        assert_eq!(param(&params, "page"), Some("4"));
        assert_eq!(param(&params, "per_page"), Some("21"));
    }

    #[test]
    fn test_safe_search_can_be_disabled() {
        let client =
            FlickrClient::new(Arc::new(ScriptedTransport::new()), "k").with_safe_search(false);
        let params = client.search_params(&region(), None, 1);
        assert_eq!(param(&params, "safe_search"), Some("0"));
        assert_eq!(param(&params, "page"), None);
    }

    #[tokio::test]
    async fn test_search_preserves_order() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .withf(|url, query| {
                url == FLICKR_API_BASE
                    && query.iter().any(|(k, v)| k == "page" && v == "3")
            })
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(200, PAGE_BODY)));

        let client = FlickrClient::new(Arc::new(transport), "k");
        let photos = client.search(&region(), 3, 21).await.unwrap();

        let ids: Vec<_> = photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(photos[1].remote_url, "https://img/a.jpg");
    }

    #[tokio::test]
    async fn test_page_count_request() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(
            200,
            r#"{"stat":"ok","photos":{"pages":512,"total":"512","photo":[{"id":"1","url_m":"u"}]}}"#,
        );

        let client = FlickrClient::new(transport.clone(), "k");
        assert_eq!(client.page_count(&region(), 1).await, Ok(Some(512)));
        assert_eq!(param(&transport.query(0), "per_page"), Some("1"));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(Err(TransportError::Timeout));

        let client = FlickrClient::new(transport, "k");
        let err = client.search(&region(), 1, 21).await.unwrap_err();
        assert_eq!(err, SearchError::Transport("request timed out".to_string()));
    }

    #[tokio::test]
    async fn test_bad_status() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(503, "unavailable");

        let client = FlickrClient::new(transport, "k");
        let err = client.search(&region(), 1, 21).await.unwrap_err();
        assert_eq!(err, SearchError::BadStatus(503));
    }

    #[tokio::test]
    async fn test_empty_body_is_malformed() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(200, "");

        let client = FlickrClient::new(transport, "k");
        let err = client.search(&region(), 1, 21).await.unwrap_err();
        assert!(matches!(err, SearchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_photo_list_is_no_photos_found() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(200, r#"{"stat":"ok","photos":{"pages":0,"total":"0","photo":[]}}"#);

        let client = FlickrClient::new(transport, "k");
        let err = client.search(&region(), 1, 21).await.unwrap_err();
        assert_eq!(err, SearchError::NoPhotosFound);
    }
}
