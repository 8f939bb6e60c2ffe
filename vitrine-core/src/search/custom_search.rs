//! Google Custom Search JSON API provider.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use crate::error::SearchError;
use crate::http::HttpClient;

use super::{ImageSearchProvider, SearchHit, SearchRequest, PROVIDER_HARD_CAP};

/// Default Custom Search endpoint.
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    /// Absent when the search found nothing.
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    link: Option<String>,
}

/// Image search over the Custom Search JSON API.
pub struct CustomSearchProvider {
    client: Arc<dyn HttpClient>,
    base_url: String,
}

impl CustomSearchProvider {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self::with_base_url(client, DEFAULT_SEARCH_BASE_URL)
    }

    pub fn with_base_url(client: Arc<dyn HttpClient>, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Build the request URL for a search.
    pub(crate) fn request_url(&self, request: &SearchRequest<'_>) -> Result<String, SearchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SearchError::Malformed(format!("bad base URL {}: {}", self.base_url, e)))?;
        let count = request.count.clamp(1, PROVIDER_HARD_CAP);
        url.query_pairs_mut()
            .append_pair("key", &request.credentials.api_key)
            .append_pair("cx", &request.credentials.engine_id)
            .append_pair("q", request.query)
            .append_pair("searchType", "image")
            .append_pair("num", &count.to_string());
        Ok(url.to_string())
    }
}

#[async_trait]
impl ImageSearchProvider for CustomSearchProvider {
    async fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<SearchHit>, SearchError> {
        let url = self.request_url(request)?;

        tracing::debug!(query = request.query, count = request.count, "calling image search");
        let body = self.client.get_json(&url).await?;

        let response: SearchResponse =
            serde_json::from_value(body).map_err(|e| SearchError::Malformed(e.to_string()))?;

        Ok(response
            .items
            .into_iter()
            .map(|item| SearchHit { link: item.link })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockClient;
    use crate::search::SearchCredentials;
    use serde_json::json;

    fn creds() -> SearchCredentials {
        SearchCredentials {
            api_key: "k3y".to_string(),
            engine_id: "engine".to_string(),
        }
    }

    #[test]
    fn test_request_url_caps_count_and_encodes_query() {
        let provider = CustomSearchProvider::new(Arc::new(MockClient::new()));
        let credentials = creds();
        let request = SearchRequest {
            query: "Acme X100 product image",
            count: 25,
            credentials: &credentials,
        };

        let url = provider.request_url(&request).unwrap();
        assert!(url.starts_with(DEFAULT_SEARCH_BASE_URL));
        assert!(url.contains("key=k3y"));
        assert!(url.contains("cx=engine"));
        assert!(url.contains("q=Acme+X100+product+image"));
        assert!(url.contains("searchType=image"));
        assert!(url.contains("num=10"));
    }

    #[tokio::test]
    async fn test_search_parses_links_in_order() {
        let credentials = creds();
        let request = SearchRequest {
            query: "hat",
            count: 3,
            credentials: &credentials,
        };
        let url = CustomSearchProvider::new(Arc::new(MockClient::new()))
            .request_url(&request)
            .unwrap();

        let client = MockClient::new().with_json(
            &url,
            json!({
                "items": [
                    { "link": "https://a.test/1.jpg" },
                    { "title": "no link" },
                    { "link": "https://a.test/3.png" }
                ]
            }),
        );
        let provider = CustomSearchProvider::new(Arc::new(client));

        let hits = provider.search(&request).await.unwrap();
        assert_eq!(
            hits,
            vec![
                SearchHit { link: Some("https://a.test/1.jpg".to_string()) },
                SearchHit { link: None },
                SearchHit { link: Some("https://a.test/3.png".to_string()) },
            ]
        );
    }

    #[tokio::test]
    async fn test_search_without_items_is_empty() {
        let credentials = creds();
        let request = SearchRequest {
            query: "nothing",
            count: 4,
            credentials: &credentials,
        };
        let url = CustomSearchProvider::new(Arc::new(MockClient::new()))
            .request_url(&request)
            .unwrap();
        let client = MockClient::new().with_json(&url, json!({ "kind": "customsearch#search" }));

        let hits = CustomSearchProvider::new(Arc::new(client))
            .search(&request)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_search_http_failure() {
        let credentials = creds();
        let request = SearchRequest {
            query: "hat",
            count: 4,
            credentials: &credentials,
        };
        let url = CustomSearchProvider::new(Arc::new(MockClient::new()))
            .request_url(&request)
            .unwrap();
        let client = MockClient::new().with_status(&url, 403);

        let result = CustomSearchProvider::new(Arc::new(client))
            .search(&request)
            .await;
        assert!(matches!(result, Err(SearchError::Request(_))));
    }
}
