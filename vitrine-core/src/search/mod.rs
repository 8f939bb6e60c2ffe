//! Image-search provider seam.
//!
//! - `ImageSearchProvider` abstracts the external search service
//! - `CustomSearchProvider` talks to the Google Custom Search JSON API
//! - `locate` turns a query into ranked candidates and never fails

mod custom_search;
mod locate;

use async_trait::async_trait;

use crate::error::SearchError;

pub use custom_search::{CustomSearchProvider, DEFAULT_SEARCH_BASE_URL};
pub use locate::{locate, Located};

/// Maximum number of results the provider returns per request.
pub const PROVIDER_HARD_CAP: usize = 10;

/// Credentials for the search provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCredentials {
    pub api_key: String,
    /// Search engine / context identifier (`cx`).
    pub engine_id: String,
}

impl SearchCredentials {
    /// Build credentials only if both parts are present and non-blank.
    pub fn from_parts(api_key: Option<String>, engine_id: Option<String>) -> Option<Self> {
        let api_key = api_key.filter(|k| !k.trim().is_empty())?;
        let engine_id = engine_id.filter(|c| !c.trim().is_empty())?;
        Some(Self {
            api_key: api_key.trim().to_string(),
            engine_id: engine_id.trim().to_string(),
        })
    }
}

/// A single search call.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    /// Number of results to ask for, 1..=PROVIDER_HARD_CAP.
    pub count: usize,
    pub credentials: &'a SearchCredentials,
}

/// One provider result. The link may be missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub link: Option<String>,
}

/// Trait for image-search providers.
#[async_trait]
pub trait ImageSearchProvider: Send + Sync {
    /// Run one search and return hits in provider order.
    async fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<SearchHit>, SearchError>;
}
