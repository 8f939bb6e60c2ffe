//! Pipeline configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::materialize::CloudinaryConfig;
use crate::search::{SearchCredentials, DEFAULT_SEARCH_BASE_URL};

/// Default number of images to acquire per product.
pub const DEFAULT_MAX_RESULTS: usize = 4;

/// Default per-request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// None when either search variable is missing; search is then disabled.
    pub credentials: Option<SearchCredentials>,
    pub search_base_url: String,
    pub max_results: usize,
    pub http_timeout: Duration,
    /// Minimum delay between requests to the same host. 0 disables.
    pub rate_limit_ms: u64,
    /// Parallel materializations; None means one per candidate.
    pub concurrency: Option<usize>,
    /// Root that local-save URLs are relative to.
    pub static_root: PathBuf,
    /// None when Cloudinary credentials are incomplete.
    pub cloudinary: Option<CloudinaryConfig>,
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `VITRINE_SEARCH_API_KEY` / `VITRINE_SEARCH_ENGINE_ID`: search credentials
    /// - `VITRINE_SEARCH_BASE_URL`: search endpoint (default: Custom Search JSON API)
    /// - `VITRINE_MAX_RESULTS`: images per product (default: 4)
    /// - `VITRINE_HTTP_TIMEOUT_SECS`: per-request timeout (default: 20)
    /// - `VITRINE_HTTP_RATE_LIMIT_MS`: per-host delay (default: 0)
    /// - `VITRINE_CONCURRENCY`: parallel downloads/uploads (default: one per image)
    /// - `VITRINE_STATIC_ROOT`: static-file root (default: "~/.vitrine/public")
    /// - `CLOUDINARY_CLOUD_NAME` / `CLOUDINARY_API_KEY` / `CLOUDINARY_API_SECRET`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = SearchCredentials::from_parts(
            lookup("VITRINE_SEARCH_API_KEY"),
            lookup("VITRINE_SEARCH_ENGINE_ID"),
        );

        let search_base_url = lookup("VITRINE_SEARCH_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SEARCH_BASE_URL.to_string());

        let max_results = parse_var(&lookup, "VITRINE_MAX_RESULTS")?.unwrap_or(DEFAULT_MAX_RESULTS);

        let http_timeout = Duration::from_secs(
            parse_var(&lookup, "VITRINE_HTTP_TIMEOUT_SECS")?.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        );

        let rate_limit_ms = parse_var(&lookup, "VITRINE_HTTP_RATE_LIMIT_MS")?.unwrap_or(0);

        let concurrency = parse_var(&lookup, "VITRINE_CONCURRENCY")?;

        let static_root = lookup("VITRINE_STATIC_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_static_root);

        let cloudinary = match (
            lookup("CLOUDINARY_CLOUD_NAME"),
            lookup("CLOUDINARY_API_KEY"),
            lookup("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        Ok(Self {
            credentials,
            search_base_url,
            max_results,
            http_timeout,
            rate_limit_ms,
            concurrency,
            static_root,
            cloudinary,
        })
    }

    /// Get the default static root: ~/.vitrine/public
    pub fn default_static_root() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".vitrine").join("public"))
            .unwrap_or_else(|| PathBuf::from("public"))
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<PipelineConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert!(config.credentials.is_none());
        assert!(config.cloudinary.is_none());
        assert_eq!(config.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(config.http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
        assert_eq!(config.rate_limit_ms, 0);
        assert_eq!(config.concurrency, None);
        assert_eq!(config.search_base_url, DEFAULT_SEARCH_BASE_URL);
    }

    #[test]
    fn test_partial_credentials_are_unconfigured() {
        let config = config(&[("VITRINE_SEARCH_API_KEY", "key")]).unwrap();
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = config(&[
            ("VITRINE_SEARCH_API_KEY", "key"),
            ("VITRINE_SEARCH_ENGINE_ID", "cx"),
            ("VITRINE_MAX_RESULTS", "6"),
            ("VITRINE_CONCURRENCY", "2"),
            ("VITRINE_STATIC_ROOT", "/srv/public"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "ck"),
            ("CLOUDINARY_API_SECRET", "cs"),
        ])
        .unwrap();
        assert_eq!(config.credentials.unwrap().engine_id, "cx");
        assert_eq!(config.max_results, 6);
        assert_eq!(config.concurrency, Some(2));
        assert_eq!(config.static_root, PathBuf::from("/srv/public"));
        assert_eq!(config.cloudinary.unwrap().cloud_name, "demo");
    }

    #[test]
    fn test_invalid_number() {
        let err = config(&[("VITRINE_MAX_RESULTS", "four")]).unwrap_err();
        assert!(err.to_string().contains("VITRINE_MAX_RESULTS"));
    }
}
