//! Asset-store uploader seam and the Cloudinary implementation.

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::error::UploadError;

/// Default Cloudinary API base URL.
pub const DEFAULT_CLOUDINARY_BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// An asset stored by the asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub secure_url: String,
}

/// Trait for remote asset stores that can ingest an image by URL.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    /// Ask the store to fetch `source_url` into `folder`.
    async fn upload_from_url(
        &self,
        source_url: &str,
        folder: &str,
    ) -> Result<UploadedAsset, UploadError>;
}

/// Cloudinary credentials.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Signed upload-by-URL against the Cloudinary REST API.
pub struct CloudinaryUploader {
    client: reqwest::Client,
    config: CloudinaryConfig,
    base_url: String,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            config,
            base_url: DEFAULT_CLOUDINARY_BASE_URL.to_string(),
        })
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", self.base_url, self.config.cloud_name)
    }
}

/// Cloudinary request signature: parameters sorted by name, joined as a query
/// string, with the API secret appended, hashed with SHA-256.
pub(crate) fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl AssetUploader for CloudinaryUploader {
    async fn upload_from_url(
        &self,
        source_url: &str,
        folder: &str,
    ) -> Result<UploadedAsset, UploadError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", folder), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let mut form = vec![
            ("file", source_url),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];
        if !folder.is_empty() {
            form.push(("folder", folder));
        }

        tracing::debug!(source_url, folder, "uploading to asset store");
        let response = self.client.post(self.upload_url()).form(&form).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        parse_upload_response(status, &body)
    }
}

/// Longest slice of a non-JSON error body kept in a diagnostic.
const MAX_RAW_ERROR_CHARS: usize = 200;

/// Interpret an upload response. The status is checked first so a gateway
/// error page still reports as `Rejected` with its status.
fn parse_upload_response(status: u16, body: &str) -> Result<UploadedAsset, UploadError> {
    if !(200..300).contains(&status) {
        let message = match serde_json::from_str::<UploadResponse>(body) {
            Ok(UploadResponse {
                error: Some(error),
                ..
            }) => error.message,
            _ if !body.trim().is_empty() => {
                body.trim().chars().take(MAX_RAW_ERROR_CHARS).collect()
            }
            _ => "no error message".to_string(),
        };
        return Err(UploadError::Rejected { status, message });
    }

    let parsed: UploadResponse =
        serde_json::from_str(body).map_err(|e| UploadError::Malformed(e.to_string()))?;
    parsed
        .secure_url
        .map(|secure_url| UploadedAsset { secure_url })
        .ok_or_else(|| UploadError::Malformed("missing secure_url".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_sorts_and_skips_empty() {
        let a = sign(&[("timestamp", "1700000000"), ("folder", "products/hats")], "s3cret");
        let b = sign(&[("folder", "products/hats"), ("timestamp", "1700000000")], "s3cret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let without_folder = sign(&[("folder", ""), ("timestamp", "1700000000")], "s3cret");
        let only_timestamp = sign(&[("timestamp", "1700000000")], "s3cret");
        assert_eq!(without_folder, only_timestamp);
    }

    #[test]
    fn test_sign_depends_on_secret() {
        let params = [("timestamp", "1")];
        assert_ne!(sign(&params, "a"), sign(&params, "b"));
    }

    #[test]
    fn test_upload_url() {
        let uploader = CloudinaryUploader::new(
            CloudinaryConfig {
                cloud_name: "demo".to_string(),
                api_key: "key".to_string(),
                api_secret: "secret".to_string(),
            },
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url("http://localhost:9999/v1_1/");
        assert_eq!(uploader.upload_url(), "http://localhost:9999/v1_1/demo/image/upload");
    }

    #[test]
    fn test_non_json_error_page_keeps_status() {
        let result = parse_upload_response(502, "<html><body>Bad Gateway</body></html>");
        match result {
            Err(UploadError::Rejected { status, message }) => {
                assert_eq!(status, 502);
                assert!(message.contains("Bad Gateway"));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_json_error_message_is_used() {
        let body = r#"{"error":{"message":"Resource not found - https://img.test/x.jpg"}}"#;
        assert!(matches!(
            parse_upload_response(400, body),
            Err(UploadError::Rejected { status: 400, message }) if message.starts_with("Resource not found")
        ));
        assert!(matches!(
            parse_upload_response(500, ""),
            Err(UploadError::Rejected { status: 500, message }) if message == "no error message"
        ));
    }

    #[test]
    fn test_success_requires_secure_url() {
        assert!(matches!(
            parse_upload_response(200, r#"{"public_id":"abc"}"#),
            Err(UploadError::Malformed(_))
        ));
        assert!(matches!(
            parse_upload_response(200, "not json"),
            Err(UploadError::Malformed(_))
        ));
        assert_eq!(
            parse_upload_response(200, r#"{"secure_url":"https://res.cdn.test/a.jpg"}"#).unwrap(),
            UploadedAsset {
                secure_url: "https://res.cdn.test/a.jpg".to_string()
            }
        );
    }
}
