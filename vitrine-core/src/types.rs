use serde::{Deserialize, Serialize};

/// Catalog attributes used to search for product photos. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescriptor {
    #[serde(default)]
    pub brand: Option<String>,
    /// Model number or SKU.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// An image location returned by the search provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateImage {
    pub url: String,
    /// 1-based position in the provider's response, after empty links are dropped.
    pub rank: usize,
}

/// Outcome of locating candidates.
///
/// `Disabled` means no credentials were configured, which is distinct from a search
/// that ran and returned nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateOutcome {
    Disabled,
    Candidates(Vec<CandidateImage>),
}

impl LocateOutcome {
    pub fn candidates(&self) -> &[CandidateImage] {
        match self {
            LocateOutcome::Disabled => &[],
            LocateOutcome::Candidates(c) => c,
        }
    }

    pub fn into_candidates(self) -> Vec<CandidateImage> {
        match self {
            LocateOutcome::Disabled => Vec::new(),
            LocateOutcome::Candidates(c) => c,
        }
    }
}

/// A candidate resolved into its durable address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterializedAsset {
    pub url: String,
    pub rank: usize,
    /// Path written to disk (local-save only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// A candidate that could not be materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedCandidate {
    pub rank: usize,
    pub url: String,
    pub stage: String,
    pub error: String,
}

impl FailedCandidate {
    /// Human-readable diagnostic line.
    pub fn log_line(&self) -> String {
        format!(
            "image #{} ({}) {} failed: {}",
            self.rank,
            url_fragment(&self.url),
            self.stage,
            self.error
        )
    }
}

/// Everything a pipeline run produced, in candidate rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineResult {
    pub urls: Vec<String>,
    pub files: Vec<String>,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedCandidate>,
}

/// Truncate long URLs for log lines.
pub(crate) fn url_fragment(url: &str) -> String {
    const MAX_CHARS: usize = 80;
    if url.chars().count() <= MAX_CHARS {
        url.to_string()
    } else {
        let head: String = url.chars().take(MAX_CHARS).collect();
        format!("{}...", head)
    }
}
