use crate::types::{CandidateImage, LocateOutcome};

use super::{ImageSearchProvider, SearchCredentials, SearchRequest, PROVIDER_HARD_CAP};

/// Result of a locate call: candidates (or `Disabled`) plus diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub outcome: LocateOutcome,
    pub logs: Vec<String>,
}

/// Find candidate images for a query.
///
/// Never fails: missing credentials yield `Disabled` and provider errors yield zero
/// candidates, each with a diagnostic line. At most `max_results` candidates are
/// returned, and never more than `PROVIDER_HARD_CAP`.
pub async fn locate(
    provider: &dyn ImageSearchProvider,
    query: &str,
    max_results: usize,
    credentials: Option<&SearchCredentials>,
) -> Located {
    let Some(credentials) = credentials else {
        tracing::debug!("image search not configured, skipping");
        return Located {
            outcome: LocateOutcome::Disabled,
            logs: vec!["image search provider is not configured".to_string()],
        };
    };

    let limit = max_results.clamp(1, PROVIDER_HARD_CAP);
    let request = SearchRequest {
        query,
        count: limit,
        credentials,
    };

    let hits = match provider.search(&request).await {
        Ok(hits) => hits,
        Err(e) => {
            tracing::warn!(query, error = %e, "image search failed");
            return Located {
                outcome: LocateOutcome::Candidates(Vec::new()),
                logs: vec![format!("image search failed: {}", e)],
            };
        }
    };

    let candidates: Vec<CandidateImage> = hits
        .into_iter()
        .filter_map(|hit| hit.link)
        .map(|link| link.trim().to_string())
        .filter(|link| !link.is_empty())
        .take(limit)
        .enumerate()
        .map(|(i, url)| CandidateImage { url, rank: i + 1 })
        .collect();

    tracing::debug!(query, found = candidates.len(), "image search complete");

    Located {
        outcome: LocateOutcome::Candidates(candidates),
        logs: Vec::new(),
    }
}
