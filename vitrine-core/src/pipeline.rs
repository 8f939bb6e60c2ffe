//! Image acquisition pipeline: query -> locate -> materialize.
//!
//! `ImagePipeline::run` never fails for expected conditions (no credentials,
//! search errors, per-image download or upload errors). Those end up in
//! `PipelineResult::logs`. Only invalid options or a panicked task abort a run.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{info_span, Instrument};

use crate::config::{PipelineConfig, DEFAULT_MAX_RESULTS};
use crate::error::{MaterializeError, PipelineError};
use crate::http::{HttpClient, ReqwestClient};
use crate::materialize::{materialize, SinkMode};
use crate::query::build_query;
use crate::search::{
    locate, CustomSearchProvider, ImageSearchProvider, SearchCredentials, PROVIDER_HARD_CAP,
};
use crate::types::{
    CandidateImage, FailedCandidate, LocateOutcome, MaterializedAsset, PipelineResult,
    ProductDescriptor,
};

/// Stages of a run, in order. Used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    QueryBuilt,
    ProviderUnconfigured,
    Located,
    MaterializedAll,
    Done,
}

/// Per-run options.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Clamped to 1..=PROVIDER_HARD_CAP.
    pub max_results: usize,
    pub sink: SinkMode,
    /// Parallel materializations. None means one per candidate; Some(0) is invalid.
    pub concurrency: Option<usize>,
    /// Per-candidate time limit. Exceeding it counts as a download failure.
    pub candidate_timeout: Option<Duration>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            sink: SinkMode::PassThrough,
            concurrency: None,
            candidate_timeout: None,
        }
    }
}

impl PipelineOptions {
    pub fn with_sink(mut self, sink: SinkMode) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Result cap after clamping.
    pub fn result_cap(&self) -> usize {
        self.max_results.clamp(1, PROVIDER_HARD_CAP)
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.concurrency == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.candidate_timeout == Some(Duration::ZERO) {
            return Err(PipelineError::InvalidConfig(
                "candidate timeout must be non-zero".to_string(),
            ));
        }
        self.sink.validate()
    }
}

/// The image acquisition pipeline.
pub struct ImagePipeline {
    client: Arc<dyn HttpClient>,
    provider: Arc<dyn ImageSearchProvider>,
    credentials: Option<SearchCredentials>,
}

impl ImagePipeline {
    pub fn new(
        client: Arc<dyn HttpClient>,
        provider: Arc<dyn ImageSearchProvider>,
        credentials: Option<SearchCredentials>,
    ) -> Self {
        Self {
            client,
            provider,
            credentials,
        }
    }

    /// Build a pipeline backed by reqwest and Custom Search.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, reqwest::Error> {
        let client: Arc<dyn HttpClient> = Arc::new(
            ReqwestClient::builder()
                .timeout(config.http_timeout)
                .rate_limit_ms(config.rate_limit_ms)
                .build()?,
        );
        let provider = Arc::new(CustomSearchProvider::with_base_url(
            client.clone(),
            &config.search_base_url,
        ));
        Ok(Self::new(client, provider, config.credentials.clone()))
    }

    /// Acquire images for a product.
    pub async fn run(
        &self,
        product: &ProductDescriptor,
        options: &PipelineOptions,
    ) -> Result<PipelineResult, PipelineError> {
        let span = info_span!("acquire_images", sink = options.sink.name());
        self.run_inner(product, options).instrument(span).await
    }

    async fn run_inner(
        &self,
        product: &ProductDescriptor,
        options: &PipelineOptions,
    ) -> Result<PipelineResult, PipelineError> {
        let mut stage = PipelineStage::Start;
        tracing::debug!(?stage);
        options.validate()?;
        let cap = options.result_cap();

        let query = build_query(product);
        stage = PipelineStage::QueryBuilt;
        tracing::debug!(?stage, query = %query);

        let located = locate(
            self.provider.as_ref(),
            &query,
            cap,
            self.credentials.as_ref(),
        )
        .await;
        stage = match located.outcome {
            LocateOutcome::Disabled => PipelineStage::ProviderUnconfigured,
            LocateOutcome::Candidates(_) => PipelineStage::Located,
        };
        tracing::debug!(?stage, candidates = located.outcome.candidates().len());

        let mut result = PipelineResult {
            logs: located.logs,
            ..Default::default()
        };

        let mut candidates = located.outcome.into_candidates();
        candidates.truncate(cap);
        let outcomes = self.materialize_all(candidates, product, options).await?;
        stage = PipelineStage::MaterializedAll;
        tracing::debug!(?stage);

        for (candidate, outcome) in outcomes {
            match outcome {
                Ok(asset) => {
                    if let Some(file) = asset.file {
                        result.files.push(file);
                    }
                    result.urls.push(asset.url);
                }
                Err(e) => {
                    tracing::warn!(rank = candidate.rank, url = %candidate.url, error = %e, "image skipped");
                    let failed = FailedCandidate {
                        rank: candidate.rank,
                        url: candidate.url,
                        stage: e.stage().to_string(),
                        error: e.to_string(),
                    };
                    result.logs.push(failed.log_line());
                    result.failures.push(failed);
                }
            }
        }

        stage = PipelineStage::Done;
        tracing::debug!(?stage, acquired = result.urls.len(), failed = result.failures.len());
        Ok(result)
    }

    /// Materialize candidates with bounded parallelism. Results come back in rank
    /// order regardless of completion order.
    async fn materialize_all(
        &self,
        candidates: Vec<CandidateImage>,
        product: &ProductDescriptor,
        options: &PipelineOptions,
    ) -> Result<Vec<(CandidateImage, Result<MaterializedAsset, MaterializeError>)>, PipelineError>
    {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let concurrency = options.concurrency.unwrap_or(candidates.len()).max(1);
        let product = Arc::new(product.clone());
        let mut tasks = JoinSet::new();
        let mut outcomes = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let client = self.client.clone();
            let sink = options.sink.clone();
            let product = product.clone();
            let timeout = options.candidate_timeout;
            let span = info_span!("materialize", rank = candidate.rank);

            tasks.spawn(
                async move {
                    let work = materialize(client.as_ref(), &candidate, &sink, &product);
                    let outcome = match timeout {
                        Some(limit) => match tokio::time::timeout(limit, work).await {
                            Ok(outcome) => outcome,
                            Err(_) => Err(MaterializeError::Download(format!(
                                "timed out after {}ms",
                                limit.as_millis()
                            ))),
                        },
                        None => work.await,
                    };
                    (candidate, outcome)
                }
                .instrument(span),
            );

            // Limit concurrency
            if tasks.len() >= concurrency {
                if let Some(joined) = tasks.join_next().await {
                    outcomes.push(joined.map_err(|e| PipelineError::TaskFailed(e.to_string()))?);
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.map_err(|e| PipelineError::TaskFailed(e.to_string()))?);
        }

        outcomes.sort_by_key(|(candidate, _)| candidate.rank);
        Ok(outcomes)
    }
}
