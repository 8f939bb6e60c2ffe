//! Product image acquisition for catalog items that have no photos.
//!
//! A product's attributes become a search query, the query goes to an image
//! search provider, and the ranked results are materialized into a sink.

pub mod config;
pub mod error;
pub mod http;
pub mod materialize;
pub mod pipeline;
pub mod query;
pub mod search;
pub mod types;

pub use config::{ConfigError, PipelineConfig, DEFAULT_MAX_RESULTS};
pub use error::{FetchError, MaterializeError, PipelineError, SearchError, UploadError};
pub use http::{HttpClient, MockClient, MockResponse, ReqwestClient, ReqwestClientBuilder};
pub use materialize::{
    materialize, AssetUploader, CloudinaryConfig, CloudinaryUploader, LocalSaveTarget,
    RemoteUploadTarget, SinkMode, UploadedAsset,
};
pub use pipeline::{ImagePipeline, PipelineOptions, PipelineStage};
pub use query::{build_query, HINT_SUFFIX};
pub use search::{
    locate, CustomSearchProvider, ImageSearchProvider, Located, SearchCredentials, SearchHit,
    SearchRequest, PROVIDER_HARD_CAP,
};
pub use types::{
    CandidateImage, FailedCandidate, LocateOutcome, MaterializedAsset, PipelineResult,
    ProductDescriptor,
};
