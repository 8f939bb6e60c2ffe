use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("HTTP request failed: {0}")]
    RequestFailed(reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

// reqwest puts the full URL (query string included) in its error text, and
// search URLs carry the API key.
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::RequestFailed(err.without_url())
    }
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(#[from] FetchError),

    #[error("Malformed search response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Upload request failed: {0}")]
    Request(reqwest::Error),

    #[error("Upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed upload response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::Request(err.without_url())
    }
}

/// Failure to materialize a single candidate. Never aborts sibling candidates.
#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("fetch status {status}")]
    FetchStatus { status: u16 },

    #[error("download failure: {0}")]
    Download(String),

    #[error("upload failure: {0}")]
    Upload(#[from] UploadError),
}

impl MaterializeError {
    /// Short stage name used in diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            MaterializeError::FetchStatus { .. } => "fetch",
            MaterializeError::Download(_) => "download",
            MaterializeError::Upload(_) => "upload",
        }
    }
}

impl From<FetchError> for MaterializeError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status(status) => MaterializeError::FetchStatus { status },
            other => MaterializeError::Download(other.to_string()),
        }
    }
}

/// Errors that abort a pipeline run. Expected failures never end up here.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("Materialization task failed: {0}")]
    TaskFailed(String),
}
