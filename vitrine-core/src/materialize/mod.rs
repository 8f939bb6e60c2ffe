//! Turning candidate images into durable addresses.
//!
//! A `SinkMode` picks one strategy per run:
//! - `PassThrough` returns the source URL untouched (no network)
//! - `LocalSave` downloads under the static-file root
//! - `RemoteUpload` hands the source URL to an asset store

mod local;
mod upload;

use std::fmt;
use std::sync::Arc;

use crate::error::{MaterializeError, PipelineError};
use crate::http::HttpClient;
use crate::types::{CandidateImage, MaterializedAsset, ProductDescriptor};

pub use local::{extension_from_url, LocalSaveTarget, DEFAULT_EXTENSION};
pub use upload::{
    AssetUploader, CloudinaryConfig, CloudinaryUploader, UploadedAsset,
    DEFAULT_CLOUDINARY_BASE_URL,
};

/// Folder used when the product has no category.
pub const DEFAULT_UPLOAD_FOLDER: &str = "products";

/// Upload destination for the remote-upload sink.
#[derive(Clone)]
pub struct RemoteUploadTarget {
    pub uploader: Arc<dyn AssetUploader>,
    /// Prefix for the per-category folder. May be empty.
    pub folder_root: String,
}

impl RemoteUploadTarget {
    pub fn new(uploader: Arc<dyn AssetUploader>, folder_root: &str) -> Self {
        Self {
            uploader,
            folder_root: folder_root.trim_matches('/').to_string(),
        }
    }

    /// Upload folder for a product category: `<root>/<category lowercased>`.
    pub fn folder_for(&self, category: Option<&str>) -> String {
        let leaf = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| DEFAULT_UPLOAD_FOLDER.to_string());

        if self.folder_root.is_empty() {
            leaf
        } else {
            format!("{}/{}", self.folder_root, leaf)
        }
    }
}

impl fmt::Debug for RemoteUploadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteUploadTarget")
            .field("folder_root", &self.folder_root)
            .finish_non_exhaustive()
    }
}

/// Where materialized images go.
#[derive(Debug, Clone, Default)]
pub enum SinkMode {
    #[default]
    PassThrough,
    LocalSave(LocalSaveTarget),
    RemoteUpload(RemoteUploadTarget),
}

impl SinkMode {
    pub fn name(&self) -> &'static str {
        match self {
            SinkMode::PassThrough => "pass-through",
            SinkMode::LocalSave(_) => "local-save",
            SinkMode::RemoteUpload(_) => "remote-upload",
        }
    }

    /// Check mode parameters before any work is done.
    pub fn validate(&self) -> Result<(), PipelineError> {
        match self {
            SinkMode::LocalSave(target) => target.validate(),
            SinkMode::PassThrough | SinkMode::RemoteUpload(_) => Ok(()),
        }
    }
}

/// Materialize a single candidate with the given sink.
pub async fn materialize(
    client: &dyn HttpClient,
    candidate: &CandidateImage,
    sink: &SinkMode,
    product: &ProductDescriptor,
) -> Result<MaterializedAsset, MaterializeError> {
    match sink {
        SinkMode::PassThrough => Ok(MaterializedAsset {
            url: candidate.url.clone(),
            rank: candidate.rank,
            file: None,
        }),
        SinkMode::LocalSave(target) => local::save_local(client, candidate, target).await,
        SinkMode::RemoteUpload(target) => {
            let folder = target.folder_for(product.category.as_deref());
            let uploaded = target
                .uploader
                .upload_from_url(&candidate.url, &folder)
                .await?;
            tracing::info!(rank = candidate.rank, folder = %folder, url = %uploaded.secure_url, "uploaded image");
            Ok(MaterializedAsset {
                url: uploaded.secure_url,
                rank: candidate.rank,
                file: None,
            })
        }
    }
}
