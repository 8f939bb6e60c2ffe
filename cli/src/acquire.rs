//! `vitrine acquire`: run the image pipeline once for a product.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use vitrine_core::http::sanitize_for_filesystem;
use vitrine_core::{
    CloudinaryUploader, ImagePipeline, LocalSaveTarget, PipelineConfig, PipelineOptions,
    ProductDescriptor, RemoteUploadTarget, SinkMode,
};

#[derive(Args, Debug)]
pub struct ProductArgs {
    #[arg(long)]
    pub brand: Option<String>,
    /// Model number or SKU
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub size: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
}

impl ProductArgs {
    pub fn descriptor(&self) -> ProductDescriptor {
        ProductDescriptor {
            brand: self.brand.clone(),
            model: self.model.clone(),
            color: self.color.clone(),
            size: self.size.clone(),
            category: self.category.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SinkKind {
    /// Return the provider's URLs unchanged
    PassThrough,
    /// Download under the static root
    Local,
    /// Upload to Cloudinary by URL
    Upload,
}

#[derive(Args, Debug)]
pub struct AcquireArgs {
    #[command(flatten)]
    pub product: ProductArgs,

    /// Number of images to acquire (1-10, default from VITRINE_MAX_RESULTS or 4)
    #[arg(long)]
    pub max_results: Option<usize>,

    #[arg(long, value_enum, default_value = "pass-through")]
    pub sink: SinkKind,

    /// Directory under the static root for --sink local
    #[arg(long, default_value = "uploads/products")]
    pub dir: PathBuf,

    /// Static-file root for --sink local (default from VITRINE_STATIC_ROOT)
    #[arg(long)]
    pub static_root: Option<PathBuf>,

    /// File name stem for --sink local (default: model, name or "product")
    #[arg(long)]
    pub base_name: Option<String>,

    /// Folder prefix for --sink upload
    #[arg(long, default_value = "")]
    pub folder_root: String,

    /// Parallel downloads/uploads
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-image time limit in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

pub async fn acquire(args: AcquireArgs) -> Result<()> {
    let config = PipelineConfig::from_env().context("Failed to load configuration")?;
    if config.credentials.is_none() {
        tracing::warn!("VITRINE_SEARCH_API_KEY/VITRINE_SEARCH_ENGINE_ID not set; search is disabled");
    }

    let product = args.product.descriptor();
    let sink = build_sink(&args, &config, &product)?;

    let options = PipelineOptions {
        max_results: args.max_results.unwrap_or(config.max_results),
        sink,
        concurrency: args.concurrency.or(config.concurrency),
        candidate_timeout: args.timeout_secs.map(Duration::from_secs),
    };

    let pipeline = ImagePipeline::from_config(&config).context("Failed to build HTTP client")?;
    let result = pipeline.run(&product, &options).await?;

    tracing::info!(
        acquired = result.urls.len(),
        failed = result.failures.len(),
        "done"
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

fn build_sink(
    args: &AcquireArgs,
    config: &PipelineConfig,
    product: &ProductDescriptor,
) -> Result<SinkMode> {
    let sink = match args.sink {
        SinkKind::PassThrough => SinkMode::PassThrough,
        SinkKind::Local => {
            let static_root = args
                .static_root
                .clone()
                .unwrap_or_else(|| config.static_root.clone());
            let base_name = args
                .base_name
                .clone()
                .or_else(|| product.model.clone())
                .or_else(|| product.name.clone())
                .filter(|b| !sanitize_for_filesystem(b).is_empty())
                .unwrap_or_else(|| "product".to_string());
            SinkMode::LocalSave(LocalSaveTarget::new(
                static_root,
                args.dir.clone(),
                &base_name.to_lowercase(),
            ))
        }
        SinkKind::Upload => {
            let Some(cloudinary) = config.cloudinary.clone() else {
                bail!("--sink upload needs CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET");
            };
            let uploader = CloudinaryUploader::new(cloudinary, config.http_timeout)
                .context("Failed to build upload client")?;
            SinkMode::RemoteUpload(RemoteUploadTarget::new(
                Arc::new(uploader),
                &args.folder_root,
            ))
        }
    };
    Ok(sink)
}
