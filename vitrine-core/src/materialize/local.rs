//! Local-save sink: downloads candidates under the static-file root.

use std::path::{Component, Path, PathBuf};
use url::Url;

use crate::error::{MaterializeError, PipelineError};
use crate::http::{sanitize_for_filesystem, HttpClient};
use crate::types::{CandidateImage, MaterializedAsset};

/// Extension used when the source URL doesn't carry a usable one.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Where local-save writes files.
///
/// Files land in `static_root/subdir`, and the returned URL is the file's path
/// relative to `static_root`, so it resolves against whatever serves that root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSaveTarget {
    pub static_root: PathBuf,
    /// Relative directory under `static_root`, e.g. `uploads/products`.
    pub subdir: PathBuf,
    /// File name stem; files are named `<base_name>-<rank>.<ext>`.
    pub base_name: String,
}

impl LocalSaveTarget {
    pub fn new(
        static_root: impl Into<PathBuf>,
        subdir: impl Into<PathBuf>,
        base_name: &str,
    ) -> Self {
        Self {
            static_root: static_root.into(),
            subdir: subdir.into(),
            base_name: base_name.to_string(),
        }
    }

    /// Check the target can produce site-relative URLs.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if sanitize_for_filesystem(&self.base_name).is_empty() {
            return Err(PipelineError::InvalidConfig(
                "local-save base name is empty".to_string(),
            ));
        }
        let escapes_root = self
            .subdir
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes_root {
            return Err(PipelineError::InvalidConfig(format!(
                "local-save directory {} must be relative to the static root without '..'",
                self.subdir.display()
            )));
        }
        Ok(())
    }

    /// Directory files are written to.
    pub fn dir(&self) -> PathBuf {
        self.static_root.join(&self.subdir)
    }

    /// File path for the candidate at `rank`.
    pub fn file_path(&self, rank: usize, source_url: &str) -> PathBuf {
        self.dir().join(format!(
            "{}-{}.{}",
            sanitize_for_filesystem(&self.base_name),
            rank,
            extension_from_url(source_url)
        ))
    }

    /// Site-root-relative URL for a file written under this target.
    pub fn relative_url(&self, file: &Path) -> String {
        let relative = file.strip_prefix(&self.static_root).unwrap_or(file);
        let normalized = relative.to_string_lossy().replace('\\', "/");
        format!("/{}", normalized.trim_start_matches('/').trim_start_matches("./"))
    }
}

/// Extension from the last path segment of a URL, lowercased. Falls back to
/// `DEFAULT_EXTENSION` when missing or implausible.
pub fn extension_from_url(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => return DEFAULT_EXTENSION.to_string(),
    };
    let segment = path.rsplit('/').next().unwrap_or("");

    match segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// Download one candidate into the target directory.
pub(crate) async fn save_local(
    client: &dyn HttpClient,
    candidate: &CandidateImage,
    target: &LocalSaveTarget,
) -> Result<MaterializedAsset, MaterializeError> {
    let dir = target.dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| MaterializeError::Download(format!("create {}: {}", dir.display(), e)))?;

    let path = target.file_path(candidate.rank, &candidate.url);
    client.download_to(&candidate.url, &path).await?;

    let url = target.relative_url(&path);
    tracing::info!(rank = candidate.rank, path = %path.display(), "saved image");

    Ok(MaterializedAsset {
        url,
        rank: candidate.rank,
        file: Some(path.to_string_lossy().into_owned()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_url() {
        assert_eq!(extension_from_url("https://a.test/img/photo.PNG"), "png");
        assert_eq!(extension_from_url("https://a.test/img/photo.webp?w=400#x"), "webp");
        assert_eq!(extension_from_url("https://a.test/img/photo"), "jpg");
        assert_eq!(extension_from_url("https://a.test/"), "jpg");
        assert_eq!(extension_from_url("https://a.test/v1.2/photo"), "jpg");
        assert_eq!(extension_from_url("https://a.test/img/.hidden"), "jpg");
        assert_eq!(extension_from_url("https://a.test/img/x.toolongext"), "jpg");
        assert_eq!(extension_from_url("not a url"), "jpg");
    }

    #[test]
    fn test_file_path_and_relative_url() {
        let target = LocalSaveTarget::new("/srv/public", "uploads/products", "acme x100");
        let path = target.file_path(3, "https://a.test/p.gif");
        assert_eq!(path, PathBuf::from("/srv/public/uploads/products/acme-x100-3.gif"));
        assert_eq!(target.relative_url(&path), "/uploads/products/acme-x100-3.gif");
    }

    #[test]
    fn test_relative_url_normalizes_backslashes() {
        let target = LocalSaveTarget::new("root", "", "p");
        assert_eq!(
            target.relative_url(Path::new("root/uploads\\p-1.jpg")),
            "/uploads/p-1.jpg"
        );
    }

    #[test]
    fn test_validate() {
        assert!(LocalSaveTarget::new("/srv", "uploads", "p").validate().is_ok());
        assert!(LocalSaveTarget::new("/srv", "./uploads", "p").validate().is_ok());
        assert!(LocalSaveTarget::new("/srv", "../etc", "p").validate().is_err());
        assert!(LocalSaveTarget::new("/srv", "/abs", "p").validate().is_err());
        assert!(LocalSaveTarget::new("/srv", "uploads", "  ").validate().is_err());
    }
}
