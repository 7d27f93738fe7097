//! Storage for uploaded images and videos. Posts only ever hold the returned reference.

use std::path::{Path, PathBuf};

use axum::async_trait;
use axum::body::Bytes;
use axum::http::StatusCode;
use chrono::Utc;
use circle_common::{Media, MediaKind};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const UPLOADS_ROUTE: &str = "/uploads";

const IMAGE_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "gif"];
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "mkv"];

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("File too large. Maximum size is {}MB.", .0 / (1024 * 1024))]
    TooLarge(usize),
    #[error("Only images and videos are allowed!")]
    UnsupportedType,
    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn status(&self) -> StatusCode {
        match self {
            MediaError::TooLarge(_) | MediaError::UnsupportedType => StatusCode::BAD_REQUEST,
            MediaError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A file as it arrived in the request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store(&self, upload: Upload) -> Result<Media, MediaError>;

    /// Removes media that ended up unused, e.g. because the post it was meant for was refused.
    async fn discard(&self, media: &Media) -> Result<(), MediaError>;
}

pub struct DiskMediaStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl DiskMediaStore {
    pub async fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Result<Self, MediaError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir, max_bytes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl MediaStore for DiskMediaStore {
    async fn store(&self, upload: Upload) -> Result<Media, MediaError> {
        if upload.bytes.len() > self.max_bytes {
            return Err(MediaError::TooLarge(self.max_bytes));
        }
        let (extension, kind) = classify(&upload)?;
        let name = format!(
            "{}-{}.{extension}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        );
        tokio::fs::write(self.dir.join(&name), &upload.bytes).await?;
        info!(file = %name, bytes = upload.bytes.len(), "stored upload");
        Ok(Media {
            url: format!("{UPLOADS_ROUTE}/{name}"),
            kind,
        })
    }

    async fn discard(&self, media: &Media) -> Result<(), MediaError> {
        let Some(name) = media.url.strip_prefix(&format!("{UPLOADS_ROUTE}/")) else {
            warn!(url = %media.url, "not an upload of this store, leaving it alone");
            return Ok(());
        };
        if name.contains(['/', '\\']) || name.starts_with('.') {
            return Ok(());
        }
        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The lowercased extension and the kind of media, or an error when it is neither image nor video.
fn classify(upload: &Upload) -> Result<(String, MediaKind), MediaError> {
    let extension = Path::new(&upload.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or(MediaError::UnsupportedType)?;

    let by_extension = if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        MediaKind::Image
    } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        MediaKind::Video
    } else {
        return Err(MediaError::UnsupportedType);
    };

    let kind = match upload.content_type.as_deref().map(str::to_ascii_lowercase) {
        None => by_extension,
        Some(mime) if mime == "application/octet-stream" => by_extension,
        Some(mime) if mime.starts_with("image/") => MediaKind::Image,
        Some(mime) if mime.starts_with("video/") => MediaKind::Video,
        Some(_) => return Err(MediaError::UnsupportedType),
    };
    Ok((extension, kind))
}
