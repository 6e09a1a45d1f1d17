/// Error types shared by the catalog, settings and media modules
///
/// The carousel itself never fails (it clamps instead), so everything here
/// belongs to the ambient layers: SQLite, the filesystem, JSON and images.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),

    #[error("could not determine the user {0} directory")]
    NoUserDirectory(&'static str),

    #[error("unsupported image source: {0}")]
    UnsupportedSource(String),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, GalleryError>;
