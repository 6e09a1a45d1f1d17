use image::{imageops::FilterType, DynamicImage};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GalleryError, Result};

/// Longest edge of generated thumbnails
const THUMBNAIL_SIZE: u32 = 256;

/// Get the thumbnail cache directory
/// Returns ~/.cache/walk-gallery/thumbnails on Linux
pub fn thumbnail_cache_dir() -> Result<PathBuf> {
    let mut path = dirs::cache_dir()
        .or_else(dirs::home_dir)
        .ok_or(GalleryError::NoUserDirectory("cache"))?;

    path.push("walk-gallery");
    path.push("thumbnails");

    fs::create_dir_all(&path)?;
    Ok(path)
}

/// Expected thumbnail location for a photo ID (doesn't generate it)
pub fn thumbnail_path(cache_dir: &Path, photo_id: i64) -> PathBuf {
    cache_dir.join(format!("{}.jpg", photo_id))
}

/// Generate a thumbnail for a photo file
/// Returns the path to the saved JPEG
pub fn generate_thumbnail(source: &Path, photo_id: i64, cache_dir: &Path) -> Result<PathBuf> {
    let img = image::open(source)?;

    // Aspect ratio is kept, the longest edge becomes THUMBNAIL_SIZE
    let thumbnail = img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3);

    // JPEG has no alpha channel
    let thumbnail = DynamicImage::ImageRgb8(thumbnail.to_rgb8());

    fs::create_dir_all(cache_dir)?;
    let path = thumbnail_path(cache_dir, photo_id);
    thumbnail.save(&path)?;

    log::debug!("📸 Generated thumbnail: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_keeps_aspect_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("wide.png");
        image::RgbaImage::new(600, 300).save(&source).unwrap();

        let cache = dir.path().join("thumbs");
        let path = generate_thumbnail(&source, 42, &cache).unwrap();

        assert_eq!(path, thumbnail_path(&cache, 42));
        assert_eq!(image::image_dimensions(&path).unwrap(), (256, 128));
    }

    #[test]
    fn test_unreadable_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.jpg");
        std::fs::write(&source, b"definitely not a jpeg").unwrap();

        assert!(generate_thumbnail(&source, 1, dir.path()).is_err());
    }
}
