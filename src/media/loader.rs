/// Background image loading
///
/// Photos are decoded on the blocking pool and handed to iced as RGBA
/// handles. Results are kept in an `ImageCache` keyed by location so the
/// carousel's preloads and the gallery's thumbnails are fetched once.
use iced::widget::image::Handle;
use image::imageops::FilterType;
use std::collections::HashMap;
use std::path::Path;
use tokio::task;

use crate::error::{GalleryError, Result};

/// Longest edge for full-screen photos; larger images are scaled down
pub const DISPLAY_MAX_EDGE: u32 = 2560;
/// Longest edge for grid and marker previews
pub const PREVIEW_MAX_EDGE: u32 = 256;

/// A decoded image ready to draw
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub handle: Handle,
    pub width: u32,
    pub height: u32,
}

/// Load an image without blocking the UI thread
///
/// Errors become strings so the result can travel inside a `Message`.
pub async fn load_image(source: String, max_edge: u32) -> std::result::Result<LoadedImage, String> {
    task::spawn_blocking(move || load_image_blocking(&source, max_edge))
        .await
        .map_err(|e| format!("Task join error: {}", e))?
        .map_err(|e| e.to_string())
}

/// Blocking implementation of image loading
pub fn load_image_blocking(source: &str, max_edge: u32) -> Result<LoadedImage> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return Err(GalleryError::UnsupportedSource(source.to_string()));
    }

    let img = image::open(Path::new(source))?;
    let img = if img.width() > max_edge || img.height() > max_edge {
        img.resize(max_edge, max_edge, FilterType::Triangle)
    } else {
        img
    };

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(LoadedImage {
        handle: Handle::from_rgba(width, height, rgba.into_raw()),
        width,
        height,
    })
}

/// Where an image is in its lifecycle
#[derive(Debug, Clone)]
pub enum ImageSlot {
    Loading,
    Ready(LoadedImage),
    /// Load failed; drawn as a broken-image placeholder
    Failed,
}

/// Decoded images keyed by their source location
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: HashMap<String, ImageSlot>,
}

impl ImageCache {
    /// Mark `source` as loading; returns false if it was already requested
    pub fn begin(&mut self, source: &str) -> bool {
        if self.entries.contains_key(source) {
            return false;
        }
        self.entries.insert(source.to_string(), ImageSlot::Loading);
        true
    }

    /// Store the outcome of a load started with `begin`
    ///
    /// Results for sources evicted while loading are dropped.
    pub fn finish(&mut self, source: String, result: std::result::Result<LoadedImage, String>) {
        let Some(entry) = self.entries.get_mut(&source) else {
            log::debug!("Dropping late image for evicted {}", source);
            return;
        };
        *entry = match result {
            Ok(image) => ImageSlot::Ready(image),
            Err(e) => {
                log::warn!("⚠️  Could not load {}: {}", source, e);
                ImageSlot::Failed
            }
        };
    }

    /// Keep only the sources `keep` accepts; decoded pixels of the rest are freed
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|source, _| keep(source));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, source: &str) -> Option<&ImageSlot> {
        self.entries.get(source)
    }

    pub fn ready(&self, source: &str) -> Option<&LoadedImage> {
        match self.entries.get(source) {
            Some(ImageSlot::Ready(image)) => Some(image),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
