/// User settings stored as JSON
///
/// Holds the carousel feel constants and map preferences. The file lives in
/// the user's config directory:
/// - Linux: ~/.config/walk-gallery/settings.json
/// - macOS: ~/Library/Application Support/walk-gallery/settings.json
/// - Windows: %APPDATA%\walk-gallery\settings.json
///
/// Missing fields take their defaults, so older files keep loading.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::carousel::CarouselConfig;
use crate::error::{GalleryError, Result};

/// Zoom the map jumps to when it follows a photo
pub const DEFAULT_PHOTO_ZOOM: f64 = 15.0;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Gesture thresholds and animation timing for the photo carousel
    pub carousel: CarouselConfig,
    /// Map zoom level used when following the carousel
    pub photo_zoom: f64,
    /// Show photo markers on the map
    pub show_markers: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            carousel: CarouselConfig::default(),
            photo_zoom: DEFAULT_PHOTO_ZOOM,
            show_markers: true,
        }
    }
}

impl Settings {
    /// Convert to a JSON string for storage
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Default settings file location
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or(GalleryError::NoUserDirectory("config"))?;

        path.push("walk-gallery");
        path.push("settings.json");
        Ok(path)
    }

    /// Load settings from `path`, falling back to defaults
    ///
    /// A missing file is normal on first run. An unreadable one is logged
    /// and replaced by defaults rather than stopping the app.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("⚙️  Settings loaded from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("⚠️  Ignoring invalid settings file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("⚠️  Could not read settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings to `path`, creating the parent directory
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
