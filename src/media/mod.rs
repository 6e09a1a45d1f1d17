/// Photo media module
///
/// This module handles:
/// - Reading GPS position and capture time from EXIF
/// - Generating gallery thumbnails
/// - Loading images in the background for display and preloading
/// - Importing a folder of photos as a new walk

pub mod metadata;
pub mod import;
pub mod loader;
pub mod thumbnail;
