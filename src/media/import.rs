/// Folder import: one folder of photos becomes one walk
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

use super::metadata::{read_metadata, PhotoMetadata};
use super::thumbnail::generate_thumbnail;
use crate::error::Result;
use crate::state::library::{Library, NewPhoto};
use crate::state::route::{split_at_gaps, TrackPoint};

/// Result of a folder import operation
#[derive(Debug, Clone, PartialEq)]
pub struct ImportResult {
    /// The walk created for the folder, None if nothing new was found
    pub walk_id: Option<i64>,
    pub imported_count: usize,
    pub skipped_count: usize,
}

/// Supported photo extensions
const PHOTO_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Photos further apart in time than this start a new leg of the route
const ROUTE_GAP: Duration = Duration::from_secs(30 * 60);

/// Import a folder in a background thread
///
/// The UI keeps its catalog connection, so the import opens its own
/// connection to the same file.
pub async fn import_folder_async(
    folder: PathBuf,
    db_path: PathBuf,
    thumbnail_dir: PathBuf,
) -> std::result::Result<ImportResult, String> {
    tokio::task::spawn_blocking(move || {
        let library = Library::open(&db_path)?;
        import_folder(&folder, &library, &thumbnail_dir)
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
    .map_err(|e| e.to_string())
}

/// Import every photo under `folder` as a new walk
///
/// The walk is named after the folder and dated by its earliest photo. Its
/// route joins the geotagged photos in the order they were taken, broken
/// into legs where the photographer paused for longer than `ROUTE_GAP`.
/// Catalog writes happen in one transaction, so a failure leaves no
/// half-imported walk behind.
pub fn import_folder(folder: &Path, library: &Library, thumbnail_dir: &Path) -> Result<ImportResult> {
    log::info!("🔍 Scanning folder: {}", folder.display());

    let mut photos: Vec<(PathBuf, PhotoMetadata)> = find_photos(folder)
        .into_iter()
        .map(|path| {
            let metadata = read_metadata(&path).unwrap_or_else(|e| {
                log::warn!("⚠️  No metadata for {}: {}", path.display(), e);
                PhotoMetadata::default()
            });
            (path, metadata)
        })
        .collect();

    if photos.is_empty() {
        log::info!("No photos found in {}", folder.display());
        return Ok(ImportResult {
            walk_id: None,
            imported_count: 0,
            skipped_count: 0,
        });
    }

    photos.sort_by(|(a_path, a), (b_path, b)| {
        (a.timestamp_ms.is_none(), a.timestamp_ms, a_path).cmp(&(b.timestamp_ms.is_none(), b.timestamp_ms, b_path))
    });

    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "Imported walk".to_string());
    let date = photos
        .iter()
        .filter_map(|(_, metadata)| metadata.timestamp_ms)
        .min()
        .map(|ms| ms / 1000)
        .unwrap_or_else(|| chrono::Utc::now().timestamp());

    library.in_transaction(|| {
        let walk_id = library.insert_walk(&name, date, None)?;

        let mut imported_count = 0;
        let mut skipped_count = 0;
        let mut track = Vec::new();

        for (path, metadata) in &photos {
            let photo = NewPhoto {
                url: path.to_string_lossy().to_string(),
                thumbnail_url: None,
                description: metadata.description.clone(),
                latitude: metadata.latitude,
                longitude: metadata.longitude,
                timestamp_ms: metadata.timestamp_ms,
            };

            let Some(photo_id) = library.insert_photo(walk_id, &photo)? else {
                skipped_count += 1;
                continue;
            };
            imported_count += 1;

            match generate_thumbnail(path, photo_id, thumbnail_dir) {
                Ok(thumb) => library.set_thumbnail(photo_id, &thumb.to_string_lossy())?,
                Err(e) => log::warn!("⚠️  Thumbnail failed for {}: {}", path.display(), e),
            }

            if let (Some(latitude), Some(longitude)) = (metadata.latitude, metadata.longitude) {
                track.push(TrackPoint {
                    latitude,
                    longitude,
                    timestamp_ms: metadata.timestamp_ms,
                });
            }
        }

        if imported_count == 0 {
            library.delete_walk(walk_id)?;
            log::info!("✅ Nothing new in {}: {} skipped", folder.display(), skipped_count);
            return Ok(ImportResult {
                walk_id: None,
                imported_count,
                skipped_count,
            });
        }

        let legs = split_at_gaps(&track, ROUTE_GAP);
        if !legs.is_empty() {
            library.set_walk_route(walk_id, &legs)?;
        }

        log::info!("✅ Import complete: {} new, {} skipped", imported_count, skipped_count);

        Ok(ImportResult {
            walk_id: Some(walk_id),
            imported_count,
            skipped_count,
        })
    })
}

fn find_photos(folder: &Path) -> Vec<PathBuf> {
    WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| PHOTO_EXTENSIONS.contains(&ext.as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_photo(path: &Path) {
        image::RgbImage::new(32, 16).save(path).unwrap();
    }

    #[test]
    fn test_import_creates_walk_with_thumbnails() {
        let root = tempfile::tempdir().unwrap();
        let folder = root.path().join("Sunday loop");
        std::fs::create_dir_all(folder.join("nested")).unwrap();
        write_photo(&folder.join("a.png"));
        write_photo(&folder.join("nested").join("b.png"));
        std::fs::write(folder.join("notes.txt"), "not a photo").unwrap();

        let library = Library::open_in_memory().unwrap();
        let thumbs = root.path().join("thumbs");
        let result = import_folder(&folder, &library, &thumbs).unwrap();

        assert_eq!(result.imported_count, 2);
        assert_eq!(result.skipped_count, 0);
        let walk_id = result.walk_id.unwrap();

        let walk = library.walk(walk_id).unwrap().unwrap();
        assert_eq!(walk.name, "Sunday loop");
        assert!(walk.path_geojson.is_none());

        let photos = library.walk_photos(walk_id).unwrap();
        assert_eq!(photos.len(), 2);
        assert!(photos
            .iter()
            .all(|p| p.thumbnail_url.as_deref().is_some_and(|t| Path::new(t).exists())));
    }

    #[test]
    fn test_reimport_skips_known_photos() {
        let root = tempfile::tempdir().unwrap();
        write_photo(&root.path().join("a.png"));

        let thumbs = tempfile::tempdir().unwrap();

        let library = Library::open_in_memory().unwrap();
        import_folder(root.path(), &library, thumbs.path()).unwrap();

        let again = import_folder(root.path(), &library, thumbs.path()).unwrap();
        assert_eq!(
            again,
            ImportResult {
                walk_id: None,
                imported_count: 0,
                skipped_count: 1,
            }
        );
        assert_eq!(library.walk_count().unwrap(), 1);
    }

    #[test]
    fn test_empty_folder_creates_nothing() {
        let root = tempfile::tempdir().unwrap();
        let library = Library::open_in_memory().unwrap();
        let result = import_folder(root.path(), &library, root.path()).unwrap();
        assert_eq!(result.walk_id, None);
        assert_eq!(library.walk_count().unwrap(), 0);
    }
}
