use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use super::data::{route_geojson, Photo, Walk};
use super::route::route_distance_km;
use crate::error::{GalleryError, Result};

/// The Library manages the SQLite walk catalog.
/// It stores walks, their routes and the photos taken along them.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

/// A photo waiting to be written to the catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPhoto {
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timestamp_ms: Option<i64>,
}

const WALK_COLUMNS: &str = "id, name, date, description, path_geojson, distance_km";
const PHOTO_COLUMNS: &str =
    "id, url, thumbnail_url, description, latitude, longitude, timestamp_ms";

impl Library {
    /// Open the catalog in the user's data directory, creating it if needed.
    ///
    /// - Linux: ~/.local/share/walk-gallery/walk_gallery.db
    /// - macOS: ~/Library/Application Support/walk-gallery/walk_gallery.db
    /// - Windows: %APPDATA%\walk-gallery\walk_gallery.db
    pub fn open_default() -> Result<Self> {
        Self::open(&Self::default_db_path()?)
    }

    /// Open or create the catalog at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        log::info!("📁 Catalog opened at: {}", db_path.display());

        let mut library = Library {
            conn,
            db_path: db_path.to_path_buf(),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Throwaway catalog for tests
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let mut library = Library {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Get the path where the catalog should be stored
    fn default_db_path() -> Result<PathBuf> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(GalleryError::NoUserDirectory("data"))?;

        path.push("walk-gallery");
        path.push("walk_gallery.db");
        Ok(path)
    }

    /// Create all tables and indexes if they don't exist
    fn init_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS walks (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                date            INTEGER NOT NULL,
                description     TEXT,
                path_geojson    TEXT,
                distance_km     REAL NOT NULL DEFAULT 0,
                created_at      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS photos (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                walk_id         INTEGER NOT NULL,
                url             TEXT NOT NULL UNIQUE,
                thumbnail_url   TEXT,
                description     TEXT,
                latitude        REAL,
                longitude       REAL,
                timestamp_ms    INTEGER,
                FOREIGN KEY(walk_id) REFERENCES walks(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_walks_date ON walks(date DESC);
            CREATE INDEX IF NOT EXISTS idx_photos_walk_id ON photos(walk_id);",
        )?;

        // Catalogs created before distances were tracked
        if !self.has_column("walks", "distance_km")? {
            self.conn.execute_batch(
                "ALTER TABLE walks ADD COLUMN distance_km REAL NOT NULL DEFAULT 0;",
            )?;
            log::info!("📐 Added distance column to an older catalog");
        }

        log::debug!("✅ Catalog schema initialized");
        Ok(())
    }

    fn has_column(&self, table: &str, column: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names.iter().any(|name| name == column))
    }

    /// Run `work` in one transaction: all of its writes land, or none do
    pub fn in_transaction<T>(&self, work: impl FnOnce() -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = work()?;
        tx.commit()?;
        Ok(value)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    #[cfg(test)]
    pub fn walk_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM walks", [], |row| row.get(0))?)
    }

    /// Insert a walk and return its ID
    pub fn insert_walk(&self, name: &str, date: i64, description: Option<&str>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO walks (name, date, description, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, date, description, chrono::Utc::now().timestamp()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Replace a walk's route and recompute its distance
    pub fn set_walk_route(&self, walk_id: i64, segments: &[Vec<(f64, f64)>]) -> Result<()> {
        let distance_km = route_distance_km(segments);
        self.conn.execute(
            "UPDATE walks SET path_geojson = ?1, distance_km = ?2 WHERE id = ?3",
            params![route_geojson(segments), distance_km, walk_id],
        )?;
        Ok(())
    }

    /// Attach a photo to a walk
    ///
    /// Returns the new ID, or None if a photo with the same url is already
    /// in the catalog.
    pub fn insert_photo(&self, walk_id: i64, photo: &NewPhoto) -> Result<Option<i64>> {
        let result = self.conn.execute(
            "INSERT INTO photos
                (walk_id, url, thumbnail_url, description, latitude, longitude, timestamp_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                walk_id,
                photo.url,
                photo.thumbnail_url,
                photo.description,
                photo.latitude,
                photo.longitude,
                photo.timestamp_ms,
            ],
        );

        match result {
            Ok(_) => Ok(Some(self.conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation
                    && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record a generated thumbnail for a photo
    pub fn set_thumbnail(&self, photo_id: i64, thumbnail_url: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE photos SET thumbnail_url = ?1 WHERE id = ?2",
            params![thumbnail_url, photo_id],
        )?;
        Ok(())
    }

    /// All walks, newest first
    pub fn all_walks(&self) -> Result<Vec<Walk>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WALK_COLUMNS} FROM walks ORDER BY date DESC, id DESC"
        ))?;

        let walks = stmt
            .query_map([], walk_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(walks)
    }

    pub fn walk(&self, walk_id: i64) -> Result<Option<Walk>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {WALK_COLUMNS} FROM walks WHERE id = ?1"),
                [walk_id],
                walk_from_row,
            )
            .optional()?)
    }

    /// Photos of a walk in the order they were taken
    ///
    /// Photos without a capture time go last, in import order.
    pub fn walk_photos(&self, walk_id: i64) -> Result<Vec<Photo>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE walk_id = ?1
             ORDER BY timestamp_ms IS NULL, timestamp_ms, id"
        ))?;

        let photos = stmt
            .query_map([walk_id], photo_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(photos)
    }

    /// Delete a walk and, through the cascade, its photos
    pub fn delete_walk(&self, walk_id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM walks WHERE id = ?1", [walk_id])?;
        Ok(deleted > 0)
    }

    /// Drop photos whose image file no longer exists on disk
    pub fn verify_photos(&self) -> Result<usize> {
        let mut stmt = self.conn.prepare("SELECT id, url FROM photos")?;
        let photos: Vec<(i64, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .filter_map(|r| r.ok())
            .collect();

        let mut removed = 0;
        for (id, url) in photos {
            if !Path::new(&url).exists() {
                self.conn.execute("DELETE FROM photos WHERE id = ?1", [id])?;
                removed += 1;
            }
        }

        if removed > 0 {
            log::warn!("⚠️  Removed {} photos whose files are gone", removed);
        }

        Ok(removed)
    }
}

fn walk_from_row(row: &Row<'_>) -> rusqlite::Result<Walk> {
    Ok(Walk {
        id: row.get(0)?,
        name: row.get(1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        path_geojson: row.get(4)?,
        distance_km: row.get(5)?,
    })
}

fn photo_from_row(row: &Row<'_>) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: row.get(0)?,
        url: row.get(1)?,
        thumbnail_url: row.get(2)?,
        description: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        timestamp_ms: row.get(6)?,
    })
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}
