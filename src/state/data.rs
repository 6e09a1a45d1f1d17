/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the catalog layer, the carousel and the UI layer.
use serde::Deserialize;

/// A single photo attached to a walk
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    /// Unique catalog ID
    pub id: i64,
    /// Full-size image location (a local file path)
    pub url: String,
    /// Small preview for the gallery grid and map markers
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp_ms: Option<i64>,
}

impl Photo {
    /// Both coordinates, or None if either one is missing
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    /// The image to show in small slots, falling back to the full image
    pub fn preview_url(&self) -> &str {
        self.thumbnail_url.as_deref().unwrap_or(&self.url)
    }

    /// Caption text, empty when the photo has none
    pub fn caption(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
impl Photo {
    /// Create a photo with only an id and a location
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            thumbnail_url: None,
            description: None,
            latitude: None,
            longitude: None,
            timestamp_ms: None,
        }
    }

    /// Set the GPS position
    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A recorded walk
#[derive(Debug, Clone, PartialEq)]
pub struct Walk {
    pub id: i64,
    pub name: String,
    /// Walk date as Unix seconds
    pub date: i64,
    pub description: Option<String>,
    /// GeoJSON geometry of the route: a LineString, or a MultiLineString
    /// when the walk had breaks
    pub path_geojson: Option<String>,
    /// Walked distance along the route
    pub distance_km: f64,
}

impl Walk {
    /// Route legs as (latitude, longitude) pairs
    ///
    /// GeoJSON stores positions as [longitude, latitude]; geometries other
    /// than (Multi)LineString yield no route.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let Some(json) = self.path_geojson.as_deref() else {
            return Vec::new();
        };

        let lines = match serde_json::from_str::<Geometry>(json) {
            Ok(Geometry::LineString { coordinates }) => vec![coordinates],
            Ok(Geometry::MultiLineString { coordinates }) => coordinates,
            Ok(Geometry::Other) => Vec::new(),
            Err(e) => {
                log::warn!("⚠️  Walk {} has an unreadable route: {}", self.id, e);
                Vec::new()
            }
        };

        lines
            .into_iter()
            .map(|line| {
                line.into_iter()
                    .filter(|position| position.len() >= 2)
                    .map(|position| (position[1], position[0]))
                    .collect::<Vec<_>>()
            })
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Human readable walk date
    pub fn date_label(&self) -> String {
        chrono::DateTime::from_timestamp(self.date, 0)
            .map(|date| date.format("%d %B %Y").to_string())
            .unwrap_or_default()
    }

    /// Sidebar subtitle, e.g. "12 May 2024 — 4.25 km"
    pub fn summary(&self) -> String {
        format!("{} — {:.2} km", self.date_label(), self.distance_km)
    }
}

/// Order of the walk list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkSort {
    #[default]
    NewestFirst,
    OldestFirst,
    LongestFirst,
    ShortestFirst,
}

impl WalkSort {
    pub const ALL: [WalkSort; 4] = [
        WalkSort::NewestFirst,
        WalkSort::OldestFirst,
        WalkSort::LongestFirst,
        WalkSort::ShortestFirst,
    ];

    /// Reorder `walks` in place; ties keep their catalog order
    pub fn apply(self, walks: &mut [Walk]) {
        match self {
            WalkSort::NewestFirst => walks.sort_by(|a, b| b.date.cmp(&a.date)),
            WalkSort::OldestFirst => walks.sort_by(|a, b| a.date.cmp(&b.date)),
            WalkSort::LongestFirst => walks.sort_by(|a, b| b.distance_km.total_cmp(&a.distance_km)),
            WalkSort::ShortestFirst => walks.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km)),
        }
    }
}

impl std::fmt::Display for WalkSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WalkSort::NewestFirst => "Newest first",
            WalkSort::OldestFirst => "Oldest first",
            WalkSort::LongestFirst => "Longest first",
            WalkSort::ShortestFirst => "Shortest first",
        };
        f.write_str(label)
    }
}

/// Totals over the whole catalog
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WalkStats {
    pub total_walks: usize,
    pub total_km: f64,
}

impl WalkStats {
    pub fn from_walks(walks: &[Walk]) -> Self {
        Self {
            total_walks: walks.len(),
            total_km: walks.iter().map(|walk| walk.distance_km).sum(),
        }
    }
}

/// GeoJSON for route legs of (latitude, longitude) points
///
/// One leg becomes a LineString, several a MultiLineString. No legs, no
/// geometry.
pub fn route_geojson(segments: &[Vec<(f64, f64)>]) -> Option<String> {
    let lines: Vec<Vec<[f64; 2]>> = segments
        .iter()
        .map(|leg| leg.iter().map(|&(lat, lon)| [lon, lat]).collect())
        .collect();

    let geometry = match lines.as_slice() {
        [] => return None,
        [line] => serde_json::json!({ "type": "LineString", "coordinates": line }),
        _ => serde_json::json!({ "type": "MultiLineString", "coordinates": lines }),
    };
    Some(geometry.to_string())
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    LineString { coordinates: Vec<Vec<f64>> },
    MultiLineString { coordinates: Vec<Vec<Vec<f64>>> },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(path: Option<&str>) -> Walk {
        Walk {
            id: 1,
            name: "Park loop".into(),
            date: 1_700_000_000,
            description: None,
            path_geojson: path.map(str::to_string),
            distance_km: 0.0,
        }
    }

    fn dated(id: i64, date: i64, distance_km: f64) -> Walk {
        Walk {
            id,
            date,
            distance_km,
            ..walk(None)
        }
    }

    #[test]
    fn test_route_swaps_geojson_order() {
        let w = walk(Some(r#"{"type":"LineString","coordinates":[[37.6,55.7],[37.7,55.8]]}"#));
        assert_eq!(w.segments(), vec![vec![(55.7, 37.6), (55.8, 37.7)]]);
    }

    #[test]
    fn test_route_ignores_other_geometries() {
        let w = walk(Some(r#"{"type":"Point","coordinates":[37.6,55.7]}"#));
        assert!(w.segments().is_empty());
        assert!(walk(None).segments().is_empty());
        assert!(walk(Some("not json")).segments().is_empty());
    }

    #[test]
    fn test_route_geojson_is_readable_back() {
        let one = vec![vec![(55.0, 37.0), (55.1, 37.2)]];
        let json = route_geojson(&one).unwrap();
        assert!(json.contains("\"LineString\""));
        assert_eq!(walk(Some(&json)).segments(), one);

        let two = vec![vec![(55.0, 37.0), (55.1, 37.2)], vec![(56.0, 38.0), (56.1, 38.1)]];
        let json = route_geojson(&two).unwrap();
        assert!(json.contains("MultiLineString"));
        assert_eq!(walk(Some(&json)).segments(), two);

        assert_eq!(route_geojson(&[]), None);
    }

    #[test]
    fn test_summary_shows_distance() {
        let w = Walk {
            distance_km: 4.25,
            ..walk(None)
        };
        assert!(w.summary().ends_with("— 4.25 km"), "got {}", w.summary());
    }

    #[test]
    fn test_sort_orders() {
        let mut walks = vec![dated(1, 100, 2.0), dated(2, 300, 1.0), dated(3, 200, 5.0)];
        let ids = |walks: &[Walk]| walks.iter().map(|w| w.id).collect::<Vec<_>>();

        WalkSort::NewestFirst.apply(&mut walks);
        assert_eq!(ids(&walks), vec![2, 3, 1]);
        WalkSort::OldestFirst.apply(&mut walks);
        assert_eq!(ids(&walks), vec![1, 3, 2]);
        WalkSort::LongestFirst.apply(&mut walks);
        assert_eq!(ids(&walks), vec![3, 1, 2]);
        WalkSort::ShortestFirst.apply(&mut walks);
        assert_eq!(ids(&walks), vec![2, 1, 3]);
    }

    #[test]
    fn test_stats_total_distance() {
        let walks = vec![dated(1, 100, 2.5), dated(2, 300, 1.25), dated(3, 200, 0.0)];
        let stats = WalkStats::from_walks(&walks);
        assert_eq!(stats.total_walks, 3);
        assert!((stats.total_km - 3.75).abs() < 1e-9);
        assert_eq!(WalkStats::from_walks(&[]), WalkStats::default());
    }

    #[test]
    fn test_coordinates_need_both_axes() {
        let mut photo = Photo::new(1, "a.jpg").at(55.0, 37.0);
        assert_eq!(photo.coordinates(), Some((55.0, 37.0)));
        photo.longitude = None;
        assert_eq!(photo.coordinates(), None);
    }

    #[test]
    fn test_preview_falls_back_to_full_image() {
        let mut photo = Photo::new(1, "a.jpg");
        assert_eq!(photo.preview_url(), "a.jpg");
        photo.thumbnail_url = Some("thumb.jpg".into());
        assert_eq!(photo.preview_url(), "thumb.jpg");
    }
}
