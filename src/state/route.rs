/// Route geometry: distances along a walk and splitting a track into legs
use std::time::Duration;

/// Mean Earth radius used by the haversine formula
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A position with an optional capture time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: Option<i64>,
}

/// Great-circle distance between two (latitude, longitude) points
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Length of a polyline in kilometres
pub fn path_length_km(points: &[(f64, f64)]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(pair[0], pair[1]))
        .sum()
}

/// Total length of all legs; the jumps between legs are not walked
pub fn route_distance_km(segments: &[Vec<(f64, f64)>]) -> f64 {
    segments.iter().map(|segment| path_length_km(segment)).sum()
}

/// Split a time-ordered track wherever two fixes are `gap` or more apart
///
/// A leg needs at least two points; lone fixes are dropped. Points without
/// a timestamp never start a new leg.
pub fn split_at_gaps(points: &[TrackPoint], gap: Duration) -> Vec<Vec<(f64, f64)>> {
    let gap_ms = i64::try_from(gap.as_millis()).unwrap_or(i64::MAX);
    let mut segments = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    let mut last_time: Option<i64> = None;

    for point in points {
        let broken = matches!(
            (last_time, point.timestamp_ms),
            (Some(previous), Some(now)) if now.saturating_sub(previous) >= gap_ms
        );
        if broken {
            let leg = std::mem::take(&mut current);
            if leg.len() > 1 {
                segments.push(leg);
            }
        }

        current.push((point.latitude, point.longitude));
        if point.timestamp_ms.is_some() {
            last_time = point.timestamp_ms;
        }
    }

    if current.len() > 1 {
        segments.push(current);
    }
    segments
}
