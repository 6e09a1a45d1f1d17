/// Walk map: route polyline, photo markers and the open marker's popup
///
/// `MapPanel` is the map model the carousel drives through `MapHandle`.
/// `MapView` draws it on a canvas in Web Mercator and turns mouse input
/// into pan/zoom/marker messages. Tiles are not drawn; the route and the
/// markers are the whole picture.
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke, Text};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme, Vector};
use std::f64::consts::PI;

use crate::media::loader::ImageCache;
use crate::state::data::{Photo, Walk};
use crate::state::sync::MapHandle;
use crate::Message;

const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_78;
const MIN_ZOOM: f64 = 2.0;
const MAX_ZOOM: f64 = 18.0;
const MARKER_SIZE: f32 = 36.0;
const POPUP_IMAGE: f32 = 140.0;

/// Where the map shows up when a walk has nothing to show
const FALLBACK_CENTER: (f64, f64) = (55.751_244, 37.618_423);
const FALLBACK_ZOOM: f64 = 10.0;

/// Pixel position in the Mercator world at `zoom`
pub fn project(latitude: f64, longitude: f64, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let x = (longitude + 180.0) / 360.0 * scale;
    let sin = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians().sin();
    let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI)) * scale;
    (x, y)
}

/// Inverse of `project`
pub fn unproject(x: f64, y: f64, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let longitude = x / scale * 360.0 - 180.0;
    let n = PI - 2.0 * PI * y / scale;
    let latitude = n.sinh().atan().to_degrees();
    (latitude, longitude)
}

/// A photo pinned on the map
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub photo_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub preview: String,
    pub caption: String,
    pub taken_at: Option<String>,
}

/// Map model: camera, route, markers, popup
#[derive(Debug, Clone)]
pub struct MapPanel {
    center: (f64, f64),
    zoom: f64,
    viewport: Size,
    /// Route legs; the pauses between them are not drawn
    route: Vec<Vec<(f64, f64)>>,
    markers: Vec<Marker>,
    popup: Option<usize>,
    show_markers: bool,
}

impl Default for MapPanel {
    fn default() -> Self {
        Self {
            center: FALLBACK_CENTER,
            zoom: FALLBACK_ZOOM,
            viewport: Size::new(640.0, 360.0),
            route: Vec::new(),
            markers: Vec::new(),
            popup: None,
            show_markers: true,
        }
    }
}

impl MapPanel {
    pub fn new(show_markers: bool) -> Self {
        Self {
            show_markers,
            ..Self::default()
        }
    }

    /// Replace the map contents with a walk and frame it
    pub fn show_walk(&mut self, walk: &Walk, photos: &[Photo]) {
        self.route = walk.segments();
        self.markers = photos
            .iter()
            .filter_map(|photo| {
                let (latitude, longitude) = photo.coordinates()?;
                Some(Marker {
                    photo_id: photo.id,
                    latitude,
                    longitude,
                    preview: photo.preview_url().to_string(),
                    caption: photo.caption().to_string(),
                    taken_at: photo.timestamp_ms.and_then(format_time),
                })
            })
            .collect();
        self.popup = None;
        self.fit_bounds();
    }

    /// Center and zoom so the route and every marker are visible
    pub fn fit_bounds(&mut self) {
        let points: Vec<(f64, f64)> = self
            .route
            .iter()
            .flatten()
            .copied()
            .chain(self.markers.iter().map(|m| (m.latitude, m.longitude)))
            .collect();

        let Some(&first) = points.first() else {
            self.center = FALLBACK_CENTER;
            self.zoom = FALLBACK_ZOOM;
            return;
        };

        let world: Vec<(f64, f64)> = points.iter().map(|&(lat, lon)| project(lat, lon, 0.0)).collect();
        let (min_x, max_x) = bounds(world.iter().map(|p| p.0));
        let (min_y, max_y) = bounds(world.iter().map(|p| p.1));
        let (span_x, span_y) = (max_x - min_x, max_y - min_y);

        if span_x < 1e-9 && span_y < 1e-9 {
            self.center = first;
            self.zoom = 15.0;
            return;
        }

        let fit_x = f64::from(self.viewport.width) * 0.85 / span_x.max(1e-9);
        let fit_y = f64::from(self.viewport.height) * 0.85 / span_y.max(1e-9);
        self.zoom = fit_x.min(fit_y).log2().clamp(MIN_ZOOM, MAX_ZOOM);
        self.center = unproject((min_x + max_x) / 2.0, (min_y + max_y) / 2.0, 0.0);
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Drag the map by a screen delta
    pub fn pan_by(&mut self, delta: Vector) {
        let (x, y) = project(self.center.0, self.center.1, self.zoom);
        self.center = unproject(x - f64::from(delta.x), y - f64::from(delta.y), self.zoom);
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn popup(&self) -> Option<&Marker> {
        self.popup.and_then(|index| self.markers.get(index))
    }

    /// Screen position of a coordinate inside a map of `size`
    pub fn to_screen(&self, latitude: f64, longitude: f64, size: Size) -> Point {
        let (cx, cy) = project(self.center.0, self.center.1, self.zoom);
        let (x, y) = project(latitude, longitude, self.zoom);
        Point::new(
            (x - cx) as f32 + size.width / 2.0,
            (y - cy) as f32 + size.height / 2.0,
        )
    }

    /// Topmost marker under a screen point
    pub fn marker_at(&self, point: Point, size: Size) -> Option<&Marker> {
        if !self.show_markers {
            return None;
        }
        self.markers.iter().rev().find(|marker| {
            marker_bounds(self.to_screen(marker.latitude, marker.longitude, size)).contains(point)
        })
    }
}

impl MapHandle for MapPanel {
    fn pan_to(&mut self, latitude: f64, longitude: f64, zoom: f64) {
        self.center = (latitude, longitude);
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Opens the popup of the marker standing exactly at the point
    fn open_popup_at(&mut self, latitude: f64, longitude: f64) {
        self.popup = self
            .markers
            .iter()
            .position(|m| m.latitude == latitude && m.longitude == longitude);
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| (min.min(v), max.max(v)))
}

fn format_time(timestamp_ms: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(timestamp_ms)
        .map(|time| time.format("%d.%m.%Y %H:%M").to_string())
}

/// Marker pins hang above their point
fn marker_bounds(anchor: Point) -> Rectangle {
    Rectangle::new(
        Point::new(anchor.x - MARKER_SIZE / 2.0, anchor.y - MARKER_SIZE),
        Size::new(MARKER_SIZE, MARKER_SIZE),
    )
}

/// Canvas program drawing a `MapPanel`
pub struct MapView<'a> {
    pub panel: &'a MapPanel,
    pub thumbnails: &'a ImageCache,
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct MapDragState {
    pub is_dragging: bool,
    pub moved: bool,
    pub last_position: Option<Point>,
}

impl<'a> Program<Message> for MapView<'a> {
    type State = MapDragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let size = bounds.size();

        frame.fill_rectangle(Point::ORIGIN, size, Color::from_rgb8(0x1e, 0x24, 0x2b));

        // Route
        if !self.panel.route.is_empty() {
            let path = Path::new(|builder| {
                for leg in self.panel.route.iter().filter(|leg| leg.len() >= 2) {
                    for (i, &(lat, lon)) in leg.iter().enumerate() {
                        let point = self.panel.to_screen(lat, lon, size);
                        if i == 0 {
                            builder.move_to(point);
                        } else {
                            builder.line_to(point);
                        }
                    }
                }
            });
            frame.stroke(
                &path,
                Stroke::default()
                    .with_color(Color::from_rgba8(0x4c, 0xaf, 0x50, 0.9))
                    .with_width(5.0),
            );
        }

        // Markers
        if self.panel.show_markers {
            for marker in &self.panel.markers {
                let anchor = self.panel.to_screen(marker.latitude, marker.longitude, size);
                let pin = marker_bounds(anchor);
                frame.fill_rectangle(
                    Point::new(pin.x - 2.0, pin.y - 2.0),
                    Size::new(pin.width + 4.0, pin.height + 4.0),
                    Color::WHITE,
                );
                match self.thumbnails.ready(&marker.preview) {
                    Some(image) => frame.draw_image(pin, &image.handle),
                    None => frame.fill_rectangle(pin.position(), pin.size(), Color::from_rgb8(0x4c, 0xaf, 0x50)),
                }
            }
        }

        // Popup above the open marker
        if let Some(marker) = self.panel.popup() {
            let anchor = self.panel.to_screen(marker.latitude, marker.longitude, size);
            let width = POPUP_IMAGE + 20.0;
            let height = POPUP_IMAGE + 56.0;
            let origin = Point::new(anchor.x - width / 2.0, anchor.y - MARKER_SIZE - height - 8.0);

            frame.fill_rectangle(origin, Size::new(width, height), Color::WHITE);
            let image_rect = Rectangle::new(origin + Vector::new(10.0, 10.0), Size::new(POPUP_IMAGE, POPUP_IMAGE));
            if let Some(image) = self.thumbnails.ready(&marker.preview) {
                frame.draw_image(image_rect, &image.handle);
            }

            let mut line = origin.y + POPUP_IMAGE + 16.0;
            for content in [marker.taken_at.clone(), Some(marker.caption.clone())].into_iter().flatten() {
                if content.is_empty() {
                    continue;
                }
                frame.fill_text(Text {
                    content,
                    position: Point::new(origin.x + 10.0, line),
                    color: Color::from_rgb8(0x33, 0x33, 0x33),
                    size: Pixels(13.0),
                    ..Text::default()
                });
                line += 16.0;
            }
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Mouse wheel for zooming
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.is_over(bounds) {
                    let zoom_delta = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y * 0.5,
                        mouse::ScrollDelta::Pixels { y, .. } => y * 0.01,
                    };
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::MapZoomed(f64::from(zoom_delta))),
                    );
                }
            }

            // Press on a marker opens its photo, anywhere else starts dragging
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(position) = cursor.position_in(bounds) {
                    if let Some(marker) = self.panel.marker_at(position, bounds.size()) {
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::MarkerSelected(marker.photo_id)),
                        );
                    }
                    state.is_dragging = true;
                    state.moved = false;
                    state.last_position = Some(position);
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Release: a click without movement dismisses the popup
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging {
                    let clicked = !state.moved;
                    *state = MapDragState::default();
                    if clicked {
                        return (canvas::event::Status::Captured, Some(Message::MapPopupClosed));
                    }
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Mouse move - pan if dragging
            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.is_dragging {
                    let current = position - Vector::new(bounds.x, bounds.y);
                    if let Some(last) = state.last_position {
                        let delta = current - last;
                        state.last_position = Some(current);
                        if delta.x != 0.0 || delta.y != 0.0 {
                            state.moved = true;
                            return (canvas::event::Status::Captured, Some(Message::MapPanned(delta)));
                        }
                    }
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk() -> Walk {
        Walk {
            id: 1,
            name: "River".into(),
            date: 0,
            description: None,
            path_geojson: crate::state::data::route_geojson(&[vec![(55.70, 37.50), (55.80, 37.70)]]),
            distance_km: 0.0,
        }
    }

    fn photos() -> Vec<Photo> {
        vec![
            Photo::new(1, "a.jpg").at(55.75, 37.60),
            Photo::new(2, "b.jpg"),
            Photo::new(3, "c.jpg").at(55.78, 37.65),
        ]
    }

    #[test]
    fn test_projection_round_trip() {
        let (x, y) = project(55.75, 37.62, 12.0);
        let (lat, lon) = unproject(x, y, 12.0);
        assert!((lat - 55.75).abs() < 1e-9);
        assert!((lon - 37.62).abs() < 1e-9);
    }

    #[test]
    fn test_only_geotagged_photos_become_markers() {
        let mut panel = MapPanel::default();
        panel.show_walk(&walk(), &photos());
        let ids: Vec<i64> = panel.markers().iter().map(|m| m.photo_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_fit_keeps_route_on_screen() {
        let mut panel = MapPanel::default();
        panel.show_walk(&walk(), &photos());
        let size = Size::new(640.0, 360.0);
        for (lat, lon) in [(55.70, 37.50), (55.80, 37.70)] {
            let p = panel.to_screen(lat, lon, size);
            assert!(p.x >= 0.0 && p.x <= size.width, "{p:?}");
            assert!(p.y >= 0.0 && p.y <= size.height, "{p:?}");
        }
    }

    #[test]
    fn test_empty_walk_uses_fallback_view() {
        let mut panel = MapPanel::default();
        let empty = Walk { path_geojson: None, ..walk() };
        panel.show_walk(&empty, &[]);
        assert_eq!(panel.center, FALLBACK_CENTER);
        assert_eq!(panel.zoom, FALLBACK_ZOOM);
    }

    #[test]
    fn test_popup_opens_on_exact_match_only() {
        let mut panel = MapPanel::default();
        panel.show_walk(&walk(), &photos());

        panel.open_popup_at(55.78, 37.65);
        assert_eq!(panel.popup().map(|m| m.photo_id), Some(3));

        panel.open_popup_at(55.7801, 37.65);
        assert!(panel.popup().is_none());
    }

    #[test]
    fn test_pan_to_centers_marker() {
        let mut panel = MapPanel::default();
        panel.show_walk(&walk(), &photos());
        panel.pan_to(55.75, 37.60, 15.0);

        let size = Size::new(640.0, 360.0);
        let p = panel.to_screen(55.75, 37.60, size);
        assert!((p.x - 320.0).abs() < 1e-3 && (p.y - 180.0).abs() < 1e-3);
        assert_eq!(panel.zoom, 15.0);

        // the pin hangs above its point
        let hit = panel.marker_at(Point::new(320.0, 170.0), size);
        assert_eq!(hit.map(|m| m.photo_id), Some(1));
        assert!(panel.marker_at(Point::new(10.0, 10.0), size).is_none());
    }

    #[test]
    fn test_pan_by_moves_center() {
        let mut panel = MapPanel::default();
        let before = panel.center;
        panel.pan_by(Vector::new(100.0, 0.0));
        assert!(panel.center.1 < before.1);
        panel.zoom_by(100.0);
        assert_eq!(panel.zoom, MAX_ZOOM);
    }
}
