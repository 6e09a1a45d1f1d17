/// Keeps a map view in lockstep with the carousel
///
/// The carousel knows nothing about maps; it reports the photo it settled on
/// to its listener. `MapSync` is that listener: it re-centers the map on the
/// photo and opens the popup of the marker standing there.
use super::carousel::IndexListener;
use super::data::Photo;

/// Operations the host's map exposes
pub trait MapHandle {
    fn pan_to(&mut self, latitude: f64, longitude: f64, zoom: f64);
    fn open_popup_at(&mut self, latitude: f64, longitude: f64);
}

/// Center `map` on `photo` and open its popup
///
/// Returns false, leaving the map untouched, when the photo has no position.
pub fn follow_photo<M: MapHandle>(map: &mut M, photo: &Photo, zoom: f64) -> bool {
    let Some((latitude, longitude)) = photo.coordinates() else {
        log::debug!("Photo {} has no coordinates, map stays put", photo.id);
        return false;
    };

    map.pan_to(latitude, longitude, zoom);
    map.open_popup_at(latitude, longitude);
    true
}

/// Carousel listener that drives a map
#[derive(Debug, Clone)]
pub struct MapSync<M> {
    map: M,
    zoom: f64,
}

impl<M: MapHandle> MapSync<M> {
    pub fn new(map: M, zoom: f64) -> Self {
        Self { map, zoom }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }
}

impl<M: MapHandle> IndexListener for MapSync<M> {
    fn on_index_change(&mut self, photo: &Photo) {
        follow_photo(&mut self.map, photo, self.zoom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::carousel::{CarouselConfig, NavKey, PhotoCarousel};

    #[derive(Debug, Default, PartialEq)]
    struct FakeMap {
        calls: Vec<String>,
    }

    impl MapHandle for FakeMap {
        fn pan_to(&mut self, latitude: f64, longitude: f64, zoom: f64) {
            self.calls.push(format!("pan {latitude} {longitude} {zoom}"));
        }

        fn open_popup_at(&mut self, latitude: f64, longitude: f64) {
            self.calls.push(format!("popup {latitude} {longitude}"));
        }
    }

    #[test]
    fn test_follow_pans_then_opens_popup() {
        let mut map = FakeMap::default();
        let photo = Photo::new(1, "a.jpg").at(55.5, 37.25);
        assert!(follow_photo(&mut map, &photo, 15.0));
        assert_eq!(map.calls, vec!["pan 55.5 37.25 15", "popup 55.5 37.25"]);
    }

    #[test]
    fn test_photo_without_position_is_skipped() {
        let mut map = FakeMap::default();
        assert!(!follow_photo(&mut map, &Photo::new(1, "a.jpg"), 15.0));
        assert!(map.calls.is_empty());
    }

    #[test]
    fn test_carousel_drives_map() {
        let photos = vec![
            Photo::new(1, "a.jpg").at(1.0, 2.0),
            Photo::new(2, "b.jpg"),
            Photo::new(3, "c.jpg").at(5.0, 6.0),
        ];
        let mut carousel =
            PhotoCarousel::new(CarouselConfig::default(), MapSync::new(FakeMap::default(), 15.0));
        carousel.resize(400.0);

        carousel.open(photos, 0);
        carousel.key(NavKey::ArrowRight);
        carousel.key(NavKey::ArrowRight);

        assert_eq!(
            carousel.listener().map().calls,
            vec!["pan 1 2 15", "popup 1 2", "pan 5 6 15", "popup 5 6"]
        );
    }
}
