use iced::mouse::{self, Cursor};
use iced::touch;
use iced::widget::canvas::{self, Path, Program, Stroke, Text};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme};
use std::time::Instant;

use crate::media::loader::{ImageCache, ImageSlot};
use crate::state::carousel::{GestureOutcome, IndexListener, PhotoCarousel, PointerId, PointerSample};
use crate::Message;

/// Space kept around the photo inside its slide
const SLIDE_PADDING: f32 = 24.0;

/// Pointer input routed to the carousel
#[derive(Debug, Clone, Copy)]
pub enum PointerEvent {
    Down(PointerSample),
    Move(PointerSample),
    /// Release; `on_backdrop` is true when it happened outside the photo
    Up { sample: PointerSample, on_backdrop: bool },
    Cancel(PointerSample),
}

/// Whether a release closes the lightbox
///
/// Only a tap that lands on the dimmed backdrop closes it. A tap on the
/// photo, or a swipe that happens to end outside it, keeps it open.
pub fn closes_on_release(outcome: GestureOutcome, on_backdrop: bool) -> bool {
    on_backdrop && outcome == GestureOutcome::Tap
}

/// Canvas program for the lightbox track
///
/// Draws every slide at its place on the track (off-screen ones are
/// skipped) and reports pointer and touch input. Mouse moves are only
/// forwarded while a gesture holds the pointer.
pub struct CarouselView<'a, L> {
    pub carousel: &'a PhotoCarousel<L>,
    pub photos: &'a ImageCache,
    pub thumbnails: &'a ImageCache,
}

/// Rectangle a photo of `image_size` occupies in `slide`, letterboxed
pub fn fit_rect(slide: Rectangle, image_size: Size) -> Rectangle {
    let area = Size::new(
        (slide.width - 2.0 * SLIDE_PADDING).max(1.0),
        (slide.height - 2.0 * SLIDE_PADDING).max(1.0),
    );
    if image_size.width <= 0.0 || image_size.height <= 0.0 {
        return Rectangle::new(Point::new(slide.x + SLIDE_PADDING, slide.y + SLIDE_PADDING), area);
    }

    let scale = (area.width / image_size.width).min(area.height / image_size.height);
    let size = Size::new(image_size.width * scale, image_size.height * scale);
    Rectangle::new(
        Point::new(
            slide.x + (slide.width - size.width) / 2.0,
            slide.y + (slide.height - size.height) / 2.0,
        ),
        size,
    )
}

impl<'a, L: IndexListener> CarouselView<'a, L> {
    /// Track offset at the canvas' real width
    fn offset(&self, width: f32) -> f32 {
        let track_width = self.carousel.viewport_width().max(1.0);
        self.carousel.track_offset(Instant::now()) * width / track_width
    }

    /// Where the current photo is drawn, for backdrop hit tests
    fn current_photo_rect(&self, size: Size) -> Rectangle {
        let slide = Rectangle::new(Point::ORIGIN, size);
        let image_size = self
            .carousel
            .current_photo()
            .and_then(|photo| {
                self.photos
                    .ready(&photo.url)
                    .or_else(|| self.thumbnails.ready(photo.preview_url()))
            })
            .map(|image| Size::new(image.width as f32, image.height as f32))
            .unwrap_or(Size::ZERO);
        fit_rect(slide, image_size)
    }

    fn draw_placeholder(frame: &mut canvas::Frame, rect: Rectangle, label: &str) {
        let outline = Path::rectangle(rect.position(), rect.size());
        frame.stroke(
            &outline,
            Stroke::default()
                .with_color(Color::from_rgba(1.0, 1.0, 1.0, 0.25))
                .with_width(2.0),
        );
        frame.fill_text(Text {
            content: label.to_string(),
            position: rect.center(),
            color: Color::from_rgba(1.0, 1.0, 1.0, 0.6),
            size: Pixels(16.0),
            horizontal_alignment: iced::alignment::Horizontal::Center,
            vertical_alignment: iced::alignment::Vertical::Center,
            ..Text::default()
        });
    }
}

impl<'a, L: IndexListener> Program<Message> for CarouselView<'a, L> {
    type State = ();

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
        let offset = self.offset(size.width);

        for (index, photo) in self.carousel.photos().iter().enumerate() {
            let x = offset + index as f32 * size.width;
            if x + size.width < 0.0 || x > size.width {
                continue;
            }
            let slide = Rectangle::new(Point::new(x, 0.0), size);

            match self.photos.get(&photo.url) {
                Some(ImageSlot::Ready(image)) => {
                    let rect = fit_rect(slide, Size::new(image.width as f32, image.height as f32));
                    frame.draw_image(rect, &image.handle);
                }
                Some(ImageSlot::Failed) => {
                    Self::draw_placeholder(&mut frame, fit_rect(slide, Size::ZERO), "⚠ Photo unavailable");
                }
                _ => match self.thumbnails.ready(photo.preview_url()) {
                    // Blurry preview until the full photo arrives
                    Some(thumb) => {
                        let rect = fit_rect(slide, Size::new(thumb.width as f32, thumb.height as f32));
                        frame.draw_image(rect, &thumb.handle);
                    }
                    None => Self::draw_placeholder(&mut frame, fit_rect(slide, Size::ZERO), "Loading…"),
                },
            }
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        let now = Instant::now();
        let local = |position: Point| Point::new(position.x - bounds.x, position.y - bounds.y);
        let sample = |id: PointerId, point: Point| PointerSample {
            id,
            x: point.x,
            y: point.y,
            at: now,
        };
        let gesture_owner = self.carousel.drag().map(|drag| drag.pointer_id);

        let pointer = match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => cursor
                .position_in(bounds)
                .map(|point| PointerEvent::Down(sample(PointerId::Mouse, point))),

            canvas::Event::Mouse(mouse::Event::CursorMoved { position })
                if gesture_owner == Some(PointerId::Mouse) =>
            {
                Some(PointerEvent::Move(sample(PointerId::Mouse, local(position))))
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
                if gesture_owner == Some(PointerId::Mouse) =>
            {
                let point = cursor.position().map(local).unwrap_or(Point::ORIGIN);
                Some(PointerEvent::Up {
                    sample: sample(PointerId::Mouse, point),
                    on_backdrop: !self.current_photo_rect(bounds.size()).contains(point),
                })
            }

            canvas::Event::Mouse(mouse::Event::CursorLeft) if gesture_owner == Some(PointerId::Mouse) => {
                let point = cursor.position().map(local).unwrap_or(Point::ORIGIN);
                Some(PointerEvent::Cancel(sample(PointerId::Mouse, point)))
            }

            canvas::Event::Touch(touch::Event::FingerPressed { id, position }) => {
                let point = local(position);
                Rectangle::new(Point::ORIGIN, bounds.size())
                    .contains(point)
                    .then(|| PointerEvent::Down(sample(PointerId::Touch(id.0), point)))
            }

            canvas::Event::Touch(touch::Event::FingerMoved { id, position })
                if gesture_owner == Some(PointerId::Touch(id.0)) =>
            {
                Some(PointerEvent::Move(sample(PointerId::Touch(id.0), local(position))))
            }

            canvas::Event::Touch(touch::Event::FingerLifted { id, position })
                if gesture_owner == Some(PointerId::Touch(id.0)) =>
            {
                let point = local(position);
                Some(PointerEvent::Up {
                    sample: sample(PointerId::Touch(id.0), point),
                    on_backdrop: !self.current_photo_rect(bounds.size()).contains(point),
                })
            }

            canvas::Event::Touch(touch::Event::FingerLost { id, position })
                if gesture_owner == Some(PointerId::Touch(id.0)) =>
            {
                Some(PointerEvent::Cancel(sample(PointerId::Touch(id.0), local(position))))
            }

            _ => None,
        };

        match pointer {
            Some(event) => (canvas::event::Status::Captured, Some(Message::Pointer(event))),
            None => (canvas::event::Status::Ignored, None),
        }
    }

    fn mouse_interaction(&self, _state: &Self::State, bounds: Rectangle, cursor: Cursor) -> mouse::Interaction {
        match self.carousel.drag() {
            Some(drag) if drag.is_confirmed_horizontal => mouse::Interaction::Grabbing,
            _ if cursor.is_over(bounds) => mouse::Interaction::Grab,
            _ => mouse::Interaction::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::carousel::CarouselConfig;
    use crate::state::data::Photo;
    use std::time::Duration;

    fn open_carousel() -> PhotoCarousel<impl FnMut(&Photo)> {
        let mut carousel = PhotoCarousel::new(CarouselConfig::default(), |_: &Photo| {});
        carousel.resize(400.0);
        carousel.open((0..3).map(|id| Photo::new(id, format!("/walk/{id}.jpg"))).collect(), 1);
        carousel
    }

    /// Press at x = 200, release at `end_x` 200 ms later
    fn release_at<L: IndexListener>(carousel: &mut PhotoCarousel<L>, end_x: f32) -> GestureOutcome {
        let t0 = Instant::now();
        let at = |ms: u64, x: f32| PointerSample {
            id: PointerId::Mouse,
            x,
            y: 200.0,
            at: t0 + Duration::from_millis(ms),
        };
        carousel.pointer_down(at(0, 200.0));
        carousel.pointer_move(at(100, end_x));
        carousel.pointer_up(at(200, end_x))
    }

    #[test]
    fn test_tap_on_backdrop_closes() {
        let mut carousel = open_carousel();
        let outcome = release_at(&mut carousel, 201.0);
        assert_eq!(outcome, GestureOutcome::Tap);
        assert!(closes_on_release(outcome, true));
    }

    #[test]
    fn test_tap_on_photo_keeps_open() {
        let mut carousel = open_carousel();
        let outcome = release_at(&mut carousel, 200.0);
        assert!(!closes_on_release(outcome, false));
    }

    #[test]
    fn test_swipe_ending_on_backdrop_keeps_open() {
        let mut carousel = open_carousel();
        let outcome = release_at(&mut carousel, 20.0);
        assert_eq!(outcome, GestureOutcome::Settled { from: 1, to: 2 });
        assert!(!closes_on_release(outcome, true));
    }

    #[test]
    fn test_fit_rect_letterboxes_wide_photo() {
        let slide = Rectangle::new(Point::new(400.0, 0.0), Size::new(448.0, 448.0));
        let rect = fit_rect(slide, Size::new(800.0, 400.0));
        assert_eq!(rect.width, 400.0);
        assert_eq!(rect.height, 200.0);
        assert_eq!(rect.x, 424.0);
        assert_eq!(rect.y, 124.0);
    }

    #[test]
    fn test_unknown_size_fills_padded_slide() {
        let slide = Rectangle::new(Point::ORIGIN, Size::new(448.0, 248.0));
        let rect = fit_rect(slide, Size::ZERO);
        assert_eq!(rect, Rectangle::new(Point::new(24.0, 24.0), Size::new(400.0, 200.0)));
    }
}
