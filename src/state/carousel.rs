/// Full-screen photo carousel
///
/// Headless state machine behind the lightbox: it owns the photo list of one
/// walk, the current index, the live drag gesture and the track animation.
/// The UI feeds it pointer samples and key presses and reads back the track
/// offset to draw. Index changes are reported to an `IndexListener` injected
/// at construction, which is how the map follows the carousel.
///
/// The track is a horizontal strip of slides, one viewport wide each. Slide
/// `i` is visible when the track is translated by `-i * viewport_width`.
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::data::Photo;

/// Gesture thresholds and animation timing
///
/// These are tuning values for how the swipe feels, not invariants.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct CarouselConfig {
    /// Fraction of the viewport width a drag must cover to commit
    pub commit_distance_ratio: f32,
    /// Release speed in px/ms that commits regardless of distance
    pub commit_velocity: f32,
    /// How much of the overshoot past the first/last slide follows the finger
    pub rubber_band: f32,
    /// Horizontal travel (px) needed before a drag counts as a swipe
    pub confirm_dx: f32,
    /// How much the horizontal travel must exceed the vertical one (px)
    pub confirm_margin: f32,
    /// Vertical travel (px) that turns the gesture into a scroll and aborts it
    pub abort_dy: f32,
    /// Duration of the settle animation
    pub transition_ms: u64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            commit_distance_ratio: 0.18,
            commit_velocity: 0.5,
            rubber_band: 0.35,
            confirm_dx: 6.0,
            confirm_margin: 2.0,
            abort_dy: 10.0,
            transition_ms: 260,
        }
    }
}

/// Receives the photo the carousel settled on
pub trait IndexListener {
    fn on_index_change(&mut self, photo: &Photo);
}

impl<F: FnMut(&Photo)> IndexListener for F {
    fn on_index_change(&mut self, photo: &Photo) {
        self(photo)
    }
}

/// Which input device owns a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerId {
    Mouse,
    Touch(u64),
}

/// One pointer event in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub id: PointerId,
    pub x: f32,
    pub y: f32,
    pub at: Instant,
}

/// Keys the carousel reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    ArrowLeft,
    ArrowRight,
    Escape,
}

/// Live gesture, from pointer-down until release, cancel or abort
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    /// Owner of the gesture; other pointers are ignored until it ends
    pub pointer_id: PointerId,
    pub start_x: f32,
    pub start_y: f32,
    pub last_x: f32,
    pub started_at: Instant,
    /// Track translate of the current slide when the gesture began
    pub base_translate_x: f32,
    pub current_translate_x: f32,
    pub is_confirmed_horizontal: bool,
}

/// What a pointer event did to the carousel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Closed, not the gesture owner, or a second pointer
    Ignored,
    /// A gesture began and holds the pointer
    Started,
    /// Movement too small to decide the direction yet
    Pending,
    /// Horizontal drag, the track follows the pointer
    Tracking,
    /// Vertical intent, gesture dropped without moving the track
    Aborted,
    /// Released without a horizontal drag; the track snapped back
    Tap,
    /// Released after a horizontal drag
    Settled { from: usize, to: usize },
}

/// Eased transition of the track between two offsets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackMotion {
    pub from: f32,
    pub to: f32,
    pub started_at: Instant,
    pub duration: Duration,
}

/// cubic-bezier(0.2, 0.8, 0.2, 1): fast start, long soft landing
const SETTLE_CURVE: CubicBezier = CubicBezier::new(0.2, 0.8, 0.2, 1.0);

impl TrackMotion {
    /// Track offset at `now`
    pub fn position(&self, now: Instant) -> f32 {
        let progress = self.progress(now);
        self.from + (self.to - self.from) * SETTLE_CURVE.ease(progress)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

/// CSS-style cubic Bézier timing curve through (0,0) and (1,1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl CubicBezier {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Eased value for time fraction `x` in [0, 1]
    pub fn ease(&self, x: f32) -> f32 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        let t = self.solve_t(x);
        Self::component(t, self.y1, self.y2)
    }

    fn component(t: f32, p1: f32, p2: f32) -> f32 {
        let u = 1.0 - t;
        3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
    }

    fn slope(t: f32, p1: f32, p2: f32) -> f32 {
        let u = 1.0 - t;
        3.0 * u * u * p1 + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
    }

    /// Curve parameter whose x equals `x`: Newton first, bisection if it stalls
    fn solve_t(&self, x: f32) -> f32 {
        let mut t = x;
        for _ in 0..8 {
            let error = Self::component(t, self.x1, self.x2) - x;
            if error.abs() < 1e-5 {
                return t;
            }
            let slope = Self::slope(t, self.x1, self.x2);
            if slope.abs() < 1e-6 {
                break;
            }
            t -= error / slope;
        }

        let (mut low, mut high) = (0.0f32, 1.0f32);
        t = x;
        for _ in 0..32 {
            let value = Self::component(t, self.x1, self.x2);
            if (value - x).abs() < 1e-5 {
                break;
            }
            if value < x {
                low = t;
            } else {
                high = t;
            }
            t = (low + high) / 2.0;
        }
        t
    }
}

/// Track offset after applying resistance past either end
///
/// Inside `[-(len - 1) * width, 0]` the candidate passes through; beyond it
/// only `factor` of the overshoot is kept.
pub fn rubber_band(candidate: f32, len: usize, width: f32, factor: f32) -> f32 {
    let min_x = -(len.saturating_sub(1) as f32) * width;
    let max_x = 0.0;

    if candidate > max_x {
        max_x + (candidate - max_x) * factor
    } else if candidate < min_x {
        min_x + (candidate - min_x) * factor
    } else {
        candidate
    }
}

/// Session data, alive between `open` and `close`
#[derive(Debug, Clone)]
struct CarouselState {
    photos: Vec<Photo>,
    current_index: usize,
    drag: Option<DragState>,
    /// Resting track offset, used when neither a drag nor a motion applies
    translate_x: f32,
    motion: Option<TrackMotion>,
}

/// The photo lightbox component
pub struct PhotoCarousel<L> {
    config: CarouselConfig,
    listener: L,
    viewport_width: f32,
    state: Option<CarouselState>,
    preload_queue: Vec<usize>,
}

impl<L: IndexListener> PhotoCarousel<L> {
    /// Create a closed carousel reporting index changes to `listener`
    pub fn new(config: CarouselConfig, listener: L) -> Self {
        Self {
            config,
            listener,
            viewport_width: 1.0,
            state: None,
            preload_queue: Vec::new(),
        }
    }

    /// Open on `photos`, showing `start_index` (clamped)
    ///
    /// An empty list leaves the carousel closed.
    pub fn open(&mut self, photos: Vec<Photo>, start_index: usize) {
        if photos.is_empty() {
            log::debug!("Carousel open ignored: walk has no photos");
            return;
        }

        let last = photos.len() - 1;
        self.preload_queue.clear();
        self.state = Some(CarouselState {
            photos,
            current_index: start_index.min(last),
            drag: None,
            translate_x: 0.0,
            motion: None,
        });

        log::debug!("🖼️  Carousel opened at {}", start_index.min(last));
        self.settle(start_index, false, Instant::now());
    }

    /// Close and drop the session. Does nothing when already closed.
    pub fn close(&mut self) {
        if self.state.take().is_some() {
            self.preload_queue.clear();
            log::debug!("Carousel closed");
        }
    }

    /// Show photo `index` (clamped, no wraparound)
    pub fn go_to(&mut self, index: usize, animate: bool) {
        self.settle(index, animate, Instant::now());
    }

    pub fn next(&mut self) {
        if let Some(index) = self.current_index() {
            self.go_to(index.saturating_add(1), true);
        }
    }

    pub fn previous(&mut self) {
        if let Some(index) = self.current_index() {
            self.go_to(index.saturating_sub(1), true);
        }
    }

    /// Keyboard navigation; returns whether the key was used
    pub fn key(&mut self, key: NavKey) -> bool {
        if !self.is_open() {
            return false;
        }
        match key {
            NavKey::ArrowLeft => self.previous(),
            NavKey::ArrowRight => self.next(),
            NavKey::Escape => self.close(),
        }
        true
    }

    /// New viewport width; re-aligns the track to the current slide
    pub fn resize(&mut self, width: f32) {
        self.viewport_width = width.max(1.0);
        if let Some(index) = self.current_index() {
            self.go_to(index, false);
        }
    }

    pub fn pointer_down(&mut self, sample: PointerSample) -> GestureOutcome {
        let width = self.viewport_width;
        let Some(state) = self.state.as_mut() else {
            return GestureOutcome::Ignored;
        };
        if state.drag.is_some() {
            return GestureOutcome::Ignored;
        }

        let base = base_translate(state.current_index, width);
        state.motion = None;
        state.translate_x = base;
        state.drag = Some(DragState {
            pointer_id: sample.id,
            start_x: sample.x,
            start_y: sample.y,
            last_x: sample.x,
            started_at: sample.at,
            base_translate_x: base,
            current_translate_x: base,
            is_confirmed_horizontal: false,
        });

        GestureOutcome::Started
    }

    pub fn pointer_move(&mut self, sample: PointerSample) -> GestureOutcome {
        let config = self.config;
        let width = self.viewport_width;
        let Some(state) = self.state.as_mut() else {
            return GestureOutcome::Ignored;
        };
        let len = state.photos.len();
        let Some(drag) = state.drag.as_mut().filter(|d| d.pointer_id == sample.id) else {
            return GestureOutcome::Ignored;
        };

        let dx = sample.x - drag.start_x;
        let dy = sample.y - drag.start_y;

        if !drag.is_confirmed_horizontal {
            if dx.abs() > config.confirm_dx && dx.abs() > dy.abs() + config.confirm_margin {
                drag.is_confirmed_horizontal = true;
            } else if dy.abs() > config.abort_dy && dy.abs() > dx.abs() {
                state.drag = None;
                return GestureOutcome::Aborted;
            } else {
                return GestureOutcome::Pending;
            }
        }

        drag.last_x = sample.x;
        drag.current_translate_x =
            rubber_band(drag.base_translate_x + dx, len, width, config.rubber_band);
        GestureOutcome::Tracking
    }

    /// Release: commit to a neighbour or snap back
    pub fn pointer_up(&mut self, sample: PointerSample) -> GestureOutcome {
        let width = self.viewport_width;
        let duration = self.transition();
        let Some(state) = self.state.as_mut() else {
            return GestureOutcome::Ignored;
        };
        if state.drag.as_ref().map(|d| d.pointer_id) != Some(sample.id) {
            return GestureOutcome::Ignored;
        }
        let Some(drag) = state.drag.take() else {
            return GestureOutcome::Ignored;
        };

        let from = state.current_index;
        let base = base_translate(from, width);

        if !drag.is_confirmed_horizontal {
            state.motion = animate_between(state.translate_x, base, sample.at, duration);
            state.translate_x = base;
            return GestureOutcome::Tap;
        }

        let dx = drag.last_x - drag.start_x;
        let dt = (sample.at.saturating_duration_since(drag.started_at).as_secs_f32() * 1000.0)
            .max(1.0);
        let velocity = dx / dt;

        state.translate_x = drag.current_translate_x;
        state.motion = None;

        let to = self.release_target(from, dx, velocity);
        self.settle(to, true, sample.at);

        let to = self.current_index().unwrap_or(from);
        GestureOutcome::Settled { from, to }
    }

    /// The platform took the pointer away; resolves like a release
    pub fn pointer_cancel(&mut self, sample: PointerSample) -> GestureOutcome {
        self.pointer_up(sample)
    }

    /// Advance animations; returns whether the track is still moving
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        match state.motion {
            Some(motion) if motion.is_finished(now) => {
                state.translate_x = motion.to;
                state.motion = None;
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Track offset to draw at `now`
    pub fn track_offset(&self, now: Instant) -> f32 {
        let Some(state) = &self.state else {
            return 0.0;
        };
        if let Some(drag) = state.drag.as_ref().filter(|d| d.is_confirmed_horizontal) {
            return drag.current_translate_x;
        }
        match state.motion {
            Some(motion) => motion.position(now),
            None => state.translate_x,
        }
    }

    /// Indices queued for preloading since the last call
    pub fn drain_preloads(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.preload_queue)
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// The page behind the overlay must not scroll while it is open
    pub fn scroll_locked(&self) -> bool {
        self.is_open()
    }

    pub fn is_animating(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.motion.is_some())
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.current_index)
    }

    pub fn current_photo(&self) -> Option<&Photo> {
        self.state.as_ref().and_then(|s| s.photos.get(s.current_index))
    }

    pub fn photos(&self) -> &[Photo] {
        self.state.as_ref().map(|s| s.photos.as_slice()).unwrap_or(&[])
    }

    /// Caption of the current photo
    pub fn description(&self) -> &str {
        self.current_photo().map(Photo::caption).unwrap_or("")
    }

    pub fn prev_disabled(&self) -> bool {
        self.current_index().map_or(true, |index| index == 0)
    }

    pub fn next_disabled(&self) -> bool {
        match &self.state {
            Some(state) => state.current_index + 1 >= state.photos.len(),
            None => true,
        }
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.state.as_ref().and_then(|s| s.drag.as_ref())
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    fn transition(&self) -> Duration {
        Duration::from_millis(self.config.transition_ms)
    }

    fn release_target(&self, current: usize, dx: f32, velocity: f32) -> usize {
        let distance = self.viewport_width * self.config.commit_distance_ratio;
        let speed = self.config.commit_velocity;

        if dx < -distance || velocity < -speed {
            current + 1
        } else if dx > distance || velocity > speed {
            current.saturating_sub(1)
        } else {
            current
        }
    }

    /// Make `index` current: clamp, move the track, queue neighbours, notify
    fn settle(&mut self, index: usize, animate: bool, now: Instant) {
        let width = self.viewport_width;
        let duration = self.transition();
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let index = index.min(state.photos.len() - 1);
        let from = match state.motion {
            Some(motion) => motion.position(now),
            None => state.translate_x,
        };
        let target = base_translate(index, width);

        state.current_index = index;
        state.translate_x = target;
        state.motion = if animate {
            animate_between(from, target, now, duration)
        } else {
            None
        };

        for neighbour in [index.checked_sub(1), index.checked_add(1)].into_iter().flatten() {
            if neighbour < state.photos.len() && !self.preload_queue.contains(&neighbour) {
                self.preload_queue.push(neighbour);
            }
        }

        self.listener.on_index_change(&state.photos[index]);
    }
}

impl<L> std::fmt::Debug for PhotoCarousel<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoCarousel")
            .field("config", &self.config)
            .field("viewport_width", &self.viewport_width)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn base_translate(index: usize, width: f32) -> f32 {
    -(index as f32) * width
}

fn animate_between(from: f32, to: f32, now: Instant, duration: Duration) -> Option<TrackMotion> {
    ((from - to).abs() > f32::EPSILON).then_some(TrackMotion {
        from,
        to,
        started_at: now,
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<i64>,
    }

    impl IndexListener for Recorder {
        fn on_index_change(&mut self, photo: &Photo) {
            self.seen.push(photo.id);
        }
    }

    fn photos(count: i64) -> Vec<Photo> {
        (0..count)
            .map(|id| Photo::new(id, format!("/walks/{id}.jpg")).with_description(format!("photo {id}")))
            .collect()
    }

    fn carousel(count: i64, start: usize) -> PhotoCarousel<Recorder> {
        let mut carousel = PhotoCarousel::new(CarouselConfig::default(), Recorder::default());
        carousel.resize(400.0);
        carousel.open(photos(count), start);
        carousel
    }

    fn sample(t0: Instant, ms: u64, x: f32, y: f32) -> PointerSample {
        PointerSample {
            id: PointerId::Mouse,
            x,
            y,
            at: t0 + Duration::from_millis(ms),
        }
    }

    /// Press at (200, 200), move to `dx` after `move_ms`, release at `up_ms`
    fn swipe(carousel: &mut PhotoCarousel<Recorder>, dx: f32, move_ms: u64, up_ms: u64) -> GestureOutcome {
        let t0 = Instant::now();
        assert_eq!(carousel.pointer_down(sample(t0, 0, 200.0, 200.0)), GestureOutcome::Started);
        carousel.pointer_move(sample(t0, move_ms, 200.0 + dx, 200.0));
        carousel.pointer_up(sample(t0, up_ms, 200.0 + dx, 200.0))
    }

    #[test]
    fn test_open_clamps_start_index() {
        let c = carousel(3, 10);
        assert_eq!(c.current_index(), Some(2));
        assert_eq!(c.current_photo().map(|p| p.id), Some(2));
        assert!(c.is_open());
        assert!(c.scroll_locked());
        assert!(!c.is_animating());
        assert_eq!(c.track_offset(Instant::now()), -800.0);
    }

    #[test]
    fn test_open_empty_list_stays_closed() {
        let mut c = PhotoCarousel::new(CarouselConfig::default(), Recorder::default());
        c.open(Vec::new(), 0);
        assert!(!c.is_open());
        assert!(c.listener().seen.is_empty());
        assert_eq!(c.description(), "");
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut c = carousel(3, 1);
        c.close();
        c.close();
        assert!(!c.is_open());
        assert!(!c.scroll_locked());
        c.next();
        assert_eq!(c.current_index(), None);
        assert_eq!(c.pointer_down(sample(Instant::now(), 0, 0.0, 0.0)), GestureOutcome::Ignored);
    }

    #[test]
    fn test_go_to_is_idempotent() {
        let mut c = carousel(4, 0);
        c.go_to(2, false);
        let first = (c.current_index(), c.track_offset(Instant::now()), c.description().to_string());
        c.go_to(2, false);
        let second = (c.current_index(), c.track_offset(Instant::now()), c.description().to_string());
        assert_eq!(first, second);
        assert_eq!(first.2, "photo 2");
    }

    #[test]
    fn test_boundaries_hold() {
        let mut c = carousel(3, 0);
        c.previous();
        assert_eq!(c.current_index(), Some(0));
        assert!(c.prev_disabled());
        assert!(!c.next_disabled());

        c.go_to(usize::MAX, false);
        assert_eq!(c.current_index(), Some(2));
        c.next();
        assert_eq!(c.current_index(), Some(2));
        assert!(c.next_disabled());
    }

    #[test]
    fn test_arrow_right_scenario() {
        let mut c = carousel(3, 1);
        assert!(c.key(NavKey::ArrowRight));
        assert_eq!(c.current_index(), Some(2));
        assert!(c.next_disabled());
        assert_eq!(c.listener().seen.last(), Some(&2));

        let notified = c.listener().seen.len();
        c.key(NavKey::ArrowRight);
        assert_eq!(c.current_index(), Some(2));
        assert_eq!(c.listener().seen.len(), notified + 1);
        assert_eq!(c.listener().seen.last(), Some(&2));
    }

    #[test]
    fn test_escape_closes() {
        let mut c = carousel(3, 1);
        assert!(c.key(NavKey::Escape));
        assert!(!c.is_open());
        assert!(!c.key(NavKey::ArrowLeft));
    }

    #[test]
    fn test_distance_commit() {
        let mut c = carousel(3, 0);
        assert_eq!(swipe(&mut c, -100.0, 500, 1000), GestureOutcome::Settled { from: 0, to: 1 });
        assert_eq!(c.current_index(), Some(1));
        assert!(c.is_animating());
    }

    #[test]
    fn test_short_slow_drag_stays() {
        let mut c = carousel(3, 0);
        assert_eq!(swipe(&mut c, -50.0, 500, 1000), GestureOutcome::Settled { from: 0, to: 0 });
        assert_eq!(c.current_index(), Some(0));
    }

    #[test]
    fn test_velocity_override() {
        let mut c = carousel(3, 0);
        // 10 px in 16 ms is about -0.63 px/ms
        assert_eq!(swipe(&mut c, -10.0, 8, 16), GestureOutcome::Settled { from: 0, to: 1 });
        assert_eq!(c.current_index(), Some(1));
    }

    #[test]
    fn test_drag_right_goes_back() {
        let mut c = carousel(3, 2);
        assert_eq!(swipe(&mut c, 120.0, 300, 600), GestureOutcome::Settled { from: 2, to: 1 });
    }

    #[test]
    fn test_commit_past_last_holds() {
        let mut c = carousel(3, 2);
        assert_eq!(swipe(&mut c, -200.0, 100, 200), GestureOutcome::Settled { from: 2, to: 2 });
        assert_eq!(c.current_index(), Some(2));
    }

    #[test]
    fn test_rubber_band_at_first_photo() {
        let mut c = carousel(3, 0);
        let t0 = Instant::now();
        c.pointer_down(sample(t0, 0, 200.0, 200.0));
        assert_eq!(c.pointer_move(sample(t0, 50, 300.0, 200.0)), GestureOutcome::Tracking);
        let offset = c.track_offset(t0);
        assert!((offset - 100.0 * 0.35).abs() < 1e-4, "offset {offset}");
    }

    #[test]
    fn test_rubber_band_function() {
        assert_eq!(rubber_band(-200.0, 3, 400.0, 0.35), -200.0);
        assert!((rubber_band(40.0, 3, 400.0, 0.35) - 14.0).abs() < 1e-4);
        assert!((rubber_band(-900.0, 3, 400.0, 0.35) - (-835.0)).abs() < 1e-4);
        assert!((rubber_band(-100.0, 1, 400.0, 0.35) - (-35.0)).abs() < 1e-4);
    }

    #[test]
    fn test_inside_drag_follows_one_to_one() {
        let mut c = carousel(3, 1);
        let t0 = Instant::now();
        c.pointer_down(sample(t0, 0, 200.0, 200.0));
        c.pointer_move(sample(t0, 20, 150.0, 203.0));
        assert_eq!(c.track_offset(t0), -450.0);
    }

    #[test]
    fn test_vertical_gesture_aborts() {
        let mut c = carousel(3, 0);
        let notified = c.listener().seen.len();
        let t0 = Instant::now();

        c.pointer_down(sample(t0, 0, 100.0, 100.0));
        assert_eq!(c.pointer_move(sample(t0, 30, 105.0, 130.0)), GestureOutcome::Aborted);
        assert!(c.drag().is_none());
        assert_eq!(c.pointer_up(sample(t0, 60, 105.0, 130.0)), GestureOutcome::Ignored);

        assert_eq!(c.current_index(), Some(0));
        assert_eq!(c.track_offset(t0), 0.0);
        assert_eq!(c.listener().seen.len(), notified);

        // capture was released, a new gesture may start
        assert_eq!(c.pointer_down(sample(t0, 100, 100.0, 100.0)), GestureOutcome::Started);
    }

    #[test]
    fn test_direction_is_decided_once() {
        let mut c = carousel(3, 1);
        let t0 = Instant::now();
        c.pointer_down(sample(t0, 0, 200.0, 200.0));
        assert_eq!(c.pointer_move(sample(t0, 10, 204.0, 202.0)), GestureOutcome::Pending);
        assert_eq!(c.pointer_move(sample(t0, 20, 220.0, 202.0)), GestureOutcome::Tracking);
        // later vertical travel no longer aborts
        assert_eq!(c.pointer_move(sample(t0, 30, 222.0, 260.0)), GestureOutcome::Tracking);
        assert!(c.drag().is_some_and(|d| d.is_confirmed_horizontal));
    }

    #[test]
    fn test_tap_snaps_back_without_notifying() {
        let mut c = carousel(3, 1);
        let notified = c.listener().seen.len();
        let t0 = Instant::now();
        c.pointer_down(sample(t0, 0, 200.0, 200.0));
        c.pointer_move(sample(t0, 10, 203.0, 201.0));
        assert_eq!(c.pointer_up(sample(t0, 80, 203.0, 201.0)), GestureOutcome::Tap);
        assert_eq!(c.current_index(), Some(1));
        assert_eq!(c.listener().seen.len(), notified);
        assert!(c.drag().is_none());
    }

    #[test]
    fn test_second_pointer_is_ignored() {
        let mut c = carousel(3, 1);
        let t0 = Instant::now();
        c.pointer_down(sample(t0, 0, 200.0, 200.0));

        let finger = PointerSample {
            id: PointerId::Touch(7),
            ..sample(t0, 5, 50.0, 50.0)
        };
        assert_eq!(c.pointer_down(finger), GestureOutcome::Ignored);
        assert_eq!(c.pointer_move(PointerSample { x: 0.0, ..finger }), GestureOutcome::Ignored);
        assert_eq!(c.pointer_up(finger), GestureOutcome::Ignored);
        assert_eq!(c.drag().map(|d| d.pointer_id), Some(PointerId::Mouse));

        assert_eq!(c.pointer_cancel(sample(t0, 40, 200.0, 200.0)), GestureOutcome::Tap);
        assert!(c.drag().is_none());
    }

    #[test]
    fn test_close_discards_drag() {
        let mut c = carousel(3, 1);
        let t0 = Instant::now();
        c.pointer_down(sample(t0, 0, 200.0, 200.0));
        c.pointer_move(sample(t0, 10, 100.0, 200.0));
        c.close();
        c.open(photos(3), 1);
        assert!(c.drag().is_none());
        assert_eq!(c.pointer_up(sample(t0, 20, 100.0, 200.0)), GestureOutcome::Ignored);
    }

    #[test]
    fn test_resize_realigns_track() {
        let mut c = carousel(3, 2);
        c.resize(1000.0);
        assert_eq!(c.track_offset(Instant::now()), -2000.0);
        assert!(!c.is_animating());
        assert_eq!(c.current_index(), Some(2));
    }

    #[test]
    fn test_settle_animation_runs_to_target() {
        let mut c = carousel(3, 0);
        let t0 = Instant::now();
        c.pointer_down(sample(t0, 0, 300.0, 200.0));
        c.pointer_move(sample(t0, 100, 150.0, 200.0));
        c.pointer_up(sample(t0, 200, 150.0, 200.0));

        let start = t0 + Duration::from_millis(200);
        assert_eq!(c.track_offset(start), -150.0);

        let midway = c.track_offset(start + Duration::from_millis(130));
        assert!(midway < -150.0 && midway > -400.0, "midway {midway}");

        let end = start + Duration::from_millis(260);
        assert_eq!(c.track_offset(end), -400.0);
        assert!(!c.tick(end));
        assert!(!c.is_animating());
    }

    #[test]
    fn test_preloads_neighbours() {
        let mut c = carousel(5, 0);
        assert_eq!(c.drain_preloads(), vec![1]);
        c.go_to(3, false);
        assert_eq!(c.drain_preloads(), vec![2, 4]);
        assert!(c.drain_preloads().is_empty());
        c.go_to(4, false);
        assert_eq!(c.drain_preloads(), vec![3]);
    }

    #[test]
    fn test_closure_listener() {
        let mut seen = Vec::new();
        {
            let mut c = PhotoCarousel::new(CarouselConfig::default(), |photo: &Photo| seen.push(photo.id));
            c.open(photos(2), 0);
            c.next();
        }
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn test_custom_thresholds() {
        let config = CarouselConfig {
            commit_distance_ratio: 0.5,
            commit_velocity: 10.0,
            ..CarouselConfig::default()
        };
        let mut c = PhotoCarousel::new(config, Recorder::default());
        c.resize(400.0);
        c.open(photos(3), 0);
        assert_eq!(swipe(&mut c, -150.0, 100, 200), GestureOutcome::Settled { from: 0, to: 0 });
        assert_eq!(swipe(&mut c, -250.0, 100, 200), GestureOutcome::Settled { from: 0, to: 1 });
    }

    #[test]
    fn test_bezier_endpoints_and_monotonic() {
        let curve = CubicBezier::new(0.2, 0.8, 0.2, 1.0);
        assert_eq!(curve.ease(0.0), 0.0);
        assert_eq!(curve.ease(1.0), 1.0);
        let mut last = 0.0;
        for step in 1..20 {
            let value = curve.ease(step as f32 / 20.0);
            assert!(value >= last);
            last = value;
        }
        // ease-out: well past halfway at the midpoint
        assert!(curve.ease(0.5) > 0.8);
    }
}
