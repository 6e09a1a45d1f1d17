use iced::widget::{
    button, canvas, column, container, horizontal_space, image, mouse_area, pick_list, row,
    scrollable, text, Column,
};
use iced::{keyboard, window};
use iced::{Alignment, Color, ContentFit, Element, Length, Size, Subscription, Task, Theme, Vector};
use rfd::FileDialog;
use std::path::PathBuf;
use std::time::Instant;

mod error;
mod media;
mod state;
mod ui;

use media::import::{import_folder_async, ImportResult};
use media::loader::{
    load_image, ImageCache, ImageSlot, LoadedImage, DISPLAY_MAX_EDGE, PREVIEW_MAX_EDGE,
};
use media::thumbnail::thumbnail_cache_dir;
use state::carousel::{NavKey, PhotoCarousel};
use state::data::{Photo, Walk, WalkSort, WalkStats};
use state::library::Library;
use state::settings::Settings;
use state::sync::MapSync;
use ui::carousel::{closes_on_release, CarouselView, PointerEvent};
use ui::map::{MapPanel, MapView};

const INITIAL_WINDOW: Size = Size::new(1280.0, 820.0);
const SIDEBAR_WIDTH: f32 = 260.0;
const CONTENT_PADDING: f32 = 20.0;
const MAP_HEIGHT: f32 = 360.0;
/// Width of the arrow columns on each side of the carousel track
const NAV_WIDTH: f32 = 72.0;
const THUMBNAIL_TILE: f32 = 120.0;

/// Main application state
struct WalkGallery {
    /// The walk catalog
    library: Library,
    thumbnail_dir: PathBuf,
    walks: Vec<Walk>,
    sort: WalkSort,
    selected: Option<Walk>,
    /// Photos of the selected walk, in gallery order
    photos: Vec<Photo>,
    /// Lightbox; its listener owns the map so swiping moves the map
    carousel: PhotoCarousel<MapSync<MapPanel>>,
    /// Full-size photos around the carousel position only
    photo_images: ImageCache,
    /// Previews of the selected walk
    thumbnails: ImageCache,
    /// Status message to display to the user
    status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Photo,
    Thumbnail,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked the "Import Folder" button
    ImportFolder,
    /// Background import finished
    ImportComplete(Result<ImportResult, String>),
    WalkSelected(i64),
    SortChanged(WalkSort),
    /// A gallery thumbnail was clicked
    ThumbnailActivated(usize),
    /// A photo marker on the map was clicked
    MarkerSelected(i64),
    ImageLoaded {
        kind: ImageKind,
        source: String,
        result: Result<LoadedImage, String>,
    },
    Pointer(PointerEvent),
    NextPhoto,
    PreviousPhoto,
    CloseCarousel,
    Key(NavKey),
    /// Animation frame while the carousel track is moving
    Tick(Instant),
    WindowResized(Size),
    MapPanned(Vector),
    MapZoomed(f64),
    MapPopupClosed,
}

impl WalkGallery {
    /// Create a new instance of the application
    fn new(library: Library) -> (Self, Task<Message>) {
        let settings = load_settings();

        let thumbnail_dir = thumbnail_cache_dir().unwrap_or_else(|e| {
            log::warn!("⚠️  {}; thumbnails go to the temp directory", e);
            std::env::temp_dir().join("walk-gallery-thumbnails")
        });

        if let Err(e) = library.verify_photos() {
            log::warn!("⚠️  Photo verification failed: {}", e);
        }

        let map = MapPanel::new(settings.show_markers);
        let mut carousel =
            PhotoCarousel::new(settings.carousel, MapSync::new(map, settings.photo_zoom));
        carousel.resize(carousel_width(INITIAL_WINDOW));
        carousel
            .listener_mut()
            .map_mut()
            .set_viewport(map_viewport(INITIAL_WINDOW));

        let walks = library.all_walks().unwrap_or_else(|e| {
            log::error!("❌ Could not list walks: {}", e);
            Vec::new()
        });
        log::info!("🥾 Walk Gallery initialized with {} walks", walks.len());

        let mut app = WalkGallery {
            library,
            thumbnail_dir,
            status: format!("Ready. {} walks in the catalog.", walks.len()),
            walks,
            sort: WalkSort::default(),
            selected: None,
            photos: Vec::new(),
            carousel,
            photo_images: ImageCache::default(),
            thumbnails: ImageCache::default(),
        };

        app.sort.apply(&mut app.walks);
        let task = match app.walks.first().map(|walk| walk.id) {
            Some(walk_id) => app.select_walk(walk_id),
            None => Task::none(),
        };

        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ImportFolder => {
                let folder = FileDialog::new()
                    .set_title("Select a Folder of Walk Photos")
                    .pick_folder();

                if let Some(folder_path) = folder {
                    self.status = format!("Importing from {}...", folder_path.display());

                    return Task::perform(
                        import_folder_async(
                            folder_path,
                            self.library.path().clone(),
                            self.thumbnail_dir.clone(),
                        ),
                        Message::ImportComplete,
                    );
                }

                Task::none()
            }
            Message::ImportComplete(Ok(result)) => {
                self.status = format!(
                    "✅ Import complete! Added {} photos, skipped {} duplicates.",
                    result.imported_count, result.skipped_count
                );
                self.reload_walks();

                match result.walk_id {
                    Some(walk_id) => self.select_walk(walk_id),
                    None => Task::none(),
                }
            }
            Message::ImportComplete(Err(e)) => {
                log::error!("❌ Import failed: {}", e);
                self.status = format!("Import failed: {}", e);
                Task::none()
            }
            Message::WalkSelected(walk_id) => self.select_walk(walk_id),
            Message::SortChanged(sort) => {
                self.sort = sort;
                sort.apply(&mut self.walks);
                Task::none()
            }
            Message::ThumbnailActivated(index) => self.open_carousel(index),
            Message::MarkerSelected(photo_id) => {
                match self.photos.iter().position(|photo| photo.id == photo_id) {
                    Some(index) => self.open_carousel(index),
                    None => Task::none(),
                }
            }
            Message::ImageLoaded {
                kind,
                source,
                result,
            } => {
                match kind {
                    ImageKind::Photo => self.photo_images.finish(source, result),
                    ImageKind::Thumbnail => self.thumbnails.finish(source, result),
                }
                Task::none()
            }
            Message::Pointer(event) => {
                match event {
                    PointerEvent::Down(sample) => {
                        self.carousel.pointer_down(sample);
                    }
                    PointerEvent::Move(sample) => {
                        self.carousel.pointer_move(sample);
                    }
                    PointerEvent::Up {
                        sample,
                        on_backdrop,
                    } => {
                        let outcome = self.carousel.pointer_up(sample);
                        if closes_on_release(outcome, on_backdrop) {
                            self.carousel.close();
                        }
                    }
                    PointerEvent::Cancel(sample) => {
                        self.carousel.pointer_cancel(sample);
                    }
                }
                self.carousel_media()
            }
            Message::NextPhoto => {
                self.carousel.next();
                self.carousel_media()
            }
            Message::PreviousPhoto => {
                self.carousel.previous();
                self.carousel_media()
            }
            Message::CloseCarousel => {
                self.carousel.close();
                self.carousel_media()
            }
            Message::Key(key) => {
                self.carousel.key(key);
                self.carousel_media()
            }
            Message::Tick(now) => {
                self.carousel.tick(now);
                Task::none()
            }
            Message::WindowResized(size) => {
                self.carousel
                    .listener_mut()
                    .map_mut()
                    .set_viewport(map_viewport(size));
                self.carousel.resize(carousel_width(size));
                Task::none()
            }
            Message::MapPanned(delta) => {
                self.carousel.listener_mut().map_mut().pan_by(delta);
                Task::none()
            }
            Message::MapZoomed(delta) => {
                self.carousel.listener_mut().map_mut().zoom_by(delta);
                Task::none()
            }
            Message::MapPopupClosed => {
                self.carousel.listener_mut().map_mut().close_popup();
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        // The gallery behind the lightbox is not rendered, so it cannot scroll
        if self.carousel.scroll_locked() {
            return self.carousel_view();
        }

        row![self.sidebar(), self.walk_view()].into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions =
            vec![window::resize_events().map(|(_id, size)| Message::WindowResized(size))];

        if self.carousel.is_open() {
            subscriptions.push(keyboard::on_key_press(nav_key));
        }
        if self.carousel.is_animating() {
            subscriptions.push(window::frames().map(Message::Tick));
        }

        Subscription::batch(subscriptions)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn reload_walks(&mut self) {
        match self.library.all_walks() {
            Ok(mut walks) => {
                self.sort.apply(&mut walks);
                self.walks = walks;
            }
            Err(e) => log::error!("❌ Could not list walks: {}", e),
        }
    }

    /// Show a walk: map, markers, thumbnails
    fn select_walk(&mut self, walk_id: i64) -> Task<Message> {
        self.carousel.close();
        self.photo_images.clear();

        let (walk, photos) = match (self.library.walk(walk_id), self.library.walk_photos(walk_id)) {
            (Ok(Some(walk)), Ok(photos)) => (walk, photos),
            (Ok(None), _) => {
                self.status = format!("Walk {} no longer exists.", walk_id);
                return Task::none();
            }
            (Err(e), _) | (_, Err(e)) => {
                log::error!("❌ Could not load walk {}: {}", walk_id, e);
                self.status = format!("Could not load walk: {}", e);
                return Task::none();
            }
        };

        self.carousel
            .listener_mut()
            .map_mut()
            .show_walk(&walk, &photos);
        self.status = format!("{}: {} photos", walk.name, photos.len());

        let previews: Vec<String> = photos
            .iter()
            .map(|photo| photo.preview_url().to_string())
            .collect();
        self.thumbnails
            .retain(|source| previews.iter().any(|preview| preview == source));
        self.selected = Some(walk);
        self.photos = photos;

        Task::batch(
            previews
                .into_iter()
                .map(|source| self.request_image(ImageKind::Thumbnail, source)),
        )
    }

    fn open_carousel(&mut self, index: usize) -> Task<Message> {
        self.carousel.open(self.photos.clone(), index);
        self.carousel_media()
    }

    /// Load the current photo and whatever the carousel queued for preload
    ///
    /// Decoded photos outside the current slide and its neighbours are
    /// evicted; closing the carousel frees them all.
    fn carousel_media(&mut self) -> Task<Message> {
        let preloads = self.carousel.drain_preloads();
        let Some(index) = self.carousel.current_index() else {
            self.photo_images.clear();
            return Task::none();
        };

        let photos = self.carousel.photos();
        let window = &photos[index.saturating_sub(1)..(index + 2).min(photos.len())];
        self.photo_images
            .retain(|source| window.iter().any(|photo| photo.url == source));

        let mut sources = vec![photos[index].url.clone()];
        sources.extend(
            preloads
                .into_iter()
                .filter(|neighbour| neighbour.abs_diff(index) == 1)
                .filter_map(|neighbour| photos.get(neighbour))
                .map(|photo| photo.url.clone()),
        );

        Task::batch(
            sources
                .into_iter()
                .map(|source| self.request_image(ImageKind::Photo, source)),
        )
    }

    /// Start loading an image unless it was already requested
    fn request_image(&mut self, kind: ImageKind, source: String) -> Task<Message> {
        let (cache, max_edge) = match kind {
            ImageKind::Photo => (&mut self.photo_images, DISPLAY_MAX_EDGE),
            ImageKind::Thumbnail => (&mut self.thumbnails, PREVIEW_MAX_EDGE),
        };
        if !cache.begin(&source) {
            return Task::none();
        }

        Task::perform(load_image(source.clone(), max_edge), move |result| {
            Message::ImageLoaded {
                kind,
                source: source.clone(),
                result,
            }
        })
    }

    fn sidebar(&self) -> Element<Message> {
        let selected_id = self.selected.as_ref().map(|walk| walk.id);

        let stats = WalkStats::from_walks(&self.walks);

        let walks = self.walks.iter().fold(Column::new().spacing(6), |list, walk| {
            let label = column![text(&walk.name).size(16), text(walk.summary()).size(12)];
            let style = if selected_id == Some(walk.id) {
                button::primary
            } else {
                button::secondary
            };
            list.push(
                button(label)
                    .width(Length::Fill)
                    .padding(8)
                    .style(style)
                    .on_press(Message::WalkSelected(walk.id)),
            )
        });

        column![
            text("Walk Gallery").size(28),
            button("Import Folder")
                .on_press(Message::ImportFolder)
                .padding(10),
            text(format!(
                "{} walks · {:.1} km",
                stats.total_walks, stats.total_km
            ))
            .size(14),
            pick_list(WalkSort::ALL, Some(self.sort), Message::SortChanged).width(Length::Fill),
            scrollable(walks).height(Length::Fill),
            text(&self.status).size(14),
        ]
        .spacing(16)
        .padding(CONTENT_PADDING)
        .width(SIDEBAR_WIDTH)
        .into()
    }

    fn walk_view(&self) -> Element<Message> {
        let Some(walk) = &self.selected else {
            return container(text("Import a folder of photos to create your first walk.").size(18))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into();
        };

        let map = canvas(MapView {
            panel: self.carousel.listener().map(),
            thumbnails: &self.thumbnails,
        })
        .width(Length::Fill)
        .height(MAP_HEIGHT);

        let tiles: Vec<Element<Message>> = self
            .photos
            .iter()
            .enumerate()
            .map(|(index, photo)| {
                let content: Element<Message> = match self.thumbnails.get(photo.preview_url()) {
                    Some(ImageSlot::Ready(loaded)) => image(loaded.handle.clone())
                        .width(THUMBNAIL_TILE)
                        .height(THUMBNAIL_TILE)
                        .content_fit(ContentFit::Cover)
                        .into(),
                    Some(ImageSlot::Failed) => tile_placeholder("⚠"),
                    _ => tile_placeholder("…"),
                };
                container(
                    button(content)
                        .padding(2)
                        .on_press(Message::ThumbnailActivated(index)),
                )
                .padding(4)
                .into()
            })
            .collect();

        let on_map = self.carousel.listener().map().markers().len();
        let mut header = column![
            text(&walk.name).size(26),
            text(format!(
                "{} · {} photos, {} on the map",
                walk.summary(),
                self.photos.len(),
                on_map
            ))
            .size(14),
        ]
        .spacing(4);
        if let Some(description) = &walk.description {
            header = header.push(text(description).size(14));
        }

        let gallery: Element<Message> = if tiles.is_empty() {
            text("This walk has no photos.").into()
        } else {
            iced_aw::Wrap::with_elements(tiles).into()
        };

        column![header, map, scrollable(gallery).height(Length::Fill)]
            .spacing(16)
            .padding(CONTENT_PADDING)
            .width(Length::Fill)
            .into()
    }

    fn carousel_view(&self) -> Element<Message> {
        let photos = self.carousel.photos();
        let position = self.carousel.current_index().unwrap_or(0) + 1;

        let track = canvas(CarouselView {
            carousel: &self.carousel,
            photos: &self.photo_images,
            thumbnails: &self.thumbnails,
        })
        .width(Length::Fill)
        .height(Length::Fill);

        let previous = button(text("←").size(28))
            .padding(12)
            .on_press_maybe((!self.carousel.prev_disabled()).then_some(Message::PreviousPhoto));
        let next = button(text("→").size(28))
            .padding(12)
            .on_press_maybe((!self.carousel.next_disabled()).then_some(Message::NextPhoto));

        // Clicks on the dimmed bars around the track close the lightbox
        let top = row![
            text(format!("{} / {}", position, photos.len())).size(16),
            horizontal_space(),
            button(text("×").size(24))
                .padding([4, 12])
                .style(button::secondary)
                .on_press(Message::CloseCarousel),
        ]
        .align_y(Alignment::Center)
        .padding(12);
        let top = mouse_area(top).on_press(Message::CloseCarousel);

        let middle = row![
            container(previous)
                .width(NAV_WIDTH)
                .center_x(NAV_WIDTH)
                .center_y(Length::Fill),
            track,
            container(next)
                .width(NAV_WIDTH)
                .center_x(NAV_WIDTH)
                .center_y(Length::Fill),
        ]
        .height(Length::Fill);

        let caption = mouse_area(
            container(text(self.carousel.description()).size(16))
                .center_x(Length::Fill)
                .padding(16),
        )
        .on_press(Message::CloseCarousel);

        container(column![top, middle, caption])
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_theme: &Theme| container::Style {
                background: Some(Color::from_rgba(0.0, 0.0, 0.0, 0.92).into()),
                text_color: Some(Color::WHITE),
                ..container::Style::default()
            })
            .into()
    }
}

fn tile_placeholder(label: &str) -> Element<'_, Message> {
    container(text(label).size(24))
        .width(THUMBNAIL_TILE)
        .height(THUMBNAIL_TILE)
        .center_x(THUMBNAIL_TILE)
        .center_y(THUMBNAIL_TILE)
        .into()
}

fn carousel_width(window: Size) -> f32 {
    (window.width - 2.0 * NAV_WIDTH).max(1.0)
}

fn map_viewport(window: Size) -> Size {
    Size::new(
        (window.width - SIDEBAR_WIDTH - 2.0 * CONTENT_PADDING).max(1.0),
        MAP_HEIGHT,
    )
}

fn nav_key(key: keyboard::Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    use keyboard::key::Named;

    match key {
        keyboard::Key::Named(Named::ArrowLeft) => Some(Message::Key(NavKey::ArrowLeft)),
        keyboard::Key::Named(Named::ArrowRight) => Some(Message::Key(NavKey::ArrowRight)),
        keyboard::Key::Named(Named::Escape) => Some(Message::Key(NavKey::Escape)),
        _ => None,
    }
}

/// Settings from the config directory; writes the defaults on first run
fn load_settings() -> Settings {
    let path = match Settings::default_path() {
        Ok(path) => path,
        Err(e) => {
            log::warn!("⚠️  {}; using default settings", e);
            return Settings::default();
        }
    };

    if !path.exists() {
        let settings = Settings::default();
        match settings.save(&path) {
            Ok(()) => log::info!("⚙️  Wrote default settings to {}", path.display()),
            Err(e) => log::warn!("⚠️  Could not write {}: {}", path.display(), e),
        }
        return settings;
    }

    Settings::load_or_default(&path)
}

fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let _ = builder.try_init();
}

fn main() -> iced::Result {
    init_logging();

    // The app cannot function without its catalog
    let library = match Library::open_default() {
        Ok(library) => library,
        Err(e) => {
            log::error!("❌ Failed to open the walk catalog: {}", e);
            std::process::exit(1);
        }
    };

    iced::application("Walk Gallery", WalkGallery::update, WalkGallery::view)
        .subscription(WalkGallery::subscription)
        .theme(WalkGallery::theme)
        .window_size(INITIAL_WINDOW)
        .centered()
        .run_with(move || WalkGallery::new(library))
}
