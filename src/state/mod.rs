/// State management module
///
/// This module handles all application state, including:
/// - The walk catalog database (library.rs)
/// - Shared data structures (data.rs)
/// - The photo carousel state machine (carousel.rs)
/// - Map/carousel synchronization (sync.rs)
/// - Route distance and leg splitting (route.rs)
/// - User settings (settings.rs)

pub mod carousel;
pub mod data;
pub mod library;
pub mod route;
pub mod settings;
pub mod sync;
