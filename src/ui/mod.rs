/// Canvas programs for the main window
///
/// - `carousel.rs` - the full-screen photo track and its pointer input
/// - `map.rs` - the walk map with route, markers and popup

pub mod carousel;
pub mod map;
