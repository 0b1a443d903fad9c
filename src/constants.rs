//! Shared crate-wide constants.
//!
//! Geometry values are CSS pixels. Most of them are only defaults: the
//! matching fields on [`crate::config::GeometryConfig`] win at runtime.

/// Viewport width below which the compact window preset is used.
pub const MOBILE_BREAKPOINT: f64 = 768.0;

/// Initial window width on narrow viewports.
pub const MOBILE_WINDOW_WIDTH: f64 = 250.0;

/// Initial window width on desktop viewports.
pub const DESKTOP_WINDOW_WIDTH: f64 = 450.0;

/// Initial window height on every viewport.
pub const WINDOW_HEIGHT: f64 = 350.0;

/// Minimum distance a freshly placed window keeps from the viewport edges.
pub const VIEWPORT_MARGIN: f64 = 10.0;

/// Height reserved for the page's status bar when placing new windows.
pub const STATUS_BAR_HEIGHT: f64 = 30.0;

/// Resize floor.
pub const MIN_WINDOW_WIDTH: f64 = 150.0;
pub const MIN_WINDOW_HEIGHT: f64 = 100.0;

/// Minimum number of pixels a dragged window must keep within the viewport
/// so the user can grab its chrome again.
pub const MIN_VISIBLE_MARGIN: f64 = 40.0;

/// Edge length of a window at the start of the open animation.
pub const OPEN_ANIMATION_START_SIZE: f64 = 10.0;

/// First z-index handed out; page chrome sits below it.
pub const INITIAL_Z_ORDER: u32 = 10;

/// Duration of the "already open" shake cue, in milliseconds.
pub const FLASH_DURATION_MS: i32 = 300;
