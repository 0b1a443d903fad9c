//! Desktop-style floating windows for a static site.
//!
//! Same-origin links open as draggable, resizable windows whose content is
//! fetched in the background, and the browser address bar follows whichever
//! content window is on top. The window logic is plain Rust and runs
//! anywhere; the `web` feature adds the DOM binding.

pub mod address;
pub mod audio;
pub mod config;
pub mod constants;
pub mod drivers;
pub mod error;
pub mod headless;
pub mod history;
pub mod layout;
pub mod links;
pub mod tracing_sub;
pub mod window;

#[cfg(feature = "web")]
pub mod web;

pub use config::DesktopConfig;
pub use error::{ConfigError, DesktopError, FetchError};
pub use window::{WindowId, WindowManager};
