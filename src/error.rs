//! Error types for the desktop layer.
//!
//! Every failure stays local to the window or widget it came from; nothing
//! here is fatal to the page.

use thiserror::Error;

use crate::window::WindowId;

#[derive(Debug, Error)]
pub enum DesktopError {
    /// A DOM element the feature depends on is absent at startup.
    #[error("required element #{0} not found; window management disabled")]
    MissingContainer(String),

    #[error("window not found: {0}")]
    WindowNotFound(WindowId),

    /// A global initializer provided by another script is absent.
    #[error("external hook `{0}` is not available")]
    MissingExternalHook(String),

    #[error("javascript error: {0}")]
    Js(String),
}

/// Transport-level failure while loading a window's content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("HTTP error, status: {status}")]
    Http { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid desktop config: {0}")]
    Parse(#[from] serde_json::Error),
}
