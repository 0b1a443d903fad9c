pub mod view;

mod window_manager;

use std::fmt;

use crate::address::Locator;
use crate::config::GeometryConfig;
use crate::drivers::{DragController, ResizeController};
use crate::layout::Geometry;

pub use view::{CommentMount, DesktopView, WindowBody};
pub use window_manager::{
    CreateOptions, FetchedPage, MainContent, PendingLoad, WindowManager, WindowSource,
};

/// Opaque window token; doubles as the DOM element id and the history hint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(String);

impl WindowId {
    pub(crate) fn generate(seq: usize, nonce: u32) -> Self {
        Self(format!("window-{seq}-{:06x}", nonce & 0x00ff_ffff))
    }

    /// Adopt an id carried in a history entry verbatim.
    pub fn from_hint(hint: impl Into<String>) -> Self {
        Self(hint.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowKind {
    Content { locator: Locator },
    Image { src: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct WindowRecord {
    pub id: WindowId,
    pub kind: WindowKind,
    pub title: String,
    pub initial_title: String,
    pub z_order: u32,
    pub geometry: Geometry,
    pub load_state: LoadState,
    drag: DragController,
    resize: ResizeController,
}

impl WindowRecord {
    fn new(
        id: WindowId,
        kind: WindowKind,
        title: String,
        z_order: u32,
        geometry: Geometry,
        cfg: &GeometryConfig,
    ) -> Self {
        let load_state = match kind {
            WindowKind::Content { .. } => LoadState::Loading,
            WindowKind::Image { .. } => LoadState::Loaded,
        };
        Self {
            id,
            kind,
            initial_title: title.clone(),
            title,
            z_order,
            geometry,
            load_state,
            drag: DragController::new(),
            resize: ResizeController::new(cfg.min_width, cfg.min_height),
        }
    }

    pub fn locator(&self) -> Option<&Locator> {
        match &self.kind {
            WindowKind::Content { locator } => Some(locator),
            WindowKind::Image { .. } => None,
        }
    }

    pub fn is_content(&self) -> bool {
        self.locator().is_some()
    }

    /// Whether a pointer is currently dragging or resizing this window.
    pub fn is_grabbed(&self) -> bool {
        self.drag.is_active() || self.resize.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_prefixed_and_bounded() {
        let id = WindowId::generate(3, 0xdead_beef);
        assert_eq!(id.as_str(), "window-3-adbeef");
        assert_eq!(WindowId::generate(1, 5).to_string(), "window-1-000005");
    }

    #[test]
    fn image_records_start_loaded() {
        let cfg = GeometryConfig::default();
        let rec = WindowRecord::new(
            WindowId::from_hint("w"),
            WindowKind::Image {
                src: "/img/a.png".into(),
            },
            "cat".into(),
            11,
            Geometry::default(),
            &cfg,
        );
        assert_eq!(rec.load_state, LoadState::Loaded);
        assert!(!rec.is_content());
        assert!(!rec.is_grabbed());
    }
}
