use super::{WindowId, WindowRecord};
use crate::drivers::PointerCapture;
use crate::error::DesktopError;
use crate::layout::{Geometry, Viewport};

/// What goes into a window's body element.
///
/// `F` is the view's detached content type: a DOM fragment in the browser,
/// plain markup in the headless harness.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowBody<F> {
    Loading(String),
    Page(F),
    Image { src: String, alt: String },
    Error(String),
}

/// Instructions for handing a comment placeholder to the external widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentMount {
    pub placeholder_id: String,
    pub container_id: String,
    pub canonical_path: String,
    pub hook: String,
    pub unavailable_text: String,
}

/// Render target for the window manager.
///
/// The manager owns the window records and issues one command per visible
/// change; implementations never decide stacking, placement or titles.
pub trait DesktopView: PointerCapture {
    type Fragment;

    fn viewport(&self) -> Viewport;

    /// Create the chrome (title bar, controls, body, resize grip) for a new
    /// window. With `spawn` set, the window starts at that box fully
    /// transparent and animates to `window.geometry` on the next frame.
    fn mount_window(&mut self, window: &WindowRecord, spawn: Option<Geometry>);

    fn set_geometry(&mut self, id: &WindowId, geometry: Geometry);

    fn set_z_order(&mut self, id: &WindowId, z_order: u32);

    fn set_title(&mut self, id: &WindowId, title: &str);

    fn show_body(&mut self, id: &WindowId, body: WindowBody<Self::Fragment>);

    /// Scan the window's body for links and images to claim.
    fn bind_links(&mut self, id: &WindowId);

    /// Rename the placeholder and invoke the comment hook. When the hook is
    /// missing the placeholder shows `unavailable_text` and the error is
    /// returned for logging.
    fn mount_comments(&mut self, id: &WindowId, mount: &CommentMount) -> Result<(), DesktopError>;

    /// Short attention cue on an already-open window.
    fn flash(&mut self, id: &WindowId);

    fn remove_window(&mut self, id: &WindowId);
}
