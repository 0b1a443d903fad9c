pub mod pointer;

pub use pointer::{DragController, PointerInput, PointerKind, PressTarget, ResizeController};

use crate::window::WindowId;

/// Which grab handle of a window a pointer is captured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TitleBar,
    ResizeGrip,
}

/// Routes all events of one pointer to a window handle while it is held.
pub trait PointerCapture {
    fn capture_pointer(&mut self, window: &WindowId, handle: Handle, pointer_id: i32);
    fn release_pointer(&mut self, window: &WindowId, handle: Handle, pointer_id: i32);
}
