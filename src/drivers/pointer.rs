//! Press/move/release tracking for the two grab handles of a window.
//!
//! Each controller owns one handle and follows at most one pointer at a
//! time: the first pointer to press wins until it is released or cancelled,
//! and events from any other pointer are ignored.

use crate::layout::floating::{apply_drag, apply_resize};
use crate::layout::{Geometry, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

impl PointerKind {
    pub fn from_dom(pointer_type: &str) -> Self {
        match pointer_type {
            "touch" => Self::Touch,
            "pen" => Self::Pen,
            _ => Self::Mouse,
        }
    }
}

/// The parts of a DOM pointer event the controllers look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pointer_id: i32,
    pub kind: PointerKind,
    pub button: i16,
    pub client_x: f64,
    pub client_y: f64,
}

impl PointerInput {
    pub fn mouse(pointer_id: i32, client_x: f64, client_y: f64) -> Self {
        Self {
            pointer_id,
            kind: PointerKind::Mouse,
            button: 0,
            client_x,
            client_y,
        }
    }

    pub fn touch(pointer_id: i32, client_x: f64, client_y: f64) -> Self {
        Self {
            kind: PointerKind::Touch,
            ..Self::mouse(pointer_id, client_x, client_y)
        }
    }

    pub fn with_button(self, button: i16) -> Self {
        Self { button, ..self }
    }

    /// Mouse presses only count for the main button; touch and pen always do.
    pub fn is_primary(&self) -> bool {
        self.kind != PointerKind::Mouse || self.button == 0
    }
}

/// Where inside the window a press landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressTarget {
    TitleBar,
    ControlButton,
    ResizeGrip,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Session {
    #[default]
    Idle,
    Active {
        pointer_id: i32,
        anchor_x: f64,
        anchor_y: f64,
        origin: Geometry,
    },
}

impl Session {
    fn begin(&mut self, input: &PointerInput, origin: Geometry) -> bool {
        if !matches!(self, Session::Idle) || !input.is_primary() {
            return false;
        }
        *self = Session::Active {
            pointer_id: input.pointer_id,
            anchor_x: input.client_x,
            anchor_y: input.client_y,
            origin,
        };
        true
    }

    /// Origin snapshot and pointer delta when `input` belongs to this session.
    fn delta(&self, input: &PointerInput) -> Option<(Geometry, f64, f64)> {
        match *self {
            Session::Active {
                pointer_id,
                anchor_x,
                anchor_y,
                origin,
            } if pointer_id == input.pointer_id => Some((
                origin,
                input.client_x - anchor_x,
                input.client_y - anchor_y,
            )),
            _ => None,
        }
    }

    fn end(&mut self, input: &PointerInput) -> bool {
        match *self {
            Session::Active { pointer_id, .. } if pointer_id == input.pointer_id => {
                *self = Session::Idle;
                true
            }
            _ => false,
        }
    }

    fn pointer_id(&self) -> Option<i32> {
        match *self {
            Session::Active { pointer_id, .. } => Some(pointer_id),
            Session::Idle => None,
        }
    }
}

/// Moves a window by its title bar.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    session: Session,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `input` if it is a primary press on the title bar
    /// proper. Presses on the window controls or the resize grip belong to
    /// someone else. Returns `true` when the caller should capture the
    /// pointer.
    pub fn press(&mut self, input: &PointerInput, target: PressTarget, current: Geometry) -> bool {
        if target != PressTarget::TitleBar {
            return false;
        }
        self.session.begin(input, current)
    }

    pub fn motion(
        &self,
        input: &PointerInput,
        viewport: Viewport,
        min_visible: f64,
    ) -> Option<Geometry> {
        let (origin, dx, dy) = self.session.delta(input)?;
        Some(apply_drag(origin, dx, dy, viewport, min_visible))
    }

    /// Handles both `pointerup` and `pointercancel`. Returns `true` when the
    /// caller should release its capture.
    pub fn release(&mut self, input: &PointerInput) -> bool {
        self.session.end(input)
    }

    pub fn is_active(&self) -> bool {
        self.active_pointer().is_some()
    }

    pub fn active_pointer(&self) -> Option<i32> {
        self.session.pointer_id()
    }
}

/// Resizes a window from its bottom-right grip.
#[derive(Debug, Clone)]
pub struct ResizeController {
    session: Session,
    min_width: f64,
    min_height: f64,
}

impl ResizeController {
    pub fn new(min_width: f64, min_height: f64) -> Self {
        Self {
            session: Session::Idle,
            min_width,
            min_height,
        }
    }

    pub fn press(&mut self, input: &PointerInput, target: PressTarget, current: Geometry) -> bool {
        if target != PressTarget::ResizeGrip {
            return false;
        }
        self.session.begin(input, current)
    }

    pub fn motion(&self, input: &PointerInput) -> Option<Geometry> {
        let (origin, dx, dy) = self.session.delta(input)?;
        Some(apply_resize(origin, dx, dy, self.min_width, self.min_height))
    }

    pub fn release(&mut self, input: &PointerInput) -> bool {
        self.session.end(input)
    }

    pub fn is_active(&self) -> bool {
        self.active_pointer().is_some()
    }

    pub fn active_pointer(&self) -> Option<i32> {
        self.session.pointer_id()
    }
}
