use std::collections::BTreeMap;

use js_sys::{Function, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, DocumentFragment, Element, HtmlElement, Window};

use crate::drivers::{Handle, PointerCapture};
use crate::error::DesktopError;
use crate::layout::{Geometry, Viewport};
use crate::links::LinkInterceptor;
use crate::window::{CommentMount, DesktopView, WindowBody, WindowId, WindowKind, WindowRecord};

use super::intercept;

pub const WINDOW_CLASS: &str = "window";
pub const TITLE_BAR_CLASS: &str = "title-bar";
pub const CONTROLS_CLASS: &str = "title-bar-controls";
pub const RESIZER_CLASS: &str = "window-resizer";
pub const BODY_CLASS: &str = "window-body";
const SHAKE_CLASS: &str = "window-shake";
const DRAGGING_CLASS: &str = "is-dragging-window";

const OPEN_TRANSITION: &str = "left 0.2s ease-out, top 0.2s ease-out, width 0.2s ease-out, height 0.2s ease-out, opacity 0.2s ease-out";
const OPEN_TRANSITION_MS: i32 = 250;

const STYLESHEET: &str = "\
@keyframes shake { 0%, 100% { transform: translateX(0); } 25% { transform: translateX(-3px); } 75% { transform: translateX(3px); } }
.window-shake { animation: shake 0.3s ease-in-out; }
body.is-dragging-window { user-select: none; -webkit-user-select: none; }
.window-resizer { width: 15px; height: 15px; position: absolute; right: 0; bottom: 0; cursor: nwse-resize; z-index: 1; touch-action: none; }
.window > .title-bar { cursor: grab; touch-action: none; }
.window-body img[data-window-claimed] { cursor: zoom-in; }
";

struct WindowElements {
    root: HtmlElement,
    title_bar: HtmlElement,
    title_text: HtmlElement,
    body: HtmlElement,
    resizer: HtmlElement,
}

/// [`DesktopView`] backed by real DOM nodes under the window container.
pub struct DomView {
    window: Window,
    document: Document,
    container: Element,
    links: LinkInterceptor,
    flash_ms: i32,
    windows: BTreeMap<WindowId, WindowElements>,
}

impl DomView {
    pub fn new(
        window: Window,
        document: Document,
        container: Element,
        links: LinkInterceptor,
    ) -> Self {
        Self {
            window,
            document,
            container,
            links,
            flash_ms: crate::constants::FLASH_DURATION_MS,
            windows: BTreeMap::new(),
        }
    }

    /// Add the shake keyframes and drag styles to the page once.
    pub fn install_stylesheet(&self) -> Result<(), JsValue> {
        let style = self.document.create_element("style")?;
        style.set_text_content(Some(STYLESHEET));
        match self.document.head() {
            Some(head) => head.append_child(&style).map(drop),
            None => Err(JsValue::from_str("document has no <head>")),
        }
    }

    fn element(&self, tag: &str, class: &str) -> Result<HtmlElement, JsValue> {
        let el: HtmlElement = self.document.create_element(tag)?.unchecked_into();
        if !class.is_empty() {
            el.set_class_name(class);
        }
        Ok(el)
    }

    fn build(&self, record: &WindowRecord) -> Result<WindowElements, JsValue> {
        let root = self.element("div", WINDOW_CLASS)?;
        root.set_id(record.id.as_str());
        if let WindowKind::Content { locator } = &record.kind {
            root.set_attribute("data-content-url", locator.as_str())?;
        }
        let style = root.style();
        style.set_property("position", "absolute")?;
        style.set_property("z-index", &record.z_order.to_string())?;

        let title_bar = self.element("div", TITLE_BAR_CLASS)?;
        let title_text = self.element("div", "title-bar-text")?;
        title_text.set_text_content(Some(&record.title));
        let controls = self.element("div", CONTROLS_CLASS)?;
        let close = self.element("button", "")?;
        close.set_attribute("aria-label", "Close")?;
        controls.append_child(&close)?;
        title_bar.append_child(&title_text)?;
        title_bar.append_child(&controls)?;

        let body = self.element("div", BODY_CLASS)?;
        let resizer = self.element("div", RESIZER_CLASS)?;

        root.append_child(&title_bar)?;
        root.append_child(&body)?;
        root.append_child(&resizer)?;
        Ok(WindowElements {
            root,
            title_bar,
            title_text,
            body,
            resizer,
        })
    }

    fn paragraph(&self, text: &str) -> Result<HtmlElement, JsValue> {
        let p = self.element("p", "")?;
        p.set_text_content(Some(text));
        Ok(p)
    }

    fn fill_body(&self, body: &HtmlElement, content: WindowBody<DocumentFragment>) -> Result<(), JsValue> {
        body.set_inner_html("");
        match content {
            WindowBody::Loading(text) | WindowBody::Error(text) => {
                body.append_child(&self.paragraph(&text)?)?;
            }
            WindowBody::Page(fragment) => {
                body.append_child(&fragment)?;
            }
            WindowBody::Image { src, alt } => {
                let img = self.element("img", crate::links::OPT_OUT_CLASS)?;
                img.set_attribute("src", &src)?;
                img.set_attribute("alt", &alt)?;
                let style = img.style();
                style.set_property("max-width", "100%")?;
                style.set_property("display", "block")?;
                body.append_child(&img)?;
            }
        }
        Ok(())
    }

    /// Run `f` once after `ms` milliseconds.
    fn after(&self, ms: i32, f: impl FnOnce() + 'static) {
        let callback = Closure::once_into_js(f);
        if let Err(err) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), ms)
        {
            tracing::warn!(error = ?err, "setTimeout failed");
        }
    }

    fn animate_open(&self, root: &HtmlElement, spawn: Geometry, target: Geometry) -> Result<(), JsValue> {
        apply_geometry(root, spawn)?;
        let style = root.style();
        style.set_property("opacity", "0")?;
        style.set_property("transition", OPEN_TRANSITION)?;
        let grow = root.clone();
        let frame = Closure::once_into_js(move || {
            let result = apply_geometry(&grow, target)
                .and_then(|()| grow.style().set_property("opacity", "1"));
            if let Err(err) = result {
                tracing::warn!(error = ?err, "open animation failed");
            }
        });
        self.window.request_animation_frame(frame.unchecked_ref())?;
        let settle = root.clone();
        self.after(OPEN_TRANSITION_MS, move || {
            let _ = settle.style().remove_property("transition");
        });
        Ok(())
    }

    fn handle_element(&self, id: &WindowId, handle: Handle) -> Option<&HtmlElement> {
        let elements = self.windows.get(id)?;
        Some(match handle {
            Handle::TitleBar => &elements.title_bar,
            Handle::ResizeGrip => &elements.resizer,
        })
    }

    fn with_window<T>(
        &self,
        id: &WindowId,
        what: &str,
        f: impl FnOnce(&WindowElements) -> Result<T, JsValue>,
    ) -> Option<T> {
        let Some(elements) = self.windows.get(id) else {
            tracing::warn!(window_id = %id, what, "no DOM node for window");
            return None;
        };
        match f(elements) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(window_id = %id, what, error = ?err, "DOM update failed");
                None
            }
        }
    }

    fn set_body_dragging(&self, handle: Handle, active: bool) -> Result<(), JsValue> {
        let Some(body) = self.document.body() else {
            return Ok(());
        };
        let style = body.style();
        match (handle, active) {
            (Handle::TitleBar, true) => body.class_list().add_1(DRAGGING_CLASS)?,
            (Handle::TitleBar, false) => body.class_list().remove_1(DRAGGING_CLASS)?,
            (Handle::ResizeGrip, true) => {
                style.set_property("user-select", "none")?;
                style.set_property("cursor", "nwse-resize")?;
            }
            (Handle::ResizeGrip, false) => {
                style.remove_property("user-select")?;
                style.remove_property("cursor")?;
            }
        }
        Ok(())
    }
}

fn apply_geometry(el: &HtmlElement, g: Geometry) -> Result<(), JsValue> {
    let style = el.style();
    style.set_property("left", &format!("{}px", g.left))?;
    style.set_property("top", &format!("{}px", g.top))?;
    style.set_property("width", &format!("{}px", g.width))?;
    style.set_property("height", &format!("{}px", g.height))?;
    Ok(())
}

impl PointerCapture for DomView {
    fn capture_pointer(&mut self, window: &WindowId, handle: Handle, pointer_id: i32) {
        let Some(el) = self.handle_element(window, handle) else {
            return;
        };
        if let Err(err) = el.set_pointer_capture(pointer_id) {
            tracing::warn!(window_id = %window, pointer_id, error = ?err, "setPointerCapture failed");
        }
        if handle == Handle::TitleBar {
            let _ = el.style().set_property("cursor", "grabbing");
        }
        if let Err(err) = self.set_body_dragging(handle, true) {
            tracing::debug!(error = ?err, "could not mark body as dragging");
        }
    }

    fn release_pointer(&mut self, window: &WindowId, handle: Handle, pointer_id: i32) {
        if let Some(el) = self.handle_element(window, handle) {
            if el.has_pointer_capture(pointer_id)
                && let Err(err) = el.release_pointer_capture(pointer_id)
            {
                tracing::warn!(window_id = %window, pointer_id, error = ?err, "releasePointerCapture failed");
            }
            if handle == Handle::TitleBar {
                let _ = el.style().remove_property("cursor");
            }
        }
        if let Err(err) = self.set_body_dragging(handle, false) {
            tracing::debug!(error = ?err, "could not clear body drag state");
        }
    }
}

impl DesktopView for DomView {
    type Fragment = DocumentFragment;

    fn viewport(&self) -> Viewport {
        let dimension = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }

    fn mount_window(&mut self, window: &WindowRecord, spawn: Option<Geometry>) {
        let elements = match self.build(window) {
            Ok(elements) => elements,
            Err(err) => {
                tracing::error!(window_id = %window.id, error = ?err, "failed to build window");
                return;
            }
        };
        let placed = match spawn {
            Some(spawn) => self.animate_open(&elements.root, spawn, window.geometry),
            None => apply_geometry(&elements.root, window.geometry),
        };
        if let Err(err) = placed.and_then(|()| self.container.append_child(&elements.root).map(drop)) {
            tracing::error!(window_id = %window.id, error = ?err, "failed to mount window");
            return;
        }
        self.windows.insert(window.id.clone(), elements);
    }

    fn set_geometry(&mut self, id: &WindowId, geometry: Geometry) {
        self.with_window(id, "geometry", |w| apply_geometry(&w.root, geometry));
    }

    fn set_z_order(&mut self, id: &WindowId, z_order: u32) {
        self.with_window(id, "z-order", |w| {
            w.root.style().set_property("z-index", &z_order.to_string())
        });
    }

    fn set_title(&mut self, id: &WindowId, title: &str) {
        self.with_window(id, "title", |w| {
            w.title_text.set_text_content(Some(title));
            Ok(())
        });
    }

    fn show_body(&mut self, id: &WindowId, body: WindowBody<DocumentFragment>) {
        let Some(target) = self.windows.get(id).map(|w| w.body.clone()) else {
            tracing::warn!(window_id = %id, "no DOM node for window body");
            return;
        };
        if let Err(err) = self.fill_body(&target, body) {
            tracing::warn!(window_id = %id, error = ?err, "failed to fill window body");
        }
    }

    fn bind_links(&mut self, id: &WindowId) {
        let interceptor = &self.links;
        self.with_window(id, "links", |w| intercept::claim_subtree(&w.body, interceptor));
    }

    fn mount_comments(&mut self, id: &WindowId, mount: &CommentMount) -> Result<(), DesktopError> {
        let body = self
            .windows
            .get(id)
            .map(|w| w.body.clone())
            .ok_or_else(|| DesktopError::WindowNotFound(id.clone()))?;
        let selector = format!("#{}", mount.placeholder_id);
        let placeholder = body
            .query_selector(&selector)
            .map_err(js_error)?
            .ok_or_else(|| DesktopError::Js(format!("{selector} vanished before mount")))?;
        placeholder.set_id(&mount.container_id);

        let hook = Reflect::get(&self.window, &JsValue::from_str(&mount.hook))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok());
        let Some(hook) = hook else {
            placeholder.set_text_content(Some(&mount.unavailable_text));
            return Err(DesktopError::MissingExternalHook(mount.hook.clone()));
        };
        hook.call2(
            &JsValue::NULL,
            &JsValue::from_str(&mount.container_id),
            &JsValue::from_str(&mount.canonical_path),
        )
        .map_err(js_error)?;
        tracing::debug!(window_id = %id, container = %mount.container_id, "comment widget mounted");
        Ok(())
    }

    fn flash(&mut self, id: &WindowId) {
        let Some(root) = self.windows.get(id).map(|w| w.root.clone()) else {
            return;
        };
        if root.class_list().add_1(SHAKE_CLASS).is_err() {
            return;
        }
        self.after(self.flash_ms, move || {
            let _ = root.class_list().remove_1(SHAKE_CLASS);
        });
    }

    fn remove_window(&mut self, id: &WindowId) {
        if let Some(elements) = self.windows.remove(id) {
            elements.root.remove();
        }
    }
}

pub(crate) fn js_error(value: JsValue) -> DesktopError {
    let message = value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"));
    DesktopError::Js(message)
}
