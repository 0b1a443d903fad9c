use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, MouseEvent, PointerEvent, PopStateEvent, Window};

use super::dom::{CONTROLS_CLASS, RESIZER_CLASS, TITLE_BAR_CLASS, WINDOW_CLASS, js_error};
use super::{Desktop, SharedDesktop, fetch, intercept};
use crate::drivers::{PointerInput, PointerKind, PressTarget};
use crate::error::DesktopError;
use crate::layout::Point;
use crate::window::WindowId;

/// Run `f` against the desktop unless it is already borrowed by an outer
/// callback, in which case the event is dropped.
pub(crate) fn with_desktop<R>(desktop: &SharedDesktop, f: impl FnOnce(&mut Desktop) -> R) -> Option<R> {
    match desktop.try_borrow_mut() {
        Ok(mut guard) => Some(f(&mut guard)),
        Err(_) => {
            tracing::warn!("desktop busy; dropping re-entrant event");
            None
        }
    }
}

fn event_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn closest(el: &Element, class: &str) -> Option<Element> {
    el.closest(&format!(".{class}")).ok().flatten()
}

fn window_of(el: &Element) -> Option<WindowId> {
    let root = closest(el, WINDOW_CLASS)?;
    let id = root.id();
    (!id.is_empty()).then(|| WindowId::from_hint(id))
}

fn press_target(el: &Element) -> PressTarget {
    if closest(el, CONTROLS_CLASS).is_some() {
        PressTarget::ControlButton
    } else if closest(el, RESIZER_CLASS).is_some() {
        PressTarget::ResizeGrip
    } else if closest(el, TITLE_BAR_CLASS).is_some() {
        PressTarget::TitleBar
    } else {
        PressTarget::Body
    }
}

fn pointer_input(event: &PointerEvent) -> PointerInput {
    PointerInput {
        pointer_id: event.pointer_id(),
        kind: PointerKind::from_dom(&event.pointer_type()),
        button: event.button(),
        client_x: f64::from(event.client_x()),
        client_y: f64::from(event.client_y()),
    }
}

fn listen<E: JsCast + 'static>(
    target: &web_sys::EventTarget,
    events: &[&str],
    capture: bool,
    mut handler: impl FnMut(E) + 'static,
) -> Result<(), DesktopError> {
    let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        if let Ok(event) = event.dyn_into::<E>() {
            handler(event);
        }
    });
    for name in events {
        target
            .add_event_listener_with_callback_and_bool(name, closure.as_ref().unchecked_ref(), capture)
            .map_err(js_error)?;
    }
    // listeners live as long as the page
    closure.forget();
    Ok(())
}

/// Start every queued content fetch. Each completion re-borrows the desktop
/// to apply its result.
pub(crate) fn start_pending_loads(desktop: &SharedDesktop) {
    let Some((loads, config)) =
        with_desktop(desktop, |d| (d.take_pending_loads(), d.config().clone()))
    else {
        return;
    };
    if loads.is_empty() {
        return;
    }
    let config = Rc::new(config);
    for load in loads {
        let desktop = Rc::clone(desktop);
        let config = Rc::clone(&config);
        spawn_local(async move {
            let Some(window) = web_sys::window() else {
                return;
            };
            let Some(document) = window.document() else {
                return;
            };
            tracing::debug!(window_id = %load.id, locator = %load.locator, "fetching window content");
            let result = fetch::load_page(&window, &document, &load.locator, &config).await;
            with_desktop(&desktop, |d| d.complete_load(&load.id, result));
        });
    }
}

/// Wire the delegated pointer, click and navigation listeners.
pub(crate) fn install(
    desktop: &SharedDesktop,
    window: &Window,
    document: &Document,
    container: &Element,
) -> Result<(), DesktopError> {
    // raise on any press inside a window, then hand title-bar and grip
    // presses to the drag/resize controllers
    let d = Rc::clone(desktop);
    listen(container, &["pointerdown"], true, move |event: PointerEvent| {
        let Some(target) = event_element(&event) else {
            return;
        };
        let Some(id) = window_of(&target) else {
            return;
        };
        let input = pointer_input(&event);
        let press = press_target(&target);
        let grabbed = with_desktop(&d, |wm| {
            if let Err(err) = wm.press_window(&id) {
                tracing::debug!(error = %err, "press on unknown window");
                return false;
            }
            match press {
                PressTarget::TitleBar => wm.begin_drag(&id, &input, press),
                PressTarget::ResizeGrip => wm.begin_resize(&id, &input, press),
                PressTarget::ControlButton | PressTarget::Body => false,
            }
        });
        if grabbed == Some(true) {
            event.prevent_default();
        }
    })?;

    let d = Rc::clone(desktop);
    listen(document, &["pointermove"], false, move |event: PointerEvent| {
        if with_desktop(&d, |wm| wm.pointer_move(&pointer_input(&event))) == Some(true) {
            event.prevent_default();
        }
    })?;

    let d = Rc::clone(desktop);
    listen(document, &["pointerup", "pointercancel"], false, move |event: PointerEvent| {
        with_desktop(&d, |wm| wm.pointer_up(&pointer_input(&event)));
    })?;

    let d = Rc::clone(desktop);
    listen(container, &["click"], false, move |event: MouseEvent| {
        let Some(target) = event_element(&event) else {
            return;
        };
        if target.closest(&format!(".{CONTROLS_CLASS} button")).ok().flatten().is_none() {
            return;
        }
        let Some(id) = window_of(&target) else {
            return;
        };
        event.stop_propagation();
        if let Some(Err(err)) = with_desktop(&d, |wm| wm.close(&id)) {
            tracing::warn!(error = %err, "close failed");
        }
    })?;

    let d = Rc::clone(desktop);
    listen(document, &["click"], false, move |event: MouseEvent| {
        if event.default_prevented() {
            return;
        }
        let Some(target) = event_element(&event) else {
            return;
        };
        let modifiers = intercept::modifiers(&event);
        let point = Point::new(f64::from(event.client_x()), f64::from(event.client_y()));
        let opened = with_desktop(&d, |wm| {
            let action = intercept::action_for_click(&target, wm.links(), modifiers)?;
            Some(wm.open_link(action, Some(point)))
        })
        .flatten();
        if opened.is_some() {
            event.prevent_default();
            start_pending_loads(&d);
        }
    })?;

    let d = Rc::clone(desktop);
    listen(window, &["popstate"], false, move |event: PopStateEvent| {
        let handled = with_desktop(&d, |wm| {
            let pop = wm.history().pop_event(&event);
            wm.on_pop_state(&pop);
        });
        if handled.is_some() {
            start_pending_loads(&d);
        }
    })?;

    Ok(())
}
