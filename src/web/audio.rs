use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Document, HtmlElement, MouseEvent};

use super::SharedDesktop;
use super::dom::js_error;
use super::events::with_desktop;
use crate::audio::{AudioDock, DockCommand};
use crate::config::AudioConfig;
use crate::error::DesktopError;

const PLAYER_CONSTRUCTOR: &str = "Webamp";

struct AudioRuntime {
    dock: AudioDock,
    player: Option<JsValue>,
}

type SharedRuntime = Rc<RefCell<AudioRuntime>>;

/// Hook the player icon up to the dock.
pub(crate) fn install(
    desktop: &SharedDesktop,
    document: &Document,
    config: AudioConfig,
) -> Result<(), DesktopError> {
    let icon = document
        .get_element_by_id(&config.icon_id)
        .ok_or_else(|| DesktopError::MissingContainer(config.icon_id.clone()))?;
    let runtime = Rc::new(RefCell::new(AudioRuntime {
        dock: AudioDock::new(config),
        player: None,
    }));
    let desktop = Rc::clone(desktop);
    let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
        event.prevent_default();
        event.stop_immediate_propagation();
        activate(&desktop, &runtime);
    });
    icon.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
        .map_err(js_error)?;
    on_click.forget();
    Ok(())
}

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn activate(desktop: &SharedDesktop, runtime: &SharedRuntime) {
    let Some(document) = document() else {
        return;
    };
    let config = runtime.borrow().dock.config().clone();
    let present = config
        .window_ids
        .first()
        .is_some_and(|main| document.get_element_by_id(main).is_some());
    let command = runtime.borrow_mut().dock.activate(present);
    match command {
        DockCommand::Raise => {
            raise(desktop, &document, &config);
            reveal(&document, &config);
        }
        DockCommand::Ignore => {}
        DockCommand::Render { dispose_previous } => {
            if dispose_previous && let Some(player) = runtime.borrow_mut().player.take() {
                dispose(&player);
            }
            if let Err(err) = render(desktop, runtime, &document, &config) {
                fail_render(runtime, &document, &config, &err.to_string());
            }
        }
    }
}

fn fail_render(runtime: &SharedRuntime, document: &Document, config: &AudioConfig, reason: &str) {
    let mut rt = runtime.borrow_mut();
    let text = rt.dock.render_failed(reason);
    match document.get_element_by_id(&config.container_id) {
        Some(container) => container.set_text_content(Some(text)),
        None => tracing::warn!(container = %config.container_id, "no player container for error text"),
    }
}

fn dispose(player: &JsValue) {
    let dispose = Reflect::get(player, &JsValue::from_str("dispose"))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok());
    match dispose {
        Some(f) => {
            if let Err(err) = f.call0(player) {
                tracing::warn!(error = ?err, "player dispose failed");
            }
        }
        None => tracing::warn!("player has no dispose()"),
    }
}

fn render(
    desktop: &SharedDesktop,
    runtime: &SharedRuntime,
    document: &Document,
    config: &AudioConfig,
) -> Result<(), DesktopError> {
    let window = web_sys::window().ok_or_else(|| DesktopError::Js("no window".into()))?;
    let constructor = Reflect::get(&window, &JsValue::from_str(PLAYER_CONSTRUCTOR))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or_else(|| DesktopError::MissingExternalHook(PLAYER_CONSTRUCTOR.to_string()))?;
    let options = serde_json::to_string(&config.player)
        .map_err(|e| DesktopError::Js(e.to_string()))
        .and_then(|json| js_sys::JSON::parse(&json).map_err(js_error))?;
    let player = Reflect::construct(&constructor, &Array::of1(&options)).map_err(js_error)?;
    let container = document
        .get_element_by_id(&config.container_id)
        .ok_or_else(|| DesktopError::MissingContainer(config.container_id.clone()))?;
    let render_when_ready = Reflect::get(&player, &JsValue::from_str("renderWhenReady"))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or_else(|| DesktopError::MissingExternalHook("renderWhenReady".to_string()))?;
    let promise: Promise = render_when_ready
        .call1(&player, &container)
        .map_err(js_error)?
        .dyn_into()
        .map_err(js_error)?;

    let desktop = Rc::clone(desktop);
    let runtime = Rc::clone(runtime);
    let config = config.clone();
    spawn_local(async move {
        match JsFuture::from(promise).await {
            Ok(_) => {
                {
                    let mut rt = runtime.borrow_mut();
                    rt.player = Some(player);
                    rt.dock.rendered();
                }
                // the player builds its windows after the promise settles
                let on_next_tick = Closure::once_into_js(move || stack_player(&desktop, &config));
                if let Some(window) = web_sys::window() {
                    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                        on_next_tick.unchecked_ref(),
                        0,
                    );
                }
            }
            Err(err) => {
                if let Some(document) = self::document() {
                    fail_render(&runtime, &document, &config, &js_error(err).to_string());
                }
            }
        }
    });
    Ok(())
}

/// Raise the player once and re-raise it on every press of its windows.
fn stack_player(desktop: &SharedDesktop, config: &AudioConfig) {
    let Some(document) = document() else {
        return;
    };
    for id in &config.window_ids {
        let Some(el) = document.get_element_by_id(id) else {
            tracing::warn!(element = %id, "player window not found");
            continue;
        };
        let desktop = Rc::clone(desktop);
        let config = config.clone();
        let on_press = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
            if let Some(document) = self::document() {
                raise(&desktop, &document, &config);
            }
        });
        if let Err(err) =
            el.add_event_listener_with_callback("pointerdown", on_press.as_ref().unchecked_ref())
        {
            tracing::warn!(element = %id, error = ?err, "could not attach player listener");
        }
        on_press.forget();
    }
    raise(desktop, &document, config);
}

fn raise(desktop: &SharedDesktop, document: &Document, config: &AudioConfig) {
    let Some(root) = document
        .get_element_by_id(&config.root_id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    else {
        tracing::error!(element = %config.root_id, "player root not found");
        return;
    };
    let Some(z_order) = with_desktop(desktop, |d| d.allocate_z()) else {
        return;
    };
    tracing::debug!(z_order, "raising audio player");
    let _ = root.style().set_property("z-index", &z_order.to_string());
}

fn reveal(document: &Document, config: &AudioConfig) {
    for id in &config.window_ids {
        let Some(el) = document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            continue;
        };
        let style = el.style();
        if style.get_property_value("display").as_deref() == Ok("none") {
            let _ = style.set_property("display", "block");
        }
    }
}
