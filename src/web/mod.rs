//! Browser binding: DOM view, session history, fetch and event wiring.
//!
//! The page calls [`boot`] once after the DOM is ready. The window manager
//! lives behind `Rc<RefCell<…>>` and every event callback borrows it for the
//! duration of that one callback.

mod audio;
mod dom;
mod events;
mod fetch;
mod history;
mod intercept;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::config::DesktopConfig;
use crate::error::DesktopError;
use crate::window::WindowManager;

pub use dom::DomView;
pub use fetch::extract_main;
pub use history::BrowserHistory;

pub type Desktop = WindowManager<DomView, BrowserHistory>;
pub(crate) type SharedDesktop = Rc<RefCell<Desktop>>;

thread_local! {
    static DESKTOP: RefCell<Option<SharedDesktop>> = const { RefCell::new(None) };
}

fn read_config(value: &JsValue) -> Result<DesktopConfig, String> {
    if value.is_undefined() || value.is_null() {
        return Ok(DesktopConfig::default());
    }
    let raw = js_sys::JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .ok_or_else(|| "config is not JSON-serializable".to_string())?;
    DesktopConfig::from_json(&raw).map_err(|e| e.to_string())
}

/// Start the desktop. `config` is a plain object matching
/// [`DesktopConfig`]; `undefined` uses the defaults.
#[wasm_bindgen]
pub fn boot(config: JsValue) {
    console_error_panic_hook::set_once();
    let parsed = read_config(&config);
    let level = parsed
        .as_ref()
        .map(DesktopConfig::max_log_level)
        .unwrap_or(tracing::Level::INFO);
    crate::tracing_sub::init_default(level);
    let config = parsed.unwrap_or_else(|err| {
        tracing::error!(error = %err, "invalid desktop config; using defaults");
        DesktopConfig::default()
    });
    if let Err(err) = start(config) {
        tracing::error!(error = %err, "desktop not started");
    }
}

/// Next z-index above every window, for other scripts stacking their own
/// floating elements.
#[wasm_bindgen(js_name = allocateZ)]
pub fn allocate_z() -> Option<u32> {
    DESKTOP.with(|slot| {
        let desktop = slot.borrow().clone()?;
        events::with_desktop(&desktop, |d| d.allocate_z())
    })
}

fn start(mut config: DesktopConfig) -> Result<(), DesktopError> {
    let window = web_sys::window().ok_or_else(|| DesktopError::Js("no global window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| DesktopError::Js("no document".into()))?;
    let container = document
        .get_element_by_id(&config.container_id)
        .ok_or_else(|| DesktopError::MissingContainer(config.container_id.clone()))?;
    if config.placement_seed.is_none() {
        config.placement_seed = Some(js_sys::Date::now() as u64);
    }
    let audio = config.audio.clone();

    let links = crate::links::LinkInterceptor::new(&config.messages);
    let view = DomView::new(window.clone(), document.clone(), container.clone(), links.clone());
    if let Err(err) = view.install_stylesheet() {
        tracing::warn!(error = ?err, "could not install window styles");
    }
    let history = BrowserHistory::new(window.clone(), document.clone());
    let desktop: SharedDesktop = Rc::new(RefCell::new(WindowManager::new(view, history, config)));

    if let Some(root) = document.document_element()
        && let Err(err) = intercept::claim_subtree(&root, &links)
    {
        tracing::warn!(error = ?err, "initial link scan failed");
    }
    events::install(&desktop, &window, &document, &container)?;
    events::with_desktop(&desktop, |d| d.auto_open());
    events::start_pending_loads(&desktop);

    if let Some(audio) = audio
        && let Err(err) = audio::install(&desktop, &document, audio)
    {
        tracing::error!(error = %err, "audio player disabled");
    }

    DESKTOP.with(|slot| *slot.borrow_mut() = Some(desktop));
    tracing::info!("desktop ready");
    Ok(())
}
