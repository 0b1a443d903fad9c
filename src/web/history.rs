use wasm_bindgen::prelude::*;
use web_sys::{Document, PopStateEvent, Window};

use crate::address::Address;
use crate::history::{HistoryState, PopEvent, SessionHistory};

/// [`SessionHistory`] over `window.history` and `document.title`.
pub struct BrowserHistory {
    window: Window,
    document: Document,
}

impl BrowserHistory {
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }

    /// Translate a `popstate` event into the manager's terms. The address
    /// has already changed when the event fires.
    pub fn pop_event(&self, event: &PopStateEvent) -> PopEvent {
        let state = js_sys::JSON::stringify(&event.state())
            .ok()
            .and_then(|s| s.as_string())
            .and_then(|raw| HistoryState::from_json(&raw));
        PopEvent::new(self.location(), state)
    }

    fn write(&self, push: bool, state: Option<&HistoryState>, title: &str, url: &str) {
        let Ok(history) = self.window.history() else {
            tracing::error!("window.history unavailable");
            return;
        };
        let data = match state.map(serde_json::to_string) {
            Some(Ok(json)) => js_sys::JSON::parse(&json).unwrap_or(JsValue::NULL),
            Some(Err(err)) => {
                tracing::warn!(error = %err, "could not encode history state");
                JsValue::NULL
            }
            None => JsValue::NULL,
        };
        let result = if push {
            history.push_state_with_url(&data, title, Some(url))
        } else {
            history.replace_state_with_url(&data, title, Some(url))
        };
        if let Err(err) = result {
            tracing::warn!(url, push, error = ?err, "history write rejected");
        }
    }
}

impl SessionHistory for BrowserHistory {
    fn location(&self) -> Address {
        let location = self.window.location();
        let path = location.pathname().unwrap_or_else(|_| "/".to_string());
        let search = location.search().ok().filter(|s| !s.is_empty());
        Address::new(path, search)
    }

    fn document_title(&self) -> String {
        self.document.title()
    }

    fn set_document_title(&mut self, title: &str) {
        self.document.set_title(title);
    }

    fn push(&mut self, state: Option<&HistoryState>, title: &str, url: &str) {
        self.write(true, state, title, url);
    }

    fn replace(&mut self, state: Option<&HistoryState>, title: &str, url: &str) {
        self.write(false, state, title, url);
    }
}
