//! Keeps the browser address bar and document title in step with the
//! window stack.
//!
//! The addressed window is the topmost content window. Every history write
//! goes through [`HistorySynchronizer`], which also decides whether the
//! current query string survives the write.

use serde::{Deserialize, Serialize};

use crate::address::{Address, CallbackQuery, Locator};
use crate::window::{WindowId, WindowRecord};

/// State payload stored with every window entry. Base entries carry `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    pub window_id: String,
}

impl HistoryState {
    pub fn for_window(id: &WindowId) -> Self {
        Self {
            window_id: id.as_str().to_string(),
        }
    }

    /// Parse a state payload read back from the browser. Anything that is
    /// not a window entry (including `null`) yields `None`.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str::<Option<Self>>(raw).ok().flatten()
    }
}

/// A back/forward navigation as reported by the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopEvent {
    pub address: Address,
    pub hint: Option<WindowId>,
}

impl PopEvent {
    pub fn new(address: Address, state: Option<HistoryState>) -> Self {
        Self {
            address,
            hint: state.map(|s| WindowId::from_hint(s.window_id)),
        }
    }
}

/// Session history as seen by the synchronizer.
pub trait SessionHistory {
    fn location(&self) -> Address;
    fn document_title(&self) -> String;
    fn set_document_title(&mut self, title: &str);
    fn push(&mut self, state: Option<&HistoryState>, title: &str, url: &str);
    fn replace(&mut self, state: Option<&HistoryState>, title: &str, url: &str);
}

/// What the window manager must do to honor a popped entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopAction {
    /// The base address was popped while content windows are open.
    FocusTopmost(WindowId),
    ResetBase,
    Focus(WindowId),
    Recreate {
        locator: Locator,
        reuse_id: Option<WindowId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Write {
    Push,
    Replace,
}

pub struct HistorySynchronizer<H> {
    history: H,
    callback: CallbackQuery,
    base_title: String,
    addressed: Option<WindowId>,
}

impl<H: SessionHistory> HistorySynchronizer<H> {
    pub fn new(history: H, callback: CallbackQuery, base_title: Option<String>) -> Self {
        let base_title = base_title.unwrap_or_else(|| history.document_title());
        Self {
            history,
            callback,
            base_title,
            addressed: None,
        }
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    pub fn base_title(&self) -> &str {
        &self.base_title
    }

    pub fn addressed(&self) -> Option<&WindowId> {
        self.addressed.as_ref()
    }

    /// Push for a user-initiated open; replace for the startup auto-open so
    /// the landing entry is reused.
    pub fn record_create(&mut self, window: &WindowRecord, is_auto_open: bool) {
        let kind = if is_auto_open { Write::Replace } else { Write::Push };
        self.write_window(kind, window);
    }

    pub fn record_focus(&mut self, window: &WindowRecord) {
        self.write_window(Write::Replace, window);
    }

    /// Refresh the entry after the addressed window's title changed.
    pub fn record_title(&mut self, window: &WindowRecord) {
        if self.addressed.as_ref() == Some(&window.id) {
            self.write_window(Write::Replace, window);
        }
    }

    /// Re-point the address after `closed` went away. Only the addressed
    /// window moves the address bar; `next` is the topmost remaining content
    /// window.
    pub fn record_close(
        &mut self,
        closed: &WindowId,
        closed_locator: Option<&Locator>,
        next: Option<&WindowRecord>,
    ) {
        let by_id = self.addressed.as_ref() == Some(closed);
        let by_location = closed_locator
            .is_some_and(|locator| self.history.location().locator().as_ref() == Some(locator));
        if !by_id && !by_location {
            tracing::trace!(window_id = %closed, "closed window was not addressed");
            return;
        }
        match next {
            Some(window) => self.write_window(Write::Replace, window),
            None => self.reset_to_base(),
        }
    }

    pub fn reset_to_base(&mut self) {
        let current = self.history.location();
        let url = with_query(
            Address::base().path(),
            self.callback.preserved(&current, None),
        );
        tracing::debug!(url = %url, "history replace (base)");
        self.history.replace(None, &self.base_title, &url);
        self.history.set_document_title(&self.base_title);
        self.addressed = None;
    }

    /// Decide how to restore the state a back/forward navigation landed on.
    pub fn resolve_pop(&self, event: &PopEvent, windows: &[WindowRecord]) -> PopAction {
        let topmost_content = || {
            windows
                .iter()
                .filter(|w| w.is_content())
                .max_by_key(|w| w.z_order)
                .map(|w| w.id.clone())
        };
        if event.address.is_base() {
            return topmost_content().map_or(PopAction::ResetBase, PopAction::FocusTopmost);
        }
        let Some(locator) = event.address.locator() else {
            return PopAction::ResetBase;
        };
        let hinted = event
            .hint
            .as_ref()
            .and_then(|hint| windows.iter().find(|w| &w.id == hint));
        if let Some(window) = hinted
            && window.locator() == Some(&locator)
        {
            return PopAction::Focus(window.id.clone());
        }
        if let Some(window) = windows.iter().find(|w| w.locator() == Some(&locator)) {
            return PopAction::Focus(window.id.clone());
        }
        // a live hint pointing elsewhere is stale; never hand it out for reuse
        let reuse_id = event.hint.clone().filter(|_| hinted.is_none());
        PopAction::Recreate { locator, reuse_id }
    }

    fn write_window(&mut self, kind: Write, window: &WindowRecord) {
        let Some(locator) = window.locator() else {
            return;
        };
        let current = self.history.location();
        let url = with_query(
            locator.as_str(),
            self.callback.preserved(&current, Some(locator)),
        );
        let state = HistoryState::for_window(&window.id);
        tracing::debug!(window_id = %window.id, url = %url, ?kind, "history write");
        match kind {
            Write::Push => self.history.push(Some(&state), &window.title, &url),
            Write::Replace => self.history.replace(Some(&state), &window.title, &url),
        }
        self.history.set_document_title(&window.title);
        self.addressed = Some(window.id.clone());
    }
}

fn with_query(path: &str, query: Option<String>) -> String {
    match query {
        Some(q) => format!("{path}?{q}"),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_payload_shape() {
        let state = HistoryState::for_window(&WindowId::from_hint("window-1-00abcd"));
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"windowId":"window-1-00abcd"}"#);
        assert_eq!(HistoryState::from_json(&json), Some(state));
    }

    #[test]
    fn null_and_foreign_state_are_not_hints() {
        assert_eq!(HistoryState::from_json("null"), None);
        assert_eq!(HistoryState::from_json(r#"{"scroll":12}"#), None);
        assert_eq!(HistoryState::from_json("not json"), None);
    }

    #[test]
    fn pop_event_carries_hint() {
        let ev = PopEvent::new(
            Address::parse("/about/"),
            HistoryState::from_json(r#"{"windowId":"w-9"}"#),
        );
        assert_eq!(ev.hint, Some(WindowId::from_hint("w-9")));
    }

    #[test]
    fn query_joins_only_when_present() {
        assert_eq!(with_query("/a/", None), "/a/");
        assert_eq!(with_query("/a/", Some("code=1".into())), "/a/?code=1");
    }
}
