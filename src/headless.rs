//! In-memory stand-ins for the DOM and the browser session history.
//!
//! Used by the test suite and by the replay tool to drive a
//! [`WindowManager`](crate::window::WindowManager) outside the browser.

use std::collections::BTreeMap;

use crate::address::Address;
use crate::drivers::{Handle, PointerCapture};
use crate::error::DesktopError;
use crate::history::{HistoryState, PopEvent, SessionHistory};
use crate::layout::{Geometry, Viewport};
use crate::window::{
    CommentMount, DesktopView, FetchedPage, MainContent, WindowBody, WindowId, WindowManager,
    WindowRecord,
};

pub type HeadlessDesktop = WindowManager<HeadlessView, MemoryHistory>;

/// Page with a main-content region, as the browser binding would hand it
/// over after parsing.
pub fn page(heading: Option<&str>, markup: &str) -> FetchedPage<String> {
    FetchedPage {
        main: Some(MainContent {
            heading: heading.map(str::to_string),
            fragment: markup.to_string(),
            has_comments: markup.contains(r#"id="comments""#),
        }),
    }
}

/// Page that lacks the main-content region.
pub fn page_without_main() -> FetchedPage<String> {
    FetchedPage { main: None }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindow {
    pub geometry: Geometry,
    pub spawned_from: Option<Geometry>,
    pub z_order: u32,
    pub title: String,
    pub body: WindowBody<String>,
    pub comments_container: Option<String>,
    pub captured: Option<(Handle, i32)>,
    pub flashes: u32,
    pub link_scans: u32,
}

#[derive(Debug, Clone)]
pub struct HeadlessView {
    viewport: Viewport,
    windows: BTreeMap<WindowId, HeadlessWindow>,
    comments_hook: Option<Vec<(String, String)>>,
}

impl HeadlessView {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            windows: BTreeMap::new(),
            comments_hook: Some(Vec::new()),
        }
    }

    /// Behave as if the page never loaded the comment widget script.
    pub fn without_comments_hook(mut self) -> Self {
        self.comments_hook = None;
        self
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width, height);
    }

    pub fn window(&self, id: &WindowId) -> Option<&HeadlessWindow> {
        self.windows.get(id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// `(container id, canonical path)` pairs the comment hook was called with.
    pub fn comment_calls(&self) -> &[(String, String)] {
        self.comments_hook.as_deref().unwrap_or_default()
    }

    fn entry(&mut self, id: &WindowId) -> Option<&mut HeadlessWindow> {
        let found = self.windows.get_mut(id);
        if found.is_none() {
            tracing::warn!(window_id = %id, "view command for unmounted window");
        }
        found
    }
}

impl PointerCapture for HeadlessView {
    fn capture_pointer(&mut self, window: &WindowId, handle: Handle, pointer_id: i32) {
        if let Some(w) = self.entry(window) {
            w.captured = Some((handle, pointer_id));
        }
    }

    fn release_pointer(&mut self, window: &WindowId, handle: Handle, pointer_id: i32) {
        if let Some(w) = self.entry(window)
            && w.captured == Some((handle, pointer_id))
        {
            w.captured = None;
        }
    }
}

impl DesktopView for HeadlessView {
    type Fragment = String;

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn mount_window(&mut self, window: &WindowRecord, spawn: Option<Geometry>) {
        self.windows.insert(
            window.id.clone(),
            HeadlessWindow {
                geometry: window.geometry,
                spawned_from: spawn,
                z_order: window.z_order,
                title: window.title.clone(),
                body: WindowBody::Loading(String::new()),
                comments_container: None,
                captured: None,
                flashes: 0,
                link_scans: 0,
            },
        );
    }

    fn set_geometry(&mut self, id: &WindowId, geometry: Geometry) {
        if let Some(w) = self.entry(id) {
            w.geometry = geometry;
        }
    }

    fn set_z_order(&mut self, id: &WindowId, z_order: u32) {
        if let Some(w) = self.entry(id) {
            w.z_order = z_order;
        }
    }

    fn set_title(&mut self, id: &WindowId, title: &str) {
        if let Some(w) = self.entry(id) {
            w.title = title.to_string();
        }
    }

    fn show_body(&mut self, id: &WindowId, body: WindowBody<String>) {
        if let Some(w) = self.entry(id) {
            w.body = body;
        }
    }

    fn bind_links(&mut self, id: &WindowId) {
        if let Some(w) = self.entry(id) {
            w.link_scans += 1;
        }
    }

    fn mount_comments(&mut self, id: &WindowId, mount: &CommentMount) -> Result<(), DesktopError> {
        let Some(w) = self.windows.get_mut(id) else {
            return Err(DesktopError::WindowNotFound(id.clone()));
        };
        match self.comments_hook.as_mut() {
            Some(calls) => {
                w.comments_container = Some(mount.container_id.clone());
                calls.push((mount.container_id.clone(), mount.canonical_path.clone()));
                Ok(())
            }
            None => {
                if let WindowBody::Page(markup) = &mut w.body {
                    markup.push_str(&mount.unavailable_text);
                }
                Err(DesktopError::MissingExternalHook(mount.hook.clone()))
            }
        }
    }

    fn flash(&mut self, id: &WindowId) {
        if let Some(w) = self.entry(id) {
            w.flashes += 1;
        }
    }

    fn remove_window(&mut self, id: &WindowId) {
        self.windows.remove(id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub state: Option<HistoryState>,
    pub title: String,
    pub url: String,
}

/// A browser session-history stack.
///
/// `push` drops any forward entries; `back` and `forward` move the cursor
/// and report the [`PopEvent`] the browser would fire.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<HistoryEntry>,
    index: usize,
    document_title: String,
    pushes: usize,
    replaces: usize,
}

impl MemoryHistory {
    pub fn new(url: &str, document_title: &str) -> Self {
        Self {
            entries: vec![HistoryEntry {
                state: None,
                title: document_title.to_string(),
                url: url.to_string(),
            }],
            index: 0,
            document_title: document_title.to_string(),
            pushes: 0,
            replaces: 0,
        }
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.index]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Index of the current entry in [`entries`](Self::entries).
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_count(&self) -> usize {
        self.pushes
    }

    pub fn replace_count(&self) -> usize {
        self.replaces
    }

    pub fn back(&mut self) -> Option<PopEvent> {
        self.index = self.index.checked_sub(1)?;
        Some(self.pop_event())
    }

    pub fn forward(&mut self) -> Option<PopEvent> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.pop_event())
    }

    fn pop_event(&self) -> PopEvent {
        let entry = self.current();
        PopEvent::new(Address::parse(&entry.url), entry.state.clone())
    }
}

impl SessionHistory for MemoryHistory {
    fn location(&self) -> Address {
        Address::parse(&self.current().url)
    }

    fn document_title(&self) -> String {
        self.document_title.clone()
    }

    fn set_document_title(&mut self, title: &str) {
        self.document_title = title.to_string();
    }

    fn push(&mut self, state: Option<&HistoryState>, title: &str, url: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(HistoryEntry {
            state: state.cloned(),
            title: title.to_string(),
            url: url.to_string(),
        });
        self.index = self.entries.len() - 1;
        self.pushes += 1;
    }

    fn replace(&mut self, state: Option<&HistoryState>, title: &str, url: &str) {
        self.entries[self.index] = HistoryEntry {
            state: state.cloned(),
            title: title.to_string(),
            url: url.to_string(),
        };
        self.replaces += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_truncates_forward_entries() {
        let mut h = MemoryHistory::new("/", "Home");
        h.push(None, "a", "/a/");
        h.push(None, "b", "/b/");
        assert_eq!(h.back().map(|e| e.address.to_url()), Some("/a/".to_string()));
        h.push(None, "c", "/c/");
        assert_eq!(h.len(), 3);
        assert!(h.forward().is_none());
        assert_eq!(h.current().url, "/c/");
    }

    #[test]
    fn back_past_first_entry_is_none() {
        let mut h = MemoryHistory::new("/", "Home");
        assert!(h.back().is_none());
        assert_eq!(h.current().url, "/");
    }

    #[test]
    fn replace_keeps_cursor() {
        let mut h = MemoryHistory::new("/about/", "Home");
        let state = HistoryState {
            window_id: "w".into(),
        };
        h.replace(Some(&state), "关于我", "/about/");
        assert_eq!(h.len(), 1);
        assert_eq!(h.replace_count(), 1);
        assert_eq!(h.current().state, Some(state));
    }
}
