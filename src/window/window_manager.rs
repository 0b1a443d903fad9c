use super::{
    CommentMount, DesktopView, LoadState, WindowBody, WindowId, WindowKind, WindowRecord,
};
use crate::address::{CallbackQuery, Locator, RouteTable};
use crate::config::DesktopConfig;
use crate::drivers::{Handle, PointerInput, PressTarget};
use crate::error::{DesktopError, FetchError};
use crate::history::{HistorySynchronizer, PopAction, PopEvent, SessionHistory};
use crate::layout::Point;
use crate::layout::floating::{Placer, spawn_geometry};
use crate::links::{LinkAction, LinkInterceptor};

/// Seed used when the configuration does not provide one.
const DEFAULT_PLACEMENT_SEED: u64 = 0x5eed_d35c_70b0_0001;

/// What a new window shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowSource {
    Content(Locator),
    Image { src: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateOptions {
    pub source_point: Option<Point>,
    pub animate_from_source: bool,
    pub is_auto_open: bool,
    pub reuse_id: Option<WindowId>,
    pub record_history: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            source_point: None,
            animate_from_source: false,
            is_auto_open: false,
            reuse_id: None,
            record_history: true,
        }
    }
}

impl CreateOptions {
    /// Opened by a click at `point`; the window grows out of it.
    pub fn from_click(point: Option<Point>) -> Self {
        Self {
            source_point: point,
            animate_from_source: point.is_some(),
            ..Self::default()
        }
    }
}

/// A content fetch the binding still has to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    pub id: WindowId,
    pub locator: Locator,
}

/// A fetched page after the binding parsed it.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage<F> {
    /// `None` when the page has no main-content region.
    pub main: Option<MainContent<F>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MainContent<F> {
    pub heading: Option<String>,
    pub fragment: F,
    pub has_comments: bool,
}

pub struct WindowManager<V: DesktopView, H: SessionHistory> {
    view: V,
    history: HistorySynchronizer<H>,
    windows: Vec<WindowRecord>,
    // highest z-order handed out so far, to windows or sibling widgets
    top_z: u32,
    // highest z-order handed to a sibling widget through `allocate_z`
    widget_z: Option<u32>,
    next_window_seq: usize,
    placer: Placer,
    routes: RouteTable,
    links: LinkInterceptor,
    config: DesktopConfig,
    // queue of fetches to start; the binding drains via `take_pending_loads`
    pending_loads: Vec<PendingLoad>,
}

impl<V: DesktopView, H: SessionHistory> WindowManager<V, H> {
    pub fn new(view: V, history: H, config: DesktopConfig) -> Self {
        let callback = CallbackQuery::new(&config.callback_params);
        let history = HistorySynchronizer::new(history, callback, config.base_title.clone());
        let placer = Placer::seeded(config.placement_seed.unwrap_or(DEFAULT_PLACEMENT_SEED));
        Self {
            view,
            history,
            windows: Vec::new(),
            top_z: config.geometry.initial_z,
            widget_z: None,
            next_window_seq: 1,
            placer,
            routes: RouteTable::new(&config.routes, &config.messages),
            links: LinkInterceptor::new(&config.messages),
            config,
            pending_loads: Vec::new(),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn history(&self) -> &H {
        self.history.history()
    }

    pub fn history_mut(&mut self) -> &mut H {
        self.history.history_mut()
    }

    pub fn addressed(&self) -> Option<&WindowId> {
        self.history.addressed()
    }

    pub fn config(&self) -> &DesktopConfig {
        &self.config
    }

    pub fn links(&self) -> &LinkInterceptor {
        &self.links
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn windows(&self) -> &[WindowRecord] {
        &self.windows
    }

    pub fn window(&self, id: &WindowId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| &w.id == id)
    }

    fn index_of(&self, id: &WindowId) -> Option<usize> {
        self.windows.iter().position(|w| &w.id == id)
    }

    pub fn find_by_locator(&self, locator: &Locator) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.locator() == Some(locator))
    }

    /// The window drawn above all others.
    pub fn topmost(&self) -> Option<&WindowRecord> {
        self.windows.iter().max_by_key(|w| w.z_order)
    }

    /// Hand out the next z-order above everything on screen to a widget
    /// that lives beside the windows, such as the audio player.
    pub fn allocate_z(&mut self) -> u32 {
        let z_order = self.next_z();
        self.widget_z = Some(z_order);
        z_order
    }

    fn next_z(&mut self) -> u32 {
        self.top_z = self.top_z.saturating_add(1);
        self.top_z
    }

    /// Whether anything live is drawn above `z_order`.
    fn covered(&self, z_order: u32) -> bool {
        let above_window = self.windows.iter().any(|w| w.z_order > z_order);
        above_window || self.widget_z.is_some_and(|z| z > z_order)
    }

    pub fn take_pending_loads(&mut self) -> Vec<PendingLoad> {
        std::mem::take(&mut self.pending_loads)
    }

    pub fn create_window(
        &mut self,
        title: impl Into<String>,
        source: WindowSource,
        options: CreateOptions,
    ) -> WindowId {
        let title = title.into();
        if let Some(reuse) = &options.reuse_id
            && self.index_of(reuse).is_some()
        {
            tracing::debug!(window_id = %reuse, "reusing live window");
            self.focus_window(reuse, true);
            return reuse.clone();
        }
        if let WindowSource::Content(locator) = &source
            && let Some(existing) = self.find_by_locator(locator)
        {
            let id = existing.id.clone();
            tracing::debug!(window_id = %id, locator = %locator, "content already open");
            self.focus_window(&id, false);
            self.view.flash(&id);
            return id;
        }

        let z_order = self.next_z();
        let viewport = self.view.viewport();
        let geometry = self.placer.place(viewport, &self.config.geometry);
        let id = match options.reuse_id {
            Some(id) => id,
            None => self.generate_id(),
        };
        let kind = match source {
            WindowSource::Content(locator) => WindowKind::Content { locator },
            WindowSource::Image { src } => WindowKind::Image { src },
        };
        let record = WindowRecord::new(
            id.clone(),
            kind,
            title,
            z_order,
            geometry,
            &self.config.geometry,
        );
        let spawn = options
            .source_point
            .filter(|_| options.animate_from_source)
            .map(|point| spawn_geometry(point, &self.config.geometry));
        self.view.mount_window(&record, spawn);

        match &record.kind {
            WindowKind::Content { locator } => {
                let loading = self.config.messages.loading_body.clone();
                self.view.show_body(&id, WindowBody::Loading(loading));
                self.pending_loads.push(PendingLoad {
                    id: id.clone(),
                    locator: locator.clone(),
                });
            }
            WindowKind::Image { src } => {
                let body = WindowBody::Image {
                    src: src.clone(),
                    alt: record.title.clone(),
                };
                self.view.show_body(&id, body);
            }
        }
        tracing::debug!(
            window_id = %id,
            z_order,
            title = %record.title,
            auto_open = options.is_auto_open,
            "opened window"
        );
        if record.is_content() && options.record_history {
            self.history.record_create(&record, options.is_auto_open);
        }
        self.windows.push(record);
        id
    }

    fn generate_id(&mut self) -> WindowId {
        loop {
            let seq = self.next_window_seq;
            self.next_window_seq = seq.saturating_add(1);
            let id = WindowId::generate(seq, self.placer.nonce());
            if self.index_of(&id).is_none() {
                return id;
            }
        }
    }

    /// Open the window a page URL asks for at startup, if any.
    pub fn auto_open(&mut self) -> Option<WindowId> {
        let address = self.history.history().location();
        let (locator, title) = self.routes.auto_open(&address)?;
        tracing::info!(locator = %locator, title = %title, "auto-opening window from address");
        let options = CreateOptions {
            is_auto_open: true,
            ..CreateOptions::default()
        };
        Some(self.create_window(title, WindowSource::Content(locator), options))
    }

    /// Run an intercepted click.
    pub fn open_link(&mut self, action: LinkAction, source_point: Option<Point>) -> WindowId {
        match action {
            LinkAction::OpenContent { locator, title } => self.create_window(
                title,
                WindowSource::Content(locator),
                CreateOptions::from_click(source_point),
            ),
            LinkAction::OpenImage { src, title } => {
                self.create_window(title, WindowSource::Image { src }, CreateOptions::default())
            }
        }
    }

    pub fn focus(&mut self, id: &WindowId) -> Result<(), DesktopError> {
        if self.index_of(id).is_none() {
            return Err(DesktopError::WindowNotFound(id.clone()));
        }
        self.focus_window(id, false);
        Ok(())
    }

    /// Capturing press anywhere inside a window raises it.
    pub fn press_window(&mut self, id: &WindowId) -> Result<(), DesktopError> {
        self.focus(id)
    }

    fn focus_window(&mut self, id: &WindowId, force_history: bool) {
        let Some(idx) = self.index_of(id) else {
            return;
        };
        let raised = self.covered(self.windows[idx].z_order);
        if raised {
            let z_order = self.next_z();
            self.windows[idx].z_order = z_order;
            self.view.set_z_order(id, z_order);
            tracing::trace!(window_id = %id, z_order, "raised window");
        }
        if raised || force_history {
            let record = &self.windows[idx];
            if record.is_content() {
                self.history.record_focus(record);
            }
        }
    }

    pub fn close(&mut self, id: &WindowId) -> Result<(), DesktopError> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| DesktopError::WindowNotFound(id.clone()))?;
        let record = self.windows.remove(idx);
        tracing::debug!(window_id = %record.id, "closing window");
        self.view.remove_window(&record.id);
        self.pending_loads.retain(|load| load.id != record.id);
        if self.windows.is_empty() {
            self.history.reset_to_base();
            return Ok(());
        }
        let next = self
            .windows
            .iter()
            .filter(|w| w.is_content())
            .max_by_key(|w| w.z_order);
        self.history.record_close(&record.id, record.locator(), next);
        Ok(())
    }

    /// Apply the result of a content fetch. Results for windows closed in
    /// the meantime are dropped.
    pub fn complete_load(
        &mut self,
        id: &WindowId,
        result: Result<FetchedPage<V::Fragment>, FetchError>,
    ) {
        let Some(idx) = self.index_of(id) else {
            tracing::debug!(window_id = %id, "dropping load result for closed window");
            return;
        };
        let messages = &self.config.messages;
        let record = &mut self.windows[idx];
        let mut comments = None;
        match result {
            Ok(FetchedPage { main: Some(main) }) => {
                match main.heading.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
                    Some(heading) => record.title = heading.to_string(),
                    None => tracing::debug!(window_id = %id, "page has no heading; keeping title"),
                }
                record.load_state = LoadState::Loaded;
                self.view.show_body(id, WindowBody::Page(main.fragment));
                self.view.bind_links(id);
                if main.has_comments
                    && let Some(locator) = record.locator()
                {
                    comments = Some(CommentMount {
                        placeholder_id: self.config.comments_placeholder_id.clone(),
                        container_id: format!("{}-{}", self.config.comments_placeholder_id, id),
                        canonical_path: locator.to_string(),
                        hook: self.config.comments_hook.clone(),
                        unavailable_text: messages.comments_unavailable.clone(),
                    });
                }
            }
            Ok(FetchedPage { main: None }) => {
                tracing::warn!(
                    window_id = %id,
                    selector = %self.config.main_content_selector,
                    "fetched page has no main content"
                );
                record.title = format!("{}{}", record.initial_title, messages.missing_content_suffix);
                record.load_state = LoadState::Error(messages.missing_content_body.clone());
                let body = WindowBody::Error(messages.missing_content_body.clone());
                self.view.show_body(id, body);
            }
            Err(err) => {
                tracing::error!(window_id = %id, error = %err, "failed to load window content");
                let body = format!("{}{}", messages.load_error_prefix, err);
                record.title = format!("{}{}", record.initial_title, messages.load_error_suffix);
                record.load_state = LoadState::Error(body.clone());
                self.view.show_body(id, WindowBody::Error(body));
            }
        }
        self.view.set_title(id, &record.title);
        self.history.record_title(record);
        if let Some(mount) = comments
            && let Err(err) = self.view.mount_comments(id, &mount)
        {
            tracing::warn!(window_id = %id, error = %err, "comment widget unavailable");
        }
    }

    /// Restore the window stack for a back/forward navigation.
    pub fn on_pop_state(&mut self, event: &PopEvent) {
        let action = self.history.resolve_pop(event, &self.windows);
        tracing::debug!(address = %event.address, ?action, "popstate");
        match action {
            PopAction::FocusTopmost(id) | PopAction::Focus(id) => self.focus_window(&id, true),
            PopAction::ResetBase => self.history.reset_to_base(),
            PopAction::Recreate { locator, reuse_id } => {
                let title = self.routes.title_for(&locator);
                let options = CreateOptions {
                    reuse_id,
                    record_history: false,
                    ..CreateOptions::default()
                };
                let id = self.create_window(title, WindowSource::Content(locator), options);
                self.focus_window(&id, true);
            }
        }
    }

    pub fn begin_drag(&mut self, id: &WindowId, input: &PointerInput, target: PressTarget) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let record = &mut self.windows[idx];
        let geometry = record.geometry;
        if !record.drag.press(input, target, geometry) {
            return false;
        }
        self.view.capture_pointer(id, Handle::TitleBar, input.pointer_id);
        true
    }

    pub fn begin_resize(&mut self, id: &WindowId, input: &PointerInput, target: PressTarget) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let record = &mut self.windows[idx];
        let geometry = record.geometry;
        if !record.resize.press(input, target, geometry) {
            return false;
        }
        self.view.capture_pointer(id, Handle::ResizeGrip, input.pointer_id);
        true
    }

    /// Route a pointer move to the controller tracking that pointer.
    /// Returns `true` when some window consumed it.
    pub fn pointer_move(&mut self, input: &PointerInput) -> bool {
        let viewport = self.view.viewport();
        let min_visible = self.config.geometry.min_visible;
        for record in &mut self.windows {
            let next = record
                .drag
                .motion(input, viewport, min_visible)
                .or_else(|| record.resize.motion(input));
            if let Some(geometry) = next {
                record.geometry = geometry;
                self.view.set_geometry(&record.id, geometry);
                return true;
            }
        }
        false
    }

    /// Handles `pointerup` and `pointercancel`.
    pub fn pointer_up(&mut self, input: &PointerInput) -> bool {
        for record in &mut self.windows {
            if record.drag.release(input) {
                self.view.release_pointer(&record.id, Handle::TitleBar, input.pointer_id);
                return true;
            }
            if record.resize.release(input) {
                self.view.release_pointer(&record.id, Handle::ResizeGrip, input.pointer_id);
                return true;
            }
        }
        false
    }
}
