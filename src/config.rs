//! Runtime configuration.
//!
//! The page hands the desktop a plain JS object at boot; it is read through
//! `serde_json`, and every field falls back to the defaults below so an
//! empty object (or no object at all) yields a working desktop.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DesktopConfig {
    /// Id of the element windows are mounted into.
    pub container_id: String,
    /// Selector of the region transplanted out of fetched pages.
    pub main_content_selector: String,
    /// Selector (scoped to the main region) whose text becomes the title.
    pub heading_selector: String,
    /// Id of the comment-widget placeholder inside fetched pages.
    pub comments_placeholder_id: String,
    /// Global function invoked as `hook(containerId, canonicalPath)`.
    pub comments_hook: String,
    /// Document title used when no content window is addressed. `None`
    /// means "whatever the page had at boot".
    pub base_title: Option<String>,
    /// Query parameters that mark an auth-callback return.
    pub callback_params: Vec<String>,
    /// Seed for window placement; the web binding seeds from the clock
    /// when absent.
    pub placement_seed: Option<u64>,
    pub log_level: String,
    pub geometry: GeometryConfig,
    pub routes: Vec<WellKnownRoute>,
    pub messages: Messages,
    pub audio: Option<AudioConfig>,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            container_id: "window-container".to_string(),
            main_content_selector: "#content-main".to_string(),
            heading_selector: "h1".to_string(),
            comments_placeholder_id: "comments".to_string(),
            comments_hook: "initComments".to_string(),
            base_title: None,
            callback_params: vec!["code".to_string(), "state".to_string()],
            placement_seed: None,
            log_level: "info".to_string(),
            geometry: GeometryConfig::default(),
            routes: WellKnownRoute::defaults(),
            messages: Messages::default(),
            audio: None,
        }
    }
}

impl DesktopConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn max_log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeometryConfig {
    pub mobile_breakpoint: f64,
    pub mobile_width: f64,
    pub desktop_width: f64,
    pub height: f64,
    pub margin: f64,
    pub status_bar_height: f64,
    pub min_width: f64,
    pub min_height: f64,
    pub min_visible: f64,
    pub animation_start_size: f64,
    pub initial_z: u32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: MOBILE_BREAKPOINT,
            mobile_width: MOBILE_WINDOW_WIDTH,
            desktop_width: DESKTOP_WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
            margin: VIEWPORT_MARGIN,
            status_bar_height: STATUS_BAR_HEIGHT,
            min_width: MIN_WINDOW_WIDTH,
            min_height: MIN_WINDOW_HEIGHT,
            min_visible: MIN_VISIBLE_MARGIN,
            animation_start_size: OPEN_ANIMATION_START_SIZE,
            initial_z: INITIAL_Z_ORDER,
        }
    }
}

/// A path that auto-opens with a fixed title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellKnownRoute {
    pub path: String,
    pub title: String,
}

impl WellKnownRoute {
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
        }
    }

    fn defaults() -> Vec<Self> {
        vec![
            Self::new("/about/", "关于我"),
            Self::new("/links/", "友情链接"),
            Self::new("/archives/", "存档"),
            Self::new("/guestbook/", "留言板"),
        ]
    }
}

/// User-visible strings. The defaults match the site's locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Messages {
    pub provisional_title: String,
    pub loading_body: String,
    pub load_error_suffix: String,
    pub load_error_prefix: String,
    pub missing_content_suffix: String,
    pub missing_content_body: String,
    pub comments_unavailable: String,
    pub fallback_link_title: String,
    pub fallback_image_title: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            provisional_title: "加载中...".to_string(),
            loading_body: "加载中...".to_string(),
            load_error_suffix: " (加载错误)".to_string(),
            load_error_prefix: "加载内容出错: ".to_string(),
            missing_content_suffix: " (内容加载失败)".to_string(),
            missing_content_body: "错误：在获取的页面中未找到 #content-main 结构。".to_string(),
            comments_unavailable: "评论组件加载失败。".to_string(),
            fallback_link_title: "窗口".to_string(),
            fallback_image_title: "图片".to_string(),
        }
    }
}

/// Embedded audio player settings. `player` is handed to the player's
/// constructor untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioConfig {
    pub icon_id: String,
    pub container_id: String,
    pub root_id: String,
    pub window_ids: Vec<String>,
    /// Shown in the container when the player script is missing or fails.
    pub unavailable_text: String,
    pub player: serde_json::Value,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            icon_id: "icon-musicplayer".to_string(),
            container_id: "webamp-container".to_string(),
            root_id: "webamp".to_string(),
            window_ids: vec![
                "main-window".to_string(),
                "playlist-window".to_string(),
                "equalizer-window".to_string(),
            ],
            unavailable_text: "音乐播放器加载失败。".to_string(),
            player: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}
