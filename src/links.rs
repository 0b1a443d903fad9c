//! Decides which clicks open windows instead of navigating.
//!
//! The browser binding scans a subtree with [`LINK_SELECTOR`] and
//! [`IMAGE_SELECTOR`], asks the interceptor which matches to claim, and tags
//! those with [`CLAIM_ATTRIBUTE`]. One delegated click listener then turns
//! clicks on tagged elements into [`LinkAction`]s.

use crate::address::Locator;
use crate::config::Messages;

pub const LINK_SELECTOR: &str =
    r#"a.desktop-icon[data-window-title], a[href^="/"]:not([href="/"]):not(.no-window)"#;
pub const IMAGE_SELECTOR: &str = "img:not(.no-window)";
pub const CLAIM_ATTRIBUTE: &str = "data-window-claimed";
pub const OPT_OUT_CLASS: &str = "no-window";

/// An anchor as read from the DOM.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkCandidate<'a> {
    pub href: &'a str,
    pub desktop_icon: bool,
    pub window_title: Option<&'a str>,
    pub text: &'a str,
    pub opted_out: bool,
}

/// An inline image as read from the DOM.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCandidate<'a> {
    pub src: &'a str,
    pub alt: Option<&'a str>,
    pub inside_anchor: bool,
    pub inside_window_body: bool,
    pub opted_out: bool,
}

/// Modifier state of a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickModifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
    pub button: i16,
}

impl ClickModifiers {
    /// Plain primary-button click; anything else is left to the browser so
    /// "open in new tab" keeps working.
    pub fn is_plain(&self) -> bool {
        self.button == 0 && !(self.ctrl || self.meta || self.shift || self.alt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    OpenContent { locator: Locator, title: String },
    OpenImage { src: String, title: String },
}

#[derive(Debug, Clone)]
pub struct LinkInterceptor {
    fallback_link_title: String,
    fallback_image_title: String,
}

impl LinkInterceptor {
    pub fn new(messages: &Messages) -> Self {
        Self {
            fallback_link_title: messages.fallback_link_title.clone(),
            fallback_image_title: messages.fallback_image_title.clone(),
        }
    }

    pub fn claims_link(&self, link: &LinkCandidate<'_>) -> bool {
        let icon = link.desktop_icon && link.window_title.is_some();
        let local = link.href.starts_with('/')
            && link.href != "/"
            && !link.href.starts_with("//")
            && !link.opted_out;
        (icon || local) && Locator::normalize(link.href).is_some()
    }

    pub fn claims_image(&self, image: &ImageCandidate<'_>) -> bool {
        image.inside_window_body && !image.inside_anchor && !image.opted_out && !image.src.is_empty()
    }

    pub fn link_action(
        &self,
        link: &LinkCandidate<'_>,
        modifiers: ClickModifiers,
    ) -> Option<LinkAction> {
        if !modifiers.is_plain() || !self.claims_link(link) {
            return None;
        }
        let locator = Locator::normalize(link.href)?;
        let title = non_empty(link.window_title)
            .or_else(|| non_empty(Some(link.text)))
            .unwrap_or(&self.fallback_link_title)
            .to_string();
        Some(LinkAction::OpenContent { locator, title })
    }

    pub fn image_action(
        &self,
        image: &ImageCandidate<'_>,
        modifiers: ClickModifiers,
    ) -> Option<LinkAction> {
        if !modifiers.is_plain() || !self.claims_image(image) {
            return None;
        }
        let title = non_empty(image.alt)
            .unwrap_or(&self.fallback_image_title)
            .to_string();
        Some(LinkAction::OpenImage {
            src: image.src.to_string(),
            title,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
