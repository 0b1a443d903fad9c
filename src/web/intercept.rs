//! DOM side of link interception: reading anchors and images into
//! candidates, tagging the claimed ones, and resolving delegated clicks.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, MouseEvent};

use crate::links::{
    CLAIM_ATTRIBUTE, ClickModifiers, IMAGE_SELECTOR, ImageCandidate, LINK_SELECTOR, LinkAction,
    LinkCandidate, LinkInterceptor, OPT_OUT_CLASS,
};

const CLAIMED_LINK: &str = "link";
const CLAIMED_IMAGE: &str = "image";

struct LinkAttrs {
    href: String,
    desktop_icon: bool,
    window_title: Option<String>,
    text: String,
    opted_out: bool,
}

impl LinkAttrs {
    fn read(el: &Element) -> Self {
        let classes = el.class_list();
        Self {
            href: el.get_attribute("href").unwrap_or_default(),
            desktop_icon: classes.contains("desktop-icon"),
            window_title: el.get_attribute("data-window-title"),
            text: el.text_content().unwrap_or_default(),
            opted_out: classes.contains(OPT_OUT_CLASS),
        }
    }

    fn candidate(&self) -> LinkCandidate<'_> {
        LinkCandidate {
            href: &self.href,
            desktop_icon: self.desktop_icon,
            window_title: self.window_title.as_deref(),
            text: &self.text,
            opted_out: self.opted_out,
        }
    }
}

struct ImageAttrs {
    src: String,
    alt: Option<String>,
    inside_anchor: bool,
    inside_window_body: bool,
    opted_out: bool,
}

impl ImageAttrs {
    fn read(el: &Element) -> Self {
        let has_ancestor = |selector: &str| el.closest(selector).ok().flatten().is_some();
        Self {
            src: el.get_attribute("src").unwrap_or_default(),
            alt: el.get_attribute("alt"),
            inside_anchor: has_ancestor("a"),
            inside_window_body: has_ancestor(".window-body"),
            opted_out: el.class_list().contains(OPT_OUT_CLASS),
        }
    }

    fn candidate(&self) -> ImageCandidate<'_> {
        ImageCandidate {
            src: &self.src,
            alt: self.alt.as_deref(),
            inside_anchor: self.inside_anchor,
            inside_window_body: self.inside_window_body,
            opted_out: self.opted_out,
        }
    }
}

fn each_match(root: &Element, selector: &str, mut f: impl FnMut(&Element) -> Result<(), JsValue>) -> Result<(), JsValue> {
    let nodes = root.query_selector_all(selector)?;
    for i in 0..nodes.length() {
        if let Some(el) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
            f(&el)?;
        }
    }
    Ok(())
}

/// Tag every anchor and inline image under `root` that the interceptor
/// claims. Already-tagged elements are left alone.
pub fn claim_subtree(root: &Element, interceptor: &LinkInterceptor) -> Result<(), JsValue> {
    let mut claimed = 0usize;
    each_match(root, LINK_SELECTOR, |el| {
        if el.has_attribute(CLAIM_ATTRIBUTE) {
            return Ok(());
        }
        if interceptor.claims_link(&LinkAttrs::read(el).candidate()) {
            el.set_attribute(CLAIM_ATTRIBUTE, CLAIMED_LINK)?;
            claimed += 1;
        }
        Ok(())
    })?;
    each_match(root, IMAGE_SELECTOR, |el| {
        if el.has_attribute(CLAIM_ATTRIBUTE) {
            return Ok(());
        }
        if interceptor.claims_image(&ImageAttrs::read(el).candidate()) {
            el.set_attribute(CLAIM_ATTRIBUTE, CLAIMED_IMAGE)?;
            claimed += 1;
        }
        Ok(())
    })?;
    tracing::trace!(claimed, "claimed links in subtree");
    Ok(())
}

pub fn modifiers(event: &MouseEvent) -> ClickModifiers {
    ClickModifiers {
        ctrl: event.ctrl_key(),
        meta: event.meta_key(),
        shift: event.shift_key(),
        alt: event.alt_key(),
        button: event.button(),
    }
}

/// Resolve a click on `target` to a window action, if a claimed element
/// was hit.
pub fn action_for_click(
    target: &Element,
    interceptor: &LinkInterceptor,
    modifiers: ClickModifiers,
) -> Option<LinkAction> {
    let selector = format!("[{CLAIM_ATTRIBUTE}]");
    let claimed = target.closest(&selector).ok().flatten()?;
    match claimed.get_attribute(CLAIM_ATTRIBUTE).as_deref() {
        Some(CLAIMED_LINK) => {
            interceptor.link_action(&LinkAttrs::read(&claimed).candidate(), modifiers)
        }
        Some(CLAIMED_IMAGE) => {
            interceptor.image_action(&ImageAttrs::read(&claimed).candidate(), modifiers)
        }
        _ => None,
    }
}
