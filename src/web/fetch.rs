use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, DocumentFragment, DomParser, Response, SupportedType, Window};

use crate::address::Locator;
use crate::config::DesktopConfig;
use crate::error::FetchError;
use crate::window::{FetchedPage, MainContent};

fn describe(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

/// GET `locator` from the page's own origin and return the body text.
async fn fetch_text(window: &Window, locator: &Locator) -> Result<String, FetchError> {
    let response = JsFuture::from(window.fetch_with_str(locator.as_str()))
        .await
        .map_err(|e| FetchError::Network(describe(&e)))?;
    let response: Response = response
        .dyn_into()
        .map_err(|e| FetchError::Network(describe(&e)))?;
    if !response.ok() {
        return Err(FetchError::Http {
            status: response.status(),
        });
    }
    let text = response.text().map_err(|e| FetchError::Body(describe(&e)))?;
    JsFuture::from(text)
        .await
        .map_err(|e| FetchError::Body(describe(&e)))?
        .as_string()
        .ok_or_else(|| FetchError::Body("response body is not text".to_string()))
}

/// Parse a fetched document and lift its main-content region into a
/// fragment owned by `document`.
pub fn extract_main(
    html: &str,
    document: &Document,
    config: &DesktopConfig,
) -> Result<FetchedPage<DocumentFragment>, FetchError> {
    let parser = DomParser::new().map_err(|e| FetchError::Body(describe(&e)))?;
    let parsed = parser
        .parse_from_string(html, SupportedType::TextHtml)
        .map_err(|e| FetchError::Body(describe(&e)))?;
    let Some(main) = parsed
        .query_selector(&config.main_content_selector)
        .ok()
        .flatten()
    else {
        return Ok(FetchedPage { main: None });
    };
    let heading = main
        .query_selector(&config.heading_selector)
        .ok()
        .flatten()
        .and_then(|h| h.text_content());
    let has_comments = main
        .query_selector(&format!("#{}", config.comments_placeholder_id))
        .ok()
        .flatten()
        .is_some();
    let fragment = document.create_document_fragment();
    while let Some(child) = main.first_child() {
        // append_child adopts the node into the live document
        fragment
            .append_child(&child)
            .map_err(|e| FetchError::Body(describe(&e)))?;
    }
    Ok(FetchedPage {
        main: Some(MainContent {
            heading,
            fragment,
            has_comments,
        }),
    })
}

pub async fn load_page(
    window: &Window,
    document: &Document,
    locator: &Locator,
    config: &DesktopConfig,
) -> Result<FetchedPage<DocumentFragment>, FetchError> {
    let html = fetch_text(window, locator).await?;
    extract_main(&html, document, config)
}
