//! Address-bar model: what the browser location says, what content path a
//! window is backed by, and which paths open automatically.

use std::fmt;

use crate::config::{Messages, WellKnownRoute};

/// Path plus optional query of the current browser location.
///
/// The query is stored without its leading `?`; the fragment is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    path: String,
    query: Option<String>,
}

impl Address {
    pub fn new(path: impl Into<String>, query: Option<String>) -> Self {
        let query = query
            .map(|q| q.trim_start_matches('?').to_string())
            .filter(|q| !q.is_empty());
        Self {
            path: path.into(),
            query,
        }
    }

    /// Parse a same-origin URL reference such as `/about/?code=1#top`.
    pub fn parse(reference: &str) -> Self {
        let without_fragment = reference.split('#').next().unwrap_or_default();
        match without_fragment.split_once('?') {
            Some((path, query)) => Self::new(path, Some(query.to_string())),
            None => Self::new(without_fragment, None),
        }
    }

    pub fn base() -> Self {
        Self::new("/", None)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn is_base(&self) -> bool {
        is_base_path(&self.path)
    }

    /// The content locator this address points at, if any.
    pub fn locator(&self) -> Option<Locator> {
        Locator::normalize(&self.path)
    }

    pub fn to_url(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}

fn is_base_path(path: &str) -> bool {
    matches!(path, "" | "/" | "/index.html")
}

/// A normalized same-origin content path; the dedup key for content windows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator(String);

impl Locator {
    /// Normalize a path into its canonical locator.
    ///
    /// Returns `None` for the base address and for anything that is not a
    /// rooted same-origin path. `…/index.html` collapses to its directory and
    /// extension-less paths gain a trailing slash.
    pub fn normalize(path: &str) -> Option<Self> {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        if is_base_path(path) || !path.starts_with('/') || path.starts_with("//") {
            return None;
        }
        if let Some(dir) = path.strip_suffix("index.html")
            && dir.ends_with('/')
        {
            return (!is_base_path(dir)).then(|| Self(dir.to_string()));
        }
        if path.ends_with('/') || has_extension(path) {
            return Some(Self(path.to_string()));
        }
        Some(Self(format!("{path}/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this names a directory-like resource rather than a file.
    pub fn is_directory_like(&self) -> bool {
        self.0.ends_with('/')
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn has_extension(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
}

/// Well-known paths and the titles they open with.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<(Locator, String)>,
    provisional_title: String,
}

impl RouteTable {
    pub fn new(routes: &[WellKnownRoute], messages: &Messages) -> Self {
        let routes = routes
            .iter()
            .filter_map(|route| {
                let locator = Locator::normalize(&route.path);
                if locator.is_none() {
                    tracing::warn!(path = %route.path, "ignoring well-known route without a content path");
                }
                locator.map(|l| (l, route.title.clone()))
            })
            .collect();
        Self {
            routes,
            provisional_title: messages.provisional_title.clone(),
        }
    }

    pub fn well_known_title(&self, locator: &Locator) -> Option<&str> {
        self.routes
            .iter()
            .find(|(l, _)| l == locator)
            .map(|(_, title)| title.as_str())
    }

    /// Title a window for `locator` starts with before its page loads.
    pub fn title_for(&self, locator: &Locator) -> String {
        self.well_known_title(locator)
            .unwrap_or(&self.provisional_title)
            .to_string()
    }

    /// Which window, if any, the page should open for its initial address.
    pub fn auto_open(&self, address: &Address) -> Option<(Locator, String)> {
        let locator = address.locator()?;
        if let Some(title) = self.well_known_title(&locator) {
            return Some((locator, title.to_string()));
        }
        if !locator.is_directory_like() {
            return None;
        }
        let title = self.provisional_title.clone();
        Some((locator, title))
    }
}

/// Detects a third-party authorization redirect landing back on the page.
///
/// The comment widget finishes its login handshake by redirecting to the
/// page it started from with reserved query parameters; those must survive
/// our own history rewrites or the handshake is lost.
#[derive(Debug, Clone)]
pub struct CallbackQuery {
    params: Vec<String>,
}

impl CallbackQuery {
    pub fn new(params: &[String]) -> Self {
        Self {
            params: params.to_vec(),
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        url::form_urlencoded::parse(query.as_bytes())
            .any(|(key, _)| self.params.iter().any(|p| p.as_str() == key))
    }

    /// Query to carry into a history write targeting `target` (`None` is the
    /// base address). Everything other than a callback return on the same
    /// path is dropped.
    pub fn preserved(&self, current: &Address, target: Option<&Locator>) -> Option<String> {
        let query = current.query()?;
        if !self.matches(query) {
            return None;
        }
        let same_path = match target {
            Some(locator) => current.locator().as_ref() == Some(locator),
            None => current.is_base(),
        };
        same_path.then(|| query.to_string())
    }
}
