use crate::variables::{VariableSource, normalize_name};

/// The variables visible while rendering: optional overrides layered on top
/// of the session store.
pub struct Scope<'a> {
    store: &'a dyn VariableSource,
    overrides: Option<&'a dyn VariableSource>,
}

impl<'a> Scope<'a> {
    pub fn new(store: &'a dyn VariableSource) -> Self {
        Self {
            store,
            overrides: None,
        }
    }

    pub fn with_overrides(mut self, overrides: &'a dyn VariableSource) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Resolution order: overrides exact, store exact, overrides ignoring
    /// case, store ignoring case. Anything else is the empty string.
    pub fn resolve(&self, raw_name: &str) -> &'a str {
        let name = normalize_name(raw_name);
        if name.is_empty() {
            return "";
        }
        let overrides = self.overrides;
        let store = self.store;
        overrides
            .and_then(|o| o.lookup(name))
            .or_else(|| store.lookup(name))
            .or_else(|| overrides.and_then(|o| o.lookup_ignore_case(name)))
            .or_else(|| store.lookup_ignore_case(name))
            .unwrap_or("")
    }
}

/// Prefixes `https://` unless the URL already starts with `http://` or `https://`.
pub fn normalize_url(url: &str) -> String {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}
