//! Immutable per-request header sets and form payloads.

/// An immutable, ordered set of request headers.
///
/// Headers are never stored as mutable state on the session. Each call
/// passes the set it needs, and the session merges it over its fixed
/// identity headers for that one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: Vec<(String, String)>,
}

impl RequestHeaders {
    /// An empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers accepting any content type (`Accept: */*`).
    pub fn accept_any() -> Self {
        Self::new().with("accept", "*/*")
    }

    /// Return a copy with `name` set to `value`, replacing any earlier value.
    ///
    /// Header names compare case-insensitively.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.entries.push((name, value.into()));
        self
    }

    /// Look up a header value by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Merge `overrides` over this set; entries in `overrides` win.
    pub fn merged(&self, overrides: &RequestHeaders) -> RequestHeaders {
        overrides
            .iter()
            .fold(self.clone(), |acc, (name, value)| acc.with(name, value))
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// URL-encoded form fields for a POST request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    fields: Vec<(String, String)>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_replaces_case_insensitively() {
        let headers = RequestHeaders::new()
            .with("Accept", "text/html")
            .with("accept", "*/*");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("ACCEPT"), Some("*/*"));
    }

    #[test]
    fn test_merged_prefers_overrides_and_keeps_base() {
        let base = RequestHeaders::new().with("user-agent", "Mozilla/5.0");
        let merged = base.merged(&RequestHeaders::accept_any());

        assert_eq!(merged.get("user-agent"), Some("Mozilla/5.0"));
        assert_eq!(merged.get("accept"), Some("*/*"));
        // The base set is untouched
        assert!(base.get("accept").is_none());
    }

    #[test]
    fn test_form_params_preserve_order() {
        let form = FormParams::new()
            .field("identifier", "me@example.com")
            .field("password", "hunter2");
        assert_eq!(form.fields()[0].0, "identifier");
        assert_eq!(form.fields()[1].0, "password");
        assert!(!form.is_empty());
    }
}
