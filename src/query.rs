//! Ordered request parameters.

use itertools::Itertools;

/// Parameters whose values never appear in logs.
const SECRET_PARAMETERS: [&str; 3] = ["lgpassword", "lgtoken", "token"];

/// Ordered mapping from parameter name to value.
///
/// Names are unique. Setting an existing name drops the old entry and appends
/// the new one, so whatever is set last is sent last (tokens rely on this).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a query for `action`, asking for the XML response format.
    pub fn action(action: &str) -> Self {
        let mut query = Self::new();
        query.set("action", action).set("format", "xml");
        query
    }

    /// Set `name` to `value`, replacing and moving any existing entry to the end.
    pub fn set<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) -> &mut Self {
        let name = name.into();
        self.params.retain(|(existing, _)| *existing != name);
        self.params.push((name, value.into()));
        self
    }

    /// Owned variant of [`Query::set`] for building queries inline.
    pub fn with<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.set(name, value);
        self
    }

    /// Set a value-less flag parameter such as `bot` or `minor`.
    pub fn flag<N: Into<String>>(&mut self, name: N) -> &mut Self {
        self.set(name, "")
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Render for logs with credentials and tokens masked.
    pub fn describe(&self) -> String {
        self.iter()
            .map(|(name, value)| {
                if SECRET_PARAMETERS.contains(&name) {
                    format!("{}=***", name)
                } else {
                    format!("{}={}", name, value)
                }
            })
            .join("&")
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut query = Self::new();
        for (name, value) in iter {
            query.set(name, value);
        }
        query
    }
}
