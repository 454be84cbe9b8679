use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

const NAME: &str = "name";

/// Immutable tagged metric name.
///
/// The name itself is stored as the `name` tag, so two metrics are the same
/// exactly when all of their tags match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Tags {
    tags: BTreeMap<String, String>,
}

impl Tags {
    /// A tag set carrying only the `name` tag.
    pub fn new(name: impl Into<String>) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(NAME.to_string(), name.into());
        Self { tags }
    }

    /// A tag set from `tags`, overriding any `name` tag with `name`.
    pub fn with_tags<I, K, V>(name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut tags: BTreeMap<String, String> = tags
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        tags.insert(NAME.to_string(), name.into());
        Self { tags }
    }

    pub fn name(&self) -> &str {
        self.tags.get(NAME).map(String::as_str).unwrap_or_default()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        let mut first = true;
        for (k, v) in self.tags.iter().filter(|(k, _)| k.as_str() != NAME) {
            f.write_str(if first { "{" } else { "," })?;
            write!(f, "{k}={v}")?;
            first = false;
        }
        if !first {
            f.write_str("}")?;
        }
        Ok(())
    }
}

impl From<&str> for Tags {
    fn from(name: &str) -> Self {
        Tags::new(name)
    }
}

impl From<String> for Tags {
    fn from(name: String) -> Self {
        Tags::new(name)
    }
}
