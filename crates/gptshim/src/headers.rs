//! Static headers attached to every outbound request.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use crate::error::ConfigError;

/// Ordered list of `(name, value)` pairs.
///
/// Duplicate names are kept; each pair becomes one header line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` strings, splitting on the first `=`; the value may
    /// itself contain `=`. Entries without `=` or with an empty key are skipped.
    pub fn parse<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for entry in raw {
            let entry = entry.as_ref();
            match entry.split_once('=') {
                Some((name, value)) if !name.trim().is_empty() => {
                    set.insert(name.trim(), value.trim());
                }
                _ => warn!(header = entry, "skipping malformed header, expected key=value"),
            }
        }
        set
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Append every entry of `other`.
    pub fn extend(&mut self, other: HeaderSet) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Convert to a [`HeaderMap`], rejecting names or values that are not valid HTTP.
    pub fn to_header_map(&self) -> Result<HeaderMap, ConfigError> {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            map.append(header_name, header_value);
        }
        Ok(map)
    }
}

/// Appends configured headers to each outgoing request.
///
/// Values are added next to whatever the request already carries, so a name the
/// client also sets (`Authorization`, `Content-Type`) ends up with both values.
#[derive(Debug, Clone, Default)]
pub struct HeaderTransport {
    headers: HeaderMap,
}

impl HeaderTransport {
    pub fn new(set: &HeaderSet) -> Result<Self, ConfigError> {
        Ok(Self {
            headers: set.to_header_map()?,
        })
    }

    pub fn apply(&self, request: &mut reqwest::Request) {
        let target = request.headers_mut();
        for (name, value) in &self.headers {
            target.append(name.clone(), value.clone());
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
