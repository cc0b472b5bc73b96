//! Dataset group metadata.
//!
//! Metadata is an ordered list of string key/value pairs. Drivers may push
//! duplicate keys while reading a source; lookups and updates always act on
//! the first entry for a key.

use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

/// Ordered key/value metadata storage.
///
/// Most groups carry only a handful of annotations, so entries live inline.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: SmallVec<[(String, String); 4]>,
}

impl Metadata {
    /// Key holding the group name.
    pub const NAME_KEY: &'static str = "name";

    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, updating the first entry for `key` or appending a new one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Append an entry without checking for an existing key.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Apply every entry of `other` through [`Metadata::set`].
    pub fn extend_from<'a>(&mut self, other: impl IntoIterator<Item = (&'a str, &'a str)>) {
        for (k, v) in other {
            self.set(k, v);
        }
    }

    /// Get the value of the first entry for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the value for `key`, or an empty string when absent.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove the first entry for `key` and return its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Entry at position `index`, in insertion order.
    pub fn entry(&self, index: usize) -> Option<(&str, &str)> {
        self.entries
            .get(index)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over key-value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Group name stored under [`Metadata::NAME_KEY`].
    pub fn name(&self) -> &str {
        self.get_or_empty(Self::NAME_KEY)
    }

    /// Set the group name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.set(Self::NAME_KEY, name);
    }

    /// Serialize as `key=value;key2=value2`, escaping `\`, `;` and `=`.
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}={}", escape(k), escape(v)))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Parse text produced by [`Metadata::serialize`]. Entries without `=`
    /// or with an empty key are skipped.
    pub fn parse(s: &str) -> Self {
        let mut meta = Self::new();
        for part in split_unescaped(s, ';') {
            let Some(eq) = find_unescaped(part, '=') else {
                continue;
            };
            let key = unescape(&part[..eq]);
            if !key.is_empty() {
                meta.set(key, unescape(&part[eq + 1..]));
            }
        }
        meta
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

/// Entries in key order.
impl From<BTreeMap<String, String>> for Metadata {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut meta = Self::new();
        for (k, v) in iter {
            meta.set(k, v);
        }
        meta
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | ';' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('\\', Some(&next)) if matches!(next, '\\' | ';' | '=') => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Byte offsets of every `sep` not escaped by a backslash.
fn unescaped_positions(s: &str, sep: char) -> impl Iterator<Item = usize> + '_ {
    let mut escaped = false;
    s.char_indices().filter_map(move |(i, c)| {
        if escaped {
            escaped = false;
            None
        } else if c == '\\' {
            escaped = true;
            None
        } else if c == sep {
            Some(i)
        } else {
            None
        }
    })
}

fn find_unescaped(s: &str, sep: char) -> Option<usize> {
    unescaped_positions(s, sep).next()
}

fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for i in unescaped_positions(s, sep) {
        parts.push(&s[start..i]);
        start = i + sep.len_utf8();
    }
    if start < s.len() {
        parts.push(&s[start..]);
    }
    parts
}
