//! Opaque metadata context threaded through parse, compile, and resolve.
//!
//! The core never interprets these entries; collaborators use them for
//! out-of-band configuration (culture, resource lookup, converter
//! parameters). Macro expressions (`$name` / `$$name`) read resources from
//! here by key.

use rustc_hash::FxHashMap;

use crate::value::Value;

/// A string-keyed bag of values carried alongside every core operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: FxHashMap<String, Value>,
}

impl Metadata {
    /// An empty metadata bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.entries.insert(key.into(), value);
        self
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Whether any entries are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let metadata = Metadata::new().with("culture", Value::string("en-US"));
        assert_eq!(metadata.get("culture"), Some(&Value::string("en-US")));
        assert_eq!(metadata.get("missing"), None);
        assert_eq!(metadata.len(), 1);
    }

    #[test]
    fn insert_replaces() {
        let mut metadata = Metadata::new();
        metadata.insert("k", Value::I32(1));
        metadata.insert("k", Value::I32(2));
        assert_eq!(metadata.get("k"), Some(&Value::I32(2)));
    }
}
