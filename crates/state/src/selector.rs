//! Rich-query selector
//!
//! A conjunction of top-level field equalities, the subset of a CouchDB
//! `{"selector": {...}}` document the contract uses.

use std::collections::BTreeMap;

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    fields: BTreeMap<String, Value>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// True when `doc` is a JSON object carrying every required field value
    pub fn matches(&self, doc: &Value) -> bool {
        let Some(object) = doc.as_object() else {
            return false;
        };
        self.fields
            .iter()
            .all(|(field, expected)| object.get(field) == Some(expected))
    }

    /// True when the raw bytes parse as JSON and match
    pub fn matches_bytes(&self, bytes: &[u8]) -> bool {
        serde_json::from_slice::<Value>(bytes)
            .map(|doc| self.matches(&doc))
            .unwrap_or(false)
    }

    /// CouchDB-style query string, for logs
    pub fn to_query_string(&self) -> String {
        serde_json::json!({ "selector": self.fields }).to_string()
    }
}
