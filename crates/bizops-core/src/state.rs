//! # Projected State
//!
//! A read-only snapshot of derived business facts (stock levels, discount
//! thresholds, ...) supplied by the projection layer at evaluation time.
//! Keys are held in a `BTreeMap` so serialization and iteration order never
//! depend on how the snapshot was assembled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read-only map of projected facts keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectedState(BTreeMap<String, Value>);

impl ProjectedState {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fact. Intended for the projection layer and tests.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Raw fact value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Fact as an integer.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    /// Fact as a float. Integers are widened.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// Fact as a string slice.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Whether a fact is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of facts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no facts were supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate facts in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ProjectedState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
