//! Attribute bags and the active-key marker
//!
//! An [`AttributeBag`] is the concrete set of formatting properties applied
//! to a run of text. [`TextAttributes`] pairs a bag with the ordered list of
//! style keys that produced it ([`ActiveKeys`]). The marker is a typed field
//! next to the bag rather than a reserved entry inside it, so it can never
//! leak into serialized markup.

mod resolver;

pub use resolver::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─────────────────────────────────────────────────────────────────────────────
// Attribute Values
// ─────────────────────────────────────────────────────────────────────────────

/// A single formatting property value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl AttributeValue {
    /// Borrow the value as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Attribute Bag
// ─────────────────────────────────────────────────────────────────────────────

/// Named formatting properties, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag(BTreeMap<String, AttributeValue>);

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Layer `other` over this bag; entries in `other` win.
    pub fn merge(&mut self, other: &AttributeBag) {
        for (name, value) in other.iter() {
            self.0.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for AttributeBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = AttributeBag::new();
        for (name, value) in iter {
            bag.insert(name, value);
        }
        bag
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Active Keys
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered, duplicate-free list of style keys.
///
/// Order follows the declaration order of the style configuration whenever
/// the list is produced by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ActiveKeys(Vec<String>);

impl ActiveKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key` unless already present.
    pub fn push(&mut self, key: impl Into<String>) {
        let key = key.into();
        if !self.0.contains(&key) {
            self.0.push(key);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ActiveKeys {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut keys = ActiveKeys::new();
        for key in iter {
            keys.push(key);
        }
        keys
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Text Attributes
// ─────────────────────────────────────────────────────────────────────────────

/// What a run of text carries: its attribute bag plus the marker of the
/// style keys that produced it.
///
/// A run without a marker was not produced by the engine (or lies outside
/// the buffer); caret sync falls back to the default style for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextAttributes {
    pub bag: AttributeBag,
    pub active_keys: Option<ActiveKeys>,
}

impl TextAttributes {
    pub fn new(bag: AttributeBag, active_keys: ActiveKeys) -> Self {
        Self {
            bag,
            active_keys: Some(active_keys),
        }
    }

    /// An empty bag with no marker.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The active-key marker, if this run was produced by the engine.
    pub fn marker(&self) -> Option<&ActiveKeys> {
        self.active_keys.as_ref()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
