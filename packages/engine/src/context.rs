//! Placeholder context for document assembly
//!
//! Holds two views of the data an external context builder produced:
//!
//! - **Replacements**: placeholder name -> string, used for substitution
//! - **Typed values**: placeholder name -> [`Value`], used only by the
//!   condition evaluator
//!
//! The typed view is a superset: every replacement is also stored as a
//! [`Value::String`], and computed fields (booleans, amounts, lists) can be
//! added on top with [`PlaceholderContext::insert_typed`].
//!
//! All lookups are case-insensitive. Keys are normalized once on insert
//! instead of scanning per lookup.

use crate::error::{AssemblyError, Result};
use crate::types::Value;
use std::collections::HashMap;

/// Map with case-insensitive string keys.
///
/// Keys are stored lower-cased; the most recent insert for a key wins.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseInsensitiveMap<V: Clone> {
    entries: HashMap<String, V>,
}

impl<V: Clone> Default for CaseInsensitiveMap<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V: Clone> CaseInsensitiveMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any entry whose key differs only in case.
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        self.entries.insert(normalize_key(key), value)
    }

    /// Look up a value by key, ignoring case.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(&normalize_key(key))
    }

    /// Check whether a key is present, ignoring case.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize_key(key))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(normalized key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<V: Clone> From<HashMap<String, V>> for CaseInsensitiveMap<V> {
    fn from(map: HashMap<String, V>) -> Self {
        let mut result = Self::new();
        for (key, value) in map {
            result.insert(&key, value);
        }
        result
    }
}

impl<V: Clone> FromIterator<(String, V)> for CaseInsensitiveMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(&key, value);
        }
        map
    }
}

fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}

/// Data context of a single assembly request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceholderContext {
    replacements: CaseInsensitiveMap<String>,
    typed: CaseInsensitiveMap<Value>,
}

impl PlaceholderContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON object.
    ///
    /// Scalars become replacements (and typed entries). Lists and nulls are
    /// typed-only since they have no single substitution text.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = json.as_object().ok_or_else(|| {
            AssemblyError::InvalidDocument("context must be a JSON object".to_string())
        })?;

        let mut context = Self::new();
        for (key, raw) in object {
            let value = Value::from_json(raw);
            match &value {
                Value::Null | Value::Array(_) => context.insert_typed(key, value),
                _ => {
                    let text = value.to_text().unwrap_or_default();
                    context.replacements.insert(key, text);
                    context.typed.insert(key, value);
                }
            }
        }
        Ok(context)
    }

    /// Add a replacement. It is also visible to conditions as a string.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        self.typed.insert(key, Value::String(value.clone()));
        self.replacements.insert(key, value);
    }

    /// Add a typed-only entry for condition evaluation.
    pub fn insert_typed(&mut self, key: &str, value: impl Into<Value>) {
        self.typed.insert(key, value.into());
    }

    /// Builder variant of [`insert`](Self::insert).
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder variant of [`insert_typed`](Self::insert_typed).
    pub fn with_typed(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert_typed(key, value);
        self
    }

    /// Replacement text for a placeholder.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.replacements.get(key).map(String::as_str)
    }

    /// Typed value for condition evaluation; missing keys are null.
    pub fn get_typed(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.typed.get(key).unwrap_or(&NULL)
    }

    /// True when the replacement exists and is not whitespace-only.
    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.trim().is_empty())
    }

    /// All replacements.
    pub fn replacements(&self) -> &CaseInsensitiveMap<String> {
        &self.replacements
    }

    /// All typed values.
    pub fn typed(&self) -> &CaseInsensitiveMap<Value> {
        &self.typed
    }

    /// True when there is nothing to substitute.
    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }
}
