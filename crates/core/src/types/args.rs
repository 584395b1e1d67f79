//! Positional and keyword arguments of a call

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Arguments of one call, kept as JSON values so they can be rendered into a
/// cache key and handed to the wrapped function alike.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: BTreeMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument, replacing any previous value
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Append any serializable value as a positional argument
    pub fn try_arg<T: Serialize>(self, value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::json("positional argument is not JSON-representable", e))?;
        Ok(self.arg(value))
    }

    /// Set any serializable value as a keyword argument
    pub fn try_kwarg<T: Serialize>(self, name: impl Into<String>, value: &T) -> Result<Self> {
        let name = name.into();
        let value = serde_json::to_value(value).map_err(|e| {
            Error::json(format!("keyword argument '{name}' is not JSON-representable"), e)
        })?;
        Ok(self.kwarg(name, value))
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &BTreeMap<String, Value> {
        &self.keyword
    }

    /// Positional argument at `index`
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Keyword argument called `name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Positional arguments rendered and joined with `,`
    pub fn render_positional(&self) -> String {
        self.positional
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Keyword arguments rendered as `name:value`, sorted as strings and
    /// joined with `,`. Insertion order never affects the result.
    pub fn render_keyword(&self) -> String {
        let mut pairs: Vec<String> = self
            .keyword
            .iter()
            .map(|(name, value)| format!("{name}:{}", render_value(value)))
            .collect();
        pairs.sort();
        pairs.join(",")
    }
}

/// Strings render raw, everything else as compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
