// src/prompt/substitution.rs

//! Placeholder substitution for prompt templates.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Za-z_][A-Za-z0-9_]*)>").unwrap());

/// How `<KEY>` placeholders are replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionMode {
    /// Replace each key in turn over the whole text. A value that itself
    /// contains `<OTHER>` may be rewritten by a later key. Kept for prompts
    /// that were written against that behavior.
    Sequential,
    /// Scan the template once; inserted values are never rescanned and
    /// placeholders without a parameter stay as they are.
    #[default]
    SinglePass,
}

/// Ordered prompt parameters. Insertion order matters only for `Sequential`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptParams {
    entries: Vec<(String, String)>,
}

impl PromptParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a parameter. Any `Display` value is accepted.
    pub fn set(&mut self, key: impl Into<String>, value: impl fmt::Display) -> &mut Self {
        let key = key.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Adds a JSON value: strings are inserted verbatim, everything else as JSON text.
    pub fn set_json(&mut self, key: impl Into<String>, value: &Value) -> &mut Self {
        match value {
            Value::String(s) => self.set(key, s),
            other => self.set(key, other),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: fmt::Display> FromIterator<(K, V)> for PromptParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = PromptParams::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

/// Replaces placeholders in `template` according to `mode`.
pub fn substitute(template: &str, params: &PromptParams, mode: SubstitutionMode) -> String {
    match mode {
        SubstitutionMode::Sequential => params.iter().fold(template.to_string(), |text, (k, v)| {
            text.replace(&format!("<{k}>"), v)
        }),
        SubstitutionMode::SinglePass => PLACEHOLDER_RE
            .replace_all(template, |caps: &Captures<'_>| match params.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned(),
    }
}
