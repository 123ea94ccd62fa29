//! Tag keys used to group view rows.

use serde::Serialize;

use crate::error::{Result, StatsError};

const MAX_TAG_LEN: usize = 255;

/// Validated tag key: non-empty, at most 255 chars, printable ASCII.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TagKey(String);

impl TagKey {
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() || name.len() > MAX_TAG_LEN {
            return Err(StatsError::InvalidTag(format!(
                "tag key length must be 1..={MAX_TAG_LEN}: {name:?}"
            )));
        }
        if !name.bytes().all(|b| (0x20..0x7f).contains(&b)) {
            return Err(StatsError::InvalidTag(format!(
                "tag key must be printable ascii: {name:?}"
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TagKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag values attached to a single record call. Later inserts win.
#[derive(Debug, Clone, Default)]
pub struct TagMap {
    entries: Vec<(TagKey, String)>,
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: TagKey, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &TagKey) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Row key for a view: one value per tag key, empty string when absent.
    pub fn values_for(&self, keys: &[TagKey]) -> Vec<String> {
        keys.iter()
            .map(|k| self.get(k).unwrap_or_default().to_string())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
