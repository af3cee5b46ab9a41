//! Multi-valued tag sets attached to generated fields

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::field::Field;
use super::rule::ColumnMatcher;

pub const TAG_COLUMN: &str = "column";
pub const TAG_TYPE: &str = "type";
pub const TAG_PRIMARY_KEY: &str = "primaryKey";
pub const TAG_AUTO_INCREMENT: &str = "autoIncrement";
pub const TAG_NOT_NULL: &str = "not null";
pub const TAG_DEFAULT: &str = "default";
pub const TAG_COMMENT: &str = "comment";
pub const TAG_INDEX: &str = "index";
pub const TAG_UNIQUE_INDEX: &str = "uniqueIndex";
pub const TAG_FOREIGN_KEY: &str = "foreignKey";
pub const TAG_REFERENCES: &str = "references";

/// Serde key holding the serialized name of a field
pub const TAG_RENAME: &str = "rename";

/// Which tag set of a field an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    /// ORM mapping annotations (`#[orm(...)]`)
    Orm,
    /// Serialization annotations (`#[serde(...)]`)
    Serde,
}

/// Ordered map of tag key to an ordered set of values.
///
/// A key never maps to an empty set: setting no values removes the key. Flag
/// keys (`primaryKey`, `not null`) hold the single value `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    entries: IndexMap<String, IndexSet<String>>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the values of `key`. An empty value list removes the key.
    pub fn set<I, V>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values: IndexSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.entries.shift_remove(key);
        } else if let Some(existing) = self.entries.get_mut(key) {
            // keep the key's position so rendering stays stable across rewrites
            *existing = values;
        } else {
            self.entries.insert(key.to_string(), values);
        }
        self
    }

    /// Set a single value
    pub fn set_value(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.set(key, [value.into()])
    }

    /// Set a valueless flag key
    pub fn set_flag(&mut self, key: &str) -> &mut Self {
        self.set(key, [""])
    }

    /// Add one value to `key`, keeping existing values
    pub fn append(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.entries
            .entry(key.to_string())
            .or_default()
            .insert(value.into());
        self
    }

    /// Remove `key`; no-op when absent
    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.entries.shift_remove(key);
        self
    }

    /// Remove every key
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, key: &str) -> Option<&IndexSet<String>> {
        self.entries.get(key)
    }

    /// First value of `key`
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexSet<String>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten into `(key, value)` pairs in order; a key with several values
    /// yields one pair per value
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
            .collect()
    }
}

/// A single declarative edit on a tag set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagOp {
    Set { key: String, values: Vec<String> },
    Remove { key: String },
    /// Drop every key
    Clear,
}

impl TagOp {
    pub fn set<V: Into<String>>(key: &str, values: impl IntoIterator<Item = V>) -> Self {
        TagOp::Set {
            key: key.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn flag(key: &str) -> Self {
        Self::set(key, [""])
    }

    pub fn remove(key: &str) -> Self {
        TagOp::Remove {
            key: key.to_string(),
        }
    }

    pub fn apply(&self, tags: &mut TagSet) {
        match self {
            TagOp::Set { key, values } => {
                tags.set(key, values.iter().cloned());
            }
            TagOp::Remove { key } => {
                tags.remove(key);
            }
            TagOp::Clear => tags.clear(),
        }
    }
}

/// Apply `edit` to every field accepted by `matcher`, in field order.
///
/// Returns how many fields were edited; zero is not an error.
pub fn for_each_field_matching<F>(fields: &mut [Field], matcher: &ColumnMatcher, mut edit: F) -> usize
where
    F: FnMut(&mut Field),
{
    let mut edited = 0;
    for field in fields.iter_mut().filter(|f| matcher.matches(f)) {
        edit(field);
        edited += 1;
    }
    edited
}
