// Form state for one wizard instance (in-memory)
//
// NOTE: This is the sole source of truth for what gets submitted; nothing here
// is derived or cached elsewhere. Persistence across a login redirect goes
// through the session store as a JSON snapshot of these values.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Field key -> human-readable message. A missing key means the field is valid.
pub type ErrorMap = BTreeMap<String, String>;

/// Field keys the user has interacted with; gates live validation feedback.
pub type TouchedSet = BTreeSet<String>;

/// A document reference returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    /// Original file name as selected by the applicant
    pub name: String,
    /// Server-assigned storage path
    pub path: String,
}

/// Document key -> uploaded reference. Only successfully uploaded documents
/// appear here; rejected or failed uploads leave the map untouched.
pub type DocumentMap = BTreeMap<String, UploadedDocument>;

/// Accumulated field values for one form instance.
///
/// Keys are fixed by the service definition; every key is present from mount
/// onward, with the empty string meaning "unanswered". BTreeMap keeps the
/// persisted JSON snapshot deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState {
    values: BTreeMap<String, String>,
}

impl FormState {
    /// Create a state with all the given field keys mapped to empty values.
    pub fn with_fields<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            values: keys.into_iter().map(|k| (k.to_string(), String::new())).collect(),
        }
    }

    /// Current value for a field; empty string when the key is unknown.
    pub fn value(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Reset every field back to empty, keeping the key set.
    pub fn clear(&mut self) {
        for v in self.values.values_mut() {
            v.clear();
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// True when no field has been filled in.
    pub fn is_blank(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }
}
