//! Run attributes written once at the head of every replay log.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CodecError;

/// Attribute key holding the capture time (seconds since the Unix epoch).
pub const TIMESTAMP_KEY: &str = "timestamp";
/// Attribute key holding the engine version string.
pub const ENGINE_VERSION_KEY: &str = "engine_version";
/// Attribute key holding the ordered list of active mods.
pub const MODS_KEY: &str = "mods";

/// Mod id that is always mounted and never affects compatibility.
pub const RESERVED_USER_MOD: &str = "user";

/// An ordered list of mod identifiers.
///
/// Order is the mount order and is preserved verbatim; two lists are only
/// ever compared for membership, never merged.
///
/// # Examples
///
/// ```
/// use cairn_core::ModList;
///
/// let mods: ModList = ["public", "mod-a"].into_iter().collect();
/// assert!(mods.contains("mod-a"));
/// assert_eq!(mods.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModList(Vec<String>);

impl ModList {
    /// An empty mod list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Whether `id` is in the list.
    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|m| m == id)
    }

    /// Iterate mod ids in mount order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of mods.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a mod id.
    pub fn push(&mut self, id: impl Into<String>) {
        self.0.push(id.into());
    }

    fn to_value(&self) -> Value {
        Value::Array(self.0.iter().cloned().map(Value::String).collect())
    }
}

impl<S: Into<String>> FromIterator<S> for ModList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ModList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Configuration of a recorded run.
///
/// A JSON object of heterogeneous values supplied by the game setup, plus
/// the three keys the recorder adds itself: [`TIMESTAMP_KEY`],
/// [`ENGINE_VERSION_KEY`] and [`MODS_KEY`]. Everything else is opaque and
/// passed to the simulation untouched.
///
/// # Examples
///
/// ```
/// use cairn_core::{ModList, ReplayAttributes};
/// use serde_json::json;
///
/// let mut attrs = ReplayAttributes::try_from(json!({"map": "arcadia"})).unwrap();
/// attrs.set_mods(&["public"].into_iter().collect::<ModList>());
/// assert_eq!(attrs.get("map"), Some(&json!("arcadia")));
/// assert!(attrs.mods().contains("public"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplayAttributes {
    map: Map<String, Value>,
}

impl ReplayAttributes {
    /// Empty attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    /// Set an attribute, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.map.insert(key.into(), value);
    }

    /// Capture time in seconds since the Unix epoch, if recorded.
    pub fn timestamp(&self) -> Option<i64> {
        self.map
            .get(TIMESTAMP_KEY)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|secs| secs as i64)))
    }

    /// Record the capture time.
    pub fn set_timestamp(&mut self, unix_secs: i64) {
        self.insert(TIMESTAMP_KEY, Value::from(unix_secs));
    }

    /// Engine version the run was recorded with, if present.
    pub fn engine_version(&self) -> Option<&str> {
        self.map.get(ENGINE_VERSION_KEY).and_then(Value::as_str)
    }

    /// Record the engine version.
    pub fn set_engine_version(&mut self, version: &str) {
        self.insert(ENGINE_VERSION_KEY, Value::from(version));
    }

    /// The recorded mod list.
    ///
    /// A missing `mods` key yields an empty list; non-string entries are
    /// skipped.
    pub fn mods(&self) -> ModList {
        match self.map.get(MODS_KEY) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => ModList::new(),
        }
    }

    /// Record the active mod list.
    pub fn set_mods(&mut self, mods: &ModList) {
        self.insert(MODS_KEY, mods.to_value());
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }

    /// Convert into a JSON value (always an object).
    pub fn into_value(self) -> Value {
        Value::Object(self.map)
    }
}

impl TryFrom<Value> for ReplayAttributes {
    type Error = CodecError;

    fn try_from(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Object(map) => Ok(Self { map }),
            other => Err(CodecError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }
}

impl From<Map<String, Value>> for ReplayAttributes {
    fn from(map: Map<String, Value>) -> Self {
        Self { map }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_mods_is_empty_list() {
        let attrs = ReplayAttributes::new();
        assert!(attrs.mods().is_empty());
    }

    #[test]
    fn mods_skip_non_strings() {
        let attrs = ReplayAttributes::try_from(json!({"mods": ["public", 3, "mod-a"]})).unwrap();
        let mods: Vec<_> = attrs.mods().iter().map(str::to_owned).collect();
        assert_eq!(mods, vec!["public", "mod-a"]);
    }

    #[test]
    fn augmentation_overwrites_caller_keys() {
        let mut attrs =
            ReplayAttributes::try_from(json!({"engine_version": "stale", "seed": 7})).unwrap();
        attrs.set_engine_version("0.1.0");
        attrs.set_timestamp(1_700_000_000);
        assert_eq!(attrs.engine_version(), Some("0.1.0"));
        assert_eq!(attrs.timestamp(), Some(1_700_000_000));
        assert_eq!(attrs.get("seed"), Some(&json!(7)));
    }

    #[test]
    fn fractional_timestamp_is_truncated() {
        let attrs = ReplayAttributes::try_from(json!({"timestamp": 1500000000.0})).unwrap();
        assert_eq!(attrs.timestamp(), Some(1_500_000_000));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = ReplayAttributes::try_from(json!([1, 2])).unwrap_err();
        assert!(matches!(err, CodecError::NotAnObject { found: "array" }));
    }

    #[test]
    fn mod_list_serializes_as_plain_array() {
        let mods: ModList = ["public", "user"].into_iter().collect();
        assert_eq!(serde_json::to_value(&mods).unwrap(), json!(["public", "user"]));
        assert_eq!(mods.to_string(), "[public, user]");
    }
}
