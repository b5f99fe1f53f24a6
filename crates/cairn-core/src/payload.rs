//! Frozen structured values carried by commands.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde_json::Value;

/// An immutable structured value.
///
/// Command payloads are frozen as soon as they are decoded: a `Payload`
/// only ever hands out `&Value`, and clones share the same allocation.
/// Nothing downstream of the codec can mutate a payload that another turn
/// (or another clone) still observes.
///
/// # Examples
///
/// ```
/// use cairn_core::Payload;
/// use serde_json::json;
///
/// let p = Payload::freeze(json!({"type": "move", "entities": [7]}));
/// let q = p.clone();
/// assert_eq!(p["type"], "move");
/// assert_eq!(p, q);
/// ```
#[derive(Clone, PartialEq)]
pub struct Payload(Arc<Value>);

impl Payload {
    /// Freeze a value. The value is moved and cannot be reached mutably again.
    pub fn freeze(value: Value) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the underlying value.
    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl Deref for Payload {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::freeze(value)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({})", self.0)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clones_share_storage() {
        let p = Payload::freeze(json!({"type": "stop"}));
        let q = p.clone();
        assert!(std::ptr::eq(p.value(), q.value()));
    }

    #[test]
    fn debug_shows_compact_json() {
        let p = Payload::freeze(json!([1, 2]));
        assert_eq!(format!("{p:?}"), "Payload([1,2])");
    }
}
