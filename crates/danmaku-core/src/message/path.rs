//! Total, path-based reader over notification JSON.
//!
//! Notification bodies change shape between server versions and most values
//! live at fixed positions inside arrays-of-arrays (`info[2][1]` is the sender
//! name of a chat message, for example).  [`JsonView`] reads such values by a
//! dot-separated path and never fails: a missing container, a short array, or
//! a type mismatch yields the zero value of the requested type.
//!
//! ```rust
//! use danmaku_core::JsonView;
//!
//! let view = JsonView::parse(br#"{"info":[[0,1,25],"hi",[42,"alice"]]}"#);
//! assert_eq!(view.get("info.2.1").string(), "alice");
//! assert_eq!(view.get("info.0.2").int(), 25);
//! assert_eq!(view.get("info.9.9").int(), 0);
//! ```

use serde_json::Value;

/// Parsed notification body that can be queried by path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonView {
    root: Value,
}

impl JsonView {
    /// Parses `bytes` as JSON.  Invalid JSON produces an empty view.
    pub fn parse(bytes: &[u8]) -> Self {
        Self {
            root: serde_json::from_slice(bytes).unwrap_or(Value::Null),
        }
    }

    /// Wraps an already parsed value.
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// The parsed root value.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Looks up `path`, e.g. `"info.2.1"` or `"data.user_info.uname"`.
    ///
    /// Numeric segments index arrays; on objects every segment is a key.
    pub fn get(&self, path: &str) -> Field<'_> {
        let mut current = Some(&self.root);
        for segment in path.split('.') {
            current = current.and_then(|value| match value {
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                Value::Object(map) => map.get(segment),
                _ => None,
            });
        }
        Field(current)
    }
}

/// The value found at a path, or nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field<'a>(Option<&'a Value>);

impl<'a> Field<'a> {
    /// Returns `true` if the path resolved to a value (including `null`).
    pub fn exists(&self) -> bool {
        self.0.is_some()
    }

    /// The raw value, if any.
    pub fn value(&self) -> Option<&'a Value> {
        self.0
    }

    /// Integer coercion: numbers (floats truncated), numeric strings, `true` as 1.
    pub fn int(&self) -> i64 {
        match self.0 {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Some(Value::String(s)) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                    .unwrap_or_default()
            }
            Some(Value::Bool(b)) => i64::from(*b),
            _ => 0,
        }
    }

    /// Floating-point coercion with the same rules as [`Field::int`].
    pub fn float(&self) -> f64 {
        match self.0 {
            Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
            Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
            Some(Value::Bool(b)) => f64::from(u8::from(*b)),
            _ => 0.0,
        }
    }

    /// String coercion: strings verbatim, scalars rendered, containers as raw JSON.
    pub fn string(&self) -> String {
        match self.0 {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Boolean coercion: bools, non-zero numbers, and `"true"`/`"1"` strings.
    pub fn boolean(&self) -> bool {
        match self.0 {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => matches!(s.trim(), "1" | "t" | "T" | "true" | "TRUE" | "True"),
            _ => false,
        }
    }
}
