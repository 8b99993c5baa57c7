//! The intermediate value tree produced from argv.
//!
//! Every option assignment is tokenized into a [`Value`] before it is projected
//! onto a typed record. The tree only knows four shapes (dictionaries, ordered
//! arrays, strings and booleans); numbers stay textual until the decoder learns
//! which width the target field wants.

use std::collections::BTreeMap;
use std::fmt;

/// Keyed entries of a [`Value::Dict`].
pub type Dict = BTreeMap<String, Value>;

/// Decoded argv value.
///
/// # Example
///
/// ```
/// use commandant_options::Value;
///
/// let value = Value::from(vec!["a", "b"]);
/// assert!(value.is_array());
/// assert_eq!(value.to_string(), "a,b");
///
/// // A single-element array unwraps to its element.
/// let single = Value::from(vec!["only"]);
/// assert_eq!(single.unwrapped(), &Value::from("only"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Key/value pairs, from `k1=v1,k2=v2` tokens or the option container.
    Dict(Dict),
    /// Ordered elements, from `a,b,c` tokens or repeated options.
    Array(Vec<Value>),
    /// A single textual token.
    Str(String),
    /// A flag that was present (`true`) or explicitly defaulted.
    Bool(bool),
}

impl Value {
    /// Returns `true` if this is a `Dict` value.
    pub fn is_dict(&self) -> bool {
        matches!(self, Value::Dict(_))
    }

    /// Returns `true` if this is an `Array` value.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Returns `true` if this is a `Str` value.
    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    /// Returns `true` if this is a `Bool` value.
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the shape, used in type mismatch messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Dict(_) => "dictionary",
            Value::Array(_) => "array",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
        }
    }

    /// Projects a single-element array onto its only element.
    ///
    /// Every other value is returned as is.
    pub fn unwrapped(&self) -> &Value {
        match self {
            Value::Array(items) if items.len() == 1 => &items[0],
            other => other,
        }
    }

    /// Returns `None` for empty dictionaries, arrays and strings.
    pub fn unempty(&self) -> Option<&Value> {
        let empty = match self {
            Value::Dict(d) => d.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Str(s) => s.is_empty(),
            Value::Bool(_) => false,
        };
        if empty {
            None
        } else {
            Some(self)
        }
    }

    /// Combines a repeated assignment with the value already held for a key.
    ///
    /// A scalar is promoted to a two-element array, arrays are appended to and
    /// dictionaries are merged (later entries win).
    pub fn promote(self, next: Value) -> Value {
        match (self, next) {
            (Value::Dict(mut held), Value::Dict(next)) => {
                held.extend(next);
                Value::Dict(held)
            }
            (Value::Array(mut held), Value::Array(next)) => {
                held.extend(next);
                Value::Array(held)
            }
            (Value::Array(mut held), next) => {
                held.push(next);
                Value::Array(held)
            }
            (held, Value::Array(next)) => {
                let mut items = Vec::with_capacity(next.len() + 1);
                items.push(held);
                items.extend(next);
                Value::Array(items)
            }
            (held, next) => Value::Array(vec![held, next]),
        }
    }
}

/// Renders the value back into argv object format (`a,b` and `k=v,k2=v2`).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Dict(entries) => {
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}={}", key, item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Str(c.to_string())
    }
}

impl From<Dict> for Value {
    fn from(d: Dict) -> Self {
        Value::Dict(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

// Numbers are kept textual, exactly as they would have arrived from argv.
macro_rules! textual_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Str(n.to_string())
                }
            }
        )*
    };
}

textual_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
