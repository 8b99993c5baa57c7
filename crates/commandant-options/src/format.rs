//! Value-level delimiters and the object-format parser.
//!
//! A token assigned to an option may itself describe a structure:
//!
//! ```text
//! 1,2,3          → array ["1", "2", "3"]
//! k1=v1,k2=v2    → dict  {k1: "v1", k2: "v2"}
//! plain          → string "plain"
//! ```
//!
//! The `=` delimiter inside a value is distinct from the `=` that separates an
//! option from its inline value (`--name=k=v` assigns the dict `{k: "v"}`).

use crate::error::{OptionsError, Result};
use crate::value::{Dict, Value};

/// Delimiters used to split a value token into arrays and dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectFormat {
    /// Separates array elements (and dictionary entries).
    pub array_delimiter: char,
    /// Separates a dictionary key from its value.
    pub key_value_delimiter: char,
}

impl Default for ObjectFormat {
    fn default() -> Self {
        Self {
            array_delimiter: ',',
            key_value_delimiter: '=',
        }
    }
}

impl ObjectFormat {
    pub fn new(array_delimiter: char, key_value_delimiter: char) -> Self {
        Self {
            array_delimiter,
            key_value_delimiter,
        }
    }

    /// Parses a value token.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::InvalidKeyValuePairs`] when the token holds
    /// key/value pairs but some element does not contain exactly one
    /// key/value delimiter.
    ///
    /// # Example
    ///
    /// ```
    /// use commandant_options::{ObjectFormat, Value};
    ///
    /// let format = ObjectFormat::default();
    /// assert_eq!(format.parse("1,2").unwrap(), Value::from(vec!["1", "2"]));
    /// assert!(format.parse("k=v").unwrap().is_dict());
    /// assert_eq!(format.parse("plain").unwrap(), Value::from("plain"));
    /// ```
    pub fn parse(&self, token: &str) -> Result<Value> {
        let kv = self.key_value_delimiter;
        if !token.contains(self.array_delimiter) && !token.contains(kv) {
            return Ok(Value::Str(token.to_string()));
        }

        let elements: Vec<&str> = token.split(self.array_delimiter).collect();
        if !elements.iter().any(|e| e.contains(kv)) {
            return Ok(Value::Array(
                elements.into_iter().map(Value::from).collect(),
            ));
        }

        let mut dict = Dict::new();
        let mut malformed = Vec::new();
        for element in elements {
            if element.matches(kv).count() == 1 {
                if let Some((key, value)) = element.split_once(kv) {
                    dict.insert(key.to_string(), Value::from(value));
                }
            } else {
                malformed.extend(element.split(kv).map(String::from));
            }
        }

        if malformed.is_empty() {
            Ok(Value::Dict(dict))
        } else {
            Err(OptionsError::InvalidKeyValuePairs { pairs: malformed })
        }
    }
}
