//! Error types for the options crate.

use serde::de;
use std::fmt;
use thiserror::Error;

/// Errors raised while tokenizing argv or decoding it into a record.
///
/// Every variant carries the offending tokens or keys, so a message can be
/// rendered without any further state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// A value token mixed `k=v` pairs with malformed elements.
    ///
    /// `pairs` holds the pieces of every malformed element, split on the
    /// key/value delimiter.
    #[error("invalid key/value pairs: {}", .pairs.join(", "))]
    InvalidKeyValuePairs { pairs: Vec<String> },

    /// `-xy=value`: more than one short option in front of an inline value.
    #[error("ambiguous short options '{token}': only one short option may take an inline value")]
    AmbiguousShortCluster { token: String },

    /// A second bare `--` after options were already terminated.
    #[error(
        "unexpected end of options at argument {}: {}",
        .position + 1,
        marked(.arguments, .position)
    )]
    UnexpectedEndOfOptions {
        /// Index of the offending `--` in `arguments`.
        position: usize,
        arguments: Vec<String>,
    },

    /// Free tokens that were not in the final positional bucket.
    #[error("unrecognized arguments: {}", .arguments.join(" "))]
    UnrecognizedArguments { arguments: Vec<String> },

    /// Option keys no schema in scope declares.
    #[error("unrecognized options: {}", render_keys(.keys))]
    UnrecognizedOptions { keys: Vec<String> },

    /// Positional tokens given to a record that takes none.
    #[error("unexpected arguments: {} (no positional arguments accepted)", .arguments.join(" "))]
    UnresolvableArguments { arguments: Vec<String> },

    /// A required key was absent and declared no default.
    #[error("missing required option '{key}'")]
    KeyNotFound { key: String },

    /// The raw value had the wrong shape for the target field.
    #[error("type mismatch{}: expected {expected}, found {found}", at(.path))]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// A value was required but the raw value was empty.
    #[error("value not found{}: expected {expected}", at(.path))]
    ValueNotFound { path: String, expected: String },

    /// The schema itself is invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Custom(String),
}

/// Errors raised while building a [`Schema`](crate::Schema).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("option '{0}' is declared more than once")]
    DuplicateKey(String),

    /// Short aliases must map to exactly one key.
    #[error("short option '-{short}' is declared for both '{first}' and '{second}'")]
    DuplicateShort {
        short: char,
        first: String,
        second: String,
    },

    #[error("positional arguments key '{0}' clashes with an option of the same name")]
    ArgumentsKeyClash(String),

    #[error("option keys must not be empty or start with '-': '{0}'")]
    InvalidKey(String),
}

impl OptionsError {
    /// Prefixes the coding path of a decode error with `key`.
    pub(crate) fn at(self, key: &str) -> Self {
        match self {
            OptionsError::TypeMismatch {
                path,
                expected,
                found,
            } => OptionsError::TypeMismatch {
                path: join_path(key, &path),
                expected,
                found,
            },
            OptionsError::ValueNotFound { path, expected } => OptionsError::ValueNotFound {
                path: join_path(key, &path),
                expected,
            },
            OptionsError::KeyNotFound { key: inner } => OptionsError::KeyNotFound {
                key: join_path(key, &inner),
            },
            other => other,
        }
    }

    /// Arguments with the offending end-of-options marker bracketed.
    ///
    /// Returns `None` for every other variant.
    pub fn marked_arguments(&self) -> Option<Vec<String>> {
        match self {
            OptionsError::UnexpectedEndOfOptions {
                position,
                arguments,
            } => Some(mark(arguments, *position)),
            _ => None,
        }
    }
}

impl de::Error for OptionsError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        OptionsError::Custom(msg.to_string())
    }

    fn invalid_type(unexp: de::Unexpected<'_>, exp: &dyn de::Expected) -> Self {
        OptionsError::TypeMismatch {
            path: String::new(),
            expected: exp.to_string(),
            found: unexp.to_string(),
        }
    }

    fn invalid_value(unexp: de::Unexpected<'_>, exp: &dyn de::Expected) -> Self {
        Self::invalid_type(unexp, exp)
    }

    fn invalid_length(len: usize, exp: &dyn de::Expected) -> Self {
        OptionsError::TypeMismatch {
            path: String::new(),
            expected: exp.to_string(),
            found: format!("{} element(s)", len),
        }
    }

    fn unknown_variant(variant: &str, expected: &'static [&'static str]) -> Self {
        OptionsError::TypeMismatch {
            path: String::new(),
            expected: format!("one of {}", expected.join(", ")),
            found: format!("`{}`", variant),
        }
    }

    fn missing_field(field: &'static str) -> Self {
        OptionsError::KeyNotFound {
            key: field.to_string(),
        }
    }
}

/// Result type for options operations.
pub type Result<T> = std::result::Result<T, OptionsError>;

fn join_path(head: &str, tail: &str) -> String {
    if tail.is_empty() {
        head.to_string()
    } else {
        format!("{}.{}", head, tail)
    }
}

fn at(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" at '{}'", path)
    }
}

fn mark(arguments: &[String], position: usize) -> Vec<String> {
    arguments
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == position {
                format!("[{}]", arg)
            } else {
                arg.clone()
            }
        })
        .collect()
}

fn marked(arguments: &[String], position: &usize) -> String {
    mark(arguments, *position).join(" ")
}

fn render_keys(keys: &[String]) -> String {
    keys.iter()
        .map(|key| {
            if key.chars().count() == 1 {
                format!("-{}", key)
            } else {
                format!("--{}", key)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
