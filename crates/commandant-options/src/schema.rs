//! Declared shape of an options record.
//!
//! A [`Schema`] lists the coding keys a record accepts, their short aliases,
//! descriptions and defaults, plus the key that receives positional
//! arguments. The decoder uses it to resolve raw argv keys; help and
//! completion read it to describe a command.
//!
//! The [`Options`] trait ties a schema to a serde-deserializable record.

use serde::de::DeserializeOwned;

use crate::error::SchemaError;
use crate::value::{Dict, Value};

/// Key always understood as a request for help, unless a schema declares it.
pub const HELP_KEY: &str = "help";
/// Short form of [`HELP_KEY`].
pub const HELP_SHORT: char = 'h';

/// A single declared option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    key: String,
    short: Option<char>,
    description: String,
    default: Option<Value>,
    value_name: Option<String>,
    flag: bool,
}

impl OptionSpec {
    /// An option taking a value.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            short: None,
            description: String::new(),
            default: None,
            value_name: None,
            flag: false,
        }
    }

    /// A boolean flag, defaulting to `false`.
    ///
    /// A flag never consumes the token after it: in `--force file` the
    /// tokenizer first assigns `file` to `force`, and the decoder hands it
    /// back to the positional arguments.
    pub fn flag(key: impl Into<String>) -> Self {
        Self {
            default: Some(Value::Bool(false)),
            flag: true,
            ..Self::new(key)
        }
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Value used when the key is absent from argv.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Placeholder shown in help, e.g. `--output <path>`.
    pub fn value_name(mut self, name: impl Into<String>) -> Self {
        self.value_name = Some(name.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn short_alias(&self) -> Option<char> {
        self.short
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.value_name.as_deref()
    }

    pub fn is_flag(&self) -> bool {
        self.flag
    }
}

/// Where positional arguments land in the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentsSpec {
    key: String,
    value_name: String,
    description: String,
}

impl ArgumentsSpec {
    /// Positional tokens are decoded as an array into field `key`.
    ///
    /// The element type is whatever the field's sequence element is.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            value_name: key.clone(),
            key,
            description: String::new(),
        }
    }

    pub fn value_name(mut self, name: impl Into<String>) -> Self {
        self.value_name = name.into();
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn placeholder(&self) -> &str {
        &self.value_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Validated set of option declarations.
///
/// # Example
///
/// ```
/// use commandant_options::{ArgumentsSpec, OptionSpec, Schema};
///
/// let schema = Schema::builder()
///     .option(OptionSpec::flag("verbose").short('v'))
///     .option(OptionSpec::new("level").default_value(1u8))
///     .arguments(ArgumentsSpec::new("files"))
///     .build()
///     .unwrap();
///
/// assert_eq!(schema.resolve("v").map(|o| o.key()), Some("verbose"));
/// assert!(schema.resolve("x").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    options: Vec<OptionSpec>,
    arguments: Option<ArgumentsSpec>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// A schema with no options and no positional arguments.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(OptionSpec::key)
    }

    pub fn option(&self, key: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.key == key)
    }

    pub fn short_key(&self, short: char) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.short == Some(short))
            .map(OptionSpec::key)
    }

    /// Resolves a raw argv key, falling back to the short alias table for
    /// single-character keys.
    pub fn resolve(&self, raw: &str) -> Option<&OptionSpec> {
        if let Some(option) = self.option(raw) {
            return Some(option);
        }
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(short), None) => self.options.iter().find(|o| o.short == Some(short)),
            _ => None,
        }
    }

    pub fn declares(&self, raw: &str) -> bool {
        self.resolve(raw).is_some()
    }

    /// Returns `true` if `raw` is the implicit help key for this schema.
    pub fn is_help_key(&self, raw: &str) -> bool {
        let implicit = raw == HELP_KEY || raw.chars().eq(std::iter::once(HELP_SHORT));
        implicit && !self.declares(raw)
    }

    pub fn arguments(&self) -> Option<&ArgumentsSpec> {
        self.arguments.as_ref()
    }

    /// Every declared default, keyed by option key.
    pub fn defaults(&self) -> Dict {
        self.options
            .iter()
            .filter_map(|o| Some((o.key.clone(), o.default.clone()?)))
            .collect()
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    options: Vec<OptionSpec>,
    arguments: Option<ArgumentsSpec>,
}

impl SchemaBuilder {
    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn arguments(mut self, arguments: ArgumentsSpec) -> Self {
        self.arguments = Some(arguments);
        self
    }

    /// Validates the declarations.
    ///
    /// # Errors
    ///
    /// Fails on empty or dash-prefixed keys, duplicate keys, a short alias
    /// shared by two keys, or an arguments key that is also an option key.
    pub fn build(self) -> Result<Schema, SchemaError> {
        for (i, option) in self.options.iter().enumerate() {
            if option.key.is_empty() || option.key.starts_with('-') {
                return Err(SchemaError::InvalidKey(option.key.clone()));
            }
            for earlier in &self.options[..i] {
                if earlier.key == option.key {
                    return Err(SchemaError::DuplicateKey(option.key.clone()));
                }
                if let (Some(a), Some(b)) = (earlier.short, option.short) {
                    if a == b {
                        return Err(SchemaError::DuplicateShort {
                            short: a,
                            first: earlier.key.clone(),
                            second: option.key.clone(),
                        });
                    }
                }
            }
        }

        if let Some(arguments) = &self.arguments {
            if self.options.iter().any(|o| o.key == arguments.key) {
                return Err(SchemaError::ArgumentsKeyClash(arguments.key.clone()));
            }
        }

        Ok(Schema {
            options: self.options,
            arguments: self.arguments,
        })
    }
}

/// A typed options record with a declared [`Schema`].
///
/// This is the contract a command declares: the schema drives tokenized key
/// resolution, defaults and positional arguments, and serde projects the
/// resolved values onto the record.
///
/// # Example
///
/// ```
/// use commandant_options::{ArgumentsSpec, OptionSpec, Options, Schema, SchemaError};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Copy {
///     force: bool,
///     files: Vec<String>,
/// }
///
/// impl Options for Copy {
///     fn schema() -> Result<Schema, SchemaError> {
///         Schema::builder()
///             .option(OptionSpec::flag("force").short('f'))
///             .arguments(ArgumentsSpec::new("files"))
///             .build()
///     }
/// }
/// ```
pub trait Options: DeserializeOwned {
    fn schema() -> Result<Schema, SchemaError>;
}

impl Options for () {
    fn schema() -> Result<Schema, SchemaError> {
        Ok(Schema::empty())
    }
}
