//! Projection of a tokenized [`Container`] onto declared schemas.
//!
//! Decoding happens in two steps:
//!
//! 1. [`decode_local`] decodes against the command's own schema. Keys the
//!    schema does not declare produce [`LocalError::Unrecognized`], carrying
//!    the unknown keys and a best-effort decode of the recognized ones.
//! 2. [`decode_with_shared`] decodes against the command's schema plus the
//!    shared schema declared at the root. Keys neither explains are final.
//!
//! Projection also settles the positional buckets: a value a flag swallowed
//! goes back to the bucket that flag opened, only the last bucket may hold
//! tokens, and those tokens become the record's positional arguments.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::container::Container;
use crate::decoder::from_value;
use crate::error::{OptionsError, Result};
use crate::schema::{OptionSpec, Options, Schema};
use crate::value::{Dict, Value};

/// Values resolved for each schema in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    /// Dictionary for the command's own record, positional arguments included.
    pub local: Value,
    /// Dictionary for the shared record (empty when no shared schema is in scope).
    pub shared: Value,
}

#[derive(Debug, Clone, Copy)]
enum Target<'s> {
    Local(&'s OptionSpec),
    Shared(&'s OptionSpec),
    Help,
    Unknown,
}

/// A container viewed through a local schema and an optional shared schema.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    container: &'a Container,
    local: &'a Schema,
    shared: Option<&'a Schema>,
}

impl<'a> Scope<'a> {
    pub fn new(container: &'a Container, local: &'a Schema) -> Self {
        Self {
            container,
            local,
            shared: None,
        }
    }

    pub fn with_shared(self, shared: &'a Schema) -> Self {
        Self {
            shared: Some(shared),
            ..self
        }
    }

    fn target(&self, raw: &str) -> Target<'a> {
        if let Some(option) = self.local.resolve(raw) {
            return Target::Local(option);
        }
        if let Some(option) = self.shared.and_then(|s| s.resolve(raw)) {
            return Target::Shared(option);
        }
        if self.local.is_help_key(raw) {
            return Target::Help;
        }
        Target::Unknown
    }

    /// Raw keys that no schema in scope declares, in order of appearance.
    pub fn unknown_keys(&self) -> Vec<String> {
        self.container
            .keys()
            .into_iter()
            .filter(|raw| matches!(self.target(raw), Target::Unknown))
            .map(String::from)
            .collect()
    }

    /// Returns `true` if `--help` or `-h` was given and no schema claims it.
    pub fn help_requested(&self) -> bool {
        self.container
            .keys()
            .into_iter()
            .any(|raw| matches!(self.target(raw), Target::Help))
    }

    /// Resolves every assignment, settles buckets and applies defaults.
    ///
    /// Unknown keys are skipped; call [`Scope::unknown_keys`] first when they
    /// must be rejected.
    ///
    /// # Errors
    ///
    /// - [`OptionsError::UnrecognizedArguments`] when free tokens sit outside
    ///   the last bucket
    /// - [`OptionsError::UnresolvableArguments`] when positional tokens remain
    ///   but the local schema takes none
    pub fn project(&self) -> Result<Projection> {
        let mut local = Dict::new();
        let mut shared = Dict::new();
        let mut buckets = self.container.buckets().clone();
        let mut reinjected: BTreeMap<usize, usize> = BTreeMap::new();

        for assignment in self.container.assignments() {
            let (dict, option) = match self.target(&assignment.key) {
                Target::Local(option) => (&mut local, option),
                Target::Shared(option) => (&mut shared, option),
                Target::Help | Target::Unknown => continue,
            };

            let value = if option.is_flag() && !assignment.value.is_bool() {
                // `--flag token`: the token was never meant for the flag.
                let token = match &assignment.raw {
                    Some(raw) => raw.clone(),
                    None => assignment.value.to_string(),
                };
                trace!(key = option.key(), %token, bucket = assignment.bucket, "reinjecting flag value");
                let offset = reinjected.entry(assignment.bucket).or_default();
                buckets
                    .entry(assignment.bucket)
                    .or_default()
                    .insert(*offset, token);
                *offset += 1;
                Value::Bool(true)
            } else {
                assignment.value.clone()
            };

            let merged = match dict.remove(option.key()) {
                Some(held) => held.promote(value),
                None => value,
            };
            dict.insert(option.key().to_string(), merged);
        }

        let last = self.container.last_bucket();
        let strays: Vec<String> = buckets
            .iter()
            .filter(|(id, _)| **id != last)
            .flat_map(|(_, tokens)| tokens.iter().cloned())
            .collect();
        if !strays.is_empty() {
            return Err(OptionsError::UnrecognizedArguments { arguments: strays });
        }

        let arguments = buckets.remove(&last).unwrap_or_default();
        match self.local.arguments() {
            Some(spec) => {
                local.insert(spec.key().to_string(), Value::from(arguments));
            }
            None if !arguments.is_empty() => {
                return Err(OptionsError::UnresolvableArguments { arguments });
            }
            None => {}
        }

        apply_defaults(&mut local, self.local);
        if let Some(schema) = self.shared {
            apply_defaults(&mut shared, schema);
        }

        debug!(
            local = local.len(),
            shared = shared.len(),
            "projected options"
        );

        Ok(Projection {
            local: Value::Dict(local),
            shared: Value::Dict(shared),
        })
    }
}

fn apply_defaults(dict: &mut Dict, schema: &Schema) {
    for option in schema.options() {
        if dict.contains_key(option.key()) {
            continue;
        }
        if let Some(default) = option.default() {
            dict.insert(option.key().to_string(), default.clone());
        }
    }
}

/// Unknown keys found while decoding against a command's own schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Unrecognized<T> {
    /// Raw keys no local option declares, in order of appearance.
    pub keys: Vec<String>,
    /// The record decoded from the recognized keys, if that succeeded.
    pub partial: Option<T>,
}

/// Failure of [`decode_local`].
#[derive(Debug, Clone, PartialEq)]
pub enum LocalError<T> {
    /// Unknown keys; a broader schema may still explain them.
    Unrecognized(Unrecognized<T>),
    /// Any other decode failure. Final.
    Failed(OptionsError),
}

impl<T> LocalError<T> {
    /// The error to report when no retry is attempted.
    pub fn into_error(self) -> OptionsError {
        match self {
            LocalError::Unrecognized(unrecognized) => OptionsError::UnrecognizedOptions {
                keys: unrecognized.keys,
            },
            LocalError::Failed(err) => err,
        }
    }
}

impl<T> From<OptionsError> for LocalError<T> {
    fn from(err: OptionsError) -> Self {
        LocalError::Failed(err)
    }
}

/// Decodes `T` from its own schema alone, rejecting any unknown key.
///
/// # Example
///
/// ```
/// use commandant_options::{decode, ArgumentsSpec, ContainerBuilder, OptionSpec, Options, Schema, SchemaError};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Remove {
///     force: bool,
///     paths: Vec<String>,
/// }
///
/// impl Options for Remove {
///     fn schema() -> Result<Schema, SchemaError> {
///         Schema::builder()
///             .option(OptionSpec::flag("force").short('f'))
///             .arguments(ArgumentsSpec::new("paths"))
///             .build()
///     }
/// }
///
/// let container = ContainerBuilder::new().build(&["-f", "a.txt", "b.txt"]).unwrap();
/// let remove: Remove = decode(&container).unwrap();
/// assert!(remove.force);
/// assert_eq!(remove.paths, ["a.txt", "b.txt"]);
/// ```
pub fn decode<T: Options>(container: &Container) -> Result<T> {
    decode_local::<T>(container).map_err(LocalError::into_error)
}

/// Decodes `T` from its own schema, reporting unknown keys as recoverable.
pub fn decode_local<T: Options>(container: &Container) -> std::result::Result<T, LocalError<T>> {
    let schema = T::schema().map_err(OptionsError::from)?;
    let scope = Scope::new(container, &schema);

    let keys = scope.unknown_keys();
    if !keys.is_empty() {
        debug!(?keys, "unrecognized local options");
        let partial = scope
            .project()
            .ok()
            .and_then(|projection| from_value(projection.local).ok());
        return Err(LocalError::Unrecognized(Unrecognized { keys, partial }));
    }

    let projection = scope.project()?;
    Ok(from_value(projection.local)?)
}

/// Projects `container` onto a local and a shared schema together.
///
/// # Errors
///
/// [`OptionsError::UnrecognizedOptions`] for keys neither schema declares,
/// plus every error of [`Scope::project`].
pub fn decode_with_shared(
    container: &Container,
    local: &Schema,
    shared: &Schema,
) -> Result<Projection> {
    let scope = Scope::new(container, local).with_shared(shared);
    let keys = scope.unknown_keys();
    if !keys.is_empty() {
        return Err(OptionsError::UnrecognizedOptions { keys });
    }
    scope.project()
}

/// Typed form of [`decode_with_shared`].
pub fn decode_pair<T: Options, G: Options>(container: &Container) -> Result<(T, G)> {
    let local = T::schema()?;
    let shared = G::schema()?;
    let projection = decode_with_shared(container, &local, &shared)?;
    Ok((from_value(projection.local)?, from_value(projection.shared)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerBuilder;
    use crate::schema::ArgumentsSpec;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Flagged {
        flag: bool,
        arguments: Vec<String>,
    }

    impl Options for Flagged {
        fn schema() -> std::result::Result<Schema, crate::SchemaError> {
            Schema::builder()
                .option(OptionSpec::flag("flag").short('f'))
                .arguments(ArgumentsSpec::new("arguments"))
                .build()
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Global {
        verbose: bool,
        level: u8,
    }

    impl Options for Global {
        fn schema() -> std::result::Result<Schema, crate::SchemaError> {
            Schema::builder()
                .option(OptionSpec::flag("verbose").short('v'))
                .option(OptionSpec::new("level").default_value(1u8))
                .build()
        }
    }

    fn container(tokens: &[&str]) -> Container {
        ContainerBuilder::new().build(tokens).unwrap()
    }

    #[test]
    fn test_flag_value_is_reinjected_before_free_tokens() {
        let flagged: Flagged = decode(&container(&["--flag", "a", "b"])).unwrap();
        assert!(flagged.flag);
        assert_eq!(flagged.arguments, vec!["a", "b"]);
    }

    #[test]
    fn test_reinjected_flag_value_keeps_the_typed_text() {
        let flagged: Flagged = decode(&container(&["--flag", "b=1,a=2"])).unwrap();
        assert_eq!(flagged.arguments, vec!["b=1,a=2"]);

        let flagged: Flagged = decode(&container(&["-f", "k=v,k=w", "tail"])).unwrap();
        assert!(flagged.flag);
        assert_eq!(flagged.arguments, vec!["k=v,k=w", "tail"]);

        let flagged: Flagged = decode(&container(&["--flag=z=1,y=2"])).unwrap();
        assert_eq!(flagged.arguments, vec!["z=1,y=2"]);
    }

    #[test]
    fn test_flag_defaults_to_false() {
        let flagged: Flagged = decode(&container(&["x"])).unwrap();
        assert!(!flagged.flag);
        assert_eq!(flagged.arguments, vec!["x"]);
    }

    #[test]
    fn test_short_alias_resolves_to_key() {
        let flagged: Flagged = decode(&container(&["-f"])).unwrap();
        assert!(flagged.flag);
        assert!(flagged.arguments.is_empty());
    }

    #[test]
    fn test_stray_tokens_are_rejected_in_order() {
        let err = decode::<Flagged>(&container(&["x", "y", "--flag", "z"])).unwrap_err();
        assert_eq!(
            err,
            OptionsError::UnrecognizedArguments {
                arguments: vec!["x".into(), "y".into()]
            }
        );
    }

    #[test]
    fn test_unknown_keys_are_recoverable_with_partial() {
        match decode_local::<Flagged>(&container(&["--flag", "--level", "3"])) {
            Err(LocalError::Unrecognized(unrecognized)) => {
                assert_eq!(unrecognized.keys, vec!["level"]);
                let partial = unrecognized.partial.unwrap();
                assert!(partial.flag);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_help_key_is_not_unknown() {
        let c = container(&["--help"]);
        let schema = Flagged::schema().unwrap();
        let scope = Scope::new(&c, &schema);
        assert!(scope.unknown_keys().is_empty());
        assert!(scope.help_requested());
    }

    #[test]
    fn test_decode_with_shared_splits_keys() {
        let c = container(&["-f", "-v", "--level", "4", "file"]);
        let (flagged, global): (Flagged, Global) = decode_pair(&c).unwrap();
        assert!(flagged.flag);
        assert_eq!(flagged.arguments, vec!["file"]);
        assert_eq!(
            global,
            Global {
                verbose: true,
                level: 4
            }
        );
    }

    #[test]
    fn test_shared_flag_reinjects_into_local_arguments() {
        let c = container(&["--verbose", "file"]);
        let (flagged, global): (Flagged, Global) = decode_pair(&c).unwrap();
        assert!(global.verbose);
        assert_eq!(global.level, 1);
        assert_eq!(flagged.arguments, vec!["file"]);
    }

    #[test]
    fn test_decode_with_shared_rejects_unexplained_keys() {
        let c = container(&["--verbose", "--color", "red"]);
        let err = decode_pair::<Flagged, Global>(&c).unwrap_err();
        assert_eq!(
            err,
            OptionsError::UnrecognizedOptions {
                keys: vec!["color".into()]
            }
        );
    }

    #[test]
    fn test_positional_arguments_without_schema_are_unresolvable() {
        let err = decode::<Global>(&container(&["extra"])).unwrap_err();
        assert_eq!(
            err,
            OptionsError::UnresolvableArguments {
                arguments: vec!["extra".into()]
            }
        );
    }
}
