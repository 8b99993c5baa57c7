//! Commandant options - typed decoding of command-line options.
//!
//! The crate turns an argv slice into a typed record in three steps:
//!
//! - [`ContainerBuilder`] tokenizes argv into keyed assignments and buckets
//!   of free tokens, parsing each value in [`ObjectFormat`]
//! - a [`Schema`] resolves raw keys (long names and short aliases), fills
//!   defaults and settles positional arguments
//! - the serde [`ValueDeserializer`] projects the resolved [`Value`] tree
//!   onto any `Deserialize` record
//!
//! # Quick Start
//!
//! ```rust
//! use commandant_options::{decode, ArgumentsSpec, ContainerBuilder, OptionSpec, Options, Schema, SchemaError};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Serve {
//!     port: u16,
//!     hosts: Vec<String>,
//!     verbose: bool,
//!     roots: Vec<String>,
//! }
//!
//! impl Options for Serve {
//!     fn schema() -> Result<Schema, SchemaError> {
//!         Schema::builder()
//!             .option(OptionSpec::new("port").short('p').default_value(8080u16))
//!             .option(OptionSpec::new("hosts"))
//!             .option(OptionSpec::flag("verbose").short('v'))
//!             .arguments(ArgumentsSpec::new("roots"))
//!             .build()
//!     }
//! }
//!
//! let argv = ["--hosts", "a.local,b.local", "-v", "public", "assets"];
//! let container = ContainerBuilder::new().build(&argv).unwrap();
//! let serve: Serve = decode(&container).unwrap();
//!
//! assert_eq!(serve.port, 8080);
//! assert_eq!(serve.hosts, ["a.local", "b.local"]);
//! assert!(serve.verbose);
//! assert_eq!(serve.roots, ["public", "assets"]);
//! ```
//!
//! # Argv Grammar
//!
//! ```text
//! --key value     assign value to key
//! --key=value     same, inline
//! -k value        short key
//! -abc            a, b and c set to true
//! --              everything after is a plain token
//! a,b,c           array value
//! k1=v1,k2=v2     dictionary value
//! ```
//!
//! A key with no following value is `true`. Repeated keys accumulate into an
//! array. Tokens like `-5` or `-.5` are values, not options.
//!
//! # Two-Phase Decoding
//!
//! Commands declare their own options and may inherit a shared set declared
//! higher up. [`decode_local`] reports unknown keys as recoverable so the
//! caller can retry with [`decode_with_shared`].

mod container;
mod decoder;
mod error;
mod format;
mod schema;
mod scope;
mod value;

pub use container::{is_option_token, Assignment, Container, ContainerBuilder};
pub use decoder::{from_value, ValueDeserializer};
pub use error::{OptionsError, Result, SchemaError};
pub use format::ObjectFormat;
pub use schema::{ArgumentsSpec, OptionSpec, Options, Schema, SchemaBuilder, HELP_KEY, HELP_SHORT};
pub use scope::{
    decode, decode_local, decode_pair, decode_with_shared, LocalError, Projection, Scope,
    Unrecognized,
};
pub use value::{Dict, Value};
