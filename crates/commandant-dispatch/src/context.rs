//! Per-dispatch state.
//!
//! A [`DispatchContext`] is created at the start of every top-level dispatch
//! and passed by reference through resolution, decoding and the handler call.
//! It is dropped when the dispatch returns, whatever the outcome, so nothing
//! one dispatch resolves can leak into the next.

use std::cell::Cell;
use std::fmt;

use commandant_options::{from_value, ObjectFormat, Options, OptionsError, Schema, SchemaError, Value};

use crate::command::CommandTree;
use crate::error::DispatchError;
use crate::handler::Extensions;
use crate::path::CommandPath;

type Install = Box<dyn Fn(Value, &mut Extensions) -> Result<(), OptionsError>>;

/// Options declared once at the root and available to every command.
///
/// Holds the shared schema plus a decoder that stores the typed record in a
/// handler's [`Extensions`].
pub struct SharedOptions {
    schema: Schema,
    install: Install,
}

impl SharedOptions {
    /// Shared options decoded into `G`.
    pub fn of<G: Options + 'static>() -> Result<Self, SchemaError> {
        Ok(Self {
            schema: G::schema()?,
            install: Box::new(|value, extensions| {
                extensions.insert(from_value::<G>(value)?);
                Ok(())
            }),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Decodes the shared dictionary and stores the record in `extensions`.
    pub(crate) fn install(&self, value: Value, extensions: &mut Extensions) -> Result<(), OptionsError> {
        (self.install)(value, extensions)
    }
}

impl fmt::Debug for SharedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedOptions")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// State threaded through one dispatch.
#[derive(Debug)]
pub struct DispatchContext<'a> {
    tree: &'a CommandTree,
    shared: Option<&'a SharedOptions>,
    format: ObjectFormat,
    path: Vec<String>,
}

impl<'a> DispatchContext<'a> {
    pub fn new(tree: &'a CommandTree, shared: Option<&'a SharedOptions>, format: ObjectFormat) -> Self {
        Self {
            tree,
            shared,
            format,
            path: vec![tree.node(tree.root()).symbol().to_string()],
        }
    }

    pub fn tree(&self) -> &'a CommandTree {
        self.tree
    }

    pub fn shared(&self) -> Option<&'a SharedOptions> {
        self.shared
    }

    pub fn shared_schema(&self) -> Option<&'a Schema> {
        self.shared.map(SharedOptions::schema)
    }

    pub fn format(&self) -> ObjectFormat {
        self.format
    }

    /// The program name, i.e. the root command's symbol.
    pub fn program(&self) -> &str {
        &self.path[0]
    }

    /// Full path of the resolved command, program name first.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Path of the resolved command without the program name.
    pub fn command_path(&self) -> &[String] {
        &self.path[1..]
    }

    /// Records the resolved command.
    pub fn enter(&mut self, path: &CommandPath) {
        self.path = path.symbols().to_vec();
    }
}

/// Marks a top-level dispatch as in flight until dropped.
#[derive(Debug)]
pub(crate) struct InFlight<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> InFlight<'a> {
    pub(crate) fn enter(flag: &'a Cell<bool>, program: &str) -> Result<Self, DispatchError> {
        if flag.replace(true) {
            return Err(DispatchError::CommandBusy {
                path: vec![program.to_string()],
            });
        }
        Ok(Self { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandNode;
    use commandant_options::OptionSpec;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Global {
        verbose: bool,
    }

    impl Options for Global {
        fn schema() -> Result<Schema, SchemaError> {
            Schema::builder()
                .option(OptionSpec::flag("verbose").short('v'))
                .build()
        }
    }

    #[test]
    fn test_shared_options_install_typed_record() {
        let shared = SharedOptions::of::<Global>().unwrap();
        assert!(shared.schema().declares("v"));

        let mut extensions = Extensions::new();
        let mut dict = commandant_options::Dict::new();
        dict.insert("verbose".into(), Value::Bool(true));
        shared.install(Value::Dict(dict), &mut extensions).unwrap();
        assert_eq!(extensions.get::<Global>(), Some(&Global { verbose: true }));
    }

    #[test]
    fn test_context_starts_at_program_root() {
        let tree = CommandTree::new(CommandNode::group("app", "app <command>"));
        let ctx = DispatchContext::new(&tree, None, ObjectFormat::default());
        assert_eq!(ctx.program(), "app");
        assert_eq!(ctx.path(), ["app"]);
        assert!(ctx.command_path().is_empty());
        assert!(ctx.shared_schema().is_none());
    }

    #[test]
    fn test_in_flight_guard_rejects_reentry_and_resets() {
        let flag = Cell::new(false);
        {
            let _guard = InFlight::enter(&flag, "app").unwrap();
            let err = InFlight::enter(&flag, "app").unwrap_err();
            assert!(matches!(err, DispatchError::CommandBusy { .. }));
        }
        assert!(!flag.get());
        assert!(InFlight::enter(&flag, "app").is_ok());
    }
}
