//! Command-tree resolution and typed dispatch for multi-level CLIs.
//!
//! `commandant-dispatch` walks argv against a tree of commands, decodes the
//! remaining tokens into the resolved command's options record with
//! `commandant-options`, and runs its handler.
//!
//! # Features
//!
//! - **Command tree**: arena of nodes; a node may appear under several parents
//! - **Resolution**: [`CommandPath::resolve`] descends while tokens name
//!   children, [`CommandPath::max_matches`] and [`CommandPath::single_match`]
//!   probe symbol lists for help and tooling
//! - **Shared options**: keys a command does not declare are retried once
//!   against the schema declared with [`CommanderBuilder::shared`]; the
//!   shared record reaches every handler, filled from its defaults
//! - **Built-ins**: `help [symbols...]`, `complete [tokens...]` and `--help`
//!
//! # Example
//!
//! ```rust
//! use commandant_dispatch::{Commander, CommandContext, CommandNode, CommandTree, FnHandler};
//! use commandant_options::{ArgumentsSpec, OptionSpec, Options, Schema, SchemaError};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Greet {
//!     shout: bool,
//!     names: Vec<String>,
//! }
//!
//! impl Options for Greet {
//!     fn schema() -> Result<Schema, SchemaError> {
//!         Schema::builder()
//!             .option(OptionSpec::flag("shout").short('s'))
//!             .arguments(ArgumentsSpec::new("names"))
//!             .build()
//!     }
//! }
//!
//! let mut tree = CommandTree::new(CommandNode::group("app", "app <command>"));
//! let greet = CommandNode::new(
//!     "greet",
//!     "app greet [-s] <names>...",
//!     FnHandler::new(|greet: Greet, _: &CommandContext| {
//!         let line = format!("hello {}", greet.names.join(" and "));
//!         Ok::<_, anyhow::Error>(if greet.shout { line.to_uppercase() } else { line })
//!     }),
//! )?;
//! tree.command(tree.root(), greet)?;
//!
//! let app = Commander::builder(tree).build()?;
//! let result = app.dispatch(&["greet", "-s", "ada", "grace"])?;
//! assert_eq!(result.output(), Some("HELLO ADA AND GRACE"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod command;
mod complete;
mod context;
mod dispatch;
mod error;
mod handler;
mod help;
mod path;
mod render;

pub use command::{CommandId, CommandNode, CommandTree};
pub use complete::complete;
pub use context::{DispatchContext, SharedOptions};
pub use dispatch::{path_to_string, Commander, CommanderBuilder, COMPLETE_COMMAND, HELP_COMMAND};
pub use error::DispatchError;
pub use handler::{
    CommandContext, Extensions, FnHandler, Handler, HandlerResult, IntoHandlerResult, Output,
    RunResult,
};
pub use help::render_help;
pub use path::CommandPath;
pub use render::{default_render, json_render, RenderError, RenderFn};
