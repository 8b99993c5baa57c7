//! Dispatch errors.

use commandant_options::{OptionsError, SchemaError};
use thiserror::Error;

use crate::render::RenderError;

/// Errors raised while resolving or running a command.
///
/// Every variant is plain data: the command path and the offending symbols
/// are enough to render the message.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Tokenizing or decoding the command's options failed.
    #[error(transparent)]
    Options(#[from] OptionsError),

    /// A group command received a symbol none of its children carry.
    #[error("unrecognized command '{symbol}' for '{}'", .path.join(" "))]
    UnrecognizedCommand { path: Vec<String>, symbol: String },

    /// Symbols that matched no command anywhere in the tree.
    #[error("unrecognized commands: {}", .symbols.join(", "))]
    UnrecognizedCommands { symbols: Vec<String> },

    /// The symbols describe more than one command chain.
    #[error("ambiguous commands: {}", render_paths(.paths))]
    AmbiguousCommands { paths: Vec<Vec<String>> },

    /// A group command was invoked without a subcommand.
    #[error("'{}' requires a subcommand", .path.join(" "))]
    EmptyCommand { path: Vec<String> },

    #[error("command '{symbol}' is already attached to '{parent}'")]
    DuplicateCommand { parent: String, symbol: String },

    /// A dispatch was started while another one is still running.
    #[error("command '{}' is already running", .path.join(" "))]
    CommandBusy { path: Vec<String> },

    /// The command handler failed.
    #[error(transparent)]
    Handler(anyhow::Error),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<SchemaError> for DispatchError {
    fn from(err: SchemaError) -> Self {
        DispatchError::Options(err.into())
    }
}

fn render_paths(paths: &[Vec<String>]) -> String {
    paths
        .iter()
        .map(|path| path.join(" "))
        .collect::<Vec<_>>()
        .join(" | ")
}
