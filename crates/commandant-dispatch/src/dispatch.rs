//! Top-level dispatch.
//!
//! [`Commander`] owns the command tree and runs one argv at a time:
//!
//! ```text
//! argv
//!   → built-in `help` / `complete` (optional)
//!   → CommandPath::resolve
//!   → --help check
//!   → decode (local, then shared)
//!   → handler
//!   → render function
//! ```

use std::cell::Cell;
use std::io::Write;
use std::process::ExitCode;

use commandant_options::{is_option_token, ContainerBuilder, ObjectFormat, Options, Scope};
use tracing::debug;

use crate::command::CommandTree;
use crate::complete::complete;
use crate::context::{DispatchContext, InFlight, SharedOptions};
use crate::error::DispatchError;
use crate::handler::RunResult;
use crate::help::render_help;
use crate::path::CommandPath;
use crate::render::{default_render, RenderFn};

/// Symbol of the built-in help command.
pub const HELP_COMMAND: &str = "help";
/// Symbol of the built-in completion command.
pub const COMPLETE_COMMAND: &str = "complete";

/// Converts a command path to a dot-separated string.
///
/// For example, `["db", "migrate"]` becomes `"db.migrate"`.
pub fn path_to_string(path: &[String]) -> String {
    path.join(".")
}

/// Builder for [`Commander`].
pub struct CommanderBuilder {
    tree: CommandTree,
    shared: Option<Result<SharedOptions, DispatchError>>,
    format: ObjectFormat,
    render: RenderFn,
    builtins: bool,
}

impl CommanderBuilder {
    /// Declares the options shared by every command.
    pub fn shared<G: Options + 'static>(mut self) -> Self {
        self.shared = Some(SharedOptions::of::<G>().map_err(DispatchError::from));
        self
    }

    /// Overrides the value-level delimiters.
    pub fn format(mut self, format: ObjectFormat) -> Self {
        self.format = format;
        self
    }

    pub fn render(mut self, render: RenderFn) -> Self {
        self.render = render;
        self
    }

    /// Enables or disables the built-in `help` and `complete` commands.
    ///
    /// Enabled by default. A root child with the same symbol always wins.
    pub fn builtins(mut self, enabled: bool) -> Self {
        self.builtins = enabled;
        self
    }

    /// # Errors
    ///
    /// Fails when the shared options schema is invalid.
    pub fn build(self) -> Result<Commander, DispatchError> {
        Ok(Commander {
            tree: self.tree,
            shared: self.shared.transpose()?,
            format: self.format,
            render: self.render,
            builtins: self.builtins,
            in_flight: Cell::new(false),
        })
    }
}

/// Resolves and runs commands from argv.
///
/// # Example
///
/// ```rust
/// use commandant_dispatch::{Commander, CommandContext, CommandNode, CommandTree, FnHandler};
///
/// let mut tree = CommandTree::new(CommandNode::group("app", "app <command>"));
/// let hello = CommandNode::new(
///     "hello",
///     "app hello",
///     FnHandler::new(|_: (), _: &CommandContext| Ok::<_, anyhow::Error>("hello!")),
/// )?;
/// tree.command(tree.root(), hello)?;
///
/// let app = Commander::builder(tree).build()?;
/// let result = app.dispatch(&["hello"])?;
/// assert_eq!(result.output(), Some("hello!"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Commander {
    tree: CommandTree,
    shared: Option<SharedOptions>,
    format: ObjectFormat,
    render: RenderFn,
    builtins: bool,
    in_flight: Cell<bool>,
}

impl Commander {
    pub fn builder(tree: CommandTree) -> CommanderBuilder {
        CommanderBuilder {
            tree,
            shared: None,
            format: ObjectFormat::default(),
            render: default_render(),
            builtins: true,
        }
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// Program name (the root command's symbol).
    pub fn program(&self) -> &str {
        self.tree.node(self.tree.root()).symbol()
    }

    /// Resolves `argv` (program name excluded) and runs the command.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::CommandBusy`] when called from inside a running handler
    /// - [`DispatchError::EmptyCommand`] / [`DispatchError::UnrecognizedCommand`]
    ///   when argv stops at a group command
    /// - any decode, handler or render error
    pub fn dispatch<S: AsRef<str>>(&self, argv: &[S]) -> Result<RunResult, DispatchError> {
        let _guard = InFlight::enter(&self.in_flight, self.program())?;
        let argv: Vec<String> = argv.iter().map(|s| s.as_ref().to_string()).collect();
        let mut ctx = DispatchContext::new(&self.tree, self.shared.as_ref(), self.format);

        if let Some(result) = self.builtin(&ctx, &argv)? {
            return Ok(result);
        }

        let (path, rest) = CommandPath::resolve(&self.tree, &argv);
        ctx.enter(&path);
        self.invoke(&ctx, &path, rest)
    }

    /// Help page for the single command the symbols name.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnrecognizedCommands`] or
    /// [`DispatchError::AmbiguousCommands`] when the symbols do not name
    /// exactly one command.
    pub fn help_text<S: AsRef<str>>(&self, symbols: &[S]) -> Result<String, DispatchError> {
        let path = CommandPath::single_match(&self.tree, symbols)?;
        Ok(render_help(&self.tree, &path, self.shared_schema()))
    }

    /// Runs `argv` and writes the outcome.
    ///
    /// Output goes to `out`; a failure is written to `err` as
    /// `error: <message>` and maps to [`ExitCode::FAILURE`].
    pub fn run_with<S, O, E>(&self, argv: &[S], out: &mut O, err: &mut E) -> ExitCode
    where
        S: AsRef<str>,
        O: Write,
        E: Write,
    {
        match self.dispatch(argv) {
            Ok(RunResult::Handled(text)) => {
                if !text.is_empty() && writeln!(out, "{}", text).is_err() {
                    return ExitCode::FAILURE;
                }
                ExitCode::SUCCESS
            }
            Ok(RunResult::Silent) => ExitCode::SUCCESS,
            Err(error) => {
                debug!(%error, "dispatch failed");
                let _ = writeln!(err, "error: {}", error);
                ExitCode::FAILURE
            }
        }
    }

    /// Runs the process arguments against stdout and stderr.
    pub fn run(&self) -> ExitCode {
        let argv: Vec<String> = std::env::args().skip(1).collect();
        self.run_with(&argv, &mut std::io::stdout(), &mut std::io::stderr())
    }

    fn shared_schema(&self) -> Option<&commandant_options::Schema> {
        self.shared.as_ref().map(SharedOptions::schema)
    }

    fn builtin(&self, ctx: &DispatchContext<'_>, argv: &[String]) -> Result<Option<RunResult>, DispatchError> {
        let Some((first, rest)) = argv.split_first() else {
            return Ok(None);
        };
        if !self.builtins || self.tree.child(self.tree.root(), first).is_some() {
            return Ok(None);
        }

        match first.as_str() {
            HELP_COMMAND => {
                debug!(symbols = ?rest, "help");
                let paths = CommandPath::max_matches(&self.tree, rest)?;
                let pages: Vec<String> = if paths.is_empty() {
                    vec![render_help(&self.tree, &CommandPath::root(&self.tree), ctx.shared_schema())]
                } else {
                    paths
                        .iter()
                        .map(|path| render_help(&self.tree, path, ctx.shared_schema()))
                        .collect()
                };
                Ok(Some(RunResult::Handled(pages.join("\n\n"))))
            }
            COMPLETE_COMMAND => {
                let candidates = complete(&self.tree, ctx.shared_schema(), ctx.format(), rest)?;
                Ok(Some(RunResult::Handled(candidates.join("\n"))))
            }
            _ => Ok(None),
        }
    }

    fn invoke(&self, ctx: &DispatchContext<'_>, path: &CommandPath, rest: &[String]) -> Result<RunResult, DispatchError> {
        let node = self.tree.node(path.node());
        let container = ContainerBuilder::with_format(ctx.format()).build(rest)?;

        let mut scope = Scope::new(&container, node.schema());
        if let Some(shared) = ctx.shared_schema() {
            scope = scope.with_shared(shared);
        }
        if scope.help_requested() {
            return Ok(RunResult::Handled(render_help(&self.tree, path, ctx.shared_schema())));
        }

        let Some(entry) = node.entry() else {
            return Err(match rest.iter().find(|token| !is_option_token(token)) {
                Some(symbol) => DispatchError::UnrecognizedCommand {
                    path: path.symbols().to_vec(),
                    symbol: symbol.clone(),
                },
                None => DispatchError::EmptyCommand {
                    path: path.symbols().to_vec(),
                },
            });
        };

        let mut entry = entry.try_borrow_mut().map_err(|_| DispatchError::CommandBusy {
            path: path.symbols().to_vec(),
        })?;

        debug!(command = %path_to_string(ctx.command_path()), "dispatch");
        match entry.run(ctx, &container)? {
            Some(data) => Ok(RunResult::Handled((self.render)(&data)?)),
            None => Ok(RunResult::Silent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_to_string() {
        assert_eq!(path_to_string(&["db".into(), "migrate".into()]), "db.migrate");
        assert_eq!(path_to_string(&[]), "");
    }
}
