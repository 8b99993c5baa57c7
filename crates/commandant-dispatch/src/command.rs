//! The command tree.
//!
//! Commands live in an arena owned by [`CommandTree`] and refer to their
//! children by [`CommandId`]. A node may be attached under several parents,
//! so trees with shared or cyclic children (`a b a b ...`) are expressible.
//! The root node is the program itself.

use std::cell::RefCell;
use std::fmt;

use commandant_options::{Options, Schema, SchemaError};
use tracing::trace;

use crate::error::DispatchError;
use crate::handler::{Entrypoint, Handler, HandlerEntry};

/// Handle to a node in a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(usize);

/// A dispatchable command.
pub struct CommandNode {
    symbol: String,
    usage: String,
    children: Vec<CommandId>,
    schema: Schema,
    entry: Option<RefCell<Box<dyn Entrypoint>>>,
}

impl CommandNode {
    /// A command that runs `handler`, decoding argv into `H::Options`.
    ///
    /// # Errors
    ///
    /// Fails when the options schema is invalid.
    pub fn new<H>(symbol: impl Into<String>, usage: impl Into<String>, handler: H) -> Result<Self, SchemaError>
    where
        H: Handler + 'static,
    {
        Ok(Self {
            symbol: symbol.into(),
            usage: usage.into(),
            children: Vec::new(),
            schema: H::Options::schema()?,
            entry: Some(RefCell::new(Box::new(HandlerEntry(handler)))),
        })
    }

    /// A command that only groups subcommands.
    pub fn group(symbol: impl Into<String>, usage: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            usage: usage.into(),
            children: Vec::new(),
            schema: Schema::empty(),
            entry: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn children(&self) -> &[CommandId] {
        &self.children
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns `true` if this node has no handler.
    pub fn is_group(&self) -> bool {
        self.entry.is_none()
    }

    pub(crate) fn entry(&self) -> Option<&RefCell<Box<dyn Entrypoint>>> {
        self.entry.as_ref()
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("symbol", &self.symbol)
            .field("usage", &self.usage)
            .field("children", &self.children)
            .field("schema", &self.schema)
            .field("group", &self.is_group())
            .finish()
    }
}

/// Arena of [`CommandNode`]s rooted at the program node.
///
/// # Example
///
/// ```
/// use commandant_dispatch::{CommandNode, CommandTree};
///
/// let mut tree = CommandTree::new(CommandNode::group("app", "app <command>"));
/// let db = tree.command(tree.root(), CommandNode::group("db", "app db <command>")).unwrap();
/// let cache = tree.command(tree.root(), CommandNode::group("cache", "app cache <command>")).unwrap();
/// tree.attach(db, cache).unwrap();
///
/// assert_eq!(tree.child(tree.root(), "db"), Some(db));
/// assert_eq!(tree.child(db, "cache"), Some(cache));
/// assert!(tree.attach(tree.root(), cache).is_err());
/// ```
#[derive(Debug)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
}

impl CommandTree {
    pub fn new(root: CommandNode) -> Self {
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> CommandId {
        CommandId(0)
    }

    /// Adds a detached node to the arena.
    pub fn add(&mut self, node: CommandNode) -> CommandId {
        self.nodes.push(node);
        CommandId(self.nodes.len() - 1)
    }

    /// Makes `child` a child of `parent`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::DuplicateCommand`] if `parent` already has a child
    /// with the same symbol.
    pub fn attach(&mut self, parent: CommandId, child: CommandId) -> Result<(), DispatchError> {
        let symbol = self.node(child).symbol.clone();
        if self.child(parent, &symbol).is_some() {
            return Err(DispatchError::DuplicateCommand {
                parent: self.node(parent).symbol.clone(),
                symbol,
            });
        }
        trace!(parent = self.node(parent).symbol(), child = %symbol, "attach");
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Adds `node` and attaches it under `parent`.
    pub fn command(&mut self, parent: CommandId, node: CommandNode) -> Result<CommandId, DispatchError> {
        let id = self.add(node);
        if let Err(err) = self.attach(parent, id) {
            self.nodes.pop();
            return Err(err);
        }
        Ok(id)
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    pub fn node(&self, id: CommandId) -> &CommandNode {
        &self.nodes[id.0]
    }

    /// The child of `parent` carrying `symbol`.
    pub fn child(&self, parent: CommandId, symbol: &str) -> Option<CommandId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|id| self.node(*id).symbol == symbol)
    }

    /// Children of `parent` in attach order.
    pub fn children(&self, parent: CommandId) -> impl Iterator<Item = &CommandNode> {
        self.node(parent).children.iter().map(|id| self.node(*id))
    }
}
