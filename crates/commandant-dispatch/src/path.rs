//! Resolution of argv symbols against a [`CommandTree`].

use commandant_options::is_option_token;
use tracing::{debug, trace};

use crate::command::{CommandId, CommandTree};
use crate::error::DispatchError;

/// A resolved command: the symbol chain from the program root and the node
/// it ends at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPath {
    symbols: Vec<String>,
    node: CommandId,
}

impl CommandPath {
    /// The path holding only the program root.
    pub fn root(tree: &CommandTree) -> Self {
        let root = tree.root();
        Self {
            symbols: vec![tree.node(root).symbol().to_string()],
            node: root,
        }
    }

    /// Symbols from the program root to the resolved node, root included.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn node(&self) -> CommandId {
        self.node
    }

    /// Returns `true` if nothing was resolved below the root.
    pub fn is_root(&self) -> bool {
        self.symbols.len() == 1
    }

    fn descend(&mut self, symbol: &str, child: CommandId) {
        self.symbols.push(symbol.to_string());
        self.node = child;
    }

    /// Walks `tokens` down from the root.
    ///
    /// Descends while the next token is not option-shaped and names a child
    /// of the current node. Returns the resolved path and the tokens left for
    /// that command.
    ///
    /// # Example
    ///
    /// ```
    /// use commandant_dispatch::{CommandNode, CommandPath, CommandTree};
    ///
    /// let mut tree = CommandTree::new(CommandNode::group("app", "app <command>"));
    /// let db = tree.command(tree.root(), CommandNode::group("db", "")).unwrap();
    /// tree.command(db, CommandNode::group("migrate", "")).unwrap();
    ///
    /// let (path, rest) = CommandPath::resolve(&tree, &["db", "migrate", "--dry-run", "db"]);
    /// assert_eq!(path.symbols(), ["app", "db", "migrate"]);
    /// assert_eq!(rest, ["--dry-run", "db"]);
    /// ```
    pub fn resolve<'t, S: AsRef<str>>(tree: &CommandTree, tokens: &'t [S]) -> (Self, &'t [S]) {
        let mut path = Self::root(tree);
        let mut rest = tokens;

        while let Some((token, tail)) = rest.split_first() {
            let token = token.as_ref();
            if is_option_token(token) {
                trace!(token, "stop at option");
                break;
            }
            match tree.child(path.node, token) {
                Some(child) => {
                    trace!(symbol = token, "descend");
                    path.descend(token, child);
                    rest = tail;
                }
                None => break,
            }
        }

        debug!(path = ?path.symbols, remaining = rest.len(), "resolved command");
        (path, rest)
    }

    /// Finds every maximal chain the symbols spell out.
    ///
    /// Each symbol extends the current chain when it names a child of the
    /// chain's last node; otherwise a new chain starts from the root.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnrecognizedCommands`] listing every symbol that
    /// matched nowhere.
    pub fn max_matches<S: AsRef<str>>(tree: &CommandTree, symbols: &[S]) -> Result<Vec<Self>, DispatchError> {
        let mut paths = Vec::new();
        let mut orphans = Vec::new();
        let mut current: Option<Self> = None;

        for symbol in symbols {
            let symbol = symbol.as_ref();
            if let Some(path) = current.as_mut() {
                if let Some(child) = tree.child(path.node, symbol) {
                    path.descend(symbol, child);
                    continue;
                }
            }

            paths.extend(current.take());
            match tree.child(tree.root(), symbol) {
                Some(child) => {
                    let mut path = Self::root(tree);
                    path.descend(symbol, child);
                    current = Some(path);
                }
                None => orphans.push(symbol.to_string()),
            }
        }
        paths.extend(current);

        if !orphans.is_empty() {
            return Err(DispatchError::UnrecognizedCommands { symbols: orphans });
        }
        Ok(paths)
    }

    /// Resolves symbols that must describe exactly one chain.
    ///
    /// No symbols resolve to the root.
    ///
    /// # Errors
    ///
    /// [`DispatchError::AmbiguousCommands`] when the symbols form more than
    /// one chain, plus the errors of [`CommandPath::max_matches`].
    pub fn single_match<S: AsRef<str>>(tree: &CommandTree, symbols: &[S]) -> Result<Self, DispatchError> {
        let mut paths = Self::max_matches(tree, symbols)?;
        match paths.len() {
            0 => Ok(Self::root(tree)),
            1 => Ok(paths.remove(0)),
            _ => Err(DispatchError::AmbiguousCommands {
                paths: paths.into_iter().map(|p| p.symbols).collect(),
            }),
        }
    }
}
