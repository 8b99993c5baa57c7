//! Completion candidates for a partially typed command line.

use commandant_options::{ContainerBuilder, ObjectFormat, Schema, HELP_KEY};
use tracing::debug;

use crate::command::CommandTree;
use crate::error::DispatchError;
use crate::path::CommandPath;

/// Candidates for the last token of `tokens`, which is the word being typed.
///
/// - While an option is waiting for its value there are no candidates.
/// - A dash-prefixed word completes option names of the resolved command and
///   the shared schema.
/// - Otherwise, right after the command symbols, child symbols are offered.
///
/// # Example
///
/// ```
/// use commandant_dispatch::{complete, CommandNode, CommandTree};
/// use commandant_options::ObjectFormat;
///
/// let mut tree = CommandTree::new(CommandNode::group("app", "app <command>"));
/// let db = tree.command(tree.root(), CommandNode::group("db", "")).unwrap();
/// tree.command(db, CommandNode::group("migrate", "")).unwrap();
/// tree.command(db, CommandNode::group("seed", "")).unwrap();
///
/// let candidates = complete(&tree, None, ObjectFormat::default(), &["db", "m"]).unwrap();
/// assert_eq!(candidates, ["migrate"]);
/// ```
pub fn complete<S: AsRef<str>>(
    tree: &CommandTree,
    shared: Option<&Schema>,
    format: ObjectFormat,
    tokens: &[S],
) -> Result<Vec<String>, DispatchError> {
    let (current, words) = match tokens.split_last() {
        Some((current, words)) => (current.as_ref(), words),
        None => ("", tokens),
    };

    let (path, rest) = CommandPath::resolve(tree, words);
    let node = tree.node(path.node());
    let container = ContainerBuilder::with_format(format).build(rest)?;

    if let Some(pending) = container.trailing_key() {
        let is_flag = node
            .schema()
            .resolve(pending)
            .or_else(|| shared.and_then(|s| s.resolve(pending)))
            .is_some_and(|option| option.is_flag());
        if !is_flag {
            debug!(key = pending, "completing an option value");
            return Ok(Vec::new());
        }
    }

    let candidates: Vec<String> = if current.starts_with('-') && !container.is_terminated() {
        let mut names = option_names(node.schema());
        if let Some(shared) = shared {
            names.extend(option_names(shared));
        }
        if node.schema().is_help_key(HELP_KEY) {
            names.push(format!("--{}", HELP_KEY));
        }
        names
    } else if rest.is_empty() {
        tree.children(path.node())
            .map(|child| child.symbol().to_string())
            .collect()
    } else {
        Vec::new()
    };

    Ok(candidates
        .into_iter()
        .filter(|candidate| candidate.starts_with(current))
        .collect())
}

fn option_names(schema: &Schema) -> Vec<String> {
    let mut names = Vec::new();
    for option in schema.options() {
        names.push(format!("--{}", option.key()));
        if let Some(short) = option.short_alias() {
            names.push(format!("-{}", short));
        }
    }
    names
}
