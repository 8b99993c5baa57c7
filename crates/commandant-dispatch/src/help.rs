//! Plain-text help pages.
//!
//! Help reads a node's symbol, usage, children and schema; it takes no part
//! in decoding.

use std::fmt::Write;

use commandant_options::{OptionSpec, Schema, HELP_KEY, HELP_SHORT};

use crate::command::CommandTree;
use crate::path::CommandPath;

/// Renders the help page for the command at `path`.
///
/// # Example
///
/// ```
/// use commandant_dispatch::{render_help, CommandNode, CommandPath, CommandTree};
///
/// let mut tree = CommandTree::new(CommandNode::group("app", "app <command>"));
/// tree.command(tree.root(), CommandNode::group("db", "app db <command>")).unwrap();
///
/// let page = render_help(&tree, &CommandPath::root(&tree), None);
/// assert!(page.starts_with("Usage: app <command>"));
/// assert!(page.contains("  db"));
/// ```
pub fn render_help(tree: &CommandTree, path: &CommandPath, shared: Option<&Schema>) -> String {
    let node = tree.node(path.node());
    let mut page = String::new();

    let usage = if node.usage().is_empty() {
        path.symbols().join(" ")
    } else {
        node.usage().to_string()
    };
    let _ = writeln!(page, "Usage: {}", usage);

    let commands: Vec<(String, String)> = tree
        .children(path.node())
        .map(|child| (child.symbol().to_string(), child.usage().to_string()))
        .collect();
    section(&mut page, "Commands", &commands);

    if let Some(arguments) = node.schema().arguments() {
        let rows = vec![(
            format!("<{}>...", arguments.placeholder()),
            arguments.description().to_string(),
        )];
        section(&mut page, "Arguments", &rows);
    }

    let mut options = option_rows(node.schema());
    if node.schema().is_help_key(HELP_KEY) {
        let short = if node.schema().is_help_key(&HELP_SHORT.to_string()) {
            format!("-{}, ", HELP_SHORT)
        } else {
            "    ".to_string()
        };
        options.push((format!("{}--{}", short, HELP_KEY), "Print help".to_string()));
    }
    section(&mut page, "Options", &options);

    if let Some(shared) = shared {
        section(&mut page, "Shared options", &option_rows(shared));
    }

    page.truncate(page.trim_end().len());
    page
}

fn option_rows(schema: &Schema) -> Vec<(String, String)> {
    schema.options().iter().map(option_row).collect()
}

fn option_row(option: &OptionSpec) -> (String, String) {
    let mut flag = match option.short_alias() {
        Some(short) => format!("-{}, --{}", short, option.key()),
        None => format!("    --{}", option.key()),
    };
    if !option.is_flag() {
        let _ = write!(flag, " <{}>", option.placeholder().unwrap_or(option.key()));
    }

    let mut about = option.description().to_string();
    if let (false, Some(default)) = (option.is_flag(), option.default()) {
        if !about.is_empty() {
            about.push(' ');
        }
        let _ = write!(about, "[default: {}]", default);
    }
    (flag, about)
}

fn section(page: &mut String, title: &str, rows: &[(String, String)]) {
    if rows.is_empty() {
        return;
    }
    let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
    let _ = writeln!(page, "\n{}:", title);
    for (left, right) in rows {
        if right.is_empty() {
            let _ = writeln!(page, "  {}", left);
        } else {
            let _ = writeln!(page, "  {:width$}  {}", left, right, width = width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandNode;
    use crate::handler::{CommandContext, FnHandler};
    use commandant_options::{ArgumentsSpec, Options, SchemaError};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct CopyOptions {
        #[allow(dead_code)]
        force: bool,
    }

    impl Options for CopyOptions {
        fn schema() -> Result<Schema, SchemaError> {
            Schema::builder()
                .option(OptionSpec::flag("force").short('f').describe("Overwrite"))
                .option(OptionSpec::new("mode").value_name("octal").default_value("644"))
                .arguments(ArgumentsSpec::new("files").describe("Files to copy"))
                .build()
        }
    }

    #[test]
    fn test_help_lists_options_arguments_and_help() {
        let mut tree = CommandTree::new(CommandNode::group("app", "app <command>"));
        let node = CommandNode::new(
            "cp",
            "app cp [options] <files>...",
            FnHandler::new(|_: CopyOptions, _: &CommandContext| Ok::<_, anyhow::Error>(())),
        )
        .unwrap();
        tree.command(tree.root(), node).unwrap();

        let (path, _) = CommandPath::resolve(&tree, &["cp"]);
        let page = render_help(&tree, &path, None);

        assert!(page.starts_with("Usage: app cp [options] <files>..."));
        assert!(page.contains("  <files>...  Files to copy"));
        assert!(page.contains("-f, --force"));
        assert!(page.contains("Overwrite"));
        assert!(page.contains("    --mode <octal>  [default: 644]"));
        assert!(page.contains("-h, --help"));
        assert!(!page.contains("Commands:"));
    }

    #[test]
    fn test_help_shows_shared_options() {
        let tree = CommandTree::new(CommandNode::group("app", ""));
        let shared = Schema::builder()
            .option(OptionSpec::flag("verbose").short('v'))
            .build()
            .unwrap();
        let page = render_help(&tree, &CommandPath::root(&tree), Some(&shared));
        assert!(page.starts_with("Usage: app\n"));
        assert!(page.contains("Shared options:\n  -v, --verbose"));
    }
}
