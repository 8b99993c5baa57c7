//! `greet`: a small CLI built on commandant.
//!
//! ```text
//! greet [--verbose] [--greeting <word>] <command>
//!
//!   hello [-s] [-n <times>] <names>...   greet people
//!   stats [--ignore a,b] <words>...      letter statistics
//!   config show                          print the shared options
//! ```
//!
//! `--verbose` and `--greeting` are shared options: every command accepts
//! them without declaring them. Handlers read them from the extensions,
//! so the tree only runs under [`app`], which declares them.

use std::collections::BTreeMap;

use commandant_dispatch::{CommandContext, CommandNode, CommandTree, Commander, DispatchError, FnHandler};
use commandant_options::{ArgumentsSpec, OptionSpec, Options, Schema, SchemaError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Options shared by every command.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Global {
    pub verbose: bool,
    pub greeting: String,
}

impl Options for Global {
    fn schema() -> Result<Schema, SchemaError> {
        Schema::builder()
            .option(OptionSpec::flag("verbose").short('v').describe("Log what is going on"))
            .option(
                OptionSpec::new("greeting")
                    .short('g')
                    .value_name("word")
                    .default_value("hello")
                    .describe("Word to greet with"),
            )
            .build()
    }
}

#[derive(Debug, Deserialize)]
pub struct Hello {
    pub shout: bool,
    pub times: u8,
    pub names: Vec<String>,
}

impl Options for Hello {
    fn schema() -> Result<Schema, SchemaError> {
        Schema::builder()
            .option(OptionSpec::flag("shout").short('s').describe("Upper-case the greeting"))
            .option(
                OptionSpec::new("times")
                    .short('n')
                    .default_value(1u8)
                    .describe("Repeat the greeting"),
            )
            .arguments(ArgumentsSpec::new("names").value_name("name").describe("People to greet"))
            .build()
    }
}

#[derive(Debug, Deserialize)]
pub struct Stats {
    pub ignore: Vec<char>,
    pub words: Vec<String>,
}

impl Options for Stats {
    fn schema() -> Result<Schema, SchemaError> {
        Schema::builder()
            .option(
                OptionSpec::new("ignore")
                    .value_name("letters")
                    .default_value(Vec::<String>::new())
                    .describe("Letters to skip, comma separated"),
            )
            .arguments(ArgumentsSpec::new("words").value_name("word"))
            .build()
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Report {
    pub words: usize,
    pub longest: Option<String>,
    pub letters: BTreeMap<char, usize>,
}

fn hello(options: Hello, ctx: &CommandContext) -> anyhow::Result<String> {
    if options.names.is_empty() {
        anyhow::bail!("nobody to greet");
    }
    let global = ctx.extensions.get_required::<Global>()?;
    if global.verbose {
        info!(names = options.names.len(), times = options.times, "greeting");
    }

    let mut line = format!("{} {}", global.greeting, options.names.join(", "));
    if options.shout {
        line = line.to_uppercase();
    }
    Ok(vec![line; usize::from(options.times)].join("\n"))
}

fn stats(options: Stats, _ctx: &CommandContext) -> anyhow::Result<Report> {
    let mut letters = BTreeMap::new();
    for c in options.words.iter().flat_map(|w| w.chars()) {
        if !options.ignore.contains(&c) {
            *letters.entry(c).or_insert(0) += 1;
        }
    }
    let longest = options
        .words
        .iter()
        .fold(None::<&String>, |best, w| match best {
            Some(b) if b.chars().count() >= w.chars().count() => Some(b),
            _ => Some(w),
        })
        .cloned();
    debug!(words = options.words.len(), "computed stats");
    Ok(Report {
        words: options.words.len(),
        longest,
        letters,
    })
}

fn show(_options: (), ctx: &CommandContext) -> anyhow::Result<Global> {
    Ok(ctx.extensions.get_required::<Global>()?.clone())
}

/// Builds the `greet` command tree.
pub fn tree() -> Result<CommandTree, DispatchError> {
    let mut tree = CommandTree::new(CommandNode::group("greet", "greet [options] <command>"));
    let root = tree.root();

    tree.command(
        root,
        CommandNode::new("hello", "greet hello [-s] [-n <times>] <name>...", FnHandler::new(hello))?,
    )?;
    tree.command(
        root,
        CommandNode::new("stats", "greet stats [--ignore <letters>] <word>...", FnHandler::new(stats))?,
    )?;
    let config = tree.command(root, CommandNode::group("config", "greet config <command>"))?;
    tree.command(
        config,
        CommandNode::new("show", "greet config show", FnHandler::new(show))?,
    )?;
    Ok(tree)
}

/// The configured commander.
pub fn app() -> Result<Commander, DispatchError> {
    Commander::builder(tree()?).shared::<Global>().build()
}
