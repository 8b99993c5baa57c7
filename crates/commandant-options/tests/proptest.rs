//! Property-based tests for the tokenizer and object format.

use commandant_options::{
    decode, is_option_token, ArgumentsSpec, ContainerBuilder, Dict, ObjectFormat, OptionSpec,
    Options, Schema, SchemaError, Value,
};
use proptest::prelude::*;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct Record {
    verbose: bool,
    count: u32,
    name: String,
    tags: Vec<String>,
    rest: Vec<String>,
}

impl Options for Record {
    fn schema() -> Result<Schema, SchemaError> {
        Schema::builder()
            .option(OptionSpec::flag("verbose").short('v'))
            .option(OptionSpec::new("count").short('c'))
            .option(OptionSpec::new("name"))
            .option(OptionSpec::new("tags").default_value(Vec::<String>::new()))
            .arguments(ArgumentsSpec::new("rest"))
            .build()
    }
}

impl Record {
    fn argv(&self, short: bool) -> Vec<String> {
        let mut argv = Vec::new();
        if self.verbose {
            argv.push(if short { "-v" } else { "--verbose" }.to_string());
        }
        argv.push(if short { "-c" } else { "--count" }.to_string());
        argv.push(self.count.to_string());
        if !self.tags.is_empty() {
            argv.push(format!("--tags={}", self.tags.join(",")));
        }
        argv.push("--name".to_string());
        argv.push(self.name.clone());
        argv.extend(self.rest.iter().cloned());
        argv
    }
}

// Tokens free of both default delimiters and of a leading dash.
fn word() -> impl Strategy<Value = String> {
    "[a-z0-9_./]{1,12}"
}

fn flat_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        word().prop_map(Value::Str),
        prop::collection::vec(word(), 2..6).prop_map(Value::from),
        prop::collection::btree_map("[a-z]{1,8}", word(), 1..5).prop_map(|entries| {
            Value::Dict(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::Str(v)))
                    .collect::<Dict>(),
            )
        }),
    ]
}

fn record() -> impl Strategy<Value = Record> {
    (
        any::<bool>(),
        any::<u32>(),
        word(),
        prop::collection::vec(word(), 0..4),
        prop::collection::vec(word(), 0..4),
    )
        .prop_map(|(verbose, count, name, tags, rest)| Record {
            verbose,
            count,
            name,
            tags,
            rest,
        })
}

proptest! {
    /// A record rendered back to argv decodes to the same record.
    #[test]
    fn typed_record_round_trips(record in record(), short in any::<bool>()) {
        let container = ContainerBuilder::new().build(&record.argv(short)).unwrap();
        prop_assert_eq!(decode::<Record>(&container).unwrap(), record);
    }

    /// Rendering a value in object format and parsing it back is lossless.
    #[test]
    fn object_format_round_trips(value in flat_value()) {
        let format = ObjectFormat::default();
        let rendered = value.to_string();
        prop_assert_eq!(format.parse(&rendered).unwrap(), value);
    }

    /// A token with no delimiter always parses to a plain string.
    #[test]
    fn delimiter_free_tokens_are_strings(token in "[^,=]{0,20}") {
        let parsed = ObjectFormat::default().parse(&token).unwrap();
        prop_assert_eq!(parsed, Value::Str(token));
    }

    /// Plain words become positional tokens in order, and no key is assigned.
    #[test]
    fn plain_words_stay_positional(words in prop::collection::vec(word(), 0..10)) {
        let container = ContainerBuilder::new().build(&words).unwrap();
        prop_assert!(container.assignments().is_empty());
        prop_assert_eq!(container.trailing_arguments(), words.as_slice());
    }

    /// Everything after `--` is positional, whatever it looks like.
    #[test]
    fn terminator_protects_trailing_tokens(
        tail in prop::collection::vec("-{0,2}[a-z]{1,6}", 0..8),
    ) {
        let mut tokens = vec!["--verbose".to_string(), "--".to_string()];
        tokens.extend(tail.iter().cloned());
        let container = ContainerBuilder::new().build(&tokens).unwrap();
        prop_assert_eq!(container.keys(), vec!["verbose"]);
        prop_assert_eq!(container.trailing_arguments(), tail.as_slice());
    }

    /// Dash-prefixed numbers are never mistaken for options.
    #[test]
    fn negative_numbers_are_not_options(n in any::<i64>().prop_filter("negative", |n| *n < 0)) {
        prop_assert!(!is_option_token(&n.to_string()));
    }

    /// Each repeated assignment lands in the promoted array in order.
    #[test]
    fn repeated_keys_accumulate(values in prop::collection::vec(word(), 2..6)) {
        let mut tokens = Vec::new();
        for value in &values {
            tokens.push("--item".to_string());
            tokens.push(value.clone());
        }
        let container = ContainerBuilder::new().build(&tokens).unwrap();
        prop_assert_eq!(container.get("item"), Some(Value::from(values)));
    }
}
