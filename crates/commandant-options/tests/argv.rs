//! End-to-end decoding of argv slices into typed records.

use std::collections::BTreeMap;

use commandant_options::{
    decode, decode_local, ArgumentsSpec, ContainerBuilder, Dict, LocalError, ObjectFormat, OptionSpec,
    Options, OptionsError, Schema, SchemaError, Value,
};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum Mode {
    Fast,
    Safe,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Build {
    jobs: u32,
    mode: Mode,
    release: bool,
    features: Vec<String>,
    env: BTreeMap<String, String>,
    offset: Option<i64>,
    targets: Vec<String>,
}

impl Options for Build {
    fn schema() -> Result<Schema, SchemaError> {
        Schema::builder()
            .option(OptionSpec::new("jobs").short('j').default_value(1u32))
            .option(OptionSpec::new("mode").default_value("safe"))
            .option(OptionSpec::flag("release").short('r'))
            .option(OptionSpec::new("features").short('F').default_value(Vec::<String>::new()))
            .option(OptionSpec::new("env").default_value(Dict::new()))
            .option(OptionSpec::new("offset"))
            .arguments(ArgumentsSpec::new("targets"))
            .build()
    }
}

fn build(tokens: &[&str]) -> Result<Build, OptionsError> {
    let container = ContainerBuilder::new().build(tokens)?;
    decode(&container)
}

#[test]
fn test_defaults_fill_absent_keys() {
    let b = build(&[]).unwrap();
    assert_eq!(b.jobs, 1);
    assert_eq!(b.mode, Mode::Safe);
    assert!(!b.release);
    assert!(b.features.is_empty());
    assert!(b.env.is_empty());
    assert_eq!(b.offset, None);
    assert!(b.targets.is_empty());
}

#[test]
fn test_full_command_line() {
    let b = build(&[
        "-j", "8", "--mode=fast", "--env", "CC=clang,LD=lld", "-F", "simd", "-F", "tls", "-r",
        "core", "cli",
    ])
    .unwrap();
    assert_eq!(b.jobs, 8);
    assert_eq!(b.mode, Mode::Fast);
    assert!(b.release);
    assert_eq!(b.features, vec!["simd", "tls"]);
    assert_eq!(b.env.get("CC").map(String::as_str), Some("clang"));
    assert_eq!(b.env.get("LD").map(String::as_str), Some("lld"));
    assert_eq!(b.targets, vec!["core", "cli"]);
}

#[test]
fn test_negative_numbers_are_values() {
    let b = build(&["--offset", "-5", "x"]).unwrap();
    assert_eq!(b.offset, Some(-5));
    assert_eq!(b.targets, vec!["x"]);
}

#[test]
fn test_end_of_options_makes_everything_positional() {
    let b = build(&["-r", "--", "--jobs", "-j", "plain"]).unwrap();
    assert!(b.release);
    assert_eq!(b.jobs, 1);
    assert_eq!(b.targets, vec!["--jobs", "-j", "plain"]);
}

#[derive(Debug, Deserialize)]
struct Switch {
    bool: bool,
    arguments: Vec<String>,
}

impl Options for Switch {
    fn schema() -> Result<Schema, SchemaError> {
        Schema::builder()
            .option(OptionSpec::flag("bool"))
            .arguments(ArgumentsSpec::new("arguments"))
            .build()
    }
}

#[test]
fn test_terminator_position_does_not_change_arguments() {
    for argv in [
        ["--bool", "--", "a", "b"],
        ["--bool", "a", "--", "b"],
        ["--bool", "a", "b", "--"],
    ] {
        let container = ContainerBuilder::new().build(&argv).unwrap();
        let switch: Switch = decode(&container).unwrap();
        assert!(switch.bool, "{argv:?}");
        assert_eq!(switch.arguments, vec!["a", "b"], "{argv:?}");
    }
}

#[test]
fn test_repeated_flag_is_a_type_mismatch() {
    let container = ContainerBuilder::new().build(&["--bool", "--bool"]).unwrap();
    match decode::<Switch>(&container).unwrap_err() {
        OptionsError::TypeMismatch { path, expected, .. } => {
            assert_eq!(path, "bool");
            assert_eq!(expected, "bool");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_end_of_options_flushes_pending_key() {
    let container = ContainerBuilder::new().build(&["--jobs", "--"]).unwrap();
    assert_eq!(container.get("jobs"), Some(Value::Bool(true)));
    assert!(container.is_terminated());
}

#[test]
fn test_second_terminator_is_reported_with_position() {
    let err = ContainerBuilder::new()
        .build(&["a", "--", "b", "--"])
        .unwrap_err();
    assert_eq!(
        err.marked_arguments(),
        Some(vec!["a".into(), "--".into(), "b".into(), "[--]".into()])
    );
    match err {
        OptionsError::UnexpectedEndOfOptions { position, .. } => assert_eq!(position, 3),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_short_cluster_sets_every_flag() {
    let container = ContainerBuilder::new().build(&["-abc"]).unwrap();
    for key in ["a", "b", "c"] {
        assert_eq!(container.get(key), Some(Value::Bool(true)));
    }
}

#[test]
fn test_short_cluster_with_inline_value_is_ambiguous() {
    let err = ContainerBuilder::new().build(&["-ab=1"]).unwrap_err();
    assert_eq!(
        err,
        OptionsError::AmbiguousShortCluster {
            token: "-ab=1".into()
        }
    );
}

#[test]
fn test_positional_before_options_is_stray() {
    let err = build(&["core", "--release"]).unwrap_err();
    assert_eq!(
        err,
        OptionsError::UnrecognizedArguments {
            arguments: vec!["core".into()]
        }
    );
}

#[test]
fn test_value_parse_failure_is_type_mismatch() {
    let err = build(&["--jobs", "many"]).unwrap_err();
    match err {
        OptionsError::TypeMismatch { path, .. } => assert_eq!(path, "jobs"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_malformed_pairs_are_rejected() {
    let err = build(&["--env", "A=1,B"]).unwrap_err();
    assert_eq!(
        err,
        OptionsError::InvalidKeyValuePairs {
            pairs: vec!["B".into()]
        }
    );
}

#[test]
fn test_custom_object_format() {
    let container = ContainerBuilder::with_format(ObjectFormat::new(';', ':'))
        .build(&["--env", "CC:gcc;AR:ar", "--features", "a,b"])
        .unwrap();
    let b: Build = decode(&container).unwrap();
    assert_eq!(b.env.len(), 2);
    assert_eq!(b.features, vec!["a,b"]);
}

#[test]
fn test_unknown_option_is_reported_by_local_decode() {
    let container = ContainerBuilder::new()
        .build(&["--jobs", "2", "--color", "never"])
        .unwrap();
    match decode_local::<Build>(&container) {
        Err(LocalError::Unrecognized(unrecognized)) => {
            assert_eq!(unrecognized.keys, vec!["color"]);
            assert_eq!(unrecognized.partial.map(|b| b.jobs), Some(2));
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let err = decode::<Build>(&container).unwrap_err();
    assert_eq!(err.to_string(), "unrecognized options: --color");
}
