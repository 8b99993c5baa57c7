//! Tokenizer turning argv into option assignments and positional buckets.
//!
//! # Token Grammar
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `--name` | Starts option `name`; the next plain token becomes its value |
//! | `--name=value` | Assigns `value` to `name` immediately |
//! | `-x` | Same as `--x` |
//! | `-xyz` | Sets `x`, `y` and `z` to `true` |
//! | `-x=value` | Assigns `value` to `x`; only valid for a single short option |
//! | `--` | Ends option parsing; every later token is plain |
//! | anything else | A value for the pending option, or a free token |
//!
//! Values go through [`ObjectFormat::parse`], so `--tags a,b` assigns an array.
//!
//! # Positional Buckets
//!
//! Free tokens are collected in buckets. Bucket `0` holds the tokens before
//! the first option, and every option token opens a new bucket. The decoder
//! later requires that only the last bucket holds tokens; anything else is a
//! stray argument.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::error::{OptionsError, Result};
use crate::format::ObjectFormat;
use crate::value::{Dict, Value};

/// Returns `true` for tokens that start an option (`--name`, `-x`).
///
/// A bare `-`, the `--` terminator and negative numbers such as `-5` are not
/// option-shaped.
pub fn is_option_token(token: &str) -> bool {
    if let Some(long) = token.strip_prefix("--") {
        return !long.is_empty();
    }
    match token.strip_prefix('-').and_then(|short| short.chars().next()) {
        Some(first) => !(first.is_ascii_digit() || first == '.'),
        None => false,
    }
}

/// One option assignment, in the order it appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// The key as written: a long name or a single short character.
    pub key: String,
    pub value: Value,
    /// The value text as typed; `None` for flags set without a value.
    pub raw: Option<String>,
    /// Bucket opened by the option token that produced this assignment.
    pub bucket: usize,
}

/// The tokenized form of an argv slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    assignments: Vec<Assignment>,
    buckets: BTreeMap<usize, Vec<String>>,
    last_bucket: usize,
    trailing_key: Option<String>,
    terminated: bool,
}

impl Container {
    /// Every assignment, in argv order.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Raw keys in order of first appearance.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for assignment in &self.assignments {
            if !keys.contains(&assignment.key.as_str()) {
                keys.push(&assignment.key);
            }
        }
        keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.assignments.iter().any(|a| a.key == key)
    }

    /// The value for `key`, with repeated assignments promoted to an array.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.assignments
            .iter()
            .filter(|a| a.key == key)
            .map(|a| a.value.clone())
            .reduce(Value::promote)
    }

    /// All assignments as a dictionary keyed by raw option name.
    pub fn options(&self) -> Value {
        let mut dict = Dict::new();
        for assignment in &self.assignments {
            let value = match dict.remove(&assignment.key) {
                Some(held) => held.promote(assignment.value.clone()),
                None => assignment.value.clone(),
            };
            dict.insert(assignment.key.clone(), value);
        }
        Value::Dict(dict)
    }

    /// Free tokens by bucket id.
    pub fn buckets(&self) -> &BTreeMap<usize, Vec<String>> {
        &self.buckets
    }

    /// Id of the most recently created bucket.
    pub fn last_bucket(&self) -> usize {
        self.last_bucket
    }

    /// Free tokens collected in the last bucket.
    pub fn trailing_arguments(&self) -> &[String] {
        self.buckets
            .get(&self.last_bucket)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The option that was still waiting for a value when argv ended.
    ///
    /// Such an option is recorded as `true`; completion uses this to know
    /// that a value is being typed.
    pub fn trailing_key(&self) -> Option<&str> {
        self.trailing_key.as_deref()
    }

    /// Returns `true` once a bare `--` was seen.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

/// Builds a [`Container`] from argv tokens.
///
/// The program name and any leading command symbols must already be stripped.
///
/// # Example
///
/// ```
/// use commandant_options::{ContainerBuilder, Value};
///
/// let container = ContainerBuilder::new()
///     .build(&["--count", "3", "-v", "--", "file"])
///     .unwrap();
///
/// assert_eq!(container.get("count"), Some(Value::from("3")));
/// assert_eq!(container.get("v"), Some(Value::Bool(true)));
/// assert_eq!(container.trailing_arguments(), ["file".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    format: ObjectFormat,
    pending: Option<String>,
    end_of_options: bool,
    bucket: usize,
    assignments: Vec<Assignment>,
    buckets: BTreeMap<usize, Vec<String>>,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::with_format(ObjectFormat::default())
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(format: ObjectFormat) -> Self {
        Self {
            format,
            pending: None,
            end_of_options: false,
            bucket: 0,
            assignments: Vec::new(),
            buckets: BTreeMap::from([(0, Vec::new())]),
        }
    }

    /// Tokenizes `tokens`.
    ///
    /// # Errors
    ///
    /// - [`OptionsError::UnexpectedEndOfOptions`] for a second bare `--`
    /// - [`OptionsError::AmbiguousShortCluster`] for `-xy=value`
    /// - [`OptionsError::InvalidKeyValuePairs`] for malformed value tokens
    pub fn build<S: AsRef<str>>(mut self, tokens: &[S]) -> Result<Container> {
        for (index, token) in tokens.iter().enumerate() {
            self.push(token.as_ref()).map_err(|err| match err {
                OptionsError::UnexpectedEndOfOptions { .. } => {
                    OptionsError::UnexpectedEndOfOptions {
                        position: index,
                        arguments: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
                    }
                }
                other => other,
            })?;
        }

        let trailing_key = self.pending.clone();
        self.flush_pending();

        debug!(
            assignments = self.assignments.len(),
            buckets = self.buckets.len(),
            "tokenized argv"
        );

        Ok(Container {
            assignments: self.assignments,
            buckets: self.buckets,
            last_bucket: self.bucket,
            trailing_key,
            terminated: self.end_of_options,
        })
    }

    fn push(&mut self, token: &str) -> Result<()> {
        if token == "--" {
            if self.end_of_options {
                return Err(OptionsError::UnexpectedEndOfOptions {
                    position: 0,
                    arguments: Vec::new(),
                });
            }
            trace!("end of options");
            self.flush_pending();
            self.end_of_options = true;
            return Ok(());
        }

        if self.end_of_options || !is_option_token(token) {
            return self.push_plain(token);
        }

        match token.strip_prefix("--") {
            Some(long) => self.push_long(long),
            None => self.push_short(&token[1..], token),
        }
    }

    fn push_long(&mut self, body: &str) -> Result<()> {
        self.flush_pending();
        self.open_bucket();
        match body.split_once('=') {
            Some((key, raw)) => {
                let value = self.format.parse(raw)?;
                self.assign(key, value, Some(raw));
            }
            None => self.pending = Some(body.to_string()),
        }
        Ok(())
    }

    fn push_short(&mut self, body: &str, token: &str) -> Result<()> {
        self.flush_pending();
        self.open_bucket();

        if let Some((keys, value)) = body.split_once('=') {
            let mut chars = keys.chars();
            return match (chars.next(), chars.next()) {
                (Some(key), None) => {
                    let raw = value;
                    let value = self.format.parse(raw)?;
                    self.assign(&key.to_string(), value, Some(raw));
                    Ok(())
                }
                _ => Err(OptionsError::AmbiguousShortCluster {
                    token: token.to_string(),
                }),
            };
        }

        let mut chars = body.chars();
        match (chars.next(), chars.next()) {
            (Some(key), None) => self.pending = Some(key.to_string()),
            _ => {
                for key in body.chars() {
                    self.assign(&key.to_string(), Value::Bool(true), None);
                }
            }
        }
        Ok(())
    }

    fn push_plain(&mut self, token: &str) -> Result<()> {
        match self.pending.take() {
            Some(key) => {
                let value = self.format.parse(token)?;
                self.assign(&key, value, Some(token));
            }
            None => self
                .buckets
                .entry(self.bucket)
                .or_default()
                .push(token.to_string()),
        }
        Ok(())
    }

    fn open_bucket(&mut self) {
        self.bucket += 1;
        self.buckets.insert(self.bucket, Vec::new());
    }

    fn flush_pending(&mut self) {
        if let Some(key) = self.pending.take() {
            self.assign(&key, Value::Bool(true), None);
        }
    }

    fn assign(&mut self, key: &str, value: Value, raw: Option<&str>) {
        trace!(key, %value, bucket = self.bucket, "assign");
        self.assignments.push(Assignment {
            key: key.to_string(),
            value,
            raw: raw.map(str::to_string),
            bucket: self.bucket,
        });
    }
}
