//! Scripting argument boundary.
//!
//! # Responsibility
//! - Represent dynamically shaped values handed over by scripting callers.
//! - Convert the abbreviation argument into one canonical set of strings.
//!
//! # Invariants
//! - Only text values become abbreviations; byte strings never do, even when
//!   they happen to contain valid UTF-8.
//! - `Abbreviations` never contains an empty string.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input shape error raised before any tree mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentError {
    message: String,
}

impl ArgumentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ArgumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid argument: {}", self.message)
    }
}

impl Error for ArgumentError {}

/// Dynamically typed value as received from a scripting caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<ScriptValue>),
}

impl ScriptValue {
    /// Builds a byte string value.
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(value.into())
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
        }
    }
}

impl Default for ScriptValue {
    fn default() -> Self {
        Self::Null
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ScriptValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<&str>> for ScriptValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(Self::from).collect())
    }
}

impl From<Vec<String>> for ScriptValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value.into_iter().map(Self::Str).collect())
    }
}

impl From<Vec<ScriptValue>> for ScriptValue {
    fn from(value: Vec<ScriptValue>) -> Self {
        Self::List(value)
    }
}

/// Canonical, order-insensitive set of abbreviation strings of one phrase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Abbreviations(BTreeSet<String>);

impl Abbreviations {
    /// Normalizes a single string or a list of strings into a set.
    ///
    /// # Errors
    /// - Any shape other than `Null`, `Str` or a list of `Str`.
    /// - Any empty abbreviation string.
    pub fn from_value(value: ScriptValue) -> Result<Self, ArgumentError> {
        match value {
            ScriptValue::Null => Ok(Self::default()),
            ScriptValue::Str(text) => Self::from_strings([text]),
            ScriptValue::List(values) => {
                let mut strings = Vec::with_capacity(values.len());
                for (position, value) in values.into_iter().enumerate() {
                    match value {
                        ScriptValue::Str(text) => strings.push(text),
                        other => {
                            return Err(ArgumentError::new(format!(
                                "abbreviations[{position}] must be str, got {}",
                                other.type_name()
                            )));
                        }
                    }
                }
                Self::from_strings(strings)
            }
            other => Err(ArgumentError::new(format!(
                "abbreviations must be str or list of str, got {}",
                other.type_name()
            ))),
        }
    }

    /// Builds a set from already typed strings.
    pub fn from_strings<I, S>(values: I) -> Result<Self, ArgumentError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = BTreeSet::new();
        for value in values {
            let value = value.into();
            if value.is_empty() {
                return Err(ArgumentError::new("abbreviation must not be empty"));
            }
            set.insert(value);
        }
        Ok(Self(set))
    }

    pub fn contains(&self, abbreviation: &str) -> bool {
        self.0.contains(abbreviation)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
