// SPDX-FileCopyrightText: 2026 The bpd developers
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The parsed object-dump tree that the codec consumes and produces.
//!
//! Parsing raw dump text into this tree is the job of an external tool;
//! trees cross the boundary as JSON. Leaves stay raw dump text: numbers are
//! decimal strings, booleans are `True`/`False`, string-typed fields carry
//! their literal double quotes.

use std::fmt::{Display, Formatter};

use itertools::Itertools;
use thiserror::Error;

/// One value of a parsed object dump: a text leaf, a `(a,b,c)` sequence, or
/// a `(Key=Value,…)` struct with ordered entries.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    List(Vec<Value>),
    Struct(Vec<(String, Value)>),
}

/// The shape of a dump subtree does not match what the decoder needs.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StructureError {
    #[error("missing key {key:?}")]
    MissingKey { key: String },
    #[error("expected a string value for {key:?}")]
    NotAString { key: String },
    #[error("expected a list value for {key:?}")]
    NotAList { key: String },
    #[error("could not parse {key:?} value {text:?} as an int")]
    BadInt { key: String, text: String },
    #[error("could not parse {key:?} value {text:?} as a float")]
    BadFloat { key: String, text: String },
}

impl Value {
    /// Look up a struct entry by name. The first match wins.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Struct(entries) => entries
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn entry(&self, key: &str) -> Result<&Value, StructureError> {
        self.get(key).ok_or_else(|| StructureError::MissingKey { key: key.to_string() })
    }

    pub fn str_field(&self, key: &str) -> Result<&str, StructureError> {
        match self.entry(key)? {
            Value::Str(text) => Ok(text),
            _ => Err(StructureError::NotAString { key: key.to_string() }),
        }
    }

    /// A string-typed field: the stored text carries literal double quotes,
    /// which are stripped here and put back by [`Value::quoted`].
    pub fn quoted_field(&self, key: &str) -> Result<&str, StructureError> {
        Ok(self.str_field(key)?.trim_matches('"'))
    }

    pub fn int_field(&self, key: &str) -> Result<i32, StructureError> {
        let text = self.str_field(key)?;
        text.trim().parse().map_err(|_| StructureError::BadInt {
            key: key.to_string(),
            text: text.to_string(),
        })
    }

    pub fn float_field(&self, key: &str) -> Result<f32, StructureError> {
        let text = self.str_field(key)?;
        text.trim().parse().map_err(|_| StructureError::BadFloat {
            key: key.to_string(),
            text: text.to_string(),
        })
    }

    /// Booleans in dumps are the literal strings `True` and `False`; any
    /// other text reads as false rather than failing.
    pub fn bool_field(&self, key: &str) -> Result<bool, StructureError> {
        Ok(self.str_field(key)? == "True")
    }

    pub fn list_field(&self, key: &str) -> Result<&[Value], StructureError> {
        match self.entry(key)? {
            Value::List(items) => Ok(items),
            _ => Err(StructureError::NotAList { key: key.to_string() }),
        }
    }

    pub fn string(text: impl Into<String>) -> Self {
        Value::Str(text.into())
    }

    pub fn quoted(text: &str) -> Self {
        Value::Str(format!("\"{text}\""))
    }

    pub fn int(value: i32) -> Self {
        Value::Str(value.to_string())
    }

    pub fn float(value: f32) -> Self {
        Value::Str(value.to_string())
    }

    pub fn bool(value: bool) -> Self {
        Value::Str(if value { "True" } else { "False" }.to_string())
    }

    pub fn record<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Struct(entries.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    /// Read a tree out of the JSON interchange form. Total: JSON scalars
    /// that a dump would store as text are coerced to their dump spelling.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::string("None"),
            serde_json::Value::Bool(value) => Value::bool(*value),
            serde_json::Value::Number(number) => Value::string(number.to_string()),
            serde_json::Value::String(text) => Value::string(text.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::Struct(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::from_json(value)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Str(text) => serde_json::Value::String(text.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Struct(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Canonical single-line dump text: structs as `(k=v,…)`, lists as
/// `(a,b,…)`, leaves verbatim.
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(text) => f.write_str(text),
            Value::List(items) => write!(f, "({})", items.iter().format(",")),
            Value::Struct(entries) => write!(
                f,
                "({})",
                entries
                    .iter()
                    .format_with(",", |(key, value), f| f(&format_args!("{key}={value}")))
            ),
        }
    }
}

/// A whole object as dump property lines, one per top-level entry.
/// List-valued properties expand to one `Key(index)=element` line per
/// element, the way object dumps print array properties; an empty list
/// still gets a single `Key=()` line.
pub fn object_text(value: &Value) -> String {
    let Value::Struct(entries) = value else {
        return value.to_string();
    };
    let mut lines = Vec::new();
    for (key, entry) in entries {
        match entry {
            Value::List(items) if !items.is_empty() => {
                for (index, item) in items.iter().enumerate() {
                    lines.push(format!("{key}({index})={item}"));
                }
            }
            other => lines.push(format!("{key}={other}")),
        }
    }
    lines.join("\n")
}

/// Re-indent one `Key=Value` dump line for reading: parentheses open an
/// indented block, commas break lines inside them. The scanner is
/// quote-oblivious, exactly like the dump viewer display it reproduces.
pub fn multiline(line: &str) -> String {
    let Some((key, value)) = line.split_once('=') else {
        return line.to_string();
    };
    let mut output = String::with_capacity(line.len() * 2);
    output.push_str(key);
    output.push('=');
    let mut indent_level = 1;
    for c in value.chars() {
        match c {
            '(' => {
                indent_level += 1;
                output.push(c);
                output.push('\n');
                output.push_str(&"    ".repeat(indent_level));
            }
            ')' => {
                if indent_level > 1 {
                    indent_level -= 1;
                }
                output.push('\n');
                output.push_str(&"    ".repeat(indent_level));
                output.push(c);
            }
            ',' if indent_level > 1 => {
                output.push(c);
                output.push('\n');
                output.push_str(&"    ".repeat(indent_level));
            }
            other => output.push(other),
        }
    }
    output
}
