//! Rewrites literal values in JSON request bodies into `${variable}`
//! references to a data set's columns.
//!
//! Two rules are applied to every object entry, in this order:
//!
//! 1. **Key match**: the entry's key names a data set variable, so its value
//!    becomes `${key}`.
//! 2. **Value match**: the entry's scalar value equals a value of the data
//!    set's first row, so it becomes the placeholder of that column.
//!
//! Entries matching neither rule are descended into. Scalar array items are
//! never rewritten.

pub mod error;

pub use error::ParameterizeError;

use loadplan_datafiles::first_data_row;
use loadplan_types::DataSetSpec;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};
use std::collections::HashMap;

const INDENT: &[u8] = b"    ";

/// Which rule produced a replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rule {
    Key,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub key: String,
    pub placeholder: String,
    pub rule: Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameterized {
    /// The rewritten body, or the input unchanged when nothing was replaced.
    pub body: String,
    pub replacements: Vec<Replacement>,
    /// True when the data set had variables and content, whether or not the
    /// body was JSON.
    pub used: bool,
}

fn placeholder(variable: &str) -> String {
    format!("${{{}}}", variable)
}

/// Rewrites `body` against `data_set`.
///
/// A body that is not JSON is returned as is.
pub fn parameterize(body: &str, data_set: &DataSetSpec) -> Result<Parameterized, ParameterizeError> {
    let unchanged = |used| Parameterized {
        body: body.to_string(),
        replacements: Vec::new(),
        used,
    };

    let Some(raw_content) = data_set.raw_content.as_deref() else {
        return Ok(unchanged(false));
    };
    if data_set.variable_names.is_empty() {
        return Ok(unchanged(false));
    }
    // A non-JSON body still marks the data set used.
    let mut value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("body is not JSON, leaving it unparameterized: {}", e);
            return Ok(unchanged(true));
        }
    };

    let by_value = value_map(&data_set.variable_names, raw_content, delimiter_of(data_set));
    let mut replacements = Vec::new();
    rewrite(&mut value, &data_set.variable_names, &by_value, &mut replacements);
    if replacements.is_empty() {
        return Ok(unchanged(true));
    }

    log::debug!(
        "data set '{}' parameterized {} body values",
        data_set.name,
        replacements.len()
    );
    Ok(Parameterized {
        body: to_pretty_json(&value)?,
        replacements,
        used: true,
    })
}

fn delimiter_of(data_set: &DataSetSpec) -> char {
    data_set.delimiter.chars().next().unwrap_or(',')
}

/// Maps each trimmed, non-blank value of the first data row to the
/// placeholder of its column. The first column wins on repeated values.
fn value_map(variables: &[String], raw_content: &str, delimiter: char) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let Some(row) = first_data_row(raw_content, delimiter) else {
        return map;
    };
    for (variable, value) in variables.iter().zip(row) {
        let value = value.trim();
        if !value.is_empty() {
            map.entry(value.to_string())
                .or_insert_with(|| placeholder(variable));
        }
    }
    map
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn rewrite(
    value: &mut Value,
    variables: &[String],
    by_value: &HashMap<String, String>,
    replacements: &mut Vec<Replacement>,
) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if variables.iter().any(|v| v == key) {
                    let target = placeholder(key);
                    if entry.as_str() != Some(target.as_str()) {
                        *entry = Value::String(target.clone());
                        replacements.push(Replacement {
                            key: key.clone(),
                            placeholder: target,
                            rule: Rule::Key,
                        });
                    }
                    continue;
                }
                if let Some(target) = scalar_text(entry).and_then(|text| by_value.get(&text)) {
                    *entry = Value::String(target.clone());
                    replacements.push(Replacement {
                        key: key.clone(),
                        placeholder: target.clone(),
                        rule: Rule::Value,
                    });
                    continue;
                }
                rewrite(entry, variables, by_value, replacements);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut().filter(|i| i.is_object() || i.is_array()) {
                rewrite(item, variables, by_value, replacements);
            }
        }
        _ => {}
    }
}

fn to_pretty_json(value: &Value) -> Result<String, ParameterizeError> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf)?)
}
