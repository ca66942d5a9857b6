//! JSON request-body fragments and the `${name}` variables they reference.
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.\-]*)\}").expect("BUG: invalid variable regex literal")
});

/// An uploaded `.json` file.
///
/// Invalid JSON is kept as raw text with `parsed` left empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentFile {
    pub filename: String,
    #[serde(skip)]
    pub raw_content: String,
    #[serde(skip)]
    pub parsed: Option<Value>,
    pub variables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl FragmentFile {
    pub fn parse(filename: &str, text: &str) -> Self {
        let (parsed, parse_error) = match serde_json::from_str::<Value>(text) {
            Ok(value) => (Some(value), None),
            Err(e) => {
                log::debug!("fragment '{}' is not valid JSON: {}", filename, e);
                (None, Some(e.to_string()))
            }
        };
        let variables = parsed.as_ref().map(scan_variables).unwrap_or_default();
        Self {
            filename: filename.to_string(),
            raw_content: text.to_string(),
            parsed,
            variables,
            parse_error,
        }
    }
}

/// Collects the unique `${identifier}` names in the string leaves of `value`,
/// in first-seen order. Object keys are not scanned.
pub fn scan_variables(value: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect(value, &mut found);
    found
}

fn collect(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for cap in VARIABLE_RE.captures_iter(s) {
                let name = &cap[1];
                if !found.iter().any(|f| f == name) {
                    found.push(name.to_string());
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect(item, found)),
        Value::Object(map) => map.values().for_each(|v| collect(v, found)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variables_in_first_seen_order() {
        let body = json!({
            "user": "${uid}",
            "items": ["${sku}", {"qty": "${qty} of ${sku}"}],
            "again": "${uid}"
        });
        assert_eq!(scan_variables(&body), vec!["uid", "sku", "qty"]);
    }

    #[test]
    fn test_function_calls_are_not_variables() {
        let body = json!({"a": "${__P(host)}", "b": "${__Random(1,9)}", "c": "${user.name}"});
        assert_eq!(scan_variables(&body), vec!["user.name"]);
    }

    #[test]
    fn test_keys_are_not_scanned() {
        let body = json!({"${key}": 1});
        assert!(scan_variables(&body).is_empty());
    }

    #[test]
    fn test_invalid_json_is_kept_raw() {
        let fragment = FragmentFile::parse("body.json", "{\"a\": ");
        assert!(fragment.parsed.is_none());
        assert!(fragment.parse_error.is_some());
        assert_eq!(fragment.raw_content, "{\"a\": ");
        assert!(fragment.variables.is_empty());
    }
}
