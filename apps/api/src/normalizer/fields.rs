//! Lenient readers for loosely-typed extraction objects. A reader returns an
//! empty value instead of failing, and records what it could not use.

use serde_json::{Map, Value};

use crate::matching::skills::tokenize_requirements;

/// Collects field-level problems while a record is normalized.
#[derive(Debug, Default)]
pub struct Issues(pub Vec<String>);

impl Issues {
    pub fn push(&mut self, field: &str, problem: impl Into<String>) {
        self.0.push(format!("{field}: {}", problem.into()));
    }
}

/// First key from `keys` that is present and not null.
pub fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<(&'a str, &'a Value)> {
    keys.iter().find_map(|k| {
        obj.get_key_value(*k)
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.as_str(), v))
    })
}

pub fn text(obj: &Map<String, Value>, keys: &[&str], issues: &mut Issues) -> String {
    match lookup(obj, keys) {
        None => String::new(),
        Some((key, value)) => value_to_text(value).unwrap_or_else(|| {
            issues.push(key, "expected text");
            String::new()
        }),
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_to_text)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Null | Value::Object(_) => None,
    }
}

/// How a plain string is split when a list was expected.
#[derive(Debug, Clone, Copy)]
pub enum Split {
    /// Commas, semicolons and newlines ("Python, SQL").
    Items,
    /// Semicolons and newlines only, for entries that contain commas.
    Lines,
}

/// Reads a list of strings. Accepts an array (of strings, numbers, or objects
/// carrying a `name`-like key) or a delimited string.
pub fn text_list(obj: &Map<String, Value>, keys: &[&str], split: Split, issues: &mut Issues) -> Vec<String> {
    let Some((key, value)) = lookup(obj, keys) else {
        return vec![];
    };
    match value {
        Value::String(s) => split_text(s, split),
        Value::Array(items) => {
            let mut out = Vec::new();
            for item in items {
                match item {
                    Value::String(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
                    Value::String(_) | Value::Null => {}
                    Value::Number(n) => out.push(n.to_string()),
                    Value::Object(inner) => {
                        match lookup(inner, &["name", "title", "skill", "certification"]) {
                            Some((_, Value::String(s))) if !s.trim().is_empty() => {
                                out.push(s.trim().to_string())
                            }
                            _ => issues.push(key, "list item without a name"),
                        }
                    }
                    _ => issues.push(key, "unsupported list item"),
                }
            }
            out
        }
        _ => {
            issues.push(key, "expected a list");
            vec![]
        }
    }
}

pub fn split_text(s: &str, split: Split) -> Vec<String> {
    match split {
        Split::Items => tokenize_requirements(s),
        Split::Lines => s
            .split([';', '\n'])
            .map(|p| p.trim().trim_start_matches(['-', '*', '•']).trim())
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect(),
    }
}

/// Reads an array of objects, handing each object to `read`. Plain strings
/// are passed to `from_text`.
pub fn records<T>(
    obj: &Map<String, Value>,
    keys: &[&str],
    issues: &mut Issues,
    mut read: impl FnMut(&Map<String, Value>, &mut Issues) -> T,
    from_text: impl Fn(&str) -> T,
) -> Vec<T> {
    let Some((key, value)) = lookup(obj, keys) else {
        return vec![];
    };
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        Value::String(s) if s.trim().is_empty() => vec![],
        Value::String(_) => vec![value],
        _ => {
            issues.push(key, "expected a list of entries");
            return vec![];
        }
    };

    let mut out = Vec::new();
    for item in items {
        match item {
            Value::Object(inner) => out.push(read(inner, issues)),
            Value::String(s) => out.extend(split_text(s, Split::Lines).iter().map(|l| from_text(l))),
            Value::Null => {}
            _ => issues.push(key, "unsupported entry"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_text_uses_first_present_alias() {
        let mut issues = Issues::default();
        let o = obj(json!({"summary": null, "profile_summary": " Builder "}));
        assert_eq!(text(&o, &["summary", "profile_summary"], &mut issues), "Builder");
        assert!(issues.0.is_empty());
    }

    #[test]
    fn test_text_rejects_objects() {
        let mut issues = Issues::default();
        let o = obj(json!({"name": {"first": "Ada"}}));
        assert_eq!(text(&o, &["name"], &mut issues), "");
        assert_eq!(issues.0, vec!["name: expected text"]);
    }

    #[test]
    fn test_text_list_accepts_string_or_array() {
        let mut issues = Issues::default();
        let o = obj(json!({"a": "Rust, Go", "b": ["Rust", {"name": "Go"}, 3, ""]}));
        assert_eq!(text_list(&o, &["a"], Split::Items, &mut issues), vec!["Rust", "Go"]);
        assert_eq!(text_list(&o, &["b"], Split::Items, &mut issues), vec!["Rust", "Go", "3"]);
        assert!(issues.0.is_empty());
    }

    #[test]
    fn test_text_list_wrong_type_is_recorded() {
        let mut issues = Issues::default();
        let o = obj(json!({"skills": 42}));
        assert!(text_list(&o, &["skills"], Split::Items, &mut issues).is_empty());
        assert_eq!(issues.0.len(), 1);
    }
}
