//! Cleanup of raw extraction output before JSON parsing.

use serde_json::Value;

/// Strips ```json ... ``` or ``` ... ``` code fences, including fences with
/// chatter before or after them.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_open = &text[open + 3..];
    let body = after_open
        .strip_prefix("json")
        .or_else(|| after_open.strip_prefix("JSON"))
        .unwrap_or(after_open);
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Parses extraction output, repairing common damage on the way:
/// fences, prose around the object, smart quotes, trailing commas and
/// unclosed brackets from truncated output. Returns `None` when nothing
/// usable remains.
pub fn parse_lenient(text: &str) -> Option<Value> {
    let unfenced = strip_json_fences(text);
    if let Ok(value) = serde_json::from_str::<Value>(unfenced) {
        return Some(value);
    }

    let candidate = outermost_object(unfenced)?;
    let candidate = candidate
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    let candidate = remove_trailing_commas(&candidate);
    if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
        return Some(value);
    }

    let closed = close_open_brackets(&candidate);
    serde_json::from_str::<Value>(&closed).ok()
}

/// From the first `{` to the last `}`; to the end of input when the object
/// was cut off.
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    match text.rfind('}') {
        Some(end) if end > start => Some(&text[start..=end]),
        _ => Some(&text[start..]),
    }
}

fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        }
        if c == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']') | None) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn close_open_brackets(text: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut out = text.trim_end().trim_end_matches(',').to_string();
    if in_string {
        out.push('"');
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}
