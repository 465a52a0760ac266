//! Lenient recovery of structured payloads from free-form model output
//!
//! Generation services wrap JSON in prose, markdown, or code fences. The
//! contract here is explicit: locate the first balanced brace-delimited
//! substring, attempt a typed parse, and treat any failure as "no payload".

use serde::de::DeserializeOwned;

/// Extract the first balanced `{...}` substring from `text` and parse it.
///
/// The scan is string-aware: braces inside JSON string literals (including
/// escaped quotes) do not affect the depth count. Returns `None` when no
/// balanced substring exists or when it fails to parse as `T`.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Option<T> {
    let candidate = first_balanced_object(text)?;
    serde_json::from_str(candidate).ok()
}

/// Locate the first balanced brace-delimited substring
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip at most one leading and one trailing fenced-code delimiter line.
///
/// A delimiter line is three or more backticks; the leading one may carry a
/// language tag. Text without fences passes through unchanged (trimmed).
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let mut lines: Vec<&str> = trimmed.lines().collect();

    if let Some(first) = lines.first() {
        if is_fence_line(first, true) {
            lines.remove(0);
        }
    }
    if let Some(last) = lines.last() {
        if is_fence_line(last, false) {
            lines.pop();
        }
    }
    lines.join("\n")
}

fn is_fence_line(line: &str, allow_tag: bool) -> bool {
    let line = line.trim_end();
    let ticks = line.chars().take_while(|c| *c == '`').count();
    if ticks < 3 {
        return false;
    }
    let rest = &line[ticks..];
    if allow_tag {
        rest.chars().all(|c| c.is_ascii_alphanumeric())
    } else {
        rest.is_empty()
    }
}
