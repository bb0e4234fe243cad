use regex::Regex;
use serde_json::Value;

/// Best-effort extraction of one JSON object from LLM output.
///
/// Chain: strip code fences, prefer whatever follows a "json" tag, strip
/// trailing commas, and fall back to the first balanced brace-delimited
/// object. Total failure is `None`; callers degrade to an empty result.
pub fn extract_object(text: &str) -> Option<Value> {
    let cleaned = text.replace("```", "");

    // A "json" tag (usually left over from a fenced block) marks where the
    // payload starts. Case-insensitive, same as the services emit it.
    let tag = Regex::new(r"(?i)json\s*").unwrap();
    if let Some(m) = tag.find(&cleaned) {
        let mut body = cleaned[m.end()..].trim();
        body = body
            .strip_prefix('\'')
            .or_else(|| body.strip_prefix('"'))
            .unwrap_or(body);
        body = body
            .strip_suffix('\'')
            .or_else(|| body.strip_suffix('"'))
            .unwrap_or(body);
        let body = body.trim();

        if let Ok(v) = serde_json::from_str(&strip_trailing_commas(body)) {
            return Some(v);
        }
        if let Some(obj) = balanced_object(body) {
            if let Ok(v) = serde_json::from_str(&strip_trailing_commas(obj)) {
                return Some(v);
            }
        }
    }

    let trimmed = cleaned.trim();
    if let Ok(v) = serde_json::from_str(&strip_trailing_commas(trimmed)) {
        return Some(v);
    }
    if let Some(obj) = balanced_object(trimmed) {
        if let Ok(v) = serde_json::from_str(&strip_trailing_commas(obj)) {
            return Some(v);
        }
    }

    None
}

/// Strict decoder for the clue-mutation response format: a JSON array of
/// strings and nothing else. Anything that does not parse as exactly that is
/// rejected (never evaluated), yielding an empty list.
pub fn strict_string_list(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if !trimmed.starts_with('[') || !trimmed.ends_with(']') {
        return Vec::new();
    }
    serde_json::from_str::<Vec<String>>(trimmed).unwrap_or_default()
}

fn strip_trailing_commas(s: &str) -> String {
    let re = Regex::new(r",(\s*[}\]])").unwrap();
    re.replace_all(s, "$1").into_owned()
}

/// Locate the first balanced `{...}` span, tracking string literals so braces
/// inside quoted values do not confuse the depth count.
fn balanced_object(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
