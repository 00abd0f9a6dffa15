//! Recovery strategies for raw model output.
//!
//! Each strategy looks at the raw reply independently and either recovers
//! a candidate or declines. Callers try them in order and stop at the first
//! candidate that validates.

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

/// Minimum length of unfenced text accepted as source code.
pub const BARE_SOURCE_MIN_CHARS: usize = 50;

/// The strategy that produced a decoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recovery {
    /// The whole reply parsed as JSON.
    DirectParse,
    /// The span from the first `{` to the last `}` parsed as JSON.
    BraceSpan,
    /// The first balanced `{...}` object parsed as JSON.
    BalancedObject,
    /// A JSON object carrying a `files` map.
    FilesObject,
    /// The `"src/App.tsx": "..."` field, even in otherwise broken JSON.
    FieldPattern,
    /// The body of a closed code fence.
    Fence,
    /// The body of a fence the model never closed.
    OpenFence,
    /// Unfenced text that looks like a module.
    BareSource,
}

impl Recovery {
    /// Strategies for JSON stages, in the order they are tried.
    pub const JSON: [Recovery; 3] = [
        Recovery::DirectParse,
        Recovery::BraceSpan,
        Recovery::BalancedObject,
    ];

    /// Strategies for code stages that extract source text, in order.
    ///
    /// `FilesObject` is tried before these.
    pub const SOURCE: [Recovery; 4] = [
        Recovery::FieldPattern,
        Recovery::Fence,
        Recovery::OpenFence,
        Recovery::BareSource,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Recovery::DirectParse => "direct-parse",
            Recovery::BraceSpan => "brace-span",
            Recovery::BalancedObject => "balanced-object",
            Recovery::FilesObject => "files-object",
            Recovery::FieldPattern => "field-pattern",
            Recovery::Fence => "fence",
            Recovery::OpenFence => "open-fence",
            Recovery::BareSource => "bare-source",
        }
    }

    /// Recover a JSON value. Only meaningful for [`Recovery::JSON`].
    pub fn recover_json(self, raw: &str) -> Option<Value> {
        match self {
            Recovery::DirectParse => direct_parse(raw),
            Recovery::BraceSpan => brace_span(raw).and_then(parse_json),
            Recovery::BalancedObject => balanced_object(raw).and_then(parse_json),
            _ => None,
        }
    }

    /// Recover source text. Only meaningful for [`Recovery::SOURCE`].
    pub fn recover_source(self, raw: &str) -> Option<String> {
        match self {
            Recovery::FieldPattern => field_pattern(raw),
            Recovery::Fence => fenced(raw),
            Recovery::OpenFence => open_fence(raw),
            Recovery::BareSource => bare_source(raw),
            _ => None,
        }
    }
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_json(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok()
}

/// Parse the trimmed reply. A JSON string holding an object is unwrapped
/// once, which covers double-encoded replies.
fn direct_parse(raw: &str) -> Option<Value> {
    match parse_json(raw)? {
        Value::String(inner) if inner.trim_start().starts_with('{') => parse_json(&inner),
        value => Some(value),
    }
}

/// From the first `{` to the last `}`, inclusive.
pub fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

/// The first `{...}` whose braces balance, ignoring braces inside strings.
pub fn balanced_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

static FIELD_PATTERN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"src/App\.tsx"\s*:\s*"(.*?)"\s*\}?\s*,?\s*"dependencies""#).unwrap()
});

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*(?:typescript|javascript|tsx|jsx|ts|js)?[ \t]*\r?\n(.*?)\r?\n?```").unwrap()
});

static OPEN_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*(?:typescript|javascript|tsx|jsx|ts|js)?[ \t]*\r?\n(.*)\z").unwrap()
});

fn field_pattern(raw: &str) -> Option<String> {
    let captures = FIELD_PATTERN_RE.captures(raw)?;
    let code = captures.get(1)?.as_str();
    (!code.trim().is_empty()).then(|| code.to_string())
}

fn fenced(raw: &str) -> Option<String> {
    let captures = FENCE_RE.captures(raw)?;
    let code = captures.get(1)?.as_str();
    (!code.trim().is_empty()).then(|| code.to_string())
}

fn open_fence(raw: &str) -> Option<String> {
    let captures = OPEN_FENCE_RE.captures(raw)?;
    let code = captures.get(1)?.as_str().trim_end();
    (!code.trim().is_empty()).then(|| code.to_string())
}

fn bare_source(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (trimmed.contains("export default") && trimmed.chars().count() > BARE_SOURCE_MIN_CHARS)
        .then(|| trimmed.to_string())
}
